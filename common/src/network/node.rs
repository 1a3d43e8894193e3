use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use parking_lot::Mutex;
use pnet::util::MacAddr;

use crate::network::mac::VendorRepository;

/// Key of an entry in a node's fact map. One fact per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FactKind {
    Ipv4Router,
    Ipv6Router,
}

/// What made us decide a node routes IPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterEvidence {
    RouterAdvertisement,
    EchoReply,
}

/// Something learned about a node during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeFact {
    Ipv4Router { gateway: Ipv4Addr },
    Ipv6Router { evidence: RouterEvidence },
}

impl NodeFact {
    pub fn kind(&self) -> FactKind {
        match self {
            NodeFact::Ipv4Router { .. } => FactKind::Ipv4Router,
            NodeFact::Ipv6Router { .. } => FactKind::Ipv6Router,
        }
    }
}

impl fmt::Display for NodeFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeFact::Ipv4Router { gateway } => write!(f, "IPv4 router (default gateway {gateway})"),
            NodeFact::Ipv6Router { evidence: RouterEvidence::RouterAdvertisement } => {
                write!(f, "IPv6 router (router advertisement)")
            }
            NodeFact::Ipv6Router { evidence: RouterEvidence::EchoReply } => {
                write!(f, "IPv6 router (echo reply)")
            }
        }
    }
}

/// Everything observed about a single MAC address on the segment.
///
/// Locality is decided once, when the node is first created, and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkNode {
    mac: MacAddr,
    local: bool,
    addresses: BTreeSet<IpAddr>,
    facts: BTreeMap<FactKind, NodeFact>,
}

impl NetworkNode {
    pub fn new(mac: MacAddr, local: bool) -> Self {
        Self {
            mac,
            local,
            addresses: BTreeSet::new(),
            facts: BTreeMap::new(),
        }
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// Colon delimited, uppercase.
    pub fn mac_label(&self) -> String {
        self.mac.to_string().to_uppercase()
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn addresses(&self) -> impl Iterator<Item = &IpAddr> {
        self.addresses.iter()
    }

    pub fn has_address(&self, addr: &IpAddr) -> bool {
        self.addresses.contains(addr)
    }

    /// Returns `true` if the address was not known before.
    pub fn add_address(&mut self, addr: IpAddr) -> bool {
        self.addresses.insert(addr)
    }

    pub fn facts(&self) -> impl Iterator<Item = &NodeFact> {
        self.facts.values()
    }

    pub fn has_fact(&self, kind: FactKind) -> bool {
        self.facts.contains_key(&kind)
    }

    /// Stores `fact` unless a fact of the same kind is already present.
    ///
    /// Returns `true` only the first time a kind is recorded.
    pub fn add_fact(&mut self, fact: NodeFact) -> bool {
        let kind = fact.kind();
        if self.facts.contains_key(&kind) {
            return false;
        }
        self.facts.insert(kind, fact);
        true
    }

    pub fn manufacturer(&self, vendors: &dyn VendorRepository) -> String {
        vendors
            .get_vendor(self.mac)
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// A node shared between the listener and the plugins it dispatches to.
pub type SharedNode = Arc<Mutex<NetworkNode>>;

/// Local nodes of one capture session keyed by MAC.
#[derive(Debug, Default)]
pub struct NodeTable {
    nodes: HashMap<MacAddr, SharedNode>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mac: &MacAddr) -> Option<SharedNode> {
        self.nodes.get(mac).cloned()
    }

    /// Inserts a node. Non-local nodes are refused and `false` is returned.
    pub fn insert(&mut self, node: SharedNode) -> bool {
        let (mac, local) = {
            let guard = node.lock();
            (guard.mac(), guard.is_local())
        };
        if !local {
            return false;
        }
        self.nodes.insert(mac, node);
        true
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copies every node out of the table, ordered by MAC.
    pub fn snapshot(&self) -> Vec<NetworkNode> {
        let mut nodes: Vec<NetworkNode> = self.nodes.values().map(|node| node.lock().clone()).collect();
        nodes.sort_by_key(|node| {
            let MacAddr(a, b, c, d, e, f) = node.mac();
            [a, b, c, d, e, f]
        });
        nodes
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

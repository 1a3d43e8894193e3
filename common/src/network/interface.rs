use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{Ipv4Network, Ipv6Network};
use pnet::util::MacAddr;
use tracing::debug;

use crate::error::DiscoveryError;
use crate::network::address::{self, AddressScope};
use crate::utils::interface::NetworkInterfaceExtension;

/// Interfaces that carry at least one IPv6 address.
pub fn ipv6_candidates(interfaces: Vec<NetworkInterface>) -> Vec<NetworkInterface> {
    interfaces
        .into_iter()
        .filter(|iface| {
            let has_ipv6 = iface.has_ipv6();
            if has_ipv6 {
                debug!(interface = %iface.name, "Interface has an IPv6 address");
            }
            has_ipv6
        })
        .collect()
}

/// Distinct /64 prefixes of every global-scope IPv6 address on the host.
pub fn global_prefixes(interfaces: &[NetworkInterface]) -> Vec<u64> {
    let mut prefixes: Vec<u64> = Vec::new();
    for net in interfaces.iter().flat_map(|iface| iface.get_ipv6_nets()) {
        let ip = net.ip();
        if address::classify(&ip) != AddressScope::Global {
            continue;
        }
        let prefix = address::network_prefix(&ip);
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }
    prefixes
}

/// What a plugin and the listener need to know about the interface being scanned.
#[derive(Debug, Clone)]
pub struct InterfaceContext {
    pub name: String,
    pub description: String,
    pub index: u32,
    pub mac: MacAddr,
    pub ipv4_nets: Vec<Ipv4Network>,
    pub ipv6_nets: Vec<Ipv6Network>,
    pub link_local: Ipv6Addr,
    /// Global /64 prefixes known to this host, not only to this interface.
    pub global_prefixes: Vec<u64>,
    pub ipv4_gateway: Option<Ipv4Addr>,
    pub template_dir: PathBuf,
}

impl InterfaceContext {
    pub fn from_interface(
        iface: &NetworkInterface,
        global_prefixes: Vec<u64>,
        ipv4_gateway: Option<Ipv4Addr>,
        template_dir: PathBuf,
    ) -> Result<Self, DiscoveryError> {
        let mac = iface
            .mac
            .filter(|mac| !mac.is_zero())
            .ok_or_else(|| DiscoveryError::MissingMac(iface.name.clone()))?;
        let link_local = iface
            .get_link_local_ipv6()
            .ok_or_else(|| DiscoveryError::MissingLinkLocal(iface.name.clone()))?;

        Ok(Self {
            name: iface.name.clone(),
            description: iface.description.clone(),
            index: iface.index,
            mac,
            ipv4_nets: iface.get_ipv4_nets(),
            ipv6_nets: iface.get_ipv6_nets(),
            link_local,
            global_prefixes,
            ipv4_gateway,
            template_dir,
        })
    }

    pub fn first_ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4_nets.first().map(|net| net.ip())
    }

    /// True if `addr` falls inside any IPv4 subnet bound to this interface.
    pub fn in_ipv4_subnet(&self, addr: Ipv4Addr) -> bool {
        self.ipv4_nets.iter().any(|net| net.contains(addr))
    }

    /// Our own interface identifier placed under a global prefix.
    pub fn global_address(&self, prefix: u64) -> Ipv6Addr {
        address::with_prefix(prefix, address::interface_identifier(&self.link_local))
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

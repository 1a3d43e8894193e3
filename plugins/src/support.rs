use std::collections::HashSet;
use std::net::{IpAddr, Ipv6Addr};

use pnet::datalink::MacAddr;
use sixscout_common::network::address;
use sixscout_protocols::frame::Frame;
use tracing::trace;

use crate::plugin::{InjectorId, LiveInjector};

/// Live injectors registered with a plugin.
#[derive(Debug, Default)]
pub(crate) struct LiveInjectors {
    injectors: Vec<LiveInjector>,
}

impl LiveInjectors {
    pub fn register(&mut self, injector: LiveInjector) {
        if self.injectors.iter().all(|i| i.id() != injector.id()) {
            self.injectors.push(injector);
        }
    }

    pub fn unregister(&mut self, id: InjectorId) {
        self.injectors.retain(|i| i.id() != id);
    }

    pub fn is_empty(&self) -> bool {
        self.injectors.is_empty()
    }

    /// Hands a copy of `packet` to every registered injector.
    pub fn broadcast(&self, packet: &[u8]) -> usize {
        self.injectors
            .iter()
            .filter(|injector| injector.inject(packet.to_vec()))
            .count()
    }
}

/// Link-local and site-local IPv6 addresses seen on the wire, each handed out once.
#[derive(Debug, Default)]
pub(crate) struct CandidateTracker {
    processed: HashSet<Ipv6Addr>,
}

impl CandidateTracker {
    /// Runs `queue` for an eligible address not processed yet, and records the
    /// address only once `queue` succeeds.
    ///
    /// Returns `Ok(false)` without calling `queue` for ineligible or known addresses.
    pub fn process<E>(&mut self, addr: &Ipv6Addr, queue: impl FnOnce() -> Result<(), E>) -> Result<bool, E> {
        let ip = IpAddr::V6(*addr);
        if !(address::is_link_local(&ip) || address::is_site_local(&ip)) || self.processed.contains(addr) {
            return Ok(false);
        }
        queue()?;
        self.processed.insert(*addr);
        trace!(%addr, "Probe candidate processed");
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }
}

/// Source and destination (MAC, IPv6) pairs of an IPv6 frame.
pub(crate) fn ipv6_endpoints(frame: &Frame) -> Option<[(MacAddr, Ipv6Addr); 2]> {
    let ip = frame.ipv6()?;
    let eth = frame.ethernet();
    Some([(eth.source, ip.source), (eth.destination, ip.destination)])
}

/// Interface used by the strategy tests: one IPv4 subnet, a link-local and one global prefix.
#[cfg(test)]
pub(crate) fn sample_context() -> sixscout_common::network::interface::InterfaceContext {
    use sixscout_common::network::interface::InterfaceContext;

    InterfaceContext {
        name: "eth0".into(),
        description: String::new(),
        index: 2,
        mac: MacAddr::new(0x02, 0x00, 0x00, 0xaa, 0xbb, 0xcc),
        ipv4_nets: vec!["192.168.1.10/24".parse().unwrap()],
        ipv6_nets: vec!["fe80::aa:bbcc/64".parse().unwrap()],
        link_local: "fe80::aa:bbcc".parse().unwrap(),
        global_prefixes: vec![0x2001_0db8_0000_0001],
        ipv4_gateway: Some("192.168.1.1".parse().unwrap()),
        template_dir: std::path::PathBuf::from("pcap"),
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

//! Compiled table of every discovery strategy.
//!
//! Instances are created fresh for each run; nothing here holds state.

use crate::plugin::{Plugin, PluginSet};
use crate::strategies::multicast::MulticastProbe;
use crate::strategies::neighbor_discovery::NeighborDiscovery;
use crate::strategies::ping6::Ping6;
use crate::strategies::router_discovery::RouterDiscovery;

pub type PluginFactory = fn() -> Box<dyn Plugin>;

#[derive(Debug, Clone, Copy)]
pub struct PluginEntry {
    pub id: &'static str,
    pub factory: PluginFactory,
}

fn icmp_v4() -> Box<dyn Plugin> {
    Box::new(MulticastProbe::icmp_v4())
}

fn icmp_v6() -> Box<dyn Plugin> {
    Box::new(MulticastProbe::icmp_v6())
}

fn udp_v4() -> Box<dyn Plugin> {
    Box::new(MulticastProbe::udp_v4())
}

fn udp_v6() -> Box<dyn Plugin> {
    Box::new(MulticastProbe::udp_v6())
}

fn ping6() -> Box<dyn Plugin> {
    Box::new(Ping6::new())
}

fn neighbor_discovery() -> Box<dyn Plugin> {
    Box::new(NeighborDiscovery::new())
}

fn router_discovery() -> Box<dyn Plugin> {
    Box::new(RouterDiscovery::new())
}

pub const MANIFEST: &[PluginEntry] = &[
    PluginEntry { id: "icmp4", factory: icmp_v4 },
    PluginEntry { id: "icmp6", factory: icmp_v6 },
    PluginEntry { id: "udp4", factory: udp_v4 },
    PluginEntry { id: "udp6", factory: udp_v6 },
    PluginEntry { id: "ping6", factory: ping6 },
    PluginEntry { id: "neighbor-discovery", factory: neighbor_discovery },
    PluginEntry { id: "router-discovery", factory: router_discovery },
];

pub fn find(id: &str) -> Option<&'static PluginEntry> {
    MANIFEST.iter().find(|entry| entry.id.eq_ignore_ascii_case(id))
}

/// A fresh instance of every strategy in the manifest.
pub fn instantiate_all() -> PluginSet {
    PluginSet::new(MANIFEST.iter().map(|entry| (entry.factory)()).collect())
}

/// Fresh instances of the named strategies. Unknown ids are returned as the error.
pub fn instantiate(ids: &[String]) -> Result<PluginSet, Vec<String>> {
    let mut plugins = Vec::new();
    let mut unknown = Vec::new();
    for id in ids {
        match find(id) {
            Some(entry) => plugins.push((entry.factory)()),
            None => unknown.push(id.clone()),
        }
    }
    if unknown.is_empty() {
        Ok(PluginSet::new(plugins))
    } else {
        Err(unknown)
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

//! Neighbor solicitation for addresses we have not heard from at global scope.
//!
//! For each link-local or site-local address seen on the wire, the interface
//! identifier is combined with every known /64 prefix and a solicitation for the
//! result is sent to its solicited-node group. Hosts that own the address answer
//! with an advertisement, which the listener treats as local.

use std::net::Ipv6Addr;

use sixscout_common::network::address;
use sixscout_common::network::interface::InterfaceContext;
use sixscout_protocols::builder::{FrameAddressing, icmpv6_frame};
use sixscout_protocols::error::CodecError;
use sixscout_protocols::icmpv6::{Icmpv6Body, NeighborSolicitation};
use sixscout_protocols::ndp;
use tracing::trace;

use crate::plugin::{InjectorId, InjectorPlugin, ListenerPacket, ListenerPlugin, LiveInjector, Plugin};
use crate::support::{CandidateTracker, LiveInjectors, ipv6_endpoints};

/// Solicitation for `target`, sent from our address under the same prefix.
pub fn solicitation(iface: &InterfaceContext, prefix: u64, target: Ipv6Addr) -> Result<Vec<u8>, CodecError> {
    let addressing = FrameAddressing {
        src_mac: iface.mac,
        dst_mac: ndp::solicited_node_mac(&target),
        src_ip: iface.global_address(prefix),
        dst_ip: ndp::solicited_node_address(&target),
        hop_limit: ndp::NDP_HOP_LIMIT,
    };
    let body = Icmpv6Body::NeighborSolicitation(NeighborSolicitation {
        reserved: 0,
        target,
        source_link_layer: Some(iface.mac),
    });
    icmpv6_frame(&addressing, &body)
}

/// One solicitation per global prefix for `candidate`'s interface identifier.
pub fn solicitations(iface: &InterfaceContext, candidate: &Ipv6Addr) -> Result<Vec<Vec<u8>>, CodecError> {
    let iid = address::interface_identifier(candidate);
    iface
        .global_prefixes
        .iter()
        .map(|&prefix| solicitation(iface, prefix, address::with_prefix(prefix, iid)))
        .collect()
}

#[derive(Default)]
pub struct NeighborDiscovery {
    iface: Option<InterfaceContext>,
    candidates: CandidateTracker,
    injectors: LiveInjectors,
}

impl NeighborDiscovery {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for NeighborDiscovery {
    fn name(&self) -> &str {
        "NeighborDiscovery"
    }

    fn initialize(&mut self, iface: &InterfaceContext) -> anyhow::Result<()> {
        self.candidates = CandidateTracker::default();
        self.iface = Some(iface.clone());
        Ok(())
    }

    fn as_listener(&mut self) -> Option<&mut dyn ListenerPlugin> {
        Some(self)
    }

    fn as_injector(&mut self) -> Option<&mut dyn InjectorPlugin> {
        Some(self)
    }
}

impl ListenerPlugin for NeighborDiscovery {
    fn process_packet(&mut self, packet: &ListenerPacket) -> anyhow::Result<()> {
        let Some(iface) = &self.iface else {
            return Ok(());
        };
        if self.injectors.is_empty() || iface.global_prefixes.is_empty() {
            return Ok(());
        }
        let Some(endpoints) = ipv6_endpoints(&packet.frame) else {
            return Ok(());
        };

        let injectors = &self.injectors;
        for (_, ip) in endpoints {
            self.candidates.process(&ip, || {
                for ns in solicitations(iface, &ip)? {
                    let queued = injectors.broadcast(&ns);
                    trace!(%ip, queued, "Queued neighbor solicitation");
                }
                Ok::<(), CodecError>(())
            })?;
        }
        Ok(())
    }
}

impl InjectorPlugin for NeighborDiscovery {
    fn injection_packets(&mut self) -> anyhow::Result<Vec<Vec<u8>>> {
        Ok(Vec::new())
    }

    fn register_live_injector(&mut self, injector: LiveInjector) {
        self.injectors.register(injector);
    }

    fn unregister_live_injector(&mut self, id: InjectorId) {
        self.injectors.unregister(id);
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

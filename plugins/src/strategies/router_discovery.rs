//! Router discovery.
//!
//! Sends one router solicitation and flags the sender of any router
//! advertisement as an IPv6 router. Nodes talking to the default IPv4 gateway's
//! address are flagged as IPv4 routers.

use std::net::Ipv4Addr;

use sixscout_common::network::interface::InterfaceContext;
use sixscout_common::network::node::{NodeFact, RouterEvidence, SharedNode};
use sixscout_protocols::builder::{FrameAddressing, icmpv6_frame};
use sixscout_protocols::error::CodecError;
use sixscout_protocols::icmpv6::{Icmpv6Body, RouterSolicitation};
use sixscout_protocols::ndp;
use tracing::{debug, info};

use crate::plugin::{InjectorPlugin, ListenerPacket, ListenerPlugin, Plugin};

/// Router solicitation from our link-local address to `ff02::2`.
pub fn router_solicitation(iface: &InterfaceContext) -> Result<Vec<u8>, CodecError> {
    let addressing = FrameAddressing {
        src_mac: iface.mac,
        dst_mac: ndp::multicast_mac(&ndp::ALL_ROUTERS),
        src_ip: iface.link_local,
        dst_ip: ndp::ALL_ROUTERS,
        hop_limit: ndp::NDP_HOP_LIMIT,
    };
    let body = Icmpv6Body::RouterSolicitation(RouterSolicitation {
        reserved: 0,
        source_link_layer: Some(iface.mac),
    });
    icmpv6_frame(&addressing, &body)
}

fn flag_ipv4_router(node: &SharedNode, gateway: Ipv4Addr) {
    let mut node = node.lock();
    if node.add_fact(NodeFact::Ipv4Router { gateway }) {
        info!("Node[{}] is an IPv4 router", node.mac_label());
    }
}

#[derive(Default)]
pub struct RouterDiscovery {
    solicitation: Vec<u8>,
    gateway: Option<Ipv4Addr>,
}

impl RouterDiscovery {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for RouterDiscovery {
    fn name(&self) -> &str {
        "RouterDiscovery"
    }

    fn initialize(&mut self, iface: &InterfaceContext) -> anyhow::Result<()> {
        self.solicitation = router_solicitation(iface)?;
        self.gateway = iface.ipv4_gateway;
        if self.gateway.is_none() {
            debug!(interface = %iface.name, "No IPv4 gateway, IPv4 router tagging disabled");
        }
        Ok(())
    }

    fn as_listener(&mut self) -> Option<&mut dyn ListenerPlugin> {
        Some(self)
    }

    fn as_injector(&mut self) -> Option<&mut dyn InjectorPlugin> {
        Some(self)
    }
}

impl ListenerPlugin for RouterDiscovery {
    fn process_packet(&mut self, packet: &ListenerPacket) -> anyhow::Result<()> {
        if packet.frame.icmpv6().and_then(|m| m.router_advertisement()).is_some() {
            let mut src = packet.src.lock();
            if src.add_fact(NodeFact::Ipv6Router {
                evidence: RouterEvidence::RouterAdvertisement,
            }) {
                info!("Node[{}] is an IPv6 router", src.mac_label());
            }
            return Ok(());
        }

        if let (Some(gateway), Some(ip)) = (self.gateway, packet.frame.ipv4()) {
            if ip.source == gateway {
                flag_ipv4_router(&packet.src, gateway);
            }
            if ip.destination == gateway {
                flag_ipv4_router(&packet.dst, gateway);
            }
        }
        Ok(())
    }
}

impl InjectorPlugin for RouterDiscovery {
    fn injection_packets(&mut self) -> anyhow::Result<Vec<Vec<u8>>> {
        if self.solicitation.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![self.solicitation.clone()])
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

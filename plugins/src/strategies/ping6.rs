//! Echo based probing.
//!
//! A single echo request to all-routers is sent up front. Afterwards every newly
//! seen link-local or site-local address is pinged at its global form under each
//! known /64 prefix. A reply to the router probe marks the sender as a router.

use std::net::Ipv6Addr;

use pnet::datalink::MacAddr;
use sixscout_common::network::address;
use sixscout_common::network::interface::InterfaceContext;
use sixscout_common::network::node::{NodeFact, RouterEvidence};
use sixscout_protocols::builder::{FrameAddressing, icmpv6_frame};
use sixscout_protocols::error::CodecError;
use sixscout_protocols::icmpv6::{Echo, Icmpv6Body};
use sixscout_protocols::ndp;
use tracing::{info, trace};

use crate::plugin::{InjectorId, InjectorPlugin, ListenerPacket, ListenerPlugin, LiveInjector, Plugin};
use crate::support::{CandidateTracker, LiveInjectors, ipv6_endpoints};

/// Identifier of the echo request sent to all-routers.
pub const ROUTER_ID: u16 = 0x7304;
/// Identifier of echo requests sent to individual neighbors.
pub const NEIGHBOR_ID: u16 = 0xcea1;
pub const SEQUENCE: u16 = 1;

const PATTERN: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
const PATTERN_REPEAT: usize = 7;

/// The 56 byte payload carried by every probe.
pub fn echo_payload() -> Vec<u8> {
    PATTERN.repeat(PATTERN_REPEAT)
}

fn echo_request(identifier: u16) -> Icmpv6Body {
    Icmpv6Body::EchoRequest(Echo {
        identifier,
        sequence: SEQUENCE,
        payload: echo_payload(),
    })
}

/// Echo request from our link-local address to `ff02::2`.
pub fn router_probe(iface: &InterfaceContext) -> Result<Vec<u8>, CodecError> {
    let addressing = FrameAddressing {
        src_mac: iface.mac,
        dst_mac: ndp::multicast_mac(&ndp::ALL_ROUTERS),
        src_ip: iface.link_local,
        dst_ip: ndp::ALL_ROUTERS,
        hop_limit: ndp::NDP_HOP_LIMIT,
    };
    icmpv6_frame(&addressing, &echo_request(ROUTER_ID))
}

/// One unicast echo request per global prefix, aimed at `candidate`'s interface
/// identifier under that prefix.
pub fn neighbor_probes(
    iface: &InterfaceContext,
    dst_mac: MacAddr,
    candidate: &Ipv6Addr,
) -> Result<Vec<Vec<u8>>, CodecError> {
    let iid = address::interface_identifier(candidate);
    iface
        .global_prefixes
        .iter()
        .map(|&prefix| {
            let addressing = FrameAddressing {
                src_mac: iface.mac,
                dst_mac,
                src_ip: iface.global_address(prefix),
                dst_ip: address::with_prefix(prefix, iid),
                hop_limit: ndp::NDP_HOP_LIMIT,
            };
            icmpv6_frame(&addressing, &echo_request(NEIGHBOR_ID))
        })
        .collect()
}

fn answers_router_probe(echo: &Echo) -> bool {
    echo.identifier == ROUTER_ID && echo.sequence == SEQUENCE && echo.payload == echo_payload()
}

#[derive(Default)]
pub struct Ping6 {
    iface: Option<InterfaceContext>,
    router_probe: Vec<u8>,
    candidates: CandidateTracker,
    injectors: LiveInjectors,
}

impl Ping6 {
    pub fn new() -> Self {
        Self::default()
    }

    fn probe_neighbors(&mut self, packet: &ListenerPacket) -> anyhow::Result<()> {
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
        for (mac, ip) in endpoints {
            self.candidates.process(&ip, || {
                for probe in neighbor_probes(iface, mac, &ip)? {
                    let queued = injectors.broadcast(&probe);
                    trace!(%ip, %mac, queued, "Queued neighbor echo request");
                }
                Ok::<(), CodecError>(())
            })?;
        }
        Ok(())
    }
}

impl Plugin for Ping6 {
    fn name(&self) -> &str {
        "Ping6"
    }

    fn initialize(&mut self, iface: &InterfaceContext) -> anyhow::Result<()> {
        self.router_probe = router_probe(iface)?;
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

impl ListenerPlugin for Ping6 {
    fn process_packet(&mut self, packet: &ListenerPacket) -> anyhow::Result<()> {
        if let Some(echo) = packet.frame.icmpv6().and_then(|m| m.echo_reply()) {
            if answers_router_probe(echo) {
                let mut src = packet.src.lock();
                if src.add_fact(NodeFact::Ipv6Router {
                    evidence: RouterEvidence::EchoReply,
                }) {
                    info!("Node[{}] is an IPv6 router", src.mac_label());
                }
            }
        }

        self.probe_neighbors(packet)
    }
}

impl InjectorPlugin for Ping6 {
    fn injection_packets(&mut self) -> anyhow::Result<Vec<Vec<u8>>> {
        if self.router_probe.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![self.router_probe.clone()])
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

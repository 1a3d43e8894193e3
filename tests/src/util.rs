use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use pnet::datalink::{MacAddr, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use sixscout_common::network::interface::InterfaceContext;
use sixscout_protocols::builder::{FrameAddressing, icmpv6_frame};
use sixscout_protocols::icmpv6::{Echo, Icmpv6Body, NeighborAdvertisement, RouterAdvertisement};
use sixscout_plugins::strategies::ping6;
use sixscout_protocols::ndp;

pub const IFF_UP: u32 = 1;
pub const IFF_BROADCAST: u32 = 1 << 1;

pub const LOCAL_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x01);
pub const ROUTER_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x01, 0x02);

pub fn ni(name: &str, index: u32, mac: Option<MacAddr>, ips: &[IpNetwork], flags: u32) -> NetworkInterface {
    NetworkInterface {
        name: name.into(),
        description: "".into(),
        index,
        mac,
        ips: ips.to_vec(),
        flags,
    }
}

pub fn v4(a: u8, b: u8, c: u8, d: u8, p: u8) -> IpNetwork {
    IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(a, b, c, d), p).unwrap())
}

pub fn v6(s: &str, p: u8) -> IpNetwork {
    IpNetwork::V6(Ipv6Network::new(s.parse::<Ipv6Addr>().unwrap(), p).unwrap())
}

pub fn ip6(s: &str) -> Ipv6Addr {
    s.parse().unwrap()
}

/// A dual-stack interface with one global /64.
pub fn lan_interface() -> NetworkInterface {
    ni(
        "eth0",
        2,
        Some(LOCAL_MAC),
        &[v4(192, 168, 1, 10, 24), v6("fe80::1", 64), v6("2a00:1450:4001:1::10", 64)],
        IFF_UP | IFF_BROADCAST,
    )
}

pub fn lan_context() -> InterfaceContext {
    let iface = lan_interface();
    let prefixes = sixscout_common::network::interface::global_prefixes(std::slice::from_ref(&iface));
    InterfaceContext::from_interface(&iface, prefixes, Some(Ipv4Addr::new(192, 168, 1, 1)), PathBuf::from("pcap")).unwrap()
}

fn frame(src_mac: MacAddr, dst_mac: MacAddr, src_ip: Ipv6Addr, dst_ip: Ipv6Addr, hop_limit: u8, body: Icmpv6Body) -> Vec<u8> {
    let addressing = FrameAddressing {
        src_mac,
        dst_mac,
        src_ip,
        dst_ip,
        hop_limit,
    };
    icmpv6_frame(&addressing, &body).unwrap()
}

/// Router advertisement to all-nodes.
pub fn router_advertisement(src_mac: MacAddr, src_ip: Ipv6Addr) -> Vec<u8> {
    let body = Icmpv6Body::RouterAdvertisement(RouterAdvertisement {
        hop_limit: 64,
        flags: 0,
        lifetime: 1800,
        reachable_time: 0,
        retrans_timer: 0,
        source_link_layer: Some(src_mac),
    });
    frame(src_mac, ndp::multicast_mac(&ndp::ALL_NODES), src_ip, ndp::ALL_NODES, ndp::NDP_HOP_LIMIT, body)
}

/// Unsolicited neighbor advertisement to all-nodes.
pub fn neighbor_advertisement(src_mac: MacAddr, src_ip: Ipv6Addr, hop_limit: u8) -> Vec<u8> {
    let body = Icmpv6Body::NeighborAdvertisement(NeighborAdvertisement {
        flags: NeighborAdvertisement::OVERRIDE,
        target: src_ip,
        target_link_layer: Some(src_mac),
    });
    frame(src_mac, ndp::multicast_mac(&ndp::ALL_NODES), src_ip, ndp::ALL_NODES, hop_limit, body)
}

/// Reply to the all-routers echo request, as a router sends it.
pub fn router_echo_reply(src_mac: MacAddr, src_ip: Ipv6Addr) -> Vec<u8> {
    let body = Icmpv6Body::EchoReply(Echo {
        identifier: ping6::ROUTER_ID,
        sequence: ping6::SEQUENCE,
        payload: ping6::echo_payload(),
    });
    frame(src_mac, LOCAL_MAC, src_ip, ip6("fe80::1"), 64, body)
}

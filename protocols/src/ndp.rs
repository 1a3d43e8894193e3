//! Neighbor Discovery helpers: link-layer options and solicited-node groups.

use std::net::Ipv6Addr;

use pnet::datalink::MacAddr;

pub const SOURCE_LINK_LAYER_OPTION: u8 = 1;
pub const TARGET_LINK_LAYER_OPTION: u8 = 2;

pub const ALL_NODES: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1);
pub const ALL_ROUTERS: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 2);

/// NDP requires 255 so receivers can tell the packet never crossed a router.
pub const NDP_HOP_LIMIT: u8 = 255;

/// An 8 byte source/target link-layer address option.
pub fn link_layer_option(kind: u8, mac: MacAddr) -> [u8; 8] {
    [kind, 1, mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]
}

/// Walks an NDP option list looking for a link-layer address option of `kind`.
pub fn find_link_layer_option(mut options: &[u8], kind: u8) -> Option<MacAddr> {
    while options.len() >= 2 {
        let len = options[1] as usize * 8;
        if len == 0 || len > options.len() {
            return None;
        }
        if options[0] == kind && len >= 8 {
            let o = &options[2..8];
            return Some(MacAddr::new(o[0], o[1], o[2], o[3], o[4], o[5]));
        }
        options = &options[len..];
    }
    None
}

/// `ff02::1:ffXX:XXXX` built from the low 24 bits of `target`.
pub fn solicited_node_address(target: &Ipv6Addr) -> Ipv6Addr {
    let o = target.octets();
    Ipv6Addr::from([
        0xff, 0x02, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0xff, o[13], o[14], o[15],
    ])
}

/// Ethernet group address of an IPv6 multicast group: `33:33` plus the low 32 bits.
pub fn multicast_mac(group: &Ipv6Addr) -> MacAddr {
    let o = group.octets();
    MacAddr::new(0x33, 0x33, o[12], o[13], o[14], o[15])
}

/// `33:33:ff:XX:XX:XX` for the solicited-node group of `target`.
pub fn solicited_node_mac(target: &Ipv6Addr) -> MacAddr {
    multicast_mac(&solicited_node_address(target))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

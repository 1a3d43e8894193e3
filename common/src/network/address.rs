//! # IPv6 address classification
//!
//! Maps an address to exactly one [`AddressScope`]. The order of the checks in
//! [`classify`] matters: the first matching rule wins, so an address inside a
//! well-known prefix is only tagged with that prefix if none of the earlier
//! (link-local, site-local, multicast...) rules claimed it first.
//!
//! Teredo and 6to4 addresses embed IPv4 information which can be pulled back
//! out with [`TeredoInfo::decode`] and [`SixToFourInfo::decode`].

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressScope {
    Local,
    LinkLocal,
    SiteLocal,
    Ipv4Compatible,
    GlobalMulticast,
    OrgLocalMulticast,
    SiteLocalMulticast,
    LinkLocalMulticast,
    InterfaceLocalMulticast,
    UnknownMulticast,
    Global6to4,
    GlobalTeredo,
    Ula,
    Ipv4Mapped,
    Ipv4Ipv6Translation,
    Documentation,
    Global,
}

impl AddressScope {
    pub const ALL: [AddressScope; 17] = [
        AddressScope::Local,
        AddressScope::LinkLocal,
        AddressScope::SiteLocal,
        AddressScope::Ipv4Compatible,
        AddressScope::GlobalMulticast,
        AddressScope::OrgLocalMulticast,
        AddressScope::SiteLocalMulticast,
        AddressScope::LinkLocalMulticast,
        AddressScope::InterfaceLocalMulticast,
        AddressScope::UnknownMulticast,
        AddressScope::Global6to4,
        AddressScope::GlobalTeredo,
        AddressScope::Ula,
        AddressScope::Ipv4Mapped,
        AddressScope::Ipv4Ipv6Translation,
        AddressScope::Documentation,
        AddressScope::Global,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AddressScope::Local => "Local",
            AddressScope::LinkLocal => "Link-Local",
            AddressScope::SiteLocal => "Site-Local",
            AddressScope::Ipv4Compatible => "IPv4 Compatible",
            AddressScope::GlobalMulticast => "Global Multicast",
            AddressScope::OrgLocalMulticast => "Organization-Local Multicast",
            AddressScope::SiteLocalMulticast => "Site-Local Multicast",
            AddressScope::LinkLocalMulticast => "Link-Local Multicast",
            AddressScope::InterfaceLocalMulticast => "Interface-Local Multicast",
            AddressScope::UnknownMulticast => "Unknown Multicast",
            AddressScope::Global6to4 => "Global 6to4",
            AddressScope::GlobalTeredo => "Global Teredo",
            AddressScope::Ula => "ULA",
            AddressScope::Ipv4Mapped => "IPv4 Mapped",
            AddressScope::Ipv4Ipv6Translation => "IPv4-IPv6 Translation",
            AddressScope::Documentation => "Documentation",
            AddressScope::Global => "Global",
        }
    }

    pub fn is_multicast(self) -> bool {
        matches!(
            self,
            AddressScope::GlobalMulticast
                | AddressScope::OrgLocalMulticast
                | AddressScope::SiteLocalMulticast
                | AddressScope::LinkLocalMulticast
                | AddressScope::InterfaceLocalMulticast
                | AddressScope::UnknownMulticast
        )
    }
}

impl fmt::Display for AddressScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const LINK_LOCAL: (u128, u32) = (0xfe80 << 112, 10);
const SITE_LOCAL: (u128, u32) = (0xfec0 << 112, 10);

/// Fixed prefixes tested after the scoped and multicast rules, in order.
const WELL_KNOWN_PREFIXES: [(u128, u32, AddressScope); 6] = [
    (0x2002 << 112, 16, AddressScope::Global6to4),
    (0x2001_0000 << 96, 32, AddressScope::GlobalTeredo),
    (0xfc << 120, 7, AddressScope::Ula),
    (0xffff << 32, 96, AddressScope::Ipv4Mapped),
    (0x0064_ff9b << 96, 96, AddressScope::Ipv4Ipv6Translation),
    (0x2001_0db8 << 96, 32, AddressScope::Documentation),
];

fn in_prefix(bits: u128, (network, len): (u128, u32)) -> bool {
    let mask = if len == 0 { 0 } else { u128::MAX << (128 - len) };
    bits & mask == network & mask
}

/// Classifies an IPv6 address. Total over all 128-bit values.
pub fn classify(addr: &Ipv6Addr) -> AddressScope {
    let bits = u128::from(*addr);

    if addr.is_unspecified() || addr.is_loopback() {
        return AddressScope::Local;
    }
    if in_prefix(bits, LINK_LOCAL) {
        return AddressScope::LinkLocal;
    }
    if in_prefix(bits, SITE_LOCAL) {
        return AddressScope::SiteLocal;
    }
    if bits >> 32 == 0 {
        return AddressScope::Ipv4Compatible;
    }
    if addr.is_multicast() {
        return match addr.octets()[1] & 0x0f {
            0x0e => AddressScope::GlobalMulticast,
            0x08 => AddressScope::OrgLocalMulticast,
            0x05 => AddressScope::SiteLocalMulticast,
            0x02 => AddressScope::LinkLocalMulticast,
            0x01 => AddressScope::InterfaceLocalMulticast,
            _ => AddressScope::UnknownMulticast,
        };
    }

    WELL_KNOWN_PREFIXES
        .iter()
        .find(|(network, len, _)| in_prefix(bits, (*network, *len)))
        .map(|(_, _, scope)| *scope)
        .unwrap_or(AddressScope::Global)
}

/// Fields embedded in a Teredo (2001:0::/32) address.
///
/// The port and client address are stored bit-inverted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeredoInfo {
    pub server: Ipv4Addr,
    pub flags: u16,
    pub port: u16,
    pub client: Ipv4Addr,
}

impl TeredoInfo {
    pub fn decode(addr: &Ipv6Addr) -> Option<Self> {
        if classify(addr) != AddressScope::GlobalTeredo {
            return None;
        }
        let o = addr.octets();
        Some(Self {
            server: Ipv4Addr::new(o[4], o[5], o[6], o[7]),
            flags: u16::from_be_bytes([o[8], o[9]]),
            port: !u16::from_be_bytes([o[10], o[11]]),
            client: Ipv4Addr::new(!o[12], !o[13], !o[14], !o[15]),
        })
    }

    pub fn encode(&self) -> Ipv6Addr {
        let mut o = [0u8; 16];
        o[0] = 0x20;
        o[1] = 0x01;
        o[4..8].copy_from_slice(&self.server.octets());
        o[8..10].copy_from_slice(&self.flags.to_be_bytes());
        o[10..12].copy_from_slice(&(!self.port).to_be_bytes());
        for (dst, src) in o[12..16].iter_mut().zip(self.client.octets()) {
            *dst = !src;
        }
        Ipv6Addr::from(o)
    }

    /// Cone NAT flag (high bit of the flags word).
    pub fn is_cone(&self) -> bool {
        self.flags & 0x8000 != 0
    }
}

/// The IPv4 address embedded in a 6to4 (2002::/16) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SixToFourInfo {
    pub client: Ipv4Addr,
}

impl SixToFourInfo {
    pub fn decode(addr: &Ipv6Addr) -> Option<Self> {
        if classify(addr) != AddressScope::Global6to4 {
            return None;
        }
        let o = addr.octets();
        Some(Self {
            client: Ipv4Addr::new(o[2], o[3], o[4], o[5]),
        })
    }
}

/// Link-local: 169.254/16 for IPv4, fe80::/10 for IPv6.
pub fn is_link_local(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => in_prefix(u128::from(*v6), LINK_LOCAL),
    }
}

/// Site-local: the RFC 1918 ranges for IPv4, the deprecated fec0::/10 for IPv6.
pub fn is_site_local(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.is_private(),
        IpAddr::V6(v6) => in_prefix(u128::from(*v6), SITE_LOCAL),
    }
}

/// Upper 64 bits of an address.
pub fn network_prefix(addr: &Ipv6Addr) -> u64 {
    (u128::from(*addr) >> 64) as u64
}

/// Lower 64 bits of an address.
pub fn interface_identifier(addr: &Ipv6Addr) -> u64 {
    u128::from(*addr) as u64
}

/// Builds `prefix::iid` from a /64 prefix and an interface identifier.
pub fn with_prefix(prefix: u64, iid: u64) -> Ipv6Addr {
    Ipv6Addr::from(((prefix as u128) << 64) | iid as u128)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn scope_of(s: &str) -> AddressScope {
        classify(&s.parse().unwrap())
    }

    #[test]
    fn classify_should_tag_local_and_scoped_unicast() {
        assert_eq!(scope_of("::"), AddressScope::Local);
        assert_eq!(scope_of("::1"), AddressScope::Local);
        assert_eq!(scope_of("fe80::1"), AddressScope::LinkLocal);
        assert_eq!(scope_of("febf:ffff::1"), AddressScope::LinkLocal);
        assert_eq!(scope_of("fec0::1"), AddressScope::SiteLocal);
        assert_eq!(scope_of("::192.168.1.1"), AddressScope::Ipv4Compatible);
    }

    #[test]
    fn classify_should_use_multicast_scope_nibble() {
        assert_eq!(scope_of("ff0e::1"), AddressScope::GlobalMulticast);
        assert_eq!(scope_of("ff08::1"), AddressScope::OrgLocalMulticast);
        assert_eq!(scope_of("ff05::1:3"), AddressScope::SiteLocalMulticast);
        assert_eq!(scope_of("ff02::1"), AddressScope::LinkLocalMulticast);
        assert_eq!(scope_of("ff12::fb"), AddressScope::LinkLocalMulticast);
        assert_eq!(scope_of("ff01::1"), AddressScope::InterfaceLocalMulticast);
        assert_eq!(scope_of("ff03::1"), AddressScope::UnknownMulticast);
        assert!(scope_of("ff02::2").is_multicast());
    }

    #[test]
    fn classify_should_match_well_known_prefixes() {
        assert_eq!(scope_of("2002:0101:0101::"), AddressScope::Global6to4);
        assert_eq!(
            scope_of("2001:0000:4136:e378:8000:63bf:3fff:fdd2"),
            AddressScope::GlobalTeredo
        );
        assert_eq!(scope_of("fd12:3456:789a::1"), AddressScope::Ula);
        assert_eq!(scope_of("fc00::1"), AddressScope::Ula);
        assert_eq!(scope_of("::ffff:10.0.0.1"), AddressScope::Ipv4Mapped);
        assert_eq!(scope_of("64:ff9b::c000:221"), AddressScope::Ipv4Ipv6Translation);
        assert_eq!(scope_of("2001:db8::1"), AddressScope::Documentation);
        assert_eq!(scope_of("2a00:1450:4001:80b::200e"), AddressScope::Global);
        assert_eq!(scope_of("2001:4860::8888"), AddressScope::Global);
    }

    #[test]
    fn classify_should_prefer_scoped_rules_over_prefix_table() {
        // The IPv4-compatible rule runs before the IPv4-mapped prefix.
        assert_eq!(scope_of("::0.0.0.2"), AddressScope::Ipv4Compatible);
        assert_eq!(scope_of("::ffff:0.0.0.2"), AddressScope::Ipv4Mapped);
    }

    #[test]
    fn classify_should_produce_exactly_one_scope_for_sampled_space() {
        let mut seen = std::collections::HashSet::new();
        let mut value: u128 = 0x0123_4567_89ab_cdef_0f1e_2d3c_4b5a_6978;
        for _ in 0..10_000 {
            value = value.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let scope = classify(&Ipv6Addr::from(value));
            assert!(AddressScope::ALL.contains(&scope));
            seen.insert(scope);
        }
        assert!(seen.contains(&AddressScope::Global));
    }

    #[test]
    fn six_to_four_should_decode_embedded_client() {
        let info = SixToFourInfo::decode(&"2002:0101:0101::".parse().unwrap()).unwrap();
        assert_eq!(info.client, Ipv4Addr::new(1, 1, 1, 1));
        assert!(SixToFourInfo::decode(&"2001:db8::1".parse().unwrap()).is_none());
    }

    #[test]
    fn teredo_should_decode_inverted_fields() {
        let addr: Ipv6Addr = "2001:0000:4136:e378:8000:63bf:3fff:fdd2".parse().unwrap();
        let info = TeredoInfo::decode(&addr).unwrap();
        assert_eq!(info.server, Ipv4Addr::new(65, 54, 227, 120));
        assert_eq!(info.flags, 0x8000);
        assert!(info.is_cone());
        assert_eq!(info.port, 40000);
        assert_eq!(info.client, Ipv4Addr::new(192, 0, 2, 45));
    }

    #[test]
    fn teredo_encode_then_decode_should_reproduce_fields() {
        let info = TeredoInfo {
            server: Ipv4Addr::new(94, 245, 121, 253),
            flags: 0,
            port: 51413,
            client: Ipv4Addr::new(203, 0, 113, 7),
        };
        let addr = info.encode();
        assert_eq!(classify(&addr), AddressScope::GlobalTeredo);
        assert_eq!(TeredoInfo::decode(&addr), Some(info));
    }

    #[test]
    fn teredo_decode_should_reject_other_scopes() {
        assert!(TeredoInfo::decode(&"2001:db8::1".parse().unwrap()).is_none());
    }

    #[test]
    fn locality_helpers_should_follow_both_families() {
        assert!(is_link_local(&"169.254.10.1".parse().unwrap()));
        assert!(is_link_local(&"fe80::1".parse().unwrap()));
        assert!(!is_link_local(&"10.0.0.1".parse().unwrap()));
        assert!(is_site_local(&"172.16.4.4".parse().unwrap()));
        assert!(is_site_local(&"192.168.0.1".parse().unwrap()));
        assert!(is_site_local(&"fec0::5".parse().unwrap()));
        assert!(!is_site_local(&"fd00::5".parse().unwrap()));
    }

    #[test]
    fn prefix_helpers_should_split_and_join() {
        let addr: Ipv6Addr = "2001:db8:1:2:aabb:ccff:fedd:eeff".parse().unwrap();
        let link_local: Ipv6Addr = "fe80::1122:33ff:fe44:5566".parse().unwrap();
        let global = with_prefix(network_prefix(&addr), interface_identifier(&link_local));
        assert_eq!(global, "2001:db8:1:2:1122:33ff:fe44:5566".parse::<Ipv6Addr>().unwrap());
    }
}

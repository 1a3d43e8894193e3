//! ICMPv6 messages used for discovery: Echo, Router and Neighbor Discovery.
//!
//! Every message is parsed into an immutable value and encoded back into a
//! fresh buffer with a zero checksum; [`crate::builder`] fills the checksum in
//! once the IPv6 addresses are known.

use std::net::Ipv6Addr;

use pnet::datalink::MacAddr;

use crate::ndp::{self, SOURCE_LINK_LAYER_OPTION, TARGET_LINK_LAYER_OPTION};

pub const ECHO_REQUEST: u8 = 128;
pub const ECHO_REPLY: u8 = 129;
pub const ROUTER_SOLICITATION: u8 = 133;
pub const ROUTER_ADVERTISEMENT: u8 = 134;
pub const NEIGHBOR_SOLICITATION: u8 = 135;
pub const NEIGHBOR_ADVERTISEMENT: u8 = 136;

const ICMPV6_HDR_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icmpv6Header {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
}

impl Icmpv6Header {
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let head = bytes.get(..ICMPV6_HDR_LEN)?;
        Some(Self {
            icmp_type: head[0],
            code: head[1],
            checksum: u16::from_be_bytes([head[2], head[3]]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Echo {
    pub identifier: u16,
    pub sequence: u16,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSolicitation {
    pub reserved: u32,
    pub source_link_layer: Option<MacAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterAdvertisement {
    pub hop_limit: u8,
    pub flags: u8,
    pub lifetime: u16,
    pub reachable_time: u32,
    pub retrans_timer: u32,
    pub source_link_layer: Option<MacAddr>,
}

impl RouterAdvertisement {
    pub const MANAGED: u8 = 0x80;
    pub const OTHER: u8 = 0x40;

    pub fn is_managed(&self) -> bool {
        self.flags & Self::MANAGED != 0
    }

    pub fn is_other_config(&self) -> bool {
        self.flags & Self::OTHER != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborSolicitation {
    pub reserved: u32,
    pub target: Ipv6Addr,
    pub source_link_layer: Option<MacAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborAdvertisement {
    pub flags: u32,
    pub target: Ipv6Addr,
    pub target_link_layer: Option<MacAddr>,
}

impl NeighborAdvertisement {
    pub const ROUTER: u32 = 0x8000_0000;
    pub const SOLICITED: u32 = 0x4000_0000;
    pub const OVERRIDE: u32 = 0x2000_0000;

    pub fn is_router(&self) -> bool {
        self.flags & Self::ROUTER != 0
    }

    pub fn is_solicited(&self) -> bool {
        self.flags & Self::SOLICITED != 0
    }

    pub fn is_override(&self) -> bool {
        self.flags & Self::OVERRIDE != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icmpv6Body {
    EchoRequest(Echo),
    EchoReply(Echo),
    RouterSolicitation(RouterSolicitation),
    RouterAdvertisement(RouterAdvertisement),
    NeighborSolicitation(NeighborSolicitation),
    NeighborAdvertisement(NeighborAdvertisement),
    /// Any other type, kept as raw bytes after the common header.
    Other { icmp_type: u8, code: u8, body: Vec<u8> },
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn ipv6_at(bytes: &[u8], at: usize) -> Option<Ipv6Addr> {
    let octets: [u8; 16] = bytes.get(at..at + 16)?.try_into().ok()?;
    Some(Ipv6Addr::from(octets))
}

impl Icmpv6Body {
    pub fn icmp_type(&self) -> u8 {
        match self {
            Icmpv6Body::EchoRequest(_) => ECHO_REQUEST,
            Icmpv6Body::EchoReply(_) => ECHO_REPLY,
            Icmpv6Body::RouterSolicitation(_) => ROUTER_SOLICITATION,
            Icmpv6Body::RouterAdvertisement(_) => ROUTER_ADVERTISEMENT,
            Icmpv6Body::NeighborSolicitation(_) => NEIGHBOR_SOLICITATION,
            Icmpv6Body::NeighborAdvertisement(_) => NEIGHBOR_ADVERTISEMENT,
            Icmpv6Body::Other { icmp_type, .. } => *icmp_type,
        }
    }

    fn code(&self) -> u8 {
        match self {
            Icmpv6Body::Other { code, .. } => *code,
            _ => 0,
        }
    }

    /// Decodes the part of the message following the common header.
    ///
    /// `None` when the type is known but the message is too short for it.
    fn parse(header: &Icmpv6Header, bytes: &[u8]) -> Option<Self> {
        let rest = &bytes[ICMPV6_HDR_LEN..];
        let body = match header.icmp_type {
            ECHO_REQUEST | ECHO_REPLY => {
                let echo = Echo {
                    identifier: be_u16(rest, 0)?,
                    sequence: be_u16(rest, 2)?,
                    payload: rest[4..].to_vec(),
                };
                if header.icmp_type == ECHO_REQUEST {
                    Icmpv6Body::EchoRequest(echo)
                } else {
                    Icmpv6Body::EchoReply(echo)
                }
            }
            ROUTER_SOLICITATION => Icmpv6Body::RouterSolicitation(RouterSolicitation {
                reserved: be_u32(rest, 0)?,
                source_link_layer: ndp::find_link_layer_option(&rest[4..], SOURCE_LINK_LAYER_OPTION),
            }),
            ROUTER_ADVERTISEMENT => {
                let fixed = rest.get(..12)?;
                Icmpv6Body::RouterAdvertisement(RouterAdvertisement {
                    hop_limit: fixed[0],
                    flags: fixed[1],
                    lifetime: be_u16(fixed, 2)?,
                    reachable_time: be_u32(fixed, 4)?,
                    retrans_timer: be_u32(fixed, 8)?,
                    source_link_layer: ndp::find_link_layer_option(&rest[12..], SOURCE_LINK_LAYER_OPTION),
                })
            }
            NEIGHBOR_SOLICITATION => Icmpv6Body::NeighborSolicitation(NeighborSolicitation {
                reserved: be_u32(rest, 0)?,
                target: ipv6_at(rest, 4)?,
                source_link_layer: ndp::find_link_layer_option(&rest[20..], SOURCE_LINK_LAYER_OPTION),
            }),
            NEIGHBOR_ADVERTISEMENT => Icmpv6Body::NeighborAdvertisement(NeighborAdvertisement {
                flags: be_u32(rest, 0)?,
                target: ipv6_at(rest, 4)?,
                target_link_layer: ndp::find_link_layer_option(&rest[20..], TARGET_LINK_LAYER_OPTION),
            }),
            other => Icmpv6Body::Other {
                icmp_type: other,
                code: header.code,
                body: rest.to_vec(),
            },
        };
        Some(body)
    }

    /// Full ICMPv6 message with the checksum field left at zero.
    pub fn encode(&self) -> Vec<u8> {
        let mut out: Vec<u8> = vec![self.icmp_type(), self.code(), 0, 0];
        match self {
            Icmpv6Body::EchoRequest(echo) | Icmpv6Body::EchoReply(echo) => {
                out.extend_from_slice(&echo.identifier.to_be_bytes());
                out.extend_from_slice(&echo.sequence.to_be_bytes());
                out.extend_from_slice(&echo.payload);
            }
            Icmpv6Body::RouterSolicitation(rs) => {
                out.extend_from_slice(&rs.reserved.to_be_bytes());
                if let Some(mac) = rs.source_link_layer {
                    out.extend_from_slice(&ndp::link_layer_option(SOURCE_LINK_LAYER_OPTION, mac));
                }
            }
            Icmpv6Body::RouterAdvertisement(ra) => {
                out.push(ra.hop_limit);
                out.push(ra.flags);
                out.extend_from_slice(&ra.lifetime.to_be_bytes());
                out.extend_from_slice(&ra.reachable_time.to_be_bytes());
                out.extend_from_slice(&ra.retrans_timer.to_be_bytes());
                if let Some(mac) = ra.source_link_layer {
                    out.extend_from_slice(&ndp::link_layer_option(SOURCE_LINK_LAYER_OPTION, mac));
                }
            }
            Icmpv6Body::NeighborSolicitation(ns) => {
                out.extend_from_slice(&ns.reserved.to_be_bytes());
                out.extend_from_slice(&ns.target.octets());
                if let Some(mac) = ns.source_link_layer {
                    out.extend_from_slice(&ndp::link_layer_option(SOURCE_LINK_LAYER_OPTION, mac));
                }
            }
            Icmpv6Body::NeighborAdvertisement(na) => {
                out.extend_from_slice(&na.flags.to_be_bytes());
                out.extend_from_slice(&na.target.octets());
                if let Some(mac) = na.target_link_layer {
                    out.extend_from_slice(&ndp::link_layer_option(TARGET_LINK_LAYER_OPTION, mac));
                }
            }
            Icmpv6Body::Other { body, .. } => out.extend_from_slice(body),
        }
        out
    }
}

/// A decoded ICMPv6 message: common header plus typed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icmpv6Message {
    pub header: Icmpv6Header,
    pub body: Icmpv6Body,
}

impl Icmpv6Message {
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header = Icmpv6Header::parse(bytes)?;
        let body = Icmpv6Body::parse(&header, bytes)?;
        Some(Self { header, body })
    }

    pub fn echo_reply(&self) -> Option<&Echo> {
        match &self.body {
            Icmpv6Body::EchoReply(echo) => Some(echo),
            _ => None,
        }
    }

    pub fn router_advertisement(&self) -> Option<&RouterAdvertisement> {
        match &self.body {
            Icmpv6Body::RouterAdvertisement(ra) => Some(ra),
            _ => None,
        }
    }

    pub fn neighbor_advertisement(&self) -> Option<&NeighborAdvertisement> {
        match &self.body {
            Icmpv6Body::NeighborAdvertisement(na) => Some(na),
            _ => None,
        }
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

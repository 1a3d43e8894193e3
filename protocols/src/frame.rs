//! Owned, parse-once view of a captured Ethernet frame.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use pnet::datalink::MacAddr;
use pnet::packet::Packet;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;

use crate::icmpv6::Icmpv6Message;

pub const ETH_HDR_LEN: usize = 14;
pub const IP_V4_HDR_LEN: usize = 20;
pub const IP_V6_HDR_LEN: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub source: MacAddr,
    pub destination: MacAddr,
    pub ethertype: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub protocol: u8,
    pub ttl: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Header {
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
    pub next_header: u8,
    pub hop_limit: u8,
    pub payload_length: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkHeader {
    V4(Ipv4Header),
    V6(Ipv6Header),
}

impl NetworkHeader {
    pub fn source(&self) -> IpAddr {
        match self {
            NetworkHeader::V4(h) => IpAddr::V4(h.source),
            NetworkHeader::V6(h) => IpAddr::V6(h.source),
        }
    }

    pub fn destination(&self) -> IpAddr {
        match self {
            NetworkHeader::V4(h) => IpAddr::V4(h.destination),
            NetworkHeader::V6(h) => IpAddr::V6(h.destination),
        }
    }
}

/// An Ethernet frame carrying IPv4 or IPv6, with the ICMPv6 message decoded
/// when there is one.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    ethernet: EthernetHeader,
    network: NetworkHeader,
    icmpv6: Option<Icmpv6Message>,
}

impl Frame {
    /// Returns `None` for anything that is not Ethernet + IPv4/IPv6.
    pub fn parse(data: Vec<u8>) -> Option<Self> {
        let eth = EthernetPacket::new(&data)?;
        let ethernet = EthernetHeader {
            source: eth.get_source(),
            destination: eth.get_destination(),
            ethertype: eth.get_ethertype().0,
        };

        let (network, icmpv6) = match eth.get_ethertype() {
            EtherTypes::Ipv4 => {
                let ip = Ipv4Packet::new(eth.payload())?;
                let header = Ipv4Header {
                    source: ip.get_source(),
                    destination: ip.get_destination(),
                    protocol: ip.get_next_level_protocol().0,
                    ttl: ip.get_ttl(),
                };
                (NetworkHeader::V4(header), None)
            }
            EtherTypes::Ipv6 => {
                let ip = Ipv6Packet::new(eth.payload())?;
                let header = Ipv6Header {
                    source: ip.get_source(),
                    destination: ip.get_destination(),
                    next_header: ip.get_next_header().0,
                    hop_limit: ip.get_hop_limit(),
                    payload_length: ip.get_payload_length(),
                };
                let icmpv6 = if ip.get_next_header() == IpNextHeaderProtocols::Icmpv6 {
                    Icmpv6Message::parse(ip.payload())
                } else {
                    None
                };
                (NetworkHeader::V6(header), icmpv6)
            }
            _ => return None,
        };

        Some(Self {
            data,
            ethernet,
            network,
            icmpv6,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn ethernet(&self) -> &EthernetHeader {
        &self.ethernet
    }

    pub fn network(&self) -> &NetworkHeader {
        &self.network
    }

    pub fn ipv4(&self) -> Option<&Ipv4Header> {
        match &self.network {
            NetworkHeader::V4(h) => Some(h),
            NetworkHeader::V6(_) => None,
        }
    }

    pub fn ipv6(&self) -> Option<&Ipv6Header> {
        match &self.network {
            NetworkHeader::V6(h) => Some(h),
            NetworkHeader::V4(_) => None,
        }
    }

    pub fn icmpv6(&self) -> Option<&Icmpv6Message> {
        self.icmpv6.as_ref()
    }

    pub fn source_ip(&self) -> IpAddr {
        self.network.source()
    }

    pub fn destination_ip(&self) -> IpAddr {
        self.network.destination()
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

//! Writers for outbound frames. Each call produces a fresh buffer.

use std::net::Ipv6Addr;

use pnet::datalink::MacAddr;
use pnet::packet::ethernet::{EtherType, EtherTypes, MutableEthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv6::MutableIpv6Packet;

use crate::checksum::icmpv6_checksum;
use crate::error::CodecError;
use crate::frame::{ETH_HDR_LEN, IP_V6_HDR_LEN};
use crate::icmpv6::Icmpv6Body;

/// Link and network addressing of an outbound IPv6 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAddressing {
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ip: Ipv6Addr,
    pub dst_ip: Ipv6Addr,
    pub hop_limit: u8,
}

pub fn make_ethernet_header(
    buffer: &mut [u8],
    src_mac: MacAddr,
    dst_mac: MacAddr,
    ethertype: EtherType,
) -> Result<(), CodecError> {
    let available = buffer.len();
    let mut eth = MutableEthernetPacket::new(buffer).ok_or(CodecError::BufferTooSmall {
        what: "ethernet header",
        needed: ETH_HDR_LEN,
        available,
    })?;
    eth.set_source(src_mac);
    eth.set_destination(dst_mac);
    eth.set_ethertype(ethertype);
    Ok(())
}

/// Serializes `body` behind Ethernet and IPv6 headers with a valid ICMPv6 checksum.
pub fn icmpv6_frame(addressing: &FrameAddressing, body: &Icmpv6Body) -> Result<Vec<u8>, CodecError> {
    let mut message = body.encode();
    let csm = icmpv6_checksum(&addressing.src_ip, &addressing.dst_ip, &message);
    message[2..4].copy_from_slice(&csm.to_be_bytes());

    let mut buffer = vec![0u8; ETH_HDR_LEN + IP_V6_HDR_LEN + message.len()];
    make_ethernet_header(&mut buffer, addressing.src_mac, addressing.dst_mac, EtherTypes::Ipv6)?;

    let available = buffer.len() - ETH_HDR_LEN;
    let mut ip = MutableIpv6Packet::new(&mut buffer[ETH_HDR_LEN..]).ok_or(CodecError::BufferTooSmall {
        what: "ipv6 header",
        needed: IP_V6_HDR_LEN,
        available,
    })?;
    ip.set_version(6);
    ip.set_traffic_class(0);
    ip.set_flow_label(0);
    ip.set_payload_length(message.len() as u16);
    ip.set_next_header(IpNextHeaderProtocols::Icmpv6);
    ip.set_hop_limit(addressing.hop_limit);
    ip.set_source(addressing.src_ip);
    ip.set_destination(addressing.dst_ip);
    ip.set_payload(&message);

    Ok(buffer)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

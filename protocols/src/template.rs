//! # Packet template store
//!
//! Static probes start from reference packets stored as single-packet capture
//! files, one directory per protocol family below a common root:
//!
//! ```text
//! pcap/icmp/v4/*.pcap
//! pcap/icmp/v6/*.pcap
//! pcap/udp/v4/*.pcap
//! pcap/udp/v6/*.pcap
//! ```
//!
//! Only the first packet of each file is used. The rewrite helpers replace the
//! link and network addresses of a template and fix every checksum that covers them.

use std::fs;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

use pnet::datalink::MacAddr;
use pnet::packet::Packet;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::{self, Ipv4Packet, MutableIpv4Packet};
use pnet::packet::ipv6::{Ipv6Packet, MutableIpv6Packet};
use tracing::{debug, warn};

use crate::checksum::{ICMPV6_NEXT_HEADER, UDP_NEXT_HEADER, icmpv6_checksum, internet_checksum, udp6_checksum};
use crate::error::CodecError;
use crate::frame::{ETH_HDR_LEN, IP_V6_HDR_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFamily {
    IcmpV4,
    IcmpV6,
    UdpV4,
    UdpV6,
}

impl TemplateFamily {
    pub fn relative_dir(self) -> &'static str {
        match self {
            TemplateFamily::IcmpV4 => "icmp/v4",
            TemplateFamily::IcmpV6 => "icmp/v6",
            TemplateFamily::UdpV4 => "udp/v4",
            TemplateFamily::UdpV6 => "udp/v6",
        }
    }

    pub fn is_ipv6(self) -> bool {
        matches!(self, TemplateFamily::IcmpV6 | TemplateFamily::UdpV6)
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

/// First packet of a capture file.
pub fn read_first_packet(path: &Path) -> Result<Vec<u8>, CodecError> {
    let unreadable = |e: pcap::Error| CodecError::TemplateUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut capture = pcap::Capture::from_file(path).map_err(unreadable)?;
    match capture.next_packet() {
        Ok(packet) => Ok(packet.data.to_vec()),
        Err(pcap::Error::NoMorePackets) => Err(CodecError::TemplateEmpty(path.to_path_buf())),
        Err(e) => Err(unreadable(e)),
    }
}

/// Loads every readable template of `family`, sorted by file name.
///
/// A missing directory yields no templates. Unreadable files are skipped.
pub fn load_family(root: &Path, family: TemplateFamily) -> Vec<Template> {
    let dir = root.join(family.relative_dir());
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), "Template directory unavailable: {e}");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| match read_first_packet(&path) {
            Ok(data) => {
                debug!(template = %path.display(), len = data.len(), "Loaded template");
                Some(Template { path, data })
            }
            Err(e) => {
                warn!("Skipping template: {e}");
                None
            }
        })
        .collect()
}

/// Addressing placed into an IPv6 template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Rewrite {
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ip: Ipv6Addr,
    pub dst_ip: Ipv6Addr,
}

/// Addressing placed into an IPv4 template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Rewrite {
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
}

fn set_ethernet(frame: &mut [u8], src: MacAddr, dst: MacAddr) -> Result<(), CodecError> {
    let mut eth = MutableEthernetPacket::new(frame).ok_or(CodecError::UnexpectedHeaders("ethernet"))?;
    eth.set_source(src);
    eth.set_destination(dst);
    Ok(())
}

/// Copies an ICMPv6 or UDP-over-IPv6 template with new addresses and checksum.
pub fn rewrite_ipv6(template: &[u8], rewrite: &Ipv6Rewrite) -> Result<Vec<u8>, CodecError> {
    let next_header = {
        let eth = EthernetPacket::new(template).ok_or(CodecError::UnexpectedHeaders("ethernet"))?;
        if eth.get_ethertype() != EtherTypes::Ipv6 {
            return Err(CodecError::UnexpectedHeaders("ipv6"));
        }
        let ip = Ipv6Packet::new(eth.payload()).ok_or(CodecError::UnexpectedHeaders("ipv6"))?;
        ip.get_next_header().0
    };
    if next_header != ICMPV6_NEXT_HEADER && next_header != UDP_NEXT_HEADER {
        return Err(CodecError::UnexpectedHeaders("icmpv6 or udp"));
    }

    let mut frame = template.to_vec();
    set_ethernet(&mut frame, rewrite.src_mac, rewrite.dst_mac)?;

    let payload_len = {
        let mut ip = MutableIpv6Packet::new(&mut frame[ETH_HDR_LEN..]).ok_or(CodecError::UnexpectedHeaders("ipv6"))?;
        ip.set_source(rewrite.src_ip);
        ip.set_destination(rewrite.dst_ip);
        ip.get_payload_length() as usize
    };

    let start = ETH_HDR_LEN + IP_V6_HDR_LEN;
    let end = (start + payload_len).min(frame.len());
    let (offset, csm) = {
        let upper = &frame[start..end];
        if next_header == ICMPV6_NEXT_HEADER {
            (2, icmpv6_checksum(&rewrite.src_ip, &rewrite.dst_ip, upper))
        } else {
            (6, udp6_checksum(&rewrite.src_ip, &rewrite.dst_ip, upper))
        }
    };
    let field = frame
        .get_mut(start + offset..start + offset + 2)
        .ok_or(CodecError::UnexpectedHeaders("upper-layer header"))?;
    field.copy_from_slice(&csm.to_be_bytes());

    Ok(frame)
}

/// Copies an ICMP or UDP-over-IPv4 template with new addresses.
///
/// The IPv4 header and ICMP checksums are recomputed; the UDP checksum is zeroed.
pub fn rewrite_ipv4(template: &[u8], rewrite: &Ipv4Rewrite) -> Result<Vec<u8>, CodecError> {
    let (protocol, header_len, total_len) = {
        let eth = EthernetPacket::new(template).ok_or(CodecError::UnexpectedHeaders("ethernet"))?;
        if eth.get_ethertype() != EtherTypes::Ipv4 {
            return Err(CodecError::UnexpectedHeaders("ipv4"));
        }
        let ip = Ipv4Packet::new(eth.payload()).ok_or(CodecError::UnexpectedHeaders("ipv4"))?;
        (
            ip.get_next_level_protocol(),
            ip.get_header_length() as usize * 4,
            ip.get_total_length() as usize,
        )
    };
    if protocol != IpNextHeaderProtocols::Icmp && protocol != IpNextHeaderProtocols::Udp {
        return Err(CodecError::UnexpectedHeaders("icmp or udp"));
    }

    let mut frame = template.to_vec();
    set_ethernet(&mut frame, rewrite.src_mac, rewrite.dst_mac)?;
    {
        let mut ip = MutableIpv4Packet::new(&mut frame[ETH_HDR_LEN..]).ok_or(CodecError::UnexpectedHeaders("ipv4"))?;
        ip.set_source(rewrite.src_ip);
        ip.set_destination(rewrite.dst_ip);
        ip.set_checksum(0);
        let csm = ipv4::checksum(&ip.to_immutable());
        ip.set_checksum(csm);
    }

    let start = ETH_HDR_LEN + header_len;
    let end = (ETH_HDR_LEN + total_len).min(frame.len());
    if start + 8 > end {
        return Err(CodecError::UnexpectedHeaders("upper-layer header"));
    }

    if protocol == IpNextHeaderProtocols::Icmp {
        frame[start + 2..start + 4].fill(0);
        let csm = internet_checksum(&frame[start..end]);
        frame[start + 2..start + 4].copy_from_slice(&csm.to_be_bytes());
    } else {
        frame[start + 6..start + 8].fill(0);
    }

    Ok(frame)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

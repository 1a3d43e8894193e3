//! Internet checksum (RFC 1071) and the IPv6 pseudo-header variants.

use std::net::Ipv6Addr;

pub const ICMPV6_NEXT_HEADER: u8 = 58;
pub const UDP_NEXT_HEADER: u8 = 17;

const ICMPV6_CHECKSUM_OFFSET: usize = 2;
const UDP_CHECKSUM_OFFSET: usize = 6;

/// Adds a 16-bit word, folding a carry out of bit 16 straight back in.
fn add_word(sum: u32, word: u16) -> u32 {
    let sum = sum + word as u32;
    if sum > 0xffff { (sum & 0xffff) + 1 } else { sum }
}

/// One's-complement sum over `data`, complemented.
///
/// An odd trailing byte is treated as the high byte of a zero-padded word.
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum = add_word(sum, u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    if let Some(&byte) = chunks.remainder().first() {
        sum = add_word(sum, (byte as u16) << 8);
    }

    !(sum as u16)
}

/// Source, destination, 32-bit upper-layer length and 32-bit next header.
pub fn ipv6_pseudo_header(src: &Ipv6Addr, dst: &Ipv6Addr, next_header: u8, length: u32) -> [u8; 40] {
    let mut header = [0u8; 40];
    header[0..16].copy_from_slice(&src.octets());
    header[16..32].copy_from_slice(&dst.octets());
    header[32..36].copy_from_slice(&length.to_be_bytes());
    header[36..40].copy_from_slice(&(next_header as u32).to_be_bytes());
    header
}

/// Checksum of an upper-layer message behind an IPv6 header.
///
/// The checksum field at `checksum_offset` is treated as zero whatever it holds.
pub fn ipv6_upper_layer_checksum(
    src: &Ipv6Addr,
    dst: &Ipv6Addr,
    next_header: u8,
    data: &[u8],
    checksum_offset: usize,
) -> u16 {
    let mut buffer: Vec<u8> = Vec::with_capacity(40 + data.len());
    buffer.extend_from_slice(&ipv6_pseudo_header(src, dst, next_header, data.len() as u32));
    buffer.extend_from_slice(data);

    let field = 40 + checksum_offset;
    if let Some(bytes) = buffer.get_mut(field..field + 2) {
        bytes.fill(0);
    }
    internet_checksum(&buffer)
}

pub fn icmpv6_checksum(src: &Ipv6Addr, dst: &Ipv6Addr, message: &[u8]) -> u16 {
    ipv6_upper_layer_checksum(src, dst, ICMPV6_NEXT_HEADER, message, ICMPV6_CHECKSUM_OFFSET)
}

/// UDP over IPv6. A computed zero is sent as `0xffff`, zero being illegal there.
pub fn udp6_checksum(src: &Ipv6Addr, dst: &Ipv6Addr, datagram: &[u8]) -> u16 {
    match ipv6_upper_layer_checksum(src, dst, UDP_NEXT_HEADER, datagram, UDP_CHECKSUM_OFFSET) {
        0 => 0xffff,
        sum => sum,
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

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::packet::icmpv6::{self, Icmpv6Packet};

    #[test]
    fn checksum_of_repeated_pairs_should_match_reference() {
        let data: Vec<u8> = [0x00, 0x01].repeat(8);
        // Eight words of 0x0001 sum to 0x0008.
        assert_eq!(internet_checksum(&data), !0x0008u16);
    }

    #[test]
    fn odd_trailing_byte_should_be_high_byte() {
        assert_eq!(internet_checksum(&[0x01]), !0x0100u16);
        assert_eq!(internet_checksum(&[0x00, 0x01, 0x02]), !0x0201u16);
    }

    #[test]
    fn carry_should_fold_back_in() {
        assert_eq!(internet_checksum(&[0xff, 0xff, 0x00, 0x01]), !0x0001u16);
    }

    #[test]
    fn buffer_plus_checksum_should_verify_to_zero() {
        for _ in 0..200 {
            let len = rand::random_range(1..300usize) * 2;
            let mut data: Vec<u8> = (0..len).map(|_| rand::random::<u8>()).collect();
            let sum = internet_checksum(&data);
            data.extend_from_slice(&sum.to_be_bytes());
            let verify = internet_checksum(&data);
            assert!(verify == 0 || verify == 0xffff, "residue {verify:#06x}");
        }
    }

    #[test]
    fn icmpv6_checksum_should_agree_with_pnet() {
        let src: Ipv6Addr = "fe80::1".parse().unwrap();
        let dst: Ipv6Addr = "ff02::2".parse().unwrap();
        let mut message = vec![128u8, 0, 0xab, 0xcd, 0x73, 0x04, 0x00, 0x01];
        message.extend_from_slice(b"0123456789abcdef0123456789abcdef0123456789abcdef01234567");

        let ours = icmpv6_checksum(&src, &dst, &message);
        let packet = Icmpv6Packet::new(&message).unwrap();
        assert_eq!(ours, icmpv6::checksum(&packet, &src, &dst));
    }

    #[test]
    fn icmpv6_checksum_should_ignore_stale_field() {
        let src: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let dst: Ipv6Addr = "2001:db8::2".parse().unwrap();
        let clean = vec![135u8, 0, 0, 0, 0, 0, 0, 0, 0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2];
        let mut stale = clean.clone();
        stale[2] = 0x12;
        stale[3] = 0x34;
        assert_eq!(icmpv6_checksum(&src, &dst, &clean), icmpv6_checksum(&src, &dst, &stale));
    }

    #[test]
    fn pseudo_header_should_place_length_and_next_header() {
        let header = ipv6_pseudo_header(&Ipv6Addr::LOCALHOST, &Ipv6Addr::UNSPECIFIED, 58, 24);
        assert_eq!(&header[32..36], &[0, 0, 0, 24]);
        assert_eq!(&header[36..40], &[0, 0, 0, 58]);
        assert_eq!(header[15], 1);
    }
}

//! SYN packet assembly.
//!
//! Produces the exact 40-byte buffer the send socket expects with
//! IP_HDRINCL: a 20-byte IPv4 header followed by a 20-byte TCP header,
//! no options, no payload. Checksums follow RFC 1071.

use std::net::Ipv4Addr;

/// TCP flag constants
pub mod tcp_flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
}

/// Build a TCP SYN packet with a random IP identification and TCP
/// sequence number.
pub fn build_syn(src: Ipv4Addr, dst: Ipv4Addr, src_port: u16, dst_port: u16) -> [u8; 40] {
    build_syn_with(src, dst, src_port, dst_port, rand::random(), rand::random())
}

/// Build a TCP SYN packet with caller-supplied IP id and sequence
/// number. Every other byte is a pure function of the inputs.
pub fn build_syn_with(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    ip_id: u16,
    seq: u32,
) -> [u8; 40] {
    let mut buf = [0u8; 40];

    // IPv4 header
    buf[0] = 0x45; // version 4, IHL 5
    buf[1] = 0x00; // DSCP/ECN
    buf[2..4].copy_from_slice(&40u16.to_be_bytes()); // total length
    buf[4..6].copy_from_slice(&ip_id.to_be_bytes());
    buf[6..8].copy_from_slice(&0x4000u16.to_be_bytes()); // don't fragment
    buf[8] = 64; // TTL
    buf[9] = 6; // protocol: TCP
    buf[12..16].copy_from_slice(&src.octets());
    buf[16..20].copy_from_slice(&dst.octets());

    let ip_sum = checksum(&buf[0..20]);
    buf[10..12].copy_from_slice(&ip_sum.to_be_bytes());

    // TCP header
    buf[20..22].copy_from_slice(&src_port.to_be_bytes());
    buf[22..24].copy_from_slice(&dst_port.to_be_bytes());
    buf[24..28].copy_from_slice(&seq.to_be_bytes());
    buf[28..32].copy_from_slice(&0u32.to_be_bytes()); // ack
    buf[32] = 0x50; // data offset: 5 words
    buf[33] = tcp_flags::SYN;
    buf[34..36].copy_from_slice(&65535u16.to_be_bytes()); // window
    // checksum at [36..38] computed below, urgent pointer stays zero

    let tcp_sum = tcp_checksum(src, dst, &buf[20..40]);
    buf[36..38].copy_from_slice(&tcp_sum.to_be_bytes());

    buf
}

/// Internet checksum as defined in RFC 1071: one's-complement sum of
/// big-endian half-words, an odd trailing byte padded with a zero low
/// byte, carries folded back in.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut chunks = data.chunks_exact(2);
    for pair in &mut chunks {
        sum += u32::from(u16::from_be_bytes([pair[0], pair[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !(sum as u16)
}

/// TCP checksum over the 12-byte pseudo header (src, dst, zero,
/// protocol, TCP length) followed by the segment.
pub fn tcp_checksum(src: Ipv4Addr, dst: Ipv4Addr, segment: &[u8]) -> u16 {
    let mut pseudo = Vec::with_capacity(12 + segment.len());
    pseudo.extend_from_slice(&src.octets());
    pseudo.extend_from_slice(&dst.octets());
    pseudo.push(0);
    pseudo.push(6);
    pseudo.extend_from_slice(&(segment.len() as u16).to_be_bytes());
    pseudo.extend_from_slice(segment);

    checksum(&pseudo)
}

//! Raw packet I/O for the SYN scanner.
//!
//! Three pieces live here:
//! - [`socket::RawSocket`]: an AF_INET/SOCK_RAW send descriptor with
//!   IP_HDRINCL plus an AF_PACKET receive descriptor with the scan
//!   filter attached,
//! - [`filter`]: the classic-BPF program that keeps everything except
//!   SYN-ACK/RST replies to our ephemeral port range out of userspace,
//! - [`packet`]: the 40-byte IPv4+TCP SYN builder with RFC 1071
//!   checksums.
//!
//! Linux only: the receive path relies on AF_PACKET and
//! SO_ATTACH_FILTER.

pub mod filter;
pub mod packet;
pub mod socket;

pub use filter::EPHEMERAL_PORT_MIN;
pub use packet::{build_syn, build_syn_with, tcp_flags};
pub use socket::{RawSocket, RecvError};

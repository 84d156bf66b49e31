//! Socket seam between the engine and the wire.
//!
//! The sender and receiver talk to the kernel through this trait so
//! the whole scan pipeline can be exercised against an in-memory
//! implementation in tests. [`shrike_rawsock::RawSocket`] is the
//! production implementation.

use shrike_rawsock::{RawSocket, RecvError};
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

pub trait ScanSocket: Send + Sync {
    /// Transmit one complete IPv4 packet to `dst`.
    fn send(&self, dst: Ipv4Addr, packet: &[u8]) -> io::Result<()>;

    /// Read the next frame (Ethernet header already stripped), waiting
    /// at most `timeout`.
    fn recv(&self, timeout: Duration) -> Result<Vec<u8>, RecvError>;
}

impl ScanSocket for RawSocket {
    fn send(&self, dst: Ipv4Addr, packet: &[u8]) -> io::Result<()> {
        RawSocket::send(self, dst, packet)
    }

    fn recv(&self, timeout: Duration) -> Result<Vec<u8>, RecvError> {
        RawSocket::recv(self, timeout)
    }
}

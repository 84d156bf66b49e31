//! The raw socket pair.
//!
//! Sends complete IPv4 packets through AF_INET/SOCK_RAW with
//! IP_HDRINCL and receives link-layer frames through AF_PACKET with
//! the scan filter attached. Both descriptors are owned by one
//! [`RawSocket`] and closed on drop.

use crate::filter::{attach_scan_filter, EPHEMERAL_PORT_MIN};
use shrike_common::ScanError;
use std::io;
use std::mem;
use std::net::Ipv4Addr;
use std::os::fd::RawFd;
use std::time::Duration;
use thiserror::Error;

const ETH_HEADER_LEN: usize = 14;

/// Error from a single receive call. Timeouts are expected and let the
/// receive loop idle; anything else is a genuine I/O failure.
#[derive(Error, Debug)]
pub enum RecvError {
    #[error("receive timed out")]
    Timeout,

    #[error("receive failed: {0}")]
    Os(#[from] io::Error),
}

/// Owns the send and receive descriptors for one scan.
pub struct RawSocket {
    send_fd: RawFd,
    recv_fd: RawFd,
}

impl RawSocket {
    /// Open both descriptors and attach the scan filter.
    ///
    /// A permission failure on either socket is reported as
    /// [`ScanError::PermissionDenied`] so the caller can surface the
    /// sudo/CAP_NET_RAW hint. A failed filter attach is fatal: an
    /// unfiltered AF_PACKET socket would flood userspace on a busy
    /// host.
    pub fn open() -> Result<Self, ScanError> {
        let send_fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_RAW, libc::IPPROTO_TCP) };
        if send_fd < 0 {
            return Err(open_error());
        }

        let one: libc::c_int = 1;
        let rc = unsafe {
            libc::setsockopt(
                send_fd,
                libc::IPPROTO_IP,
                libc::IP_HDRINCL,
                &one as *const libc::c_int as *const libc::c_void,
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(send_fd) };
            return Err(ScanError::Os(err));
        }

        let recv_fd = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                (libc::ETH_P_IP as u16).to_be() as libc::c_int,
            )
        };
        if recv_fd < 0 {
            let err = open_error();
            unsafe { libc::close(send_fd) };
            return Err(err);
        }

        if let Err(err) = attach_scan_filter(recv_fd, EPHEMERAL_PORT_MIN) {
            unsafe {
                libc::close(send_fd);
                libc::close(recv_fd);
            }
            return Err(ScanError::Os(err));
        }

        Ok(Self { send_fd, recv_fd })
    }

    /// Transmit one complete IPv4 packet to `dst`.
    ///
    /// Safe to call from many tasks at once: with IP_HDRINCL each
    /// write is a single packet and the kernel serialises the sends.
    pub fn send(&self, dst: Ipv4Addr, packet: &[u8]) -> io::Result<()> {
        let mut sa: libc::sockaddr_in = unsafe { mem::zeroed() };
        sa.sin_family = libc::AF_INET as libc::sa_family_t;
        sa.sin_addr.s_addr = u32::from_ne_bytes(dst.octets());

        let rc = unsafe {
            libc::sendto(
                self.send_fd,
                packet.as_ptr() as *const libc::c_void,
                packet.len(),
                0,
                &sa as *const libc::sockaddr_in as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Read the next filtered frame, waiting at most `timeout`.
    /// The 14-byte Ethernet header is stripped from the returned bytes.
    pub fn recv(&self, timeout: Duration) -> Result<Vec<u8>, RecvError> {
        let tv = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };
        let rc = unsafe {
            libc::setsockopt(
                self.recv_fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                &tv as *const libc::timeval as *const libc::c_void,
                mem::size_of::<libc::timeval>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(RecvError::Os(io::Error::last_os_error()));
        }

        let mut buf = vec![0u8; 65536];
        let n = unsafe {
            libc::recv(
                self.recv_fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                0,
            )
        };
        if n < 0 {
            let err = io::Error::last_os_error();
            return match err.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Err(RecvError::Timeout),
                _ => Err(RecvError::Os(err)),
            };
        }

        let n = n as usize;
        if n < ETH_HEADER_LEN {
            return Err(RecvError::Os(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame too short: {n} bytes"),
            )));
        }

        buf.truncate(n);
        Ok(buf.split_off(ETH_HEADER_LEN))
    }
}

impl Drop for RawSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.recv_fd);
            libc::close(self.send_fd);
        }
    }
}

fn open_error() -> ScanError {
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EPERM) | Some(libc::EACCES) => ScanError::PermissionDenied,
        _ => ScanError::Os(err),
    }
}

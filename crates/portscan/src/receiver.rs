//! Reply collection: reads filtered frames, correlates them to the
//! probe set, and feeds the tracker.

use crate::socket::ScanSocket;
use crate::tracker::Tracker;
use shrike_common::{PortReport, PortState};
use shrike_rawsock::{tcp_flags, RecvError};
use std::io;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Kernel-side read timeout; bounds how long a stop signal can go
/// unobserved.
pub(crate) const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Reads incoming frames on a dedicated thread and records port states
/// through the tracker.
pub(crate) struct Receiver<S> {
    sock: Arc<S>,
    target: Ipv4Addr,
    src_port: u16,
    tracker: Arc<Tracker>,
    stop: Arc<AtomicBool>,
}

impl<S: ScanSocket + 'static> Receiver<S> {
    pub(crate) fn new(
        sock: Arc<S>,
        target: Ipv4Addr,
        src_port: u16,
        tracker: Arc<Tracker>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            sock,
            target,
            src_port,
            tracker,
            stop,
        }
    }

    /// Start the receive loop on its own OS thread. The loop exits
    /// once the stop flag is raised; each blocking read is bounded by
    /// [`READ_TIMEOUT`].
    pub(crate) fn spawn(self) -> io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("recv-loop".to_string())
            .spawn(move || self.run())
    }

    fn run(&self) {
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return;
            }
            match self.sock.recv(READ_TIMEOUT) {
                Ok(frame) => {
                    if self.stop.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Some(report) = parse(&frame, self.target, self.src_port) {
                        self.tracker.add(report);
                    }
                }
                Err(RecvError::Timeout) => continue,
                Err(RecvError::Os(err)) => {
                    // Unanswered ports degrade to filtered; nothing to
                    // surface mid-scan.
                    debug!(%err, "receive loop terminating");
                    return;
                }
            }
        }
    }
}

/// Decode one IPv4/TCP frame and correlate it to the scan.
///
/// Accepts only frames from the target whose TCP destination port is
/// our source port; SYN-ACK reports open, RST reports closed, anything
/// else is discarded.
pub(crate) fn parse(buf: &[u8], target: Ipv4Addr, src_port: u16) -> Option<PortReport> {
    if buf.len() < 40 {
        return None;
    }

    let ip_header_len = usize::from(buf[0] & 0x0f) * 4;
    if buf.len() < ip_header_len + 20 {
        return None;
    }

    let src_ip = Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]);
    if src_ip != target {
        return None;
    }

    let tcp = &buf[ip_header_len..];
    let dst_port = u16::from_be_bytes([tcp[2], tcp[3]]);
    if dst_port != src_port {
        return None;
    }

    let probed_port = u16::from_be_bytes([tcp[0], tcp[1]]);
    let flags = tcp[13];

    const SYN_ACK: u8 = tcp_flags::SYN | tcp_flags::ACK;
    if flags & SYN_ACK == SYN_ACK {
        return Some(PortReport::new(probed_port, PortState::Open));
    }
    if flags & tcp_flags::RST != 0 {
        return Some(PortReport::new(probed_port, PortState::Closed));
    }
    None
}

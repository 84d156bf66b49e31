//! Probe pump: builds and transmits SYNs at a bounded rate.

use crate::socket::ScanSocket;
use shrike_rawsock::build_syn;
use std::io;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Transmits SYN probes to target ports at a controlled rate.
pub(crate) struct Sender<S> {
    sock: Arc<S>,
    target: Ipv4Addr,
    src_ip: Ipv4Addr,
    src_port: u16,
    rate: u32,
}

impl<S: ScanSocket> Sender<S> {
    pub(crate) fn new(sock: Arc<S>, target: Ipv4Addr, src_port: u16, rate: u32) -> Self {
        Self {
            sock,
            target,
            src_ip: local_ipv4(),
            src_port,
            rate,
        }
    }

    /// Transmit one SYN probe to `port`.
    pub(crate) fn send(&self, port: u16) -> io::Result<()> {
        let packet = build_syn(self.src_ip, self.target, self.src_port, port);
        self.sock.send(self.target, &packet)
    }

    /// Sleep `1/rate` seconds to pace the probe pump; no-op when the
    /// rate is unlimited.
    pub(crate) async fn delay(&self) {
        if self.rate == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_secs(1) / self.rate).await;
    }
}

/// The local IPv4 address the kernel would route outbound traffic
/// from. Connecting a UDP socket sends no packets; it only selects the
/// outbound interface so the bound address can be read back. Falls
/// back to loopback when the lookup fails.
pub(crate) fn local_ipv4() -> Ipv4Addr {
    match local_ipv4_inner() {
        Ok(ip) => ip,
        Err(err) => {
            debug!(%err, "local address lookup failed, using loopback");
            Ipv4Addr::LOCALHOST
        }
    }
}

fn local_ipv4_inner() -> io::Result<Ipv4Addr> {
    let sock = UdpSocket::bind("0.0.0.0:0")?;
    sock.connect("8.8.8.8:80")?;
    match sock.local_addr()? {
        std::net::SocketAddr::V4(addr) => Ok(*addr.ip()),
        std::net::SocketAddr::V6(_) => Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "expected an IPv4 local address",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shrike_rawsock::{tcp_flags, RecvError};

    struct RecordingSocket {
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl ScanSocket for RecordingSocket {
        fn send(&self, _dst: Ipv4Addr, packet: &[u8]) -> io::Result<()> {
            self.sent.lock().push(packet.to_vec());
            Ok(())
        }

        fn recv(&self, _timeout: Duration) -> Result<Vec<u8>, RecvError> {
            Err(RecvError::Timeout)
        }
    }

    #[test]
    fn send_emits_a_syn_for_the_requested_port() {
        let sock = Arc::new(RecordingSocket {
            sent: Mutex::new(Vec::new()),
        });
        let sender = Sender::new(sock.clone(), Ipv4Addr::new(10, 0, 0, 1), 54321, 0);

        sender.send(443).unwrap();

        let sent = sock.sent.lock();
        assert_eq!(sent.len(), 1);
        let pkt = &sent[0];
        assert_eq!(pkt.len(), 40);
        assert_eq!(u16::from_be_bytes([pkt[20], pkt[21]]), 54321);
        assert_eq!(u16::from_be_bytes([pkt[22], pkt[23]]), 443);
        assert_eq!(pkt[33], tcp_flags::SYN);
        assert_eq!(&pkt[16..20], &[10, 0, 0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_rate_skips_the_pacing_sleep() {
        let sock = Arc::new(RecordingSocket {
            sent: Mutex::new(Vec::new()),
        });
        let sender = Sender::new(sock, Ipv4Addr::LOCALHOST, 54321, 0);

        let before = tokio::time::Instant::now();
        sender.delay().await;
        assert_eq!(tokio::time::Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_paces_one_over_rate() {
        let sock = Arc::new(RecordingSocket {
            sent: Mutex::new(Vec::new()),
        });
        let sender = Sender::new(sock, Ipv4Addr::LOCALHOST, 54321, 500);

        let before = tokio::time::Instant::now();
        sender.delay().await;
        assert_eq!(
            tokio::time::Instant::now() - before,
            Duration::from_secs(1) / 500
        );
    }
}

//! TCP connect() scanner.
//!
//! The fallback engine for hosts where raw sockets are unavailable:
//! a full three-way handshake per port through the kernel's TCP
//! stack, so no privileges are required. Slower and louder than the
//! SYN engine, but the result vocabulary is identical.

use async_trait::async_trait;
use shrike_common::{PortReport, PortScanner, PortState, ScanError};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::debug;

pub struct ConnectScanner {
    timeout: Duration,
    concurrency: u32,
    retries: u32,
}

impl ConnectScanner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

impl Default for ConnectScanner {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(800),
            concurrency: 1000,
            retries: 0,
        }
    }
}

/// Probe one port: a refused connection is closed, a timeout or
/// unreachable error is filtered, an established stream is open (and
/// dropped immediately).
async fn probe(addr: SocketAddr, connect_timeout: Duration, retries: u32) -> PortState {
    for _ in 0..=retries {
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => return PortState::Open,
            Ok(Err(err)) if err.kind() == ErrorKind::ConnectionRefused => {
                return PortState::Closed;
            }
            Ok(Err(err)) => {
                debug!(%addr, %err, "connect failed");
            }
            Err(_) => {}
        }
    }
    PortState::Filtered
}

#[async_trait]
impl PortScanner for ConnectScanner {
    async fn scan(&self, target: Ipv4Addr, ports: &[u16]) -> Result<Vec<PortReport>, ScanError> {
        let mut seen = HashSet::new();
        let unique: Vec<u16> = ports.iter().copied().filter(|p| seen.insert(*p)).collect();

        let semaphore = Arc::new(Semaphore::new(self.concurrency as usize));
        let mut probes = Vec::with_capacity(unique.len());
        for &port in &unique {
            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let connect_timeout = self.timeout;
            let retries = self.retries;
            probes.push(tokio::spawn(async move {
                let _permit = permit;
                let state = probe(SocketAddr::from((target, port)), connect_timeout, retries).await;
                PortReport::new(port, state)
            }));
        }

        let mut results = Vec::with_capacity(probes.len());
        for task in probes {
            match task.await {
                Ok(report) => results.push(report),
                Err(err) => debug!(%err, "probe task failed"),
            }
        }
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "connect"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn fast_scanner() -> ConnectScanner {
        ConnectScanner::new()
            .with_timeout(Duration::from_millis(500))
            .with_concurrency(16)
    }

    #[tokio::test]
    async fn listener_reports_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let results = fast_scanner()
            .scan(Ipv4Addr::LOCALHOST, &[port])
            .await
            .unwrap();
        assert_eq!(results, vec![PortReport::new(port, PortState::Open)]);
    }

    #[tokio::test]
    async fn refused_port_reports_closed() {
        // Bind then drop to find a port nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let results = fast_scanner()
            .scan(Ipv4Addr::LOCALHOST, &[port])
            .await
            .unwrap();
        assert_eq!(results, vec![PortReport::new(port, PortState::Closed)]);
    }

    #[tokio::test]
    async fn duplicate_ports_coalesce() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let results = fast_scanner()
            .scan(Ipv4Addr::LOCALHOST, &[port, port, port])
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn scanner_is_unprivileged() {
        assert!(!fast_scanner().requires_raw_sockets());
        assert_eq!(fast_scanner().name(), "connect");
    }
}

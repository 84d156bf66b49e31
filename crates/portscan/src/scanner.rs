//! Scan orchestration: owns the socket pair, drives the probe pump,
//! and synthesises the final result set.

use crate::config::ScanConfig;
use crate::receiver::Receiver;
use crate::sender::Sender;
use crate::socket::ScanSocket;
use crate::tracker::Tracker;
use async_trait::async_trait;
use shrike_common::{PortReport, PortScanner, ScanError};
use shrike_rawsock::RawSocket;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// SYN scanner: one instance per configuration, one socket pair per
/// scan.
pub struct SynScanner {
    config: ScanConfig,
}

impl SynScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scan `ports` on `target` and return one report per unique port.
    ///
    /// Opens the raw socket pair for the duration of the scan;
    /// requires CAP_NET_RAW.
    pub async fn scan(
        &self,
        target: Ipv4Addr,
        ports: &[u16],
    ) -> Result<Vec<PortReport>, ScanError> {
        self.config.validate()?;
        let sock = Arc::new(RawSocket::open()?);
        self.scan_with(sock, target, ports).await
    }

    /// Run the scan pipeline against any socket implementation.
    /// Production goes through [`SynScanner::scan`]; tests inject an
    /// in-memory socket here.
    pub async fn scan_with<S: ScanSocket + 'static>(
        &self,
        sock: Arc<S>,
        target: Ipv4Addr,
        ports: &[u16],
    ) -> Result<Vec<PortReport>, ScanError> {
        self.config.validate()?;

        let tracker = Arc::new(Tracker::new());
        let stop = Arc::new(AtomicBool::new(false));
        let sender = Arc::new(Sender::new(
            sock.clone(),
            target,
            self.config.src_port,
            self.config.rate,
        ));

        let receiver = Receiver::new(
            sock,
            target,
            self.config.src_port,
            tracker.clone(),
            stop.clone(),
        );
        let recv_handle = receiver.spawn().map_err(ScanError::Os)?;

        info!(%target, ports = ports.len(), "starting SYN scan");

        // One task per port, gated to `concurrency` simultaneous
        // probes. Each task retransmits then pays the pacing delay.
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency as usize));
        let mut probes = Vec::with_capacity(ports.len());
        for &port in ports {
            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let sender = sender.clone();
            let retries = self.config.retries;
            probes.push(tokio::spawn(async move {
                let _permit = permit;
                for _ in 0..=retries {
                    if let Err(err) = sender.send(port) {
                        // Lost probes degrade the port to filtered.
                        debug!(port, %err, "SYN send failed");
                    }
                }
                sender.delay().await;
            }));
        }
        for probe in probes {
            let _ = probe.await;
        }

        // Fixed quiescence window for late replies.
        tokio::time::sleep(self.config.timeout).await;

        stop.store(true, Ordering::Relaxed);
        let _ = tokio::task::spawn_blocking(move || recv_handle.join()).await;

        Ok(tracker.finalise(ports))
    }
}

#[async_trait]
impl PortScanner for SynScanner {
    async fn scan(&self, target: Ipv4Addr, ports: &[u16]) -> Result<Vec<PortReport>, ScanError> {
        SynScanner::scan(self, target, ports).await
    }

    fn name(&self) -> &'static str {
        "syn"
    }

    fn requires_raw_sockets(&self) -> bool {
        true
    }
}

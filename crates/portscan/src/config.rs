//! Scan tuning parameters.

use shrike_common::ScanError;
use shrike_rawsock::EPHEMERAL_PORT_MIN;
use std::time::Duration;

/// Tuning parameters for one scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Packets per second; 0 disables pacing.
    pub rate: u32,
    /// Quiescence window after the last SYN has been sent.
    pub timeout: Duration,
    /// Maximum simultaneous probe tasks.
    pub concurrency: u32,
    /// SYN retransmissions per port beyond the first.
    pub retries: u32,
    /// Source port stamped on every probe; replies are correlated on
    /// it and the kernel filter only passes the ephemeral range.
    pub src_port: u16,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rate: 500,
            timeout: Duration::from_millis(1200),
            concurrency: 1000,
            retries: 2,
            src_port: 54321,
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn with_src_port(mut self, src_port: u16) -> Self {
        self.src_port = src_port;
        self
    }

    /// Reject parameter combinations the engine cannot honour before
    /// any socket is opened.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.src_port < EPHEMERAL_PORT_MIN {
            return Err(ScanError::InvalidInput(format!(
                "source port {} is below the ephemeral range ({}..=65535)",
                self.src_port, EPHEMERAL_PORT_MIN
            )));
        }
        if self.concurrency == 0 {
            return Err(ScanError::InvalidInput(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

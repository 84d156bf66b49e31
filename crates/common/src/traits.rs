//! Core trait implemented by every scan engine.

use crate::error::ScanError;
use crate::types::PortReport;
use async_trait::async_trait;
use std::net::Ipv4Addr;

/// A port scanner takes one target and a probe set and produces one
/// report per unique requested port.
#[async_trait]
pub trait PortScanner: Send + Sync {
    /// Scan every port in `ports` against `target`.
    ///
    /// `ports` may contain duplicates; implementations coalesce them so
    /// the returned list covers exactly the unique ports in the input.
    async fn scan(&self, target: Ipv4Addr, ports: &[u16]) -> Result<Vec<PortReport>, ScanError>;

    /// Scanner name/identifier
    fn name(&self) -> &'static str;

    /// Whether this scanner needs root/CAP_NET_RAW to run.
    fn requires_raw_sockets(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortState;

    struct MockScanner;

    #[async_trait]
    impl PortScanner for MockScanner {
        async fn scan(
            &self,
            _target: Ipv4Addr,
            ports: &[u16],
        ) -> Result<Vec<PortReport>, ScanError> {
            Ok(ports
                .iter()
                .map(|&p| PortReport::new(p, PortState::Filtered))
                .collect())
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_scanner_trait() {
        let scanner = MockScanner;
        let reports = scanner
            .scan(Ipv4Addr::LOCALHOST, &[80, 443])
            .await
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert!(!scanner.requires_raw_sockets());
    }
}

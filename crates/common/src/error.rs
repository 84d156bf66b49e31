//! Error types shared across the scanner crates.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// Raw socket creation or filter attach was rejected by the kernel.
    /// Callers map this to a distinct exit code and a sudo hint.
    #[error("permission denied: raw sockets require root\n  hint: run with sudo or grant CAP_NET_RAW")]
    PermissionDenied,

    /// Any other socket or syscall failure. Fatal to the scan.
    #[error("socket error: {0}")]
    Os(#[from] io::Error),

    /// The scan was asked to run with parameters it cannot honour.
    #[error("invalid scan input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_error_carries_hint() {
        let msg = ScanError::PermissionDenied.to_string();
        assert!(msg.contains("sudo"));
        assert!(msg.contains("CAP_NET_RAW"));
    }

    #[test]
    fn os_error_wraps_io() {
        let err: ScanError = io::Error::from(io::ErrorKind::AddrInUse).into();
        assert!(matches!(err, ScanError::Os(_)));
    }
}

//! Core data types for the shrike scanner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a probed TCP port.
///
/// `Open` means a SYN-ACK was observed, `Closed` means a RST was
/// observed, `Filtered` means nothing came back within the scan's
/// quiescence window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortState::Open => "open",
            PortState::Closed => "closed",
            PortState::Filtered => "filtered",
        };
        f.write_str(s)
    }
}

/// Result of probing a single port. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortReport {
    pub port: u16,
    pub state: PortState,
}

impl PortReport {
    #[inline]
    #[must_use]
    pub fn new(port: u16, state: PortState) -> Self {
        Self { port, state }
    }

    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, PortState::Open)
    }

    #[inline]
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, PortState::Closed)
    }

    #[inline]
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        matches!(self.state, PortState::Filtered)
    }
}

impl fmt::Display for PortReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/tcp {}", self.port, self.state)
    }
}

//! Stateless SYN port scanning.
//!
//! The engine sends one TCP SYN per requested port at a bounded rate,
//! correlates asynchronously arriving SYN-ACK / RST replies back to
//! the probe set, and reports every port as open, closed, or filtered
//! after a fixed quiescence window.
//!
//! [`SynScanner::scan`] owns the whole lifecycle: socket pair,
//! receiver thread, semaphore-gated probe pump, quiescence wait,
//! result synthesis.

pub mod config;
mod receiver;
mod sender;
pub mod socket;
mod tracker;

mod scanner;

pub use config::ScanConfig;
pub use scanner::SynScanner;
pub use socket::ScanSocket;

//! Shrike Common - shared types and traits
//!
//! This crate provides the core types, errors, and the scanner trait
//! used across the shrike workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::ScanError;
pub use traits::PortScanner;
pub use types::{PortReport, PortState};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

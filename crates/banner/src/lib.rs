//! Service banner grabbing and identification.
//!
//! Connects to an open port, reads whatever the service volunteers
//! (falling back to an HTTP HEAD probe for quiet services), and maps
//! the bytes to a service name, version, and an NVD search link.
//! Every failure here is non-fatal to a scan.

mod grabber;
mod identify;

pub use grabber::{Banner, Grabber};
pub use identify::{cve_link, identify, service_for_port};

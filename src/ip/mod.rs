//! IP address allocation and management module.
//!
//! Link subnets come from a monotonically advancing allocator, and every
//! assigned interface address is recorded in a registry keyed by address.

pub mod allocator;
pub mod registry;

use std::net::Ipv4Addr;

// Re-export commonly used types
pub use allocator::{Subnet, SubnetAllocator, LINK_PREFIX_LEN};
pub use registry::AddressRegistry;

/// Address of the reserved loopback interface present on every node
pub const LOOPBACK: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Errors from subnet allocation and address registration
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("Address space {base}/8 exhausted after {allocated} subnets")]
    Exhausted { base: Ipv4Addr, allocated: u32 },

    #[error("IP {addr} already assigned to {owner}, requested by {requested_by}")]
    Conflict { addr: Ipv4Addr, owner: String, requested_by: String },

    #[error("Subnet {subnet} has no host {host}")]
    NoSuchHost { subnet: Subnet, host: u32 },
}

//! Point-to-point subnet allocation.
//!
//! Every link gets its own /24 out of a base /8. The allocator walks the
//! networks in order: 10.0.0.0/24, 10.0.1.0/24, ... 10.0.255.0/24,
//! 10.1.0.0/24 and so on, and never hands the same network out twice.

use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

use super::AddressError;

/// Prefix length of every link subnet
pub const LINK_PREFIX_LEN: u8 = 24;

/// An IPv4 network with a prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Subnet {
    pub network: Ipv4Addr,
    pub prefix_len: u8,
}

impl Subnet {
    fn mask(&self) -> u32 {
        if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix_len))
        }
    }

    /// Address of host number `host` inside this subnet
    pub fn host(&self, host: u32) -> Option<Ipv4Addr> {
        let mask = self.mask();
        if host == 0 || host & mask != 0 || host == !mask {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.network) | host))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask() == u32::from(self.network)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Hands out consecutive /24 networks from a base /8
#[derive(Debug)]
pub struct SubnetAllocator {
    base: Ipv4Addr,
    next: u32,
}

impl SubnetAllocator {
    /// Number of /24 networks that fit into the /8 base
    pub const CAPACITY: u32 = 1 << 16;

    pub fn new(base: Ipv4Addr) -> Self {
        let base = Ipv4Addr::from(u32::from(base) & 0xff00_0000);
        SubnetAllocator { base, next: 0 }
    }

    /// The network the next call to `allocate` will return
    pub fn current(&self) -> Result<Subnet, AddressError> {
        if self.next >= Self::CAPACITY {
            return Err(AddressError::Exhausted { base: self.base, allocated: self.next });
        }
        Ok(Subnet {
            network: Ipv4Addr::from(u32::from(self.base) | (self.next << 8)),
            prefix_len: LINK_PREFIX_LEN,
        })
    }

    /// Take the current network and advance to the next one
    pub fn allocate(&mut self) -> Result<Subnet, AddressError> {
        let subnet = self.current()?;
        self.next += 1;
        Ok(subnet)
    }

    /// Number of networks handed out so far
    pub fn allocated(&self) -> u32 {
        self.next
    }
}

impl Default for SubnetAllocator {
    fn default() -> Self {
        SubnetAllocator::new(Ipv4Addr::new(10, 0, 0, 0))
    }
}

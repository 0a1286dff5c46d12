//! Address registry.
//!
//! Tracks which device owns each assigned address so that no two devices
//! ever share one, and lets later stages look an owner up by address.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use super::AddressError;

/// Registry of every assigned interface address
#[derive(Debug, Default)]
pub struct AddressRegistry {
    /// Address -> owning device name
    assigned: HashMap<Ipv4Addr, String>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `addr` as owned by `device`
    pub fn register(&mut self, addr: Ipv4Addr, device: &str) -> Result<(), AddressError> {
        if let Some(existing) = self.assigned.get(&addr) {
            if existing != device {
                return Err(AddressError::Conflict {
                    addr,
                    owner: existing.clone(),
                    requested_by: device.to_string(),
                });
            }
            return Ok(());
        }
        self.assigned.insert(addr, device.to_string());
        Ok(())
    }

    pub fn is_assigned(&self, addr: Ipv4Addr) -> bool {
        self.assigned.contains_key(&addr)
    }

    /// Name of the device that owns `addr`
    pub fn owner(&self, addr: Ipv4Addr) -> Option<&str> {
        self.assigned.get(&addr).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

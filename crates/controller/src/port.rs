// SPDX-License-Identifier: MIT

//! Port allocation for worker processes.
//!
//! The original implementation used a counter modulo a fixed pool of 100
//! ports starting at a base port. This rewrite uses a free-list over a
//! configurable range instead, so a fleet larger than 100 workers does not
//! collide (see design notes on port reuse policy).

use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::error::ControllerError;

pub struct PortAllocator {
    low: u16,
    high: u16,
    in_use: Mutex<BTreeSet<u16>>,
}

impl PortAllocator {
    pub fn new(low: u16, high: u16) -> Self {
        assert!(low <= high, "port range must be non-empty");
        Self { low, high, in_use: Mutex::new(BTreeSet::new()) }
    }

    /// Allocate the lowest currently-free port in the configured range.
    pub fn allocate(&self) -> Result<u16, ControllerError> {
        let mut in_use = self.in_use.lock();
        for port in self.low..=self.high {
            if !in_use.contains(&port) {
                in_use.insert(port);
                return Ok(port);
            }
        }
        Err(ControllerError::PortExhausted)
    }

    /// Return a port to the pool. A no-op if the port was not allocated.
    pub fn release(&self, port: u16) {
        self.in_use.lock().remove(&port);
    }

    pub fn allocated_ports(&self) -> BTreeSet<u16> {
        self.in_use.lock().clone()
    }
}

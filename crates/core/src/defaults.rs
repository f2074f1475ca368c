//! Device-wide defaults
//!
//! Descriptors that leave `max_length`, `total_length` or `scope` unset
//! resolve them against the owning device's [`DeviceDefaults`] at read time.
//! Changing a default is visible to every descriptor on the next read.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Default element count / string length limit
pub const DEFAULT_MAX_LENGTH: u32 = 1024;

/// Default cumulative string length limit
pub const DEFAULT_TOTAL_LENGTH: u32 = 1024;

/// Default scope of params that declare none
pub const DEFAULT_SCOPE: &str = "st2138:mon";

static SHARED: Lazy<Arc<DeviceDefaults>> = Lazy::new(|| Arc::new(DeviceDefaults::default()));

/// Live default limits and scope of one device
#[derive(Debug)]
pub struct DeviceDefaults {
    max_length: AtomicU32,
    total_length: AtomicU32,
    scope: RwLock<String>,
}

impl Default for DeviceDefaults {
    fn default() -> Self {
        DeviceDefaults::new(DEFAULT_MAX_LENGTH, DEFAULT_TOTAL_LENGTH, DEFAULT_SCOPE)
    }
}

impl DeviceDefaults {
    /// Create a set of defaults
    pub fn new(max_length: u32, total_length: u32, scope: impl Into<String>) -> Self {
        DeviceDefaults {
            max_length: AtomicU32::new(max_length),
            total_length: AtomicU32::new(total_length),
            scope: RwLock::new(scope.into()),
        }
    }

    /// Process-wide defaults used by descriptors built without a device
    pub fn shared() -> Arc<DeviceDefaults> {
        Arc::clone(&SHARED)
    }

    /// Default maximum element count or string length
    pub fn max_length(&self) -> u32 {
        self.max_length.load(Ordering::Acquire)
    }

    /// Default cumulative string length
    pub fn total_length(&self) -> u32 {
        self.total_length.load(Ordering::Acquire)
    }

    /// Default scope
    pub fn scope(&self) -> String {
        self.scope.read().clone()
    }

    /// Replace the default maximum length
    pub fn set_max_length(&self, max_length: u32) {
        self.max_length.store(max_length, Ordering::Release);
    }

    /// Replace the default total length
    pub fn set_total_length(&self, total_length: u32) {
        self.total_length.store(total_length, Ordering::Release);
    }

    /// Replace the default scope
    pub fn set_scope(&self, scope: impl Into<String>) {
        *self.scope.write() = scope.into();
    }
}

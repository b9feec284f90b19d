//! Capacity offered to the network.

use super::HostInfo;
use crate::constants::{BYTES_PER_GIB, FALLBACK_CAPACITY_GB, USABLE_CAPACITY_PERCENT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Capacity in GiB. Zero means detect from free disk space.
    pub capacity_gb: u64,
}

impl StorageConfig {
    pub(crate) fn resolve(&mut self, host: &HostInfo) {
        if self.capacity_gb == 0 {
            self.capacity_gb = match host.free_bytes.map(usable_capacity_gb) {
                Some(gb) if gb > 0 => gb,
                _ => FALLBACK_CAPACITY_GB,
            };
        }
    }

    /// Capacity in bytes, saturating at `i64::MAX`.
    pub fn capacity_bytes(&self) -> i64 {
        i64::try_from(self.capacity_gb.saturating_mul(BYTES_PER_GIB)).unwrap_or(i64::MAX)
    }
}

/// Whole GiB of the usable share of `free_bytes`.
pub fn usable_capacity_gb(free_bytes: u64) -> u64 {
    let usable = u128::from(free_bytes) * u128::from(USABLE_CAPACITY_PERCENT) / 100;
    u64::try_from(usable / u128::from(BYTES_PER_GIB)).unwrap_or(u64::MAX)
}

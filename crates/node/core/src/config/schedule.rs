//! Loop intervals and pin task limits.

use crate::constants::{
    DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_MAX_CONCURRENT_PINS, DEFAULT_POLL_INTERVAL,
    DEFAULT_SHUTDOWN_GRACE,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalsConfig {
    #[serde(with = "super::duration")]
    pub heartbeat: Duration,

    #[serde(with = "super::duration")]
    pub poll: Duration,
}

impl Default for IntervalsConfig {
    fn default() -> Self {
        Self {
            heartbeat: DEFAULT_HEARTBEAT_INTERVAL,
            poll: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    pub max_concurrent_pins: usize,

    /// How long shutdown waits for pins still in flight.
    #[serde(with = "super::duration")]
    pub shutdown_grace: Duration,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pins: DEFAULT_MAX_CONCURRENT_PINS,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

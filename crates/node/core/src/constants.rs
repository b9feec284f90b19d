//! Constants used throughout the cairn node.
//!
//! Defaults owned by a library crate (daemon and coordinator timeouts) are
//! re-used from that crate rather than repeated here.

use std::time::Duration;

// =============================================================================
// Environment
// =============================================================================

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "CAIRN_";

/// Separator between nested keys in environment variable names.
pub const ENV_NESTING_SEPARATOR: &str = "__";

/// Legacy variable holding the coordinator credential.
pub const LEGACY_AUTH_TOKEN_VAR: &str = "CAIRN_AUTH_TOKEN";

/// Legacy variable holding the coordinator address.
pub const LEGACY_COORDINATOR_ADDR_VAR: &str = "CAIRN_COORDINATOR_ADDR";

// =============================================================================
// Endpoints
// =============================================================================

/// Default coordinator gRPC address.
pub const DEFAULT_COORDINATOR_ADDRESS: &str = "http://localhost:50052";

/// Default control API of the local IPFS daemon.
pub const DEFAULT_IPFS_API_URL: &str = "http://localhost:5001";

/// Default port of the Prometheus exporter, bound to localhost.
pub const DEFAULT_METRICS_PORT: u16 = 9464;

// =============================================================================
// Intervals & Limits
// =============================================================================

/// Default time between heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Default time between pin task polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default cap on concurrently running pin handlers.
pub const DEFAULT_MAX_CONCURRENT_PINS: usize = 16;

/// Default time shutdown waits for in-flight pins.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

// =============================================================================
// Node Identity
// =============================================================================

/// Prefix of generated node names.
pub const NODE_NAME_PREFIX: &str = "cairn-node";

/// Region reported when none is configured or derivable.
pub const UNKNOWN_REGION: &str = "unknown";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Storage Capacity
// =============================================================================

/// Capacity announced when free space cannot be measured.
pub const FALLBACK_CAPACITY_GB: u64 = 100;

/// Share of the free space offered to the network.
pub const USABLE_CAPACITY_PERCENT: u64 = 80;

/// Bytes per GiB.
pub const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

// =============================================================================
// File System
// =============================================================================

/// Name of the data directory below the platform data root.
pub const DEFAULT_DATA_DIR_NAME: &str = "cairn";

/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory holding the IPFS data inside the data directory.
pub const IPFS_DIR_NAME: &str = "ipfs";

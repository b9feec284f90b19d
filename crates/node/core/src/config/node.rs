//! Node identity announced at registration.

use super::HostInfo;
use crate::constants::{NODE_NAME_PREFIX, UNKNOWN_REGION};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeIdentityConfig {
    /// Display name. Generated from host and user name when empty.
    pub name: String,

    /// Region label. Derived from `TZ` when empty.
    pub region: String,

    /// Payout address, passed through verbatim.
    pub wallet_address: String,
}

impl NodeIdentityConfig {
    pub(crate) fn resolve(&mut self, host: &HostInfo) {
        if self.name.trim().is_empty() {
            self.name = generate_node_name(host.hostname.as_deref(), host.username.as_deref());
        }
        if self.region.trim().is_empty() {
            self.region = region_from_timezone(host.timezone.as_deref()).to_string();
        }
    }
}

/// `cairn-node-<hostname>-<user>`, lowercased, spaces replaced by `-`.
pub fn generate_node_name(hostname: Option<&str>, username: Option<&str>) -> String {
    format!(
        "{NODE_NAME_PREFIX}-{}-{}",
        hostname.unwrap_or("unknown"),
        username.unwrap_or("user")
    )
    .to_lowercase()
    .replace(' ', "-")
}

/// Coarse region label from a timezone name such as `Europe/Berlin`.
pub fn region_from_timezone(tz: Option<&str>) -> &'static str {
    match tz {
        Some(tz) if tz.contains("America") => "us",
        Some(tz) if tz.contains("Europe") => "eu",
        Some(tz) if tz.contains("Asia") => "asia",
        _ => UNKNOWN_REGION,
    }
}

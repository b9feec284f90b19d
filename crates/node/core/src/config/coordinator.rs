//! Coordinator connection and credentials.

use crate::constants::DEFAULT_COORDINATOR_ADDRESS;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// Placeholder printed instead of secrets.
pub const REDACTED: &str = "<redacted>";

/// Credential presented to the coordinator.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token sent with every request.
    pub token: String,
}

impl AuthConfig {
    /// Copy with the token replaced by a placeholder, for display.
    pub fn redacted(&self) -> Self {
        Self {
            token: if self.token.is_empty() {
                String::new()
            } else {
                REDACTED.to_string()
            },
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.redacted().token)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// gRPC address, `http://` is assumed when no scheme is given.
    pub address: String,

    #[serde(with = "super::duration")]
    pub connect_timeout: Duration,

    /// Deadline applied to every RPC.
    #[serde(with = "super::duration")]
    pub request_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_COORDINATOR_ADDRESS.to_string(),
            connect_timeout: cairn_coordinator::DEFAULT_CONNECT_TIMEOUT,
            request_timeout: cairn_coordinator::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

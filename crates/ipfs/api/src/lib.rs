//! Client for the local IPFS daemon's HTTP control API.
//!
//! Only the four calls the node needs are implemented:
//!
//! - [`StorageApi::version`] - readiness probe
//! - [`StorageApi::id`] - peer identifier and advertised addresses
//! - [`StorageApi::repo_stat`] - repository usage
//! - [`StorageApi::pin`] - pin a content identifier
//!
//! Every call is a single request. Retry policy belongs to the caller.

mod client;
mod error;
mod types;

pub use client::{DEFAULT_REQUEST_TIMEOUT, IpfsClient};
pub use error::{ApiError, ApiResult};
pub use types::{PeerInfo, RepoStat};

use async_trait::async_trait;

/// Operations against the local storage daemon.
///
/// [`IpfsClient`] is the HTTP implementation; the trait is the seam used by the
/// daemon manager and the agent.
#[async_trait]
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait StorageApi: Send + Sync {
    /// Daemon version string. Succeeds only once the daemon is serving its API.
    async fn version(&self) -> ApiResult<String>;

    /// Peer identifier and advertised multiaddresses.
    async fn id(&self) -> ApiResult<PeerInfo>;

    /// Repository usage statistics.
    async fn repo_stat(&self) -> ApiResult<RepoStat>;

    /// Recursively pin `cid` on the local daemon.
    async fn pin(&self, cid: &str) -> ApiResult<()>;
}

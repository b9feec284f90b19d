//! HTTP implementation of [`StorageApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::types::VersionResponse;
use crate::{ApiError, ApiResult, PeerInfo, RepoStat, StorageApi};

/// Default per-request timeout. Pinning a large DAG can take minutes.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const VERSION: &str = "version";
const ID: &str = "id";
const REPO_STAT: &str = "repo/stat";
const PIN_ADD: &str = "pin/add";

/// Client for the daemon's `/api/v0` endpoints.
#[derive(Debug, Clone)]
pub struct IpfsClient {
    base: Url,
    http: Client,
}

impl IpfsClient {
    /// Create a client for the API at `api_url` (e.g. `http://localhost:5001`).
    pub fn new(api_url: &str) -> ApiResult<Self> {
        Self::with_timeout(api_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(api_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base = parse_base(api_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self { base, http })
    }

    /// The API base url.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &'static str) -> ApiResult<Url> {
        self.base
            .join(&format!("api/v0/{path}"))
            .map_err(|e| ApiError::InvalidUrl {
                url: self.base.to_string(),
                reason: e.to_string(),
            })
    }

    async fn post(
        &self,
        endpoint: &'static str,
        query: Option<(&str, &str)>,
    ) -> ApiResult<Response> {
        let url = self.endpoint(endpoint)?;
        trace!(%url, "storage api request");

        let mut request = self.http.post(url);
        if let Some(pair) = query {
            request = request.query(&[pair]);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn post_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> ApiResult<T> {
        self.post(endpoint, None)
            .await?
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { endpoint, source })
    }
}

#[async_trait]
impl StorageApi for IpfsClient {
    async fn version(&self) -> ApiResult<String> {
        let response: VersionResponse = self.post_json(VERSION).await?;
        Ok(response.version)
    }

    async fn id(&self) -> ApiResult<PeerInfo> {
        self.post_json(ID).await
    }

    async fn repo_stat(&self) -> ApiResult<RepoStat> {
        self.post_json(REPO_STAT).await
    }

    async fn pin(&self, cid: &str) -> ApiResult<()> {
        self.post(PIN_ADD, Some(("arg", cid))).await?;
        Ok(())
    }
}

/// Parse the base url, making sure it ends in `/` so `join` appends rather than replaces.
fn parse_base(api_url: &str) -> ApiResult<Url> {
    let normalized = if api_url.ends_with('/') {
        api_url.to_string()
    } else {
        format!("{api_url}/")
    };

    let url = Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl {
        url: api_url.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl {
            url: api_url.to_string(),
            reason: "not a base url".to_string(),
        });
    }

    Ok(url)
}

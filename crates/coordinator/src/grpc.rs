//! tonic-backed implementation of [`Coordinator`].

use std::time::Duration;

use async_trait::async_trait;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};
use tonic::Request;
use tracing::{debug, info};

use crate::proto::{self, node_coordinator_client::NodeCoordinatorClient};
use crate::{
    Coordinator, CoordinatorConnector, CoordinatorError, CoordinatorResult, Heartbeat, NodeId,
    PeerDescriptor, PinStatus, PinTask, Registration,
};

/// Metadata key carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Default upper bound for establishing the channel.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound for a single call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens the single long-lived channel to the coordinator.
#[derive(Clone)]
pub struct GrpcConnector {
    address: String,
    credential: String,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl GrpcConnector {
    pub fn new(address: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credential: credential.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Address with an `http://` scheme added when none is given.
    pub fn uri(&self) -> String {
        normalize_address(&self.address)
    }

    fn endpoint(&self) -> CoordinatorResult<Endpoint> {
        let uri = self.uri();
        let endpoint = Endpoint::from_shared(uri.clone()).map_err(|e| {
            CoordinatorError::InvalidEndpoint {
                address: self.address.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(endpoint
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout))
    }
}

impl std::fmt::Debug for GrpcConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcConnector")
            .field("address", &self.address)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CoordinatorConnector for GrpcConnector {
    type Client = GrpcCoordinator;

    async fn connect(&self) -> CoordinatorResult<GrpcCoordinator> {
        let authorization = bearer(&self.credential)?;
        let endpoint = self.endpoint()?;

        debug!(address = %self.uri(), "connecting to coordinator");
        let channel = endpoint
            .connect()
            .await
            .map_err(|source| CoordinatorError::Connect {
                address: self.uri(),
                source,
            })?;
        info!(address = %self.uri(), "connected to coordinator");

        Ok(GrpcCoordinator {
            client: NodeCoordinatorClient::new(channel),
            authorization,
            credential: self.credential.clone(),
        })
    }
}

/// Coordinator calls over an established channel.
///
/// Dropping the last clone closes the connection.
#[derive(Clone)]
pub struct GrpcCoordinator {
    client: NodeCoordinatorClient<Channel>,
    authorization: MetadataValue<Ascii>,
    credential: String,
}

impl GrpcCoordinator {
    fn request<T>(&self, message: T) -> Request<T> {
        authorized(message, &self.authorization)
    }

    /// Per-call handle; clones share the channel.
    fn client(&self) -> NodeCoordinatorClient<Channel> {
        self.client.clone()
    }
}

impl std::fmt::Debug for GrpcCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcCoordinator").finish_non_exhaustive()
    }
}

#[async_trait]
impl Coordinator for GrpcCoordinator {
    async fn register(&self, registration: &Registration) -> CoordinatorResult<NodeId> {
        let request = self.request(register_request(registration, &self.credential));
        let response = self
            .client()
            .register(request)
            .await
            .map_err(|s| CoordinatorError::rpc("Register", s))?;
        registration_outcome(response.into_inner())
    }

    async fn get_peers(&self, node: &NodeId) -> CoordinatorResult<Vec<PeerDescriptor>> {
        let request = self.request(proto::GetPeersRequest {
            node_id: node.to_string(),
        });
        let response = self
            .client()
            .get_peers(request)
            .await
            .map_err(|s| CoordinatorError::rpc("GetPeers", s))?;
        peers_outcome(response.into_inner())
    }

    async fn heartbeat(&self, node: &NodeId, heartbeat: Heartbeat) -> CoordinatorResult<()> {
        let request = self.request(proto::HeartbeatRequest {
            node_id: node.to_string(),
            storage_used_bytes: heartbeat.storage_used_bytes,
            uptime_seconds: heartbeat.uptime_seconds(),
        });
        self.client()
            .heartbeat(request)
            .await
            .map_err(|s| CoordinatorError::rpc("Heartbeat", s))?;
        Ok(())
    }

    async fn get_pin_tasks(&self, node: &NodeId) -> CoordinatorResult<Vec<PinTask>> {
        let request = self.request(proto::GetPinTasksRequest {
            node_id: node.to_string(),
        });
        let response = self
            .client()
            .get_pin_tasks(request)
            .await
            .map_err(|s| CoordinatorError::rpc("GetPinTasks", s))?;
        Ok(response
            .into_inner()
            .tasks
            .into_iter()
            .map(PinTask::from)
            .collect())
    }

    async fn report_pin_status(
        &self,
        node: &NodeId,
        task_id: &str,
        status: PinStatus,
    ) -> CoordinatorResult<()> {
        let request = self.request(proto::ReportPinStatusRequest {
            node_id: node.to_string(),
            task_id: task_id.to_string(),
            status: proto::PinStatus::from(status).into(),
        });
        self.client()
            .report_pin_status(request)
            .await
            .map_err(|s| CoordinatorError::rpc("ReportPinStatus", s))?;
        Ok(())
    }
}

fn normalize_address(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

fn bearer(credential: &str) -> CoordinatorResult<MetadataValue<Ascii>> {
    MetadataValue::try_from(format!("Bearer {credential}"))
        .map_err(|_| CoordinatorError::InvalidCredential)
}

fn authorized<T>(message: T, authorization: &MetadataValue<Ascii>) -> Request<T> {
    let mut request = Request::new(message);
    request
        .metadata_mut()
        .insert(AUTHORIZATION_HEADER, authorization.clone());
    request
}

fn register_request(registration: &Registration, credential: &str) -> proto::RegisterRequest {
    proto::RegisterRequest {
        peer_id: registration.peer_id.clone(),
        name: registration.name.clone(),
        region: registration.region.clone(),
        ipfs_multiaddrs: registration.multiaddrs.clone(),
        storage_capacity_bytes: registration.capacity_bytes,
        wallet_address: registration.wallet_address.clone(),
        auth_token: credential.to_string(),
    }
}

fn registration_outcome(response: proto::RegisterResponse) -> CoordinatorResult<NodeId> {
    if !response.success {
        return Err(CoordinatorError::Rejected(response.error));
    }
    if response.node_id.is_empty() {
        return Err(CoordinatorError::Protocol(
            "registration succeeded without a node id".into(),
        ));
    }
    Ok(NodeId::new(response.node_id))
}

fn peers_outcome(response: proto::GetPeersResponse) -> CoordinatorResult<Vec<PeerDescriptor>> {
    if !response.error.is_empty() {
        return Err(CoordinatorError::Protocol(response.error));
    }
    Ok(response.peers.into_iter().map(PeerDescriptor::from).collect())
}

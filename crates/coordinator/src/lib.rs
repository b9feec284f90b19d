//! Client side of the node coordinator protocol.
//!
//! The coordinator assigns node identifiers, hands out peer lists and
//! dispatches pin work. Five unary RPCs are used, each authenticated with an
//! `authorization: Bearer <token>` metadata entry.
//!
//! [`Coordinator`] is the raw call surface. The agent never uses it directly:
//! [`RegisteredSession::register`] consumes a client, performs `Register`, and
//! only then exposes the remaining calls bound to the assigned [`NodeId`].

mod error;
mod grpc;
pub mod proto;
mod session;
mod types;

pub use error::{CoordinatorError, CoordinatorResult};
pub use grpc::{
    AUTHORIZATION_HEADER, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, GrpcConnector,
    GrpcCoordinator,
};
pub use session::RegisteredSession;
pub use types::{Heartbeat, NodeId, PeerDescriptor, PinStatus, PinTask, Registration};

use async_trait::async_trait;

/// The five coordinator RPCs.
#[async_trait]
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait Coordinator: Send + Sync {
    /// Announce this node. Fails with [`CoordinatorError::Rejected`] when the
    /// coordinator refuses it.
    async fn register(&self, registration: &Registration) -> CoordinatorResult<NodeId>;

    async fn get_peers(&self, node: &NodeId) -> CoordinatorResult<Vec<PeerDescriptor>>;

    async fn heartbeat(&self, node: &NodeId, heartbeat: Heartbeat) -> CoordinatorResult<()>;

    /// Outstanding tasks. An empty list is a normal answer.
    async fn get_pin_tasks(&self, node: &NodeId) -> CoordinatorResult<Vec<PinTask>>;

    async fn report_pin_status(
        &self,
        node: &NodeId,
        task_id: &str,
        status: PinStatus,
    ) -> CoordinatorResult<()>;
}

/// Establishes the coordinator connection.
#[async_trait]
pub trait CoordinatorConnector: Send + Sync {
    type Client: Coordinator + 'static;

    async fn connect(&self) -> CoordinatorResult<Self::Client>;
}

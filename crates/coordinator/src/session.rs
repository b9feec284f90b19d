use tracing::info;

use crate::{
    Coordinator, CoordinatorResult, Heartbeat, NodeId, PeerDescriptor, PinStatus, PinTask,
    Registration,
};

/// A coordinator client that has completed `Register`.
///
/// This is the only way to reach the node-scoped calls, so none of them can be
/// issued before a node id exists.
#[derive(Debug)]
pub struct RegisteredSession<C> {
    client: C,
    node_id: NodeId,
}

impl<C: Coordinator> RegisteredSession<C> {
    /// Register and take ownership of `client`. On failure the client is dropped.
    pub async fn register(client: C, registration: &Registration) -> CoordinatorResult<Self> {
        let node_id = client.register(registration).await?;
        info!(%node_id, peer_id = %registration.peer_id, "registered with coordinator");
        Ok(Self { client, node_id })
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub async fn get_peers(&self) -> CoordinatorResult<Vec<PeerDescriptor>> {
        self.client.get_peers(&self.node_id).await
    }

    pub async fn heartbeat(&self, heartbeat: Heartbeat) -> CoordinatorResult<()> {
        self.client.heartbeat(&self.node_id, heartbeat).await
    }

    pub async fn get_pin_tasks(&self) -> CoordinatorResult<Vec<PinTask>> {
        self.client.get_pin_tasks(&self.node_id).await
    }

    pub async fn report_pin_status(&self, task_id: &str, status: PinStatus) -> CoordinatorResult<()> {
        self.client
            .report_pin_status(&self.node_id, task_id, status)
            .await
    }

    /// Close the session, releasing the underlying connection.
    pub fn close(self) {
        info!(node_id = %self.node_id, "closing coordinator session");
    }
}

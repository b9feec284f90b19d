//! The node agent.
//!
//! [`Agent::run`] brings the local IPFS daemon online, registers the node
//! with the coordinator, forms a best-effort peer mesh and then runs two
//! independent loops until shutdown:
//!
//! - heartbeat: reports repository usage and uptime every interval;
//! - task poll: fetches pin tasks and hands them to a bounded handler pool.
//!
//! Setup failures are returned to the caller. Failures after registration
//! are logged and the affected loop carries on at its next tick.

mod agent;
mod config;
mod error;
mod heartbeat;
mod mesh;
mod metrics;
mod state;
mod tasks;

#[cfg(test)]
mod test_utils;

pub use agent::Agent;
pub use config::{AgentConfig, NodeProfile};
pub use error::{AgentError, AgentResult};
pub use mesh::MeshReport;
pub use state::AgentState;

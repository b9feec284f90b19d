use thiserror::Error;

/// Result alias for coordinator calls.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid coordinator address {address}: {reason}")]
    InvalidEndpoint { address: String, reason: String },

    #[error("auth token is not a valid metadata value")]
    InvalidCredential,

    #[error("failed to connect to coordinator at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// Transport or server-side failure of a single call.
    #[error("{rpc} failed: {status}")]
    Rpc {
        rpc: &'static str,
        #[source]
        status: Box<tonic::Status>,
    },

    /// `Register` answered with `success = false`.
    #[error("coordinator rejected registration: {0}")]
    Rejected(String),

    /// The call went through but the response carried an error message.
    #[error("coordinator error: {0}")]
    Protocol(String),
}

impl CoordinatorError {
    pub(crate) fn rpc(rpc: &'static str, status: tonic::Status) -> Self {
        Self::Rpc {
            rpc,
            status: Box::new(status),
        }
    }

    /// gRPC status code for call failures.
    pub fn code(&self) -> Option<tonic::Code> {
        match self {
            Self::Rpc { status, .. } => Some(status.code()),
            _ => None,
        }
    }
}

//! Error types for the message pipeline.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::storage::StoreError;

use super::transport::TransportError;

/// Errors a pipeline run can fail with. Each is contained at the pipeline
/// boundary and converted into a single user-facing notice.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An inference call failed.
    #[error("inference gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Fetching or delivering through the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Persisting analytics failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Temp-file handling failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

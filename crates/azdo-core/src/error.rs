//! Error types for azdo-pipelines.

use std::fmt;

use thiserror::Error;

/// Remote call that produced an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `GET _apis/pipelines`
    ListPipelines,
    /// `POST _apis/pipelines/{id}/runs`
    TriggerRun,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ListPipelines => f.write_str("list pipelines"),
            Stage::TriggerRun => f.write_str("trigger pipeline"),
        }
    }
}

/// Main error type for azdo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Required settings are missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Name lookup found no pipeline
    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    /// A remote call failed (transport error or non-2xx response)
    #[error("Failed to {stage}: {message}")]
    Upstream {
        stage: Stage,
        status: Option<u16>,
        message: String,
    },

    /// Caller supplied malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Upstream failure caused by the transport (no HTTP status).
    pub fn transport(stage: Stage, message: impl Into<String>) -> Self {
        Error::Upstream {
            stage,
            status: None,
            message: message.into(),
        }
    }

    /// Upstream failure caused by a non-2xx response.
    pub fn from_status(stage: Stage, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        };
        Error::Upstream {
            stage,
            status: Some(status),
            message,
        }
    }

    /// True when a pipeline name resolved to nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PipelineNotFound(_))
    }

    /// Stage of the failed remote call, if this is an upstream failure.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Upstream { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias for azdo operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Error kinds shared by the resolver, the editor and every store adapter.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WheelError {
    /// Empty wheel at spin time, malformed promotion, bad option index.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("promotion not found: {0}")]
    NotFound(String),

    /// Slug already taken on create or rename.
    #[error("slug already exists: {0}")]
    Conflict(String),

    /// Store or asset collaborator unreachable or failing.
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),
}

impl WheelError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        WheelError::InvalidInput(msg.into())
    }

    pub fn upstream(err: impl std::fmt::Display) -> Self {
        WheelError::UpstreamFailure(err.to_string())
    }

    /// Stable machine-readable name used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            WheelError::InvalidInput(_) => "invalid_input",
            WheelError::NotFound(_) => "not_found",
            WheelError::Conflict(_) => "conflict",
            WheelError::UpstreamFailure(_) => "upstream_failure",
        }
    }
}

pub type WheelResult<T> = Result<T, WheelError>;

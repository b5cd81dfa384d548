//! Error types for the IPAM core

use thiserror::Error;

use crate::domain::value_objects::NetworkError;
use crate::ports::outbound::RepositoryError;

/// Coarse error classification surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed, out-of-range or oversized input
    Validation,
    /// Absent, or owned by another tenant
    NotFound,
    /// Request incompatible with current state
    Conflict,
    /// Underlying store failure
    Internal,
}

/// IPAM error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IpamError {
    /// Input rejected before any store mutation
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource absent or outside the caller's tenant
    #[error("{0} not found")]
    NotFound(&'static str),

    /// State-incompatible request
    #[error("conflict: {0}")]
    Conflict(String),

    /// Range still owns active addresses
    #[error("range still owns {active_ip_count} active address(es); delete them first")]
    RangeInUse {
        /// Number of blocking active addresses
        active_ip_count: u64,
    },

    /// Store failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl IpamError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) | Self::RangeInUse { .. } => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Machine-readable details attached to the error, if any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::RangeInUse { active_ip_count } => {
                Some(serde_json::json!({ "activeIPCount": active_ip_count }))
            }
            _ => None,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<RepositoryError> for IpamError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => Self::NotFound(what),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Storage(msg) => Self::Internal(msg),
        }
    }
}

impl From<NetworkError> for IpamError {
    fn from(err: NetworkError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for the IPAM core
pub type IpamResult<T> = Result<T, IpamError>;

//! Error types for the configuration store

use thiserror::Error;
use tracing::{error, warn};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`ConfigStore`](crate::ConfigStore) implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Configuration store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Invalid configuration path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    pub fn invalid_path(path: &[&str], reason: impl Into<String>) -> Self {
        StoreError::InvalidPath {
            path: path.join("/"),
            reason: reason.into(),
        }
    }

    /// Whether the store itself could not be reached, as opposed to a bad request
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. } | StoreError::Io(_))
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            StoreError::InvalidPath { .. } => {
                warn!(error = %self, "Rejected configuration path");
            }
            _ => {
                error!(error = %self, "Configuration store error");
            }
        }
    }
}

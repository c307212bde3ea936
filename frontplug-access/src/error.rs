//! Failure taxonomy for context resolution

use frontplug_core::StoreError;
use thiserror::Error;

/// Credentials were supplied but could not be verified
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid or malformed token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token type")]
    InvalidTokenType,
    #[error("Malformed credentials: {0}")]
    MalformedCredentials(String),
}

/// Scope and ACL resolution failures
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Configuration store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
    #[error("Unknown share link: {link}")]
    UnknownLink { link: String },
}

impl From<StoreError> for ResolutionError {
    fn from(err: StoreError) -> Self {
        ResolutionError::StoreUnavailable(err)
    }
}

/// Why a request context could not be built
#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("Authorization context timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

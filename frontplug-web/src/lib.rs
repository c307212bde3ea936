//! Frontplug Web Server
//!
//! Serves the plugin asset bundle and renders the bootstrap pages
//! (`/gui`, `/user/reset-password/{key}`, `/public/{link}`) with a
//! per-request authorization context embedded.

pub mod assets;
pub mod auth;
pub mod handlers;
pub mod migration;
pub mod routes;
pub mod server;
pub mod settings;
pub mod state;
pub mod templates;

// Re-export main types
pub use server::{FrontplugServer, FrontplugServerBuilder};
pub use settings::WebConfig;
pub use state::AppState;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use frontplug_access::{AuthError, ContextError, ResolutionError};
use frontplug_core::StoreError;
use serde_json::json;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, warn};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let timeout = state.config.request_timeout();

    Router::new()
        .merge(routes::bootstrap_routes())
        .merge(routes::asset_routes(&state.config.assets_dir))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

impl WebError {
    /// HTTP status and stable error code
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            WebError::Context(ContextError::Auth(err)) => (
                StatusCode::UNAUTHORIZED,
                match err {
                    AuthError::InvalidToken => "invalid_token",
                    AuthError::TokenExpired => "token_expired",
                    AuthError::InvalidTokenType => "invalid_token_type",
                    AuthError::MalformedCredentials(_) => "malformed_credentials",
                },
            ),
            WebError::Context(ContextError::Timeout { .. }) => {
                (StatusCode::UNAUTHORIZED, "authorization_timeout")
            }
            WebError::Context(ContextError::Resolution(ResolutionError::StoreUnavailable(_))) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            WebError::Context(ContextError::Resolution(ResolutionError::UnknownLink { .. })) => {
                (StatusCode::NOT_FOUND, "unknown_link")
            }
            WebError::Store(err) if err.is_unavailable() => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            WebError::Template(_) => (StatusCode::INTERNAL_SERVER_ERROR, "template_error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        let message = if status.is_server_error() {
            error!(error = %self, code, "Request failed");
            match status {
                StatusCode::SERVICE_UNAVAILABLE => "Configuration is temporarily unavailable",
                _ => "Internal server error",
            }
            .to_string()
        } else {
            warn!(error = %self, code, "Request rejected");
            self.to_string()
        };

        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                WebError::from(ContextError::from(AuthError::TokenExpired)),
                StatusCode::UNAUTHORIZED,
            ),
            (
                WebError::from(ContextError::Timeout { elapsed_ms: 2000 }),
                StatusCode::UNAUTHORIZED,
            ),
            (
                WebError::from(ContextError::from(ResolutionError::from(
                    StoreError::unavailable("down"),
                ))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                WebError::from(ContextError::from(ResolutionError::UnknownLink {
                    link: "x".to_string(),
                })),
                StatusCode::NOT_FOUND,
            ),
            (
                WebError::Config("bad".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status().0, expected, "{}", err);
        }
    }

    #[test]
    fn test_auth_error_codes() {
        let err = WebError::from(ContextError::from(AuthError::MalformedCredentials(
            "basic".to_string(),
        )));
        assert_eq!(err.status().1, "malformed_credentials");
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}

//! Route definitions for the frontplug web server

use crate::{assets, handlers, AppState};
use axum::{routing::get, Router};
use std::path::Path;

/// Bootstrap pages and robots.txt
pub fn bootstrap_routes() -> Router<AppState> {
    Router::new()
        .route("/robots.txt", get(handlers::robots))
        .route("/gui", get(handlers::gui))
        .route(
            "/user/reset-password/{reset_password_key}",
            get(handlers::reset_password),
        )
        .route("/public/{link}", get(handlers::public))
}

/// Plugin bundle and manifest
pub fn asset_routes(assets_dir: &Path) -> Router<AppState> {
    Router::new()
        .route_service("/index.json", assets::index_service(assets_dir))
        .nest_service("/plug", assets::plugin_service(assets_dir))
}

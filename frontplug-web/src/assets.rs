//! Plugin asset gateway
//!
//! Serves the plugin bundle from disk, preferring a `.gz` sibling when the
//! client accepts gzip. Nothing here is authorization scoped.

use std::path::{Path, PathBuf};
use tower_http::services::{ServeDir, ServeFile};

/// Manifest listing the available plugins
pub const INDEX_FILE: &str = "index.json";

/// Service for `/plug/*`, rooted at the bundle directory
pub fn plugin_service(assets_dir: &Path) -> ServeDir {
    ServeDir::new(assets_dir)
        .precompressed_gzip()
        .append_index_html_on_directories(false)
}

/// Service for `/index.json`
pub fn index_service(assets_dir: &Path) -> ServeFile {
    ServeFile::new(index_path(assets_dir)).precompressed_gzip()
}

pub fn index_path(assets_dir: &Path) -> PathBuf {
    assets_dir.join(INDEX_FILE)
}

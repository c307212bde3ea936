//! Frontplug Web Server
//!
//! Main web server implementation using Axum.

use crate::migration::{MigrationRunner, Version};
use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use frontplug_core::{MemoryConfigStore, SharedStore};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main frontplug web server
pub struct FrontplugServer {
    config: WebConfig,
    state: AppState,
}

impl FrontplugServer {
    /// Open the configuration store, run pending migrations and prepare the state
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let store: SharedStore = match &config.store_path {
            Some(path) => Arc::new(MemoryConfigStore::open(path).await?),
            None => Arc::new(MemoryConfigStore::new()),
        };

        Self::with_store(config, store).await
    }

    pub async fn with_store(config: WebConfig, store: SharedStore) -> WebResult<Self> {
        let state = AppState::new(config.clone(), store.clone())?;

        // writes happen here only, before the listener accepts traffic
        let runner = MigrationRunner::new(config.legacy_static_dir());
        if let Err(e) = runner.run(store.as_ref(), Version::current()).await {
            error!(error = %e, "Migrations failed, continuing startup");
        }

        Ok(Self { config, state })
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> WebResult<()> {
        self.start_with_shutdown(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> WebResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.config.address();

        info!("Starting frontplug web server");
        info!(assets = %self.config.assets_dir.display(), dev_mode = self.config.dev_mode);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app).with_graceful_shutdown(shutdown).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for FrontplugServer
pub struct FrontplugServerBuilder {
    config: WebConfig,
}

impl FrontplugServerBuilder {
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    pub fn from_config(config: WebConfig) -> Self {
        Self { config }
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    /// Set the plugin bundle directory
    pub fn assets_dir<P: Into<PathBuf>>(mut self, assets_dir: P) -> Self {
        self.config.assets_dir = assets_dir.into();
        self
    }

    /// Set the application data directory
    pub fn data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.config.data_dir = data_dir.into();
        self
    }

    /// Back the configuration store with a JSON file
    pub fn store_path<P: Into<PathBuf>>(mut self, store_path: P) -> Self {
        self.config.store_path = Some(store_path.into());
        self
    }

    pub fn jwt_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<FrontplugServer> {
        FrontplugServer::new(self.config).await
    }
}

impl Default for FrontplugServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontplug_core::ConfigStore;
    use serde_json::json;

    #[test]
    fn test_server_builder() {
        let builder = FrontplugServerBuilder::new()
            .host("localhost")
            .port(3000)
            .assets_dir("/srv/plugins")
            .dev_mode(true);

        assert_eq!(builder.config.host, "localhost");
        assert_eq!(builder.config.port, 3000);
        assert_eq!(builder.config.assets_dir, PathBuf::from("/srv/plugins"));
        assert!(builder.config.dev_mode);
    }

    #[tokio::test]
    async fn test_server_runs_migrations_on_creation() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("static").join("pydio");
        std::fs::create_dir_all(legacy.join("plugins")).unwrap();

        let server = FrontplugServerBuilder::new()
            .dev_mode(true)
            .data_dir(dir.path())
            .store_path(dir.path().join("config.json"))
            .build()
            .await
            .unwrap();

        let version = server
            .state()
            .store
            .get(&crate::migration::VERSION_KEY)
            .await
            .unwrap();
        assert_eq!(version, Some(json!(Version::current().to_string())));
        assert!(dir.path().join("config.json").exists());
        assert!(!legacy.exists());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let result = FrontplugServerBuilder::new().port(0).dev_mode(true).build().await;
        assert!(matches!(result, Err(WebError::Config(_))));
    }
}

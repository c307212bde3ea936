//! Integration test helpers
//!
//! Spawns the full application on a random port with a seeded configuration
//! store and a temporary plugin bundle.

#![allow(dead_code)]

use frontplug_access::UserRecord;
use frontplug_core::{MemoryConfigStore, SharedStore};
use frontplug_web::{auth::JwtIdentityResolver, create_app, AppState, WebConfig};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const JWT_SECRET: &str = "integration-test-secret";

/// Stand-in for a precompressed asset; served as-is, never decoded
pub const GZIPPED_ASSET: &[u8] = b"\x1f\x8bprecompressed";

// Ensure tracing is only initialized once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// Running test application
pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryConfigStore>,
    pub client: reqwest::Client,
    pub tokens: JwtIdentityResolver,
    pub assets: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestApp {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> reqwest::Response {
        let mut request = self.client.get(format!("{}{}", self.address, path));
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// Access token for `user`, signed with the server's secret
    pub fn token_for(&self, user: &UserRecord) -> String {
        self.tokens.issue(user).expect("Failed to issue token.")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Configuration tree shared by most tests
pub fn default_tree() -> Value {
    json!({
        "frontend": { "plugin": {
            "core.pydio": { "APPLICATION_TITLE": "Cells Test", "DB_PASSWORD": "hunter2" },
            "gui.ajax": { "GUI_THEME": "material" }
        }},
        "acl": {
            "defaults": { "actions": { "download": true } },
            "roles": {
                "editors": {
                    "priority": 10,
                    "workspaces": ["projects", "common"],
                    "actions": { "upload": true, "format_disk": true }
                },
                "staff": { "priority": 5, "workspaces": ["common", "hr"] }
            },
            "users": { "bob": { "workspaces": ["personal"] } },
            "workspaces": { "W1": { "actions": { "download": false } } }
        },
        "links": { "abc123": { "workspace": "W1" } },
        "services": { "pydio.grpc.mailer": { "password": "mailpass" } }
    })
}

pub fn test_config(assets_dir: &Path) -> WebConfig {
    WebConfig {
        host: "127.0.0.1".to_string(),
        assets_dir: assets_dir.to_path_buf(),
        jwt_secret: JWT_SECRET.to_string(),
        ..WebConfig::default()
    }
}

/// Plugin bundle with a manifest and one gzip-precompressed script
pub fn write_assets(dir: &Path) {
    let js = dir.join("gui.ajax").join("res").join("js");
    std::fs::create_dir_all(&js).expect("Failed to create asset dir.");
    std::fs::write(
        dir.join("index.json"),
        r#"{"plugins":["gui.ajax","core.pydio"]}"#,
    )
    .expect("Failed to write manifest.");
    std::fs::write(js.join("app.js"), "console.log('plain');").expect("Failed to write asset.");
    std::fs::write(js.join("app.js.gz"), GZIPPED_ASSET).expect("Failed to write asset.");
}

/// Spawn the application with `tree` as its configuration
pub async fn spawn_app_with(tree: Value, configure: impl FnOnce(&mut WebConfig)) -> TestApp {
    LazyLock::force(&TRACING);

    let assets = tempfile::tempdir().expect("Failed to create temp dir.");
    write_assets(assets.path());

    let mut config = test_config(assets.path());
    configure(&mut config);

    let store = Arc::new(MemoryConfigStore::from_value(tree));
    let shared: SharedStore = store.clone();
    let state = AppState::new(config, shared).expect("Failed to build state.");
    let app = create_app(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("Server error");
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build client."),
        tokens: JwtIdentityResolver::new(JWT_SECRET.as_bytes()),
        assets,
        shutdown: Some(shutdown_tx),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(default_tree(), |_| {}).await
}

/// JSON embedded in a bootstrap page
pub fn bootstrap_data(html: &str) -> Value {
    let marker = r#"<script type="application/json" id="bootstrap-data">"#;
    let start = html.find(marker).expect("No bootstrap data in page.") + marker.len();
    let end = start + html[start..].find("</script>").expect("Unterminated bootstrap data.");
    serde_json::from_str(&html[start..end]).expect("Bootstrap data is not JSON.")
}

//! Server configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `FRONTPLUG_*`
//! environment variables. Command line flags are applied on top by the binary.

use crate::{WebError, WebResult};
use config::{Config, Environment, File, FileFormat};
use frontplug_access::{is_language_tag, ScopeOrdering};
use frontplug_core::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the web server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Root of the plugin bundle served under `/plug`
    pub assets_dir: PathBuf,
    /// Application data directory
    pub data_dir: PathBuf,
    /// JSON file backing the configuration store; in-memory when absent
    pub store_path: Option<PathBuf>,
    /// Language used when a request carries no acceptable hint
    pub default_language: String,
    /// Allow-list of language tags; empty accepts any well-formed tag
    pub supported_languages: Vec<String>,
    /// Cookie carrying the session token
    pub session_cookie: String,
    /// Cookie carrying the preferred language
    pub lang_cookie: String,
    /// HS256 secret for session tokens
    pub jwt_secret: String,
    /// Whole-request read/write timeout
    pub request_timeout_secs: u64,
    /// Bound on identity and configuration lookups
    pub resolve_timeout_ms: u64,
    pub scope_ordering: ScopeOrdering,
    /// Enable development mode
    pub dev_mode: bool,
    pub logging: LoggingConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("frontplug");

        Self {
            host: "0.0.0.0".to_string(),
            port: 9025,
            assets_dir: PathBuf::from("static/plugins"),
            data_dir,
            store_path: None,
            default_language: "en".to_string(),
            supported_languages: Vec::new(),
            session_cookie: "token".to_string(),
            lang_cookie: "lang".to_string(),
            jwt_secret: String::new(),
            request_timeout_secs: 15,
            resolve_timeout_ms: 2000,
            scope_ordering: ScopeOrdering::default(),
            dev_mode: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl WebConfig {
    /// Load defaults, the optional TOML file and `FRONTPLUG_*` variables
    pub fn load(path: Option<&Path>) -> WebResult<Self> {
        let defaults = Config::try_from(&WebConfig::default()).map_err(config_error)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("FRONTPLUG")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("supported_languages")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_error)?;

        settings.try_deserialize().map_err(config_error)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> WebResult<()> {
        if self.host.trim().is_empty() {
            return Err(WebError::Config("host must not be empty".to_string()));
        }

        if self.port == 0 {
            return Err(WebError::Config("port must be greater than 0".to_string()));
        }

        if self.request_timeout_secs == 0 || self.resolve_timeout_ms == 0 {
            return Err(WebError::Config(
                "request_timeout_secs and resolve_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if !is_language_tag(&self.default_language) {
            return Err(WebError::Config(format!(
                "default_language '{}' is not a language tag",
                self.default_language
            )));
        }

        if let Some(tag) = self
            .supported_languages
            .iter()
            .find(|tag| !is_language_tag(tag))
        {
            return Err(WebError::Config(format!(
                "supported_languages entry '{}' is not a language tag",
                tag
            )));
        }

        if self.jwt_secret.is_empty() && !self.dev_mode {
            return Err(WebError::Config(
                "jwt_secret is required outside dev mode".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    /// Legacy static bundle location used when the store names none
    pub fn legacy_static_dir(&self) -> PathBuf {
        self.data_dir.join("static").join("pydio")
    }
}

fn config_error(err: config::ConfigError) -> WebError {
    WebError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // `load` reads the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn dev_config() -> WebConfig {
        WebConfig {
            dev_mode: true,
            ..WebConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = WebConfig::default();
        assert_eq!(config.address(), "0.0.0.0:9025");
        assert_eq!(config.default_language, "en");
        assert_eq!(config.session_cookie, "token");
        assert_eq!(config.scope_ordering, ScopeOrdering::RolePriority);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert!(config.data_dir.ends_with("frontplug"));
    }

    #[test]
    fn test_secret_required_outside_dev_mode() {
        assert!(WebConfig::default().validate().is_err());
        assert!(dev_config().validate().is_ok());

        let config = WebConfig {
            jwt_secret: "s3cret".to_string(),
            ..WebConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            WebConfig {
                port: 0,
                ..dev_config()
            },
            WebConfig {
                host: " ".to_string(),
                ..dev_config()
            },
            WebConfig {
                resolve_timeout_ms: 0,
                ..dev_config()
            },
            WebConfig {
                default_language: "english!".to_string(),
                ..dev_config()
            },
            WebConfig {
                supported_languages: vec!["fr".to_string(), "".to_string()],
                ..dev_config()
            },
        ];

        for config in cases {
            assert!(matches!(config.validate(), Err(WebError::Config(_))));
        }
    }

    #[test]
    fn test_legacy_static_dir_under_data_dir() {
        let config = WebConfig {
            data_dir: PathBuf::from("/var/lib/frontplug"),
            ..WebConfig::default()
        };
        assert_eq!(
            config.legacy_static_dir(),
            PathBuf::from("/var/lib/frontplug/static/pydio")
        );
    }

    #[test]
    fn test_load_from_toml_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
port = 8443
default_language = "fr"
supported_languages = ["fr", "en"]
scope_ordering = "alphabetical"

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = WebConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.port, 8443);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.default_language, "fr");
        assert_eq!(config.supported_languages, ["fr", "en"]);
        assert_eq!(config.scope_ordering, ScopeOrdering::Alphabetical);
        assert_eq!(config.logging.format, frontplug_core::LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let result = WebConfig::load(Some(Path::new("/nonexistent/frontplug.toml")));
        assert!(matches!(result, Err(WebError::Config(_))));
    }

    #[test]
    fn test_environment_overrides_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = 8443\ndefault_language = \"de\"").unwrap();

        let vars = [
            ("FRONTPLUG_PORT", "8111"),
            ("FRONTPLUG_LOGGING__LEVEL", "debug"),
            ("FRONTPLUG_SUPPORTED_LANGUAGES", "fr,en"),
            ("FRONTPLUG_JWT_SECRET", "12345"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        let loaded = WebConfig::load(Some(file.path()));
        for (key, _) in vars {
            std::env::remove_var(key);
        }

        let config = loaded.unwrap();
        assert_eq!(config.port, 8111);
        assert_eq!(config.default_language, "de");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.supported_languages, ["fr", "en"]);
        assert_eq!(config.jwt_secret, "12345");
        assert_eq!(config.store_path, None);
        assert!(config.validate().is_ok());
    }
}

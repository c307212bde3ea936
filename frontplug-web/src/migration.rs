//! Version-gated startup migrations
//!
//! The last migrated version is kept under `versions/frontplug-web`. A
//! migration runs when its target is above the recorded version and not above
//! the running one, so each target runs at most once per upgrade.

use crate::{WebError, WebResult};
use async_trait::async_trait;
use frontplug_core::ConfigStore;
use serde_json::{json, Value};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Store key holding the last migrated version
pub const VERSION_KEY: [&str; 2] = ["versions", "frontplug-web"];

/// Actor recorded for changes made by the service itself
pub const SYSTEM_ACTOR: &str = "pydio.system.user";

/// `major.minor.patch`, ordered numerically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Version of this build
    pub fn current() -> Self {
        Version::new(
            env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        )
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = String;

    /// Accepts an optional `v` prefix and ignores pre-release/build suffixes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core = s
            .trim()
            .trim_start_matches('v')
            .split(['-', '+'])
            .next()
            .unwrap_or_default();

        let parts = core
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("Invalid version: {}", s))?;

        match parts.as_slice() {
            [major, minor, patch] => Ok(Version::new(*major, *minor, *patch)),
            [major, minor] => Ok(Version::new(*major, *minor, 0)),
            _ => Err(format!("Invalid version: {}", s)),
        }
    }
}

/// Filesystem operations migrations are allowed to perform
pub trait LegacyFs: Send + Sync {
    /// Remove a file or directory tree. A missing path is not an error.
    fn remove_all(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl LegacyFs for DiskFs {
    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let result = match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
            Ok(_) => std::fs::remove_file(path),
            Err(e) => Err(e),
        };

        match result {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// What a migration can reach
pub struct MigrationEnv<'a> {
    pub store: &'a dyn ConfigStore,
    pub fs: &'a dyn LegacyFs,
    /// Legacy static bundle removed when the store names no `frontRoot`
    pub legacy_static_dir: &'a Path,
}

#[async_trait]
pub trait Migration: Send + Sync {
    fn target_version(&self) -> Version;

    fn name(&self) -> &'static str;

    async fn up(&self, env: &MigrationEnv<'_>) -> WebResult<()>;
}

/// Outcome of a runner pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from: Option<Version>,
    pub to: Version,
    pub applied: Vec<&'static str>,
}

pub struct MigrationRunner {
    migrations: Vec<Box<dyn Migration>>,
    fs: Arc<dyn LegacyFs>,
    legacy_static_dir: PathBuf,
}

impl MigrationRunner {
    /// Runner with the service's own migrations
    pub fn new(legacy_static_dir: impl Into<PathBuf>) -> Self {
        Self::empty(legacy_static_dir).with_migration(DropLegacyStatics)
    }

    pub fn empty(legacy_static_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations: Vec::new(),
            fs: Arc::new(DiskFs),
            legacy_static_dir: legacy_static_dir.into(),
        }
    }

    pub fn with_migration(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self.migrations.sort_by_key(|m| m.target_version());
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn LegacyFs>) -> Self {
        self.fs = fs;
        self
    }

    /// Bring the store up to `running`.
    ///
    /// A failing migration stops the pass and leaves the recorded version
    /// untouched, so it is attempted again on next start.
    pub async fn run(
        &self,
        store: &dyn ConfigStore,
        running: Version,
    ) -> WebResult<MigrationReport> {
        let from = recorded_version(store).await?;
        let mut report = MigrationReport {
            from,
            to: running,
            applied: Vec::new(),
        };

        if from.is_some_and(|from| from >= running) {
            info!(version = %running, "Configuration already migrated");
            return Ok(report);
        }

        let env = MigrationEnv {
            store,
            fs: self.fs.as_ref(),
            legacy_static_dir: &self.legacy_static_dir,
        };

        for migration in &self.migrations {
            let target = migration.target_version();
            if from.is_some_and(|from| target <= from) || target > running {
                continue;
            }

            info!(migration = migration.name(), target = %target, "Running migration");
            migration.up(&env).await?;
            report.applied.push(migration.name());
        }

        store.set(json!(running.to_string()), &VERSION_KEY).await?;
        let description = match from {
            Some(from) => format!("Upgrade from {} to {}", from, running),
            None => format!("Initialize at {}", running),
        };
        store.save(SYSTEM_ACTOR, &description).await?;

        info!(
            from = ?from.map(|v| v.to_string()),
            to = %running,
            applied = report.applied.len(),
            "Migrations complete"
        );
        Ok(report)
    }
}

async fn recorded_version(store: &dyn ConfigStore) -> WebResult<Option<Version>> {
    let value = store.get(&VERSION_KEY).await?;
    match value.as_ref().and_then(Value::as_str) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|e: String| {
            warn!(value = raw, "Unreadable migrated version");
            WebError::Migration(e)
        }),
    }
}

/// Removes the legacy static bundle and the configuration keys that pointed at it
#[derive(Debug, Clone, Copy, Default)]
pub struct DropLegacyStatics;

impl DropLegacyStatics {
    const LEGACY_KEYS: [&'static [&'static str]; 4] = [
        &["defaults", "frontRoot"],
        &["defaults", "fpm"],
        &["defaults", "fronts"],
        &["services", "pydio.frontends"],
    ];

    const TITLE_KEY: [&'static str; 4] = ["frontend", "plugin", "core.pydio", "APPLICATION_TITLE"];
}

#[async_trait]
impl Migration for DropLegacyStatics {
    fn target_version(&self) -> Version {
        Version::new(1, 2, 0)
    }

    fn name(&self) -> &'static str {
        "drop_legacy_statics"
    }

    async fn up(&self, env: &MigrationEnv<'_>) -> WebResult<()> {
        let front_root = env
            .store
            .get(&["defaults", "frontRoot"])
            .await?
            .as_ref()
            .and_then(Value::as_str)
            .filter(|root| !root.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| env.legacy_static_dir.to_path_buf());

        match env.fs.remove_all(&front_root) {
            Ok(()) => info!(path = %front_root.display(), "Removed legacy static data"),
            Err(e) => error!(
                path = %front_root.display(),
                error = %e,
                "Could not remove legacy static data, the folder can be deleted manually"
            ),
        }

        info!("Clearing unused configurations");
        for key in Self::LEGACY_KEYS {
            env.store.delete(key).await?;
        }

        let title = env.store.get(&Self::TITLE_KEY).await?;
        if title.as_ref().and_then(Value::as_str).unwrap_or_default().is_empty() {
            env.store
                .set(json!(crate::templates::DEFAULT_TITLE), &Self::TITLE_KEY)
                .await?;
        }

        match env.store.save(SYSTEM_ACTOR, "Upgrade to 1.2.0").await {
            Ok(version) => info!(version, "Cleaned unused configurations"),
            Err(e) => warn!(error = %e, "Could not save cleaned configuration"),
        }

        Ok(())
    }
}

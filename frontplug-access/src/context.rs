//! Per-request authorization context
//!
//! [`RequestContextBuilder::build`] is the only way to obtain a
//! [`RequestAuthContext`]. It either returns a complete context or an error;
//! nothing partially resolved ever reaches the renderer.

use crate::error::{ContextError, ResolutionError};
use crate::identity::{Credentials, Identity, IdentityResolver, UserRecord};
use crate::locale::{LocaleHints, LocaleNegotiator};
use crate::scope::{ResolvedScope, ScopeResolver};
use crate::vocabulary::{AclAction, AclParameter};
use frontplug_core::{ConfigSnapshot, SharedStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Bootstrap page a request is rendered for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    Gui,
    /// The key is opaque here; its validation belongs to the account service
    ResetPassword { key: String },
    Public { link: String },
}

impl EntryPoint {
    pub fn name(&self) -> &'static str {
        match self {
            EntryPoint::Gui => "gui",
            EntryPoint::ResetPassword { .. } => "reset_password",
            EntryPoint::Public { .. } => "public",
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            EntryPoint::Public { link } => Some(link),
            _ => None,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, EntryPoint::Public { .. })
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the builder reads from an HTTP request
#[derive(Debug, Clone)]
pub struct BootstrapRequest {
    pub entry: EntryPoint,
    pub credentials: Credentials,
    pub locale: LocaleHints,
}

impl BootstrapRequest {
    pub fn new(entry: EntryPoint) -> Self {
        Self {
            entry,
            credentials: Credentials::none(),
            locale: LocaleHints::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_locale(mut self, locale: LocaleHints) -> Self {
        self.locale = locale;
        self
    }
}

/// Immutable authorization context for one request
#[derive(Debug, Clone)]
pub struct RequestAuthContext {
    config: ConfigSnapshot,
    acl_parameters: BTreeMap<AclParameter, Value>,
    acl_actions: BTreeMap<AclAction, bool>,
    workspace_scopes: Vec<String>,
    identity: Identity,
    lang: String,
    entry: EntryPoint,
}

impl RequestAuthContext {
    /// Configuration snapshot in effect when the context was built
    pub fn config(&self) -> &ConfigSnapshot {
        &self.config
    }

    pub fn acl_parameters(&self) -> &BTreeMap<AclParameter, Value> {
        &self.acl_parameters
    }

    pub fn acl_actions(&self) -> &BTreeMap<AclAction, bool> {
        &self.acl_actions
    }

    /// Visible workspaces, highest precedence first
    pub fn workspace_scopes(&self) -> &[String] {
        &self.workspace_scopes
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.identity.user()
    }

    /// True exactly when there is no verified user
    pub fn no_claims(&self) -> bool {
        self.identity.is_anonymous()
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn entry(&self) -> &EntryPoint {
        &self.entry
    }

    pub fn can(&self, action: AclAction) -> bool {
        self.acl_actions.get(&action).copied().unwrap_or(false)
    }
}

/// Composes identity, scope and locale resolution
#[derive(Clone)]
pub struct RequestContextBuilder {
    store: SharedStore,
    identities: Arc<dyn IdentityResolver>,
    scopes: ScopeResolver,
    locale: LocaleNegotiator,
    timeout: Duration,
}

impl RequestContextBuilder {
    pub fn new(store: SharedStore, identities: Arc<dyn IdentityResolver>) -> Self {
        Self {
            store,
            identities,
            scopes: ScopeResolver::default(),
            locale: LocaleNegotiator::default(),
            timeout: Duration::from_secs(2),
        }
    }

    pub fn with_scopes(mut self, scopes: ScopeResolver) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_locale(mut self, locale: LocaleNegotiator) -> Self {
        self.locale = locale;
        self
    }

    /// Upper bound for identity and configuration lookups
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the context for one request, or fail as a whole
    pub async fn build(&self, request: &BootstrapRequest) -> Result<RequestAuthContext, ContextError> {
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, self.resolve(request)).await {
            Ok(result) => result,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(
                    entry = %request.entry,
                    elapsed_ms,
                    "Authorization context resolution timed out"
                );
                Err(ContextError::Timeout { elapsed_ms })
            }
        }
    }

    async fn resolve(&self, request: &BootstrapRequest) -> Result<RequestAuthContext, ContextError> {
        // shared links never carry the session of whoever opens them
        let identity = match &request.entry {
            EntryPoint::Public { .. } => Identity::Anonymous,
            _ => self.identities.resolve(&request.credentials).await?,
        };

        let config = self
            .store
            .snapshot()
            .await
            .map_err(|err| {
                err.log();
                ResolutionError::from(err)
            })?;

        let ResolvedScope {
            workspace_scopes,
            acl_parameters,
            acl_actions,
        } = self
            .scopes
            .resolve(&identity, request.entry.link(), &config)?;

        let lang = self.locale.negotiate(&request.locale);

        debug!(
            entry = %request.entry,
            identity = %identity,
            no_claims = identity.is_anonymous(),
            workspaces = workspace_scopes.len(),
            lang = %lang,
            config_version = config.version(),
            "Built request context"
        );

        Ok(RequestAuthContext {
            config,
            acl_parameters,
            acl_actions,
            workspace_scopes,
            identity,
            lang,
            entry: request.entry.clone(),
        })
    }
}

//! Application state shared by all handlers

use crate::{auth::JwtIdentityResolver, templates::BootstrapRenderer, WebConfig, WebResult};
use frontplug_access::{IdentityResolver, LocaleNegotiator, RequestContextBuilder, ScopeResolver};
use frontplug_core::SharedStore;
use std::sync::Arc;
use tracing::warn;

/// Secret used in dev mode when none is configured
const DEV_JWT_SECRET: &str = "frontplug-dev-secret-change-in-production";

/// Application state. Cloned per request; everything inside is shared and read-only.
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<WebConfig>,
    /// Configuration store, read through snapshots by request handlers
    pub store: SharedStore,
    /// Builds the per-request authorization context
    pub contexts: Arc<RequestContextBuilder>,
    pub renderer: BootstrapRenderer,
}

impl AppState {
    /// State resolving session tokens with the configured JWT secret
    pub fn new(config: WebConfig, store: SharedStore) -> WebResult<Self> {
        config.validate()?;

        let secret = if config.jwt_secret.is_empty() {
            warn!("No jwt_secret configured, using the development secret");
            DEV_JWT_SECRET.as_bytes().to_vec()
        } else {
            config.jwt_secret.as_bytes().to_vec()
        };

        let identities = Arc::new(JwtIdentityResolver::new(&secret));
        Ok(Self::with_identity_resolver(config, store, identities))
    }

    /// State with a caller-supplied identity resolver
    pub fn with_identity_resolver(
        config: WebConfig,
        store: SharedStore,
        identities: Arc<dyn IdentityResolver>,
    ) -> Self {
        let contexts = RequestContextBuilder::new(store.clone(), identities)
            .with_scopes(ScopeResolver::new(config.scope_ordering))
            .with_locale(LocaleNegotiator::new(
                &config.default_language,
                &config.supported_languages,
            ))
            .with_timeout(config.resolve_timeout());

        let renderer = BootstrapRenderer::new(config.dev_mode);

        Self {
            config: Arc::new(config),
            store,
            contexts: Arc::new(contexts),
            renderer,
        }
    }
}

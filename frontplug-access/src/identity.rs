//! Request identity
//!
//! A request is either made by an authenticated user or by an anonymous
//! visitor. There is no third, half-populated state.

use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Verified user information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique login
    pub login: String,
    /// Display name (optional)
    pub display_name: Option<String>,
    /// Email (optional)
    pub email: Option<String>,
    /// Role memberships granted by the identity provider
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserRecord {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            display_name: None,
            email: None,
            roles: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

/// Who is behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(UserRecord),
    /// No verified claims: visitor without a session, or a shared-link viewer
    Anonymous,
}

impl Identity {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Authenticated(user) => write!(f, "user:{}", user.login),
            Identity::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Session material carried by a request
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    bearer: Option<String>,
}

impl Credentials {
    pub fn none() -> Self {
        Self::default()
    }

    /// Blank tokens count as no credentials at all
    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        Self {
            bearer: (!token.is_empty()).then(|| token.to_string()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.bearer.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Resolves request credentials into an identity.
///
/// Absent credentials yield [`Identity::Anonymous`]; an error is returned only
/// when credentials are present and cannot be verified.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, credentials: &Credentials) -> Result<Identity, AuthError>;
}

/// Fixed token table, for development setups and tests
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, UserRecord>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user: UserRecord) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        match credentials.token() {
            None => Ok(Identity::Anonymous),
            Some(token) => self
                .tokens
                .get(token)
                .cloned()
                .map(Identity::Authenticated)
                .ok_or(AuthError::InvalidToken),
        }
    }
}

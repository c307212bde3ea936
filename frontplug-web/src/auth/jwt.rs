//! JWT session tokens

use async_trait::async_trait;
use chrono::{Duration, Utc};
use frontplug_access::{AuthError, Credentials, Identity, IdentityResolver, UserRecord};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Access tokens are valid for one hour
const ACCESS_TOKEN_TTL_HOURS: i64 = 1;

/// JWT signing and verification keys
#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user login)
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Role memberships asserted by the identity service
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    pub token_type: TokenType,
}

/// Token type enumeration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl Claims {
    /// Create new access token claims
    pub fn new_access_token(user: &UserRecord) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(ACCESS_TOKEN_TTL_HOURS);

        Self {
            sub: user.login.clone(),
            name: user.display_name.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            token_type: TokenType::Access,
        }
    }

    /// Convert claims to a user record
    pub fn to_user(&self) -> Result<UserRecord, AuthError> {
        if self.token_type != TokenType::Access {
            return Err(AuthError::InvalidTokenType);
        }

        if self.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(UserRecord {
            login: self.sub.clone(),
            display_name: self.name.clone(),
            email: self.email.clone(),
            roles: self.roles.clone(),
        })
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Resolves bearer tokens signed with the shared HS256 secret
#[derive(Clone)]
pub struct JwtIdentityResolver {
    keys: Keys,
    validation: Validation,
}

impl JwtIdentityResolver {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            keys: Keys::new(secret),
            validation,
        }
    }

    /// Mint a token for the given claims
    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys.encoding).map_err(|e| {
            warn!("Failed to encode JWT token: {}", e);
            AuthError::InvalidToken
        })
    }

    /// Mint an access token for `user`
    pub fn issue(&self, user: &UserRecord) -> Result<String, AuthError> {
        self.encode(&Claims::new_access_token(user))
    }

    /// Verify and decode token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    debug!("Token verification failed: {}", e);
                    AuthError::InvalidToken
                }
            })?;

        let claims = token_data.claims;

        if claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        match credentials.token() {
            None => Ok(Identity::Anonymous),
            Some(token) => {
                let user = self.verify_token(token)?.to_user()?;
                Ok(Identity::Authenticated(user))
            }
        }
    }
}

//! Request credential and locale extraction

pub mod jwt;

pub use jwt::{Claims, JwtIdentityResolver, TokenType};

use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::{header::ACCEPT_LANGUAGE, header::AUTHORIZATION, request::Parts, HeaderMap, Uri},
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};
use frontplug_access::{AuthError, Credentials, LocaleHints};
use std::convert::Infallible;

/// Session material and locale hints carried by a bootstrap request.
///
/// Extraction never rejects: a malformed `Authorization` header is kept as an
/// error so authenticated entry points can refuse it while public links ignore it.
#[derive(Debug, Clone)]
pub struct BootstrapHints {
    pub credentials: Result<Credentials, AuthError>,
    pub locale: LocaleHints,
}

impl<S> FromRequestParts<S> for BootstrapHints
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let credentials =
            extract_credentials(&parts.headers, &jar, &app_state.config.session_cookie);

        let locale = LocaleHints {
            query: lang_parameter(&parts.uri),
            cookie: jar
                .get(&app_state.config.lang_cookie)
                .map(|cookie| cookie.value().to_string()),
            accept_language: parts
                .headers
                .get(ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        };

        Ok(Self {
            credentials,
            locale,
        })
    }
}

/// First `lang` query parameter; repeated or unrelated parameters are ignored
fn lang_parameter(uri: &Uri) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .find(|(key, _)| key == "lang")
        .map(|(_, value)| value)
}

/// Bearer token from `Authorization`, falling back to the session cookie.
///
/// A `Bearer` scheme with a blank token counts as no credentials, like a blank cookie.
pub fn extract_credentials(
    headers: &HeaderMap,
    jar: &CookieJar,
    session_cookie: &str,
) -> Result<Credentials, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        if value
            .to_str()
            .is_ok_and(|raw| raw.trim().eq_ignore_ascii_case("bearer"))
        {
            return Ok(Credentials::none());
        }

        return headers
            .typed_get::<Authorization<Bearer>>()
            .map(|Authorization(bearer)| Credentials::bearer(bearer.token()))
            .ok_or_else(|| {
                AuthError::MalformedCredentials("expected a Bearer authorization".to_string())
            });
    }

    Ok(jar
        .get(session_cookie)
        .map(|cookie| Credentials::bearer(cookie.value()))
        .unwrap_or_default())
}

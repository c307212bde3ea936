//! Bootstrap page and robots handlers

use crate::{auth::BootstrapHints, AppState, WebResult};
use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::{Html, IntoResponse},
};
use frontplug_access::{BootstrapRequest, ContextError, Credentials, EntryPoint};
use tracing::debug;

pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /";

/// `GET /robots.txt`
pub async fn robots() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/plain")], ROBOTS_TXT)
}

/// `GET /gui`
pub async fn gui(State(state): State<AppState>, hints: BootstrapHints) -> WebResult<Html<String>> {
    render_entry(&state, EntryPoint::Gui, hints).await
}

/// `GET /user/reset-password/{resetPasswordKey}`
pub async fn reset_password(
    State(state): State<AppState>,
    Path(key): Path<String>,
    hints: BootstrapHints,
) -> WebResult<Html<String>> {
    render_entry(&state, EntryPoint::ResetPassword { key }, hints).await
}

/// `GET /public/{link}`
pub async fn public(
    State(state): State<AppState>,
    Path(link): Path<String>,
    hints: BootstrapHints,
) -> WebResult<Html<String>> {
    render_entry(&state, EntryPoint::Public { link }, hints).await
}

async fn render_entry(
    state: &AppState,
    entry: EntryPoint,
    hints: BootstrapHints,
) -> WebResult<Html<String>> {
    let credentials = match hints.credentials {
        Ok(credentials) => credentials,
        // the session of whoever opens a shared link is irrelevant to it
        Err(err) if entry.is_public() => {
            debug!(error = %err, "Ignoring malformed credentials on public link");
            Credentials::none()
        }
        Err(err) => return Err(ContextError::Auth(err).into()),
    };

    let request = BootstrapRequest::new(entry)
        .with_credentials(credentials)
        .with_locale(hints.locale);

    let context = state.contexts.build(&request).await?;
    let body = state.renderer.render(&context)?;

    Ok(Html(body))
}

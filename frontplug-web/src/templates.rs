//! Bootstrap page rendering
//!
//! Each entry point renders an askama template with the request context
//! embedded as JSON. Only vocabulary-keyed ACL maps, the workspace list and
//! the user record are serialized; the configuration snapshot never is.

use crate::WebResult;
use askama::Template;
use frontplug_access::{AclAction, AclParameter, EntryPoint, RequestAuthContext};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Title used until an application title is configured
pub const DEFAULT_TITLE: &str = "Pydio Cells";

/// Main GUI page template
#[derive(Template)]
#[template(path = "gui.html")]
pub struct GuiTemplate<'a> {
    pub title: &'a str,
    pub lang: &'a str,
    pub bootstrap: &'a str,
    pub dev_mode: bool,
}

/// Password reset page template
#[derive(Template)]
#[template(path = "reset_password.html")]
pub struct ResetPasswordTemplate<'a> {
    pub title: &'a str,
    pub lang: &'a str,
    pub bootstrap: &'a str,
    pub dev_mode: bool,
}

/// Shared link page template
#[derive(Template)]
#[template(path = "public.html")]
pub struct PublicTemplate<'a> {
    pub title: &'a str,
    pub lang: &'a str,
    pub bootstrap: &'a str,
    pub dev_mode: bool,
}

/// User data exposed to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapUser<'a> {
    pub login: &'a str,
    pub display_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub roles: &'a [String],
}

/// Data embedded in every bootstrap page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapData<'a> {
    pub entry: &'static str,
    pub lang: &'a str,
    pub no_claims: bool,
    pub user: Option<BootstrapUser<'a>>,
    pub workspace_scopes: &'a [String],
    pub acl_parameters: &'a BTreeMap<AclParameter, Value>,
    pub acl_actions: &'a BTreeMap<AclAction, bool>,
    pub config_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_password_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_link: Option<&'a str>,
}

impl<'a> BootstrapData<'a> {
    pub fn from_context(context: &'a RequestAuthContext) -> Self {
        let (reset_password_key, public_link) = match context.entry() {
            EntryPoint::Gui => (None, None),
            EntryPoint::ResetPassword { key } => (Some(key.as_str()), None),
            EntryPoint::Public { link } => (None, Some(link.as_str())),
        };

        Self {
            entry: context.entry().name(),
            lang: context.lang(),
            no_claims: context.no_claims(),
            user: context.user().map(|user| BootstrapUser {
                login: &user.login,
                display_name: user.display_name.as_deref(),
                email: user.email.as_deref(),
                roles: &user.roles,
            }),
            workspace_scopes: context.workspace_scopes(),
            acl_parameters: context.acl_parameters(),
            acl_actions: context.acl_actions(),
            config_version: context.config().version(),
            reset_password_key,
            public_link,
        }
    }
}

/// Renders bootstrap pages from a completed request context
#[derive(Debug, Clone, Default)]
pub struct BootstrapRenderer {
    dev_mode: bool,
}

impl BootstrapRenderer {
    pub fn new(dev_mode: bool) -> Self {
        Self { dev_mode }
    }

    /// Render the page for the context's entry point.
    ///
    /// The whole body is produced before anything is written to the response.
    pub fn render(&self, context: &RequestAuthContext) -> WebResult<String> {
        let bootstrap = script_safe_json(&BootstrapData::from_context(context))?;
        let title = context
            .acl_parameters()
            .get(&AclParameter::ApplicationTitle)
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
            .unwrap_or(DEFAULT_TITLE);
        let lang = context.lang();
        let dev_mode = self.dev_mode;

        let html = match context.entry() {
            EntryPoint::Gui => GuiTemplate {
                title,
                lang,
                bootstrap: &bootstrap,
                dev_mode,
            }
            .render()?,
            EntryPoint::ResetPassword { .. } => ResetPasswordTemplate {
                title,
                lang,
                bootstrap: &bootstrap,
                dev_mode,
            }
            .render()?,
            EntryPoint::Public { .. } => PublicTemplate {
                title,
                lang,
                bootstrap: &bootstrap,
                dev_mode,
            }
            .render()?,
        };

        Ok(html)
    }
}

/// JSON that cannot close or open markup inside a `<script>` element
fn script_safe_json<T: Serialize>(value: &T) -> WebResult<String> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

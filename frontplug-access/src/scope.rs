//! Workspace scopes and ACL resolution
//!
//! Reads from a [`ConfigSnapshot`] only, so resolution is a pure function of
//! the identity and the snapshot. Store layout:
//!
//! ```text
//! frontend/plugin/<plugin>/<KEY>          global parameter defaults
//! acl/defaults/actions/<action>           global action defaults
//! acl/roles/<role>/{priority, workspaces, parameters, actions}
//! acl/users/<login>/{roles, workspaces, parameters, actions}
//! acl/workspaces/<workspace>/{parameters, actions}
//! links/<link>/workspace                  workspace bound to a share link
//! ```

use crate::error::ResolutionError;
use crate::identity::{Identity, UserRecord};
use crate::layers::{resolve_layers, LayerKind};
use crate::vocabulary::{AclAction, AclParameter};
use frontplug_core::ConfigSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Order in which visible workspaces are listed (and take precedence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeOrdering {
    /// Highest granting role priority first, workspace id on ties
    #[default]
    RolePriority,
    /// Workspace id only
    Alphabetical,
}

impl fmt::Display for ScopeOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeOrdering::RolePriority => write!(f, "role_priority"),
            ScopeOrdering::Alphabetical => write!(f, "alphabetical"),
        }
    }
}

impl FromStr for ScopeOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "role_priority" => Ok(ScopeOrdering::RolePriority),
            "alphabetical" => Ok(ScopeOrdering::Alphabetical),
            _ => Err(format!("Unknown scope ordering: {}", s)),
        }
    }
}

/// Scoped view of the access configuration for one identity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedScope {
    pub workspace_scopes: Vec<String>,
    pub acl_parameters: BTreeMap<AclParameter, Value>,
    pub acl_actions: BTreeMap<AclAction, bool>,
}

/// A role the identity holds, as configured in the store
#[derive(Debug, Clone)]
struct RoleGrant {
    id: String,
    priority: i64,
}

/// Who the scope is computed for
#[derive(Clone, Copy)]
enum Subject<'a> {
    User(&'a UserRecord),
    Visitor,
    Link(&'a str),
}

#[derive(Debug, Clone, Default)]
pub struct ScopeResolver {
    ordering: ScopeOrdering,
}

impl ScopeResolver {
    pub fn new(ordering: ScopeOrdering) -> Self {
        Self { ordering }
    }

    /// Resolve scopes and ACLs.
    ///
    /// When `link` is set the result is restricted to the workspace bound to
    /// that link and no user or role layer applies, whatever `identity` holds.
    pub fn resolve(
        &self,
        identity: &Identity,
        link: Option<&str>,
        config: &ConfigSnapshot,
    ) -> Result<ResolvedScope, ResolutionError> {
        let subject = match (link, identity) {
            (Some(link), _) => Subject::Link(link),
            (None, Identity::Authenticated(user)) => Subject::User(user),
            (None, Identity::Anonymous) => Subject::Visitor,
        };

        let (roles, workspace_scopes) = match subject {
            Subject::User(user) => {
                let roles = role_grants(user, config);
                let workspaces = self.order_workspaces(user, &roles, config);
                (roles, workspaces)
            }
            Subject::Visitor => (Vec::new(), Vec::new()),
            Subject::Link(link) => {
                let workspace = config
                    .get_str(&["links", link, "workspace"])
                    .filter(|w| !w.is_empty())
                    .ok_or_else(|| ResolutionError::UnknownLink {
                        link: link.to_string(),
                    })?;
                (Vec::new(), vec![workspace.to_string()])
            }
        };

        let user = match subject {
            Subject::User(user) => Some(user.login.as_str()),
            _ => None,
        };
        let layers = LayerSources {
            config,
            roles: &roles,
            user,
            workspaces: &workspace_scopes,
        };

        let acl_parameters = AclParameter::ALL
            .into_iter()
            .filter_map(|parameter| {
                layers
                    .parameter(parameter)
                    .map(|resolved| (parameter, resolved))
            })
            .collect();

        let acl_actions = AclAction::ALL
            .into_iter()
            .map(|action| (action, layers.action(action)))
            .collect();

        debug!(
            subject = %identity,
            link = link.unwrap_or(""),
            roles = roles.len(),
            workspaces = workspace_scopes.len(),
            "Resolved access scope"
        );

        Ok(ResolvedScope {
            workspace_scopes,
            acl_parameters,
            acl_actions,
        })
    }

    fn order_workspaces(
        &self,
        user: &UserRecord,
        roles: &[RoleGrant],
        config: &ConfigSnapshot,
    ) -> Vec<String> {
        // workspace -> highest granting priority
        let mut granted: BTreeMap<String, i64> = BTreeMap::new();
        let mut grant = |workspace: String, priority: i64| {
            if workspace.is_empty() {
                return;
            }
            granted
                .entry(workspace)
                .and_modify(|p| *p = (*p).max(priority))
                .or_insert(priority);
        };

        for role in roles {
            let path = ["acl", "roles", role.id.as_str(), "workspaces"];
            for workspace in config.string_list(&path) {
                grant(workspace, role.priority);
            }
        }
        let path = ["acl", "users", user.login.as_str(), "workspaces"];
        for workspace in config.string_list(&path) {
            grant(workspace, 0);
        }

        let mut ordered: Vec<(String, i64)> = granted.into_iter().collect();
        match self.ordering {
            ScopeOrdering::RolePriority => ordered.sort_by(|(a_id, a_p), (b_id, b_p)| {
                b_p.cmp(a_p).then_with(|| a_id.cmp(b_id))
            }),
            ScopeOrdering::Alphabetical => ordered.sort_by(|(a, _), (b, _)| a.cmp(b)),
        }
        ordered.into_iter().map(|(workspace, _)| workspace).collect()
    }
}

/// Roles held by the user that exist in the store, lowest precedence first
fn role_grants(user: &UserRecord, config: &ConfigSnapshot) -> Vec<RoleGrant> {
    let held: BTreeSet<String> = user
        .roles
        .iter()
        .cloned()
        .chain(config.string_list(&["acl", "users", user.login.as_str(), "roles"]))
        .collect();

    let mut roles: Vec<RoleGrant> = held
        .into_iter()
        .filter(|id| config.get(&["acl", "roles", id.as_str()]).is_some())
        .map(|id| RoleGrant {
            priority: config
                .get_i64(&["acl", "roles", id.as_str(), "priority"])
                .unwrap_or(0),
            id,
        })
        .collect();

    // ascending priority; on ties the alphabetically first role is applied last
    roles.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| b.id.cmp(&a.id)));
    roles
}

/// The ordered layers a value is looked up in
struct LayerSources<'a> {
    config: &'a ConfigSnapshot,
    roles: &'a [RoleGrant],
    user: Option<&'a str>,
    /// Highest precedence first
    workspaces: &'a [String],
}

impl<'a> LayerSources<'a> {
    /// Role, user and workspace layers for one key, in fold order
    fn overrides(&self, section: &str, key: &str) -> Vec<(LayerKind, Option<&'a Value>)> {
        let config = self.config;
        let mut layers = Vec::with_capacity(self.roles.len() + 1 + self.workspaces.len());

        for role in self.roles {
            layers.push((
                LayerKind::Role,
                config.get(&["acl", "roles", role.id.as_str(), section, key]),
            ));
        }
        if let Some(login) = self.user {
            layers.push((
                LayerKind::User,
                config.get(&["acl", "users", login, section, key]),
            ));
        }
        // applied last-to-first so the first workspace wins
        for workspace in self.workspaces.iter().rev() {
            layers.push((
                LayerKind::Workspace,
                config.get(&["acl", "workspaces", workspace.as_str(), section, key]),
            ));
        }

        layers
    }

    fn parameter(&self, parameter: AclParameter) -> Option<Value> {
        let (plugin, key) = parameter.plugin_key();
        let default = (
            LayerKind::Default,
            self.config.get(&["frontend", "plugin", plugin, key]),
        );

        resolve_layers(
            std::iter::once(default).chain(self.overrides("parameters", parameter.as_str())),
        )
        .map(|resolved| resolved.value.clone())
    }

    /// Absent everywhere means denied; non-boolean values are ignored
    fn action(&self, action: AclAction) -> bool {
        let default = (
            LayerKind::Default,
            self.config
                .get(&["acl", "defaults", "actions", action.as_str()]),
        );

        resolve_layers(
            std::iter::once(default)
                .chain(self.overrides("actions", action.as_str()))
                .map(|(kind, value)| (kind, value.and_then(Value::as_bool))),
        )
        .map(|resolved| resolved.value)
        .unwrap_or(false)
    }
}

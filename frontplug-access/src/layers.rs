//! Layered override resolution
//!
//! Values are looked up in an ordered list of layers
//! (global default, roles, user, workspaces). A present layer replaces
//! whatever an earlier layer produced; absent layers are skipped.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Default,
    Role,
    User,
    Workspace,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Default => write!(f, "default"),
            LayerKind::Role => write!(f, "role"),
            LayerKind::User => write!(f, "user"),
            LayerKind::Workspace => write!(f, "workspace"),
        }
    }
}

/// Winning value and the layer it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub from: LayerKind,
}

/// Fold layers in order, last present value wins
pub fn resolve_layers<T, I>(layers: I) -> Option<Resolved<T>>
where
    I: IntoIterator<Item = (LayerKind, Option<T>)>,
{
    layers.into_iter().fold(None, |resolved, (from, value)| {
        value.map(|value| Resolved { value, from }).or(resolved)
    })
}

//! Authorization-scoped request context
//!
//! Turns an incoming bootstrap request into an immutable [`RequestAuthContext`]:
//! - identity: authenticated user or anonymous visitor ([`identity`])
//! - scope: visible workspaces and layered ACL values ([`scope`], [`layers`])
//! - locale: negotiated language tag ([`locale`])
//!
//! ACL keys are restricted to the closed vocabulary in [`vocabulary`].

pub mod context;
pub mod error;
pub mod identity;
pub mod layers;
pub mod locale;
pub mod scope;
pub mod vocabulary;

pub use context::{BootstrapRequest, EntryPoint, RequestAuthContext, RequestContextBuilder};
pub use error::{AuthError, ContextError, ResolutionError};
pub use identity::{Credentials, Identity, IdentityResolver, StaticIdentityResolver, UserRecord};
pub use layers::{resolve_layers, LayerKind, Resolved};
pub use locale::{is_language_tag, LocaleHints, LocaleNegotiator};
pub use scope::{ResolvedScope, ScopeOrdering, ScopeResolver};
pub use vocabulary::{AclAction, AclParameter};

//! Frontplug Core - shared building blocks for the frontplug gateway
//!
//! Holds the hierarchical configuration store, the store error type and the
//! logging bootstrap used by every other crate of the workspace.

pub mod error;
pub mod logging;
pub mod store;

pub use error::*;
pub use logging::*;
pub use store::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use serde_json::Value;

//! Plugin registry.
//!
//! Plugins are in-process handlers registered under a stable string id.
//! They take a JSON request and return a JSON result. A registry can only
//! be built when the resolved bindings enable plugin support.
//!
//! # Protocol
//!
//! **Request**:
//! ```json
//! { "plugin": "utils-conf.option", "input": { "key": "log-level" } }
//! ```
//!
//! **Response**:
//! ```json
//! { "plugin": "utils-conf.option", "status": "ok", "output": { "key": "log-level", "value": "info" } }
//! ```

pub mod builtin;
pub mod registry;

pub use builtin::{BindingsPlugin, OptionQueryPlugin};
pub use registry::PluginRegistry;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uc_common::Result;

/// A handler reachable through the registry.
pub trait PluginHandler: Send + Sync {
    /// Stable identifier, unique within a registry.
    fn id(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str {
        ""
    }

    fn invoke(&self, input: &Value) -> Result<Value>;
}

/// Request addressed to a plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRequest {
    pub plugin: String,
    #[serde(default)]
    pub input: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    Ok,
    Failed,
}

/// Outcome of dispatching a [`PluginRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginResponse {
    pub plugin: String,
    pub status: PluginStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Listing entry for a registered plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    pub id: String,
    pub description: String,
}

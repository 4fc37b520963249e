use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use uc_common::{Error, Result};
use uc_config::BindingSet;

use super::{PluginHandler, PluginInfo, PluginRequest, PluginResponse, PluginStatus};

/// Handlers keyed by id. Built once, then only read.
#[derive(Default)]
pub struct PluginRegistry {
    handlers: BTreeMap<String, Box<dyn PluginHandler>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl PluginRegistry {
    /// Empty registry. Fails when the bindings disable plugin support.
    pub fn new(bindings: &BindingSet) -> Result<Self> {
        if !bindings.plugin_support {
            return Err(Error::PluginsDisabled);
        }
        Ok(Self::default())
    }

    pub fn register(&mut self, handler: Box<dyn PluginHandler>) -> Result<()> {
        let id = handler.id().to_string();
        if self.handlers.contains_key(&id) {
            return Err(Error::DuplicatePlugin { id });
        }
        debug!(plugin = %id, "plugin registered");
        self.handlers.insert(id, handler);
        Ok(())
    }

    pub fn with(mut self, handler: Box<dyn PluginHandler>) -> Result<Self> {
        self.register(handler)?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&dyn PluginHandler> {
        self.handlers.get(id).map(|h| h.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn list(&self) -> Vec<PluginInfo> {
        self.handlers
            .values()
            .map(|h| PluginInfo {
                id: h.id().to_string(),
                description: h.description().to_string(),
            })
            .collect()
    }

    /// Invoke the handler registered under `id`.
    pub fn invoke(&self, id: &str, input: &Value) -> Result<Value> {
        let handler = self.get(id).ok_or_else(|| Error::PluginNotFound { id: id.to_string() })?;
        handler.invoke(input).map_err(|e| match e {
            Error::PluginFailed { .. } => e,
            other => Error::PluginFailed {
                id: id.to_string(),
                message: other.to_string(),
            },
        })
    }

    /// Dispatch a request, reporting handler failures in the response.
    ///
    /// An unknown plugin id is still an error.
    pub fn dispatch(&self, request: &PluginRequest) -> Result<PluginResponse> {
        if !self.contains(&request.plugin) {
            return Err(Error::PluginNotFound {
                id: request.plugin.clone(),
            });
        }
        Ok(match self.invoke(&request.plugin, &request.input) {
            Ok(output) => PluginResponse {
                plugin: request.plugin.clone(),
                status: PluginStatus::Ok,
                output: Some(output),
                message: None,
            },
            Err(e) => {
                warn!(plugin = %request.plugin, error = %e, "plugin failed");
                PluginResponse {
                    plugin: request.plugin.clone(),
                    status: PluginStatus::Failed,
                    output: None,
                    message: Some(e.to_string()),
                }
            }
        })
    }
}

//! Plugins that ship with uc-core.

use serde_json::{json, Value};
use uc_common::{Error, Result};
use uc_config::{BindingSet, OptionMap};

use super::PluginHandler;

/// `utils-conf.option`: look up one resolved option by key.
#[derive(Debug, Clone)]
pub struct OptionQueryPlugin {
    effective: OptionMap,
}

impl OptionQueryPlugin {
    pub const ID: &'static str = "utils-conf.option";

    /// `effective` is the fully resolved mapping, defaults included.
    pub fn new(effective: OptionMap) -> Self {
        Self { effective }
    }
}

impl PluginHandler for OptionQueryPlugin {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Resolved value of one option: {\"key\": \"log-level\"}"
    }

    fn invoke(&self, input: &Value) -> Result<Value> {
        let key = input
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Config("input must be an object with a string 'key'".into()))?;
        let key = uc_config::value::normalize_key(key);
        let value = self
            .effective
            .get(&key)
            .ok_or_else(|| Error::UnknownOption(key.clone()))?;
        Ok(json!({ "key": key, "value": value }))
    }
}

/// `utils-conf.bindings`: the bound set and its fingerprint.
#[derive(Debug, Clone)]
pub struct BindingsPlugin {
    bindings: BindingSet,
}

impl BindingsPlugin {
    pub const ID: &'static str = "utils-conf.bindings";

    pub fn new(bindings: BindingSet) -> Self {
        Self { bindings }
    }
}

impl PluginHandler for BindingsPlugin {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Bound symbols and their fingerprint"
    }

    fn invoke(&self, _input: &Value) -> Result<Value> {
        Ok(json!({
            "fingerprint": self.bindings.fingerprint()?,
            "bindings": serde_json::to_value(&self.bindings)?,
        }))
    }
}

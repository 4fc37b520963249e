//! Raw option values and the externally supplied option mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;

/// A value as written in a configuration source, before it is checked
/// against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    UInt(u64),
    Text(String),
    List(Vec<String>),
}

impl OptionValue {
    /// Parse a literal coming from an environment variable or a `key=value`
    /// override. Booleans and unsigned integers are recognized; everything
    /// else stays text and is coerced later by the option's kind.
    pub fn parse_literal(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "true" => return OptionValue::Bool(true),
            "false" => return OptionValue::Bool(false),
            _ => {}
        }
        if let Ok(n) = raw.parse::<u64>() {
            return OptionValue::UInt(n);
        }
        OptionValue::Text(raw.to_string())
    }

    /// Short name of the value's shape, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::UInt(_) => "unsigned integer",
            OptionValue::Text(_) => "string",
            OptionValue::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            OptionValue::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::UInt(n) => write!(f, "{}", n),
            OptionValue::Text(s) => write!(f, "{}", s),
            OptionValue::List(items) => write!(f, "{}", items.join("|")),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<u64> for OptionValue {
    fn from(n: u64) -> Self {
        OptionValue::UInt(n)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<Vec<&str>> for OptionValue {
    fn from(items: Vec<&str>) -> Self {
        OptionValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Normalize a key so `LOG_LEVEL`, `log_level` and `log-level` all name the
/// same option.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('_', "-")
}

/// A fixed mapping from option key to selected value.
///
/// Keys are stored normalized. Iteration order is sorted by key, so two maps
/// with the same content always resolve identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionMap(BTreeMap<String, OptionValue>);

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<OptionValue>) -> Option<OptionValue> {
        self.0.insert(normalize_key(key), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        self.0.remove(&normalize_key(key))
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(&normalize_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(&normalize_key(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self`; entries in `other` win.
    pub fn merge(&mut self, other: OptionMap) {
        self.0.extend(other.0);
    }

    /// Parse a flat TOML table (`log-level = "info"`).
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, OptionValue> = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// Parse a flat JSON object (`{"log-level": "info"}`).
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, OptionValue> = serde_json::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// Render as a flat TOML table.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(&self.0)?)
    }

    fn from_raw(raw: BTreeMap<String, OptionValue>) -> Self {
        Self(
            raw.into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect(),
        )
    }
}

impl FromIterator<(String, OptionValue)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_recognizes_shapes() {
        assert_eq!(OptionValue::parse_literal("true"), OptionValue::Bool(true));
        assert_eq!(OptionValue::parse_literal("FALSE"), OptionValue::Bool(false));
        assert_eq!(OptionValue::parse_literal("16"), OptionValue::UInt(16));
        assert_eq!(
            OptionValue::parse_literal(" error-log "),
            OptionValue::Text("error-log".into())
        );
    }

    #[test]
    fn keys_are_normalized() {
        let map = OptionMap::new().with("LOG_LEVEL", "debug");
        assert!(map.contains("log-level"));
        assert_eq!(map.get("log_level"), Some(&OptionValue::Text("debug".into())));
    }

    #[test]
    fn toml_flat_table_parses_all_shapes() {
        let map = OptionMap::from_toml_str(
            r#"
            schema-version = "1.5.0"
            log-level = "debug"
            trace-on-enter-exit = true
            platform-heap-align = 16
            platform-heap-caps = ["default", "8bit"]
            "#,
        )
        .unwrap();
        assert_eq!(map.len(), 5);
        assert_eq!(map.get("trace-on-enter-exit"), Some(&OptionValue::Bool(true)));
        assert_eq!(map.get("platform-heap-align"), Some(&OptionValue::UInt(16)));
        assert_eq!(
            map.get("platform-heap-caps"),
            Some(&OptionValue::List(vec!["default".into(), "8bit".into()]))
        );
    }

    #[test]
    fn json_object_parses() {
        let map = OptionMap::from_json_str(r#"{"log_level": "warning", "plugin-support": false}"#)
            .unwrap();
        assert_eq!(map.get("log-level").and_then(OptionValue::as_text), Some("warning"));
        assert_eq!(map.get("plugin-support").and_then(OptionValue::as_bool), Some(false));
    }

    #[test]
    fn merge_prefers_overlay() {
        let mut base = OptionMap::new().with("log-level", "info").with("plugin-support", true);
        base.merge(OptionMap::new().with("log-level", "error"));
        assert_eq!(base.get("log-level").and_then(OptionValue::as_text), Some("error"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn toml_output_reparses() {
        let map = OptionMap::new()
            .with("log-level", "none")
            .with("platform-heap-caps", vec!["spiram"]);
        let text = map.to_toml_string().unwrap();
        assert_eq!(OptionMap::from_toml_str(&text).unwrap(), map);
    }
}

//! Option mapping sources.
//!
//! Precedence, highest first: command-line overrides, `UTILS_CONF_*`
//! environment variables, the configuration file, documented defaults.
//! The file is the explicit path if given, otherwise
//! `$XDG_CONFIG_HOME/utils-conf/utils_conf.toml` when it exists.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::catalog::lookup;
use crate::error::ConfigError;
use crate::value::{normalize_key, OptionMap, OptionValue};

/// Prefix for environment overrides (`UTILS_CONF_LOG_LEVEL=debug`).
pub const ENV_PREFIX: &str = "UTILS_CONF_";

/// Environment variable naming the file a build script bakes in. Not an option.
pub const ENV_CONFIG_PATH: &str = "UTILS_CONF_PATH";

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "utils_conf.toml";

/// Where an option mapping comes from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Explicit configuration file.
    pub file: Option<PathBuf>,
    /// `key=value` overrides.
    pub overrides: Vec<String>,
    /// Read `UTILS_CONF_*` environment variables.
    pub use_env: bool,
}

impl ConfigSources {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_override(mut self, assignment: impl Into<String>) -> Self {
        self.overrides.push(assignment.into());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    /// The file that will be read, if any.
    pub fn config_file(&self) -> Option<PathBuf> {
        match &self.file {
            Some(path) => Some(path.clone()),
            None => default_config_path().filter(|p| p.exists()),
        }
    }
}

/// `$XDG_CONFIG_HOME/utils-conf/utils_conf.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("utils-conf").join(CONFIG_FILE_NAME))
}

/// Read a configuration file. `.json` files are parsed as JSON, anything
/// else as TOML.
pub fn load_file(path: &Path) -> Result<OptionMap, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let map = if is_json {
        OptionMap::from_json_str(&content)?
    } else {
        OptionMap::from_toml_str(&content)?
    };
    debug!(path = %path.display(), options = map.len(), "loaded configuration file");
    Ok(map)
}

/// Collect `UTILS_CONF_*` variables into a mapping.
///
/// Variables that do not name a catalog option are skipped with a warning;
/// unknown keys in a configuration file or `--set` stay errors.
pub fn env_options<I>(vars: I) -> OptionMap
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter(|(name, _)| name != ENV_CONFIG_PATH)
        .filter_map(|(name, value)| {
            let key = normalize_key(name.strip_prefix(ENV_PREFIX)?);
            if lookup(&key).is_none() {
                warn!(variable = %name, "ignoring environment variable that names no option");
                return None;
            }
            Some((key, OptionValue::parse_literal(&value)))
        })
        .collect()
}

/// Parse a `key=value` override.
pub fn parse_override(assignment: &str) -> Result<(String, OptionValue), ConfigError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(assignment.to_string()))?;
    let key = normalize_key(key);
    if key.is_empty() {
        return Err(ConfigError::InvalidOverride(assignment.to_string()));
    }
    Ok((key, OptionValue::parse_literal(value)))
}

/// Build the option mapping from all sources.
pub fn load_options(sources: &ConfigSources) -> Result<OptionMap, ConfigError> {
    let mut map = match sources.config_file() {
        Some(path) => load_file(&path)?,
        None => OptionMap::new(),
    };
    if sources.use_env {
        let env = env_options(std::env::vars());
        if !env.is_empty() {
            debug!(options = env.len(), "applying environment overrides");
        }
        map.merge(env);
    }
    let overrides = sources
        .overrides
        .iter()
        .map(|a| parse_override(a))
        .collect::<Result<OptionMap, _>>()?;
    map.merge(overrides);
    Ok(map)
}

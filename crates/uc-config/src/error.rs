//! Errors from loading and resolving configuration.

use std::path::PathBuf;
use thiserror::Error;

use crate::validate::{ValidationError, ValidationReport};

/// Errors that can occur while producing a binding set.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML render error: {0}")]
    TomlRender(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("option '{0}' has no documented default and is not set")]
    Unset(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("configuration rejected with {} error(s): {}", .0.errors.len(), .0.summary())]
    Rejected(ValidationReport),

    #[error(transparent)]
    Schema(#[from] uc_common::Error),

    #[error("invalid override '{0}': expected KEY=VALUE")]
    InvalidOverride(String),
}

impl ConfigError {
    /// The validation report, when the error carries one.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ConfigError::Rejected(report) => Some(report),
            _ => None,
        }
    }

    /// Whether the error is a schema major-version mismatch.
    pub fn is_incompatible_schema(&self) -> bool {
        matches!(
            self,
            ConfigError::Schema(uc_common::Error::IncompatibleSchema { .. })
        )
    }
}

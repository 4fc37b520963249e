//! Validation errors, warnings and the collected report.

use serde::Serialize;
use thiserror::Error;

/// A single reason an option mapping cannot be bound.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("unknown option '{key}'")]
    UnknownOption { key: String },

    #[error("option '{key}' expects {expected}, got {found}")]
    InvalidType {
        key: String,
        expected: String,
        found: String,
    },

    #[error("option '{key}' has no value '{value}' (allowed: {})", .allowed.join(", "))]
    NotInEnumeration {
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("option '{key}' value {value} is outside {min}..={max}")]
    OutOfRange {
        key: String,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("option '{key}' value {value} is not a power of two")]
    NotPowerOfTwo { key: String, value: u64 },

    #[error("option '{key}' must not be empty")]
    EmptyValue { key: String },

    #[error("option '{key}' is required when {branch}")]
    MissingRequired { key: String, branch: String },

    #[error("invalid schema version '{value}'")]
    InvalidVersion { value: String },

    #[error("configuration schema {declared} is incompatible with library schema {library}")]
    IncompatibleSchema { library: String, declared: String },
}

impl ValidationError {
    /// The option the error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            ValidationError::UnknownOption { key }
            | ValidationError::InvalidType { key, .. }
            | ValidationError::NotInEnumeration { key, .. }
            | ValidationError::OutOfRange { key, .. }
            | ValidationError::NotPowerOfTwo { key, .. }
            | ValidationError::EmptyValue { key }
            | ValidationError::MissingRequired { key, .. } => Some(key),
            ValidationError::InvalidVersion { .. } | ValidationError::IncompatibleSchema { .. } => {
                None
            }
        }
    }
}

/// Non-fatal findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// The configuration was written against a different minor schema.
    MinorSchemaDrift { library: String, declared: String },
    /// An option unknown to this schema was ignored because of minor drift.
    IgnoredUnknownOption { key: String },
    /// The configuration does not declare a schema version.
    Unversioned { assumed: String },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::MinorSchemaDrift { library, declared } => write!(
                f,
                "configuration schema {} differs from library schema {}; missing options use defaults",
                declared, library
            ),
            ValidationWarning::IgnoredUnknownOption { key } => {
                write!(f, "ignoring option '{}' unknown to this schema", key)
            }
            ValidationWarning::Unversioned { assumed } => {
                write!(f, "configuration declares no schema-version; assuming {}", assumed)
            }
        }
    }
}

/// Result of validating an option mapping: all errors, all warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether any error concerns `key`.
    pub fn mentions(&self, key: &str) -> bool {
        self.errors.iter().any(|e| e.key() == Some(key))
    }

    /// One line per error, for diagnostics.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

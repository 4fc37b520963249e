//! Error types for utils-conf.

use thiserror::Error;

/// Result type alias for utils-conf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for utils-conf.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("configuration rejected with {count} error(s): {summary}")]
    Validation { count: usize, summary: String },

    // Schema errors (20-29)
    #[error("incompatible configuration schema: library is {library}, configuration declares {declared}")]
    IncompatibleSchema { library: String, declared: String },

    #[error("invalid schema version '{0}': expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    // Plugin errors (30-39)
    #[error("plugin support is disabled in the resolved bindings")]
    PluginsDisabled,

    #[error("plugin '{id}' is already registered")]
    DuplicatePlugin { id: String },

    #[error("plugin '{id}' is not registered")]
    PluginNotFound { id: String },

    #[error("plugin '{id}' failed: {message}")]
    PluginFailed { id: String, message: String },

    // Memory errors (40-49)
    #[error("allocation of {size} bytes (align {align}) failed in backend {backend}")]
    AllocationFailed {
        backend: String,
        size: usize,
        align: usize,
    },

    #[error("invalid allocation layout: {0}")]
    InvalidLayout(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::UnknownOption(_) => 11,
            Error::Validation { .. } => 12,
            Error::IncompatibleSchema { .. } => 20,
            Error::InvalidVersion(_) => 21,
            Error::PluginsDisabled => 30,
            Error::DuplicatePlugin { .. } => 31,
            Error::PluginNotFound { .. } => 32,
            Error::PluginFailed { .. } => 33,
            Error::AllocationFailed { .. } => 40,
            Error::InvalidLayout(_) => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }
}

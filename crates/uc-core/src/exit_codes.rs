//! Exit codes for the uc-core CLI.
//!
//! Exit codes communicate the resolution outcome without requiring output
//! parsing. They are stable.

use uc_config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Resolved with no warnings
    Clean = 0,

    /// Resolved, with warnings (minor schema drift, ignored options)
    Warnings = 1,

    /// Configuration could not be loaded or parsed
    ConfigError = 10,

    /// One or more options failed validation
    ValidationError = 11,

    /// Declared schema major version differs from the library's
    IncompatibleSchema = 12,

    /// I/O error
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::Warnings)
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Exit code for a successful run that may carry warnings.
    pub fn from_warnings(has_warnings: bool) -> Self {
        if has_warnings {
            ExitCode::Warnings
        } else {
            ExitCode::Clean
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(err: &ConfigError) -> Self {
        match err {
            ConfigError::Io { .. } => ExitCode::IoError,
            _ if err.is_incompatible_schema() => ExitCode::IncompatibleSchema,
            ConfigError::Rejected(report)
                if report.errors.iter().any(|e| {
                    matches!(e, uc_config::ValidationError::IncompatibleSchema { .. })
                }) =>
            {
                ExitCode::IncompatibleSchema
            }
            ConfigError::Rejected(_) | ConfigError::Invalid(_) | ConfigError::UnknownOption(_) => {
                ExitCode::ValidationError
            }
            ConfigError::Schema(inner) => ExitCode::from(inner),
            ConfigError::Toml(_)
            | ConfigError::Json(_)
            | ConfigError::InvalidOverride(_)
            | ConfigError::Unset(_) => ExitCode::ConfigError,
            ConfigError::TomlRender(_) => ExitCode::InternalError,
        }
    }
}

impl From<&uc_common::Error> for ExitCode {
    fn from(err: &uc_common::Error) -> Self {
        use uc_common::Error;
        match err {
            Error::Config(_)
            | Error::PluginsDisabled
            | Error::DuplicatePlugin { .. }
            | Error::PluginNotFound { .. } => ExitCode::ConfigError,
            Error::UnknownOption(_) | Error::Validation { .. } | Error::InvalidVersion(_) => {
                ExitCode::ValidationError
            }
            Error::IncompatibleSchema { .. } => ExitCode::IncompatibleSchema,
            Error::Io(_) => ExitCode::IoError,
            Error::PluginFailed { .. }
            | Error::AllocationFailed { .. }
            | Error::InvalidLayout(_)
            | Error::Json(_) => ExitCode::InternalError,
        }
    }
}

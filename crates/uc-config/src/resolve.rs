//! The configuration resolver.
//!
//! Given a fixed option mapping, the resolver answers per-option lookups,
//! validates the whole mapping, compares the declared schema version with the
//! library's, and binds the mapping into a [`BindingSet`]. Resolution is pure:
//! the same mapping always produces the same result.

use serde::Serialize;
use std::str::FromStr;
use tracing::{debug, warn};
use uc_common::{Compatibility, SchemaVersion, SCHEMA_VERSION};

use crate::binding::BindingSet;
use crate::catalog::{keys, lookup, OptionSpec, OPTIONS};
use crate::error::ConfigError;
use crate::model::{
    AllocBackend, AllocType, CheckHandleMethod, CustomAlloc, CxxAllocOverride, HeapCap, HeapCaps,
    LogBackend, LogConfig, LogLevel, LogVerbosity, MemoryConfig, UtilsConfig,
};
use crate::validate::{ValidationError, ValidationReport, ValidationWarning};
use crate::value::{OptionMap, OptionValue};

/// Keys that make up one allocator branch group.
struct AllocKeys {
    alloc_type: &'static str,
    default_enabled: &'static str,
    align: &'static str,
    caps: &'static str,
    include: &'static str,
    malloc: &'static str,
    free: &'static str,
}

const GENERAL_ALLOC: AllocKeys = AllocKeys {
    alloc_type: keys::GENERAL_ALLOC_TYPE,
    default_enabled: keys::DEFAULT_GENERAL_ALLOC_ENABLED,
    align: keys::PLATFORM_HEAP_ALIGN,
    caps: keys::PLATFORM_HEAP_CAPS,
    include: keys::CUSTOM_ALLOC_INCLUDE,
    malloc: keys::CUSTOM_MALLOC_SYMBOL,
    free: keys::CUSTOM_FREE_SYMBOL,
};

const CXX_ALLOC: AllocKeys = AllocKeys {
    alloc_type: keys::CXX_ALLOC_TYPE,
    default_enabled: keys::CXX_DEFAULT_ENABLED,
    align: keys::CXX_PLATFORM_HEAP_ALIGN,
    caps: keys::CXX_PLATFORM_HEAP_CAPS,
    include: keys::CXX_CUSTOM_INCLUDE,
    malloc: keys::CXX_CUSTOM_MALLOC_SYMBOL,
    free: keys::CXX_CUSTOM_FREE_SYMBOL,
};

/// Successful outcome of [`Resolver::bind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub config: UtilsConfig,
    pub bindings: BindingSet,
    pub declared_version: SchemaVersion,
    pub compatibility: Compatibility,
    pub warnings: Vec<ValidationWarning>,
}

/// Resolves one fixed option mapping.
#[derive(Debug, Clone)]
pub struct Resolver {
    options: OptionMap,
    library: SchemaVersion,
}

impl Resolver {
    /// Resolver against the current library schema.
    pub fn new(options: OptionMap) -> Self {
        Self {
            options,
            library: SCHEMA_VERSION,
        }
    }

    /// Resolve against a different library schema version.
    pub fn with_library_version(mut self, library: SchemaVersion) -> Self {
        self.library = library;
        self
    }

    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    pub fn library_version(&self) -> SchemaVersion {
        self.library
    }

    /// Value selected for `key`, or its documented default when unset.
    ///
    /// The value is returned in canonical form. A set value outside the
    /// option's legal values is an error; so is an unset option without a
    /// documented default.
    pub fn resolve(&self, key: &str) -> Result<OptionValue, ConfigError> {
        let spec = lookup(key).ok_or_else(|| ConfigError::UnknownOption(key.to_string()))?;
        self.resolve_spec(spec)
    }

    fn resolve_spec(&self, spec: &OptionSpec) -> Result<OptionValue, ConfigError> {
        match self.options.get(spec.key) {
            Some(raw) => Ok(spec.kind.coerce(spec.key, raw)?),
            None => spec
                .default_value(self.library)
                .ok_or_else(|| ConfigError::Unset(spec.key.to_string())),
        }
    }

    /// Whether `spec` is meaningful under the current selections: its gate
    /// (and every gate above it) is open.
    pub fn is_active(&self, spec: &OptionSpec) -> bool {
        let Some(gate) = spec.gate else {
            return true;
        };
        let Some(parent) = lookup(gate.parent) else {
            return false;
        };
        if !self.is_active(parent) {
            return false;
        }
        match self.resolve_spec(parent) {
            Ok(value) => {
                let selected = value.to_string();
                gate.values.contains(&selected.as_str())
            }
            Err(_) => false,
        }
    }

    /// The schema version declared by the mapping, if any.
    pub fn declared_version(&self) -> Result<Option<SchemaVersion>, ConfigError> {
        match self.options.get(keys::SCHEMA_VERSION) {
            None => Ok(None),
            Some(OptionValue::Text(s)) => Ok(Some(s.parse::<SchemaVersion>()?)),
            Some(other) => Err(ValidationError::InvalidVersion {
                value: other.to_string(),
            }
            .into()),
        }
    }

    /// Compare a declared schema version against the library's.
    ///
    /// Major mismatch is an error. Minor mismatch is logged as a warning and
    /// accepted. Patch mismatch has no effect.
    pub fn check_compatibility(
        &self,
        declared_major: u32,
        declared_minor: u32,
        declared_patch: u32,
    ) -> Result<Compatibility, ConfigError> {
        let declared = SchemaVersion::new(declared_major, declared_minor, declared_patch);
        let compatibility = uc_common::check_compatibility(self.library, declared)?;
        match compatibility {
            Compatibility::MinorDrift => warn!(
                library = %self.library,
                declared = %declared,
                "configuration schema minor version differs; missing options use defaults"
            ),
            Compatibility::PatchDrift => {
                debug!(library = %self.library, declared = %declared, "patch drift ignored")
            }
            Compatibility::Exact => {}
        }
        Ok(compatibility)
    }

    /// Validate the whole mapping, collecting every error and warning.
    ///
    /// Options whose gate is closed are skipped entirely; their values never
    /// influence the outcome.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        let minor_drift = match self.declared_version() {
            Ok(Some(declared)) => match uc_common::check_compatibility(self.library, declared) {
                Ok(Compatibility::MinorDrift) => {
                    report.warnings.push(ValidationWarning::MinorSchemaDrift {
                        library: self.library.to_string(),
                        declared: declared.to_string(),
                    });
                    true
                }
                Ok(_) => false,
                Err(_) => {
                    report.errors.push(ValidationError::IncompatibleSchema {
                        library: self.library.to_string(),
                        declared: declared.to_string(),
                    });
                    false
                }
            },
            Ok(None) => {
                report.warnings.push(ValidationWarning::Unversioned {
                    assumed: self.library.to_string(),
                });
                false
            }
            Err(_) => {
                let value = self
                    .options
                    .get(keys::SCHEMA_VERSION)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                report.errors.push(ValidationError::InvalidVersion { value });
                false
            }
        };

        for key in self.options.keys() {
            if lookup(key).is_some() {
                continue;
            }
            if minor_drift {
                report.warnings.push(ValidationWarning::IgnoredUnknownOption {
                    key: key.to_string(),
                });
            } else {
                report.errors.push(ValidationError::UnknownOption {
                    key: key.to_string(),
                });
            }
        }

        for spec in OPTIONS {
            if spec.key == keys::SCHEMA_VERSION {
                continue;
            }
            if !self.is_active(spec) {
                if self.options.contains(spec.key) {
                    debug!(key = spec.key, "option inactive under current selections");
                }
                continue;
            }
            match self.options.get(spec.key) {
                Some(raw) => {
                    if let Err(e) = spec.kind.coerce(spec.key, raw) {
                        report.errors.push(e);
                    }
                }
                None if spec.is_required() => {
                    report.errors.push(ValidationError::MissingRequired {
                        key: spec.key.to_string(),
                        branch: spec.gate.map(|g| g.describe()).unwrap_or_default(),
                    });
                }
                None => {}
            }
        }

        report
    }

    /// Check compatibility, validate, and produce the binding set.
    pub fn bind(&self) -> Result<Resolution, ConfigError> {
        let declared = self.declared_version()?.unwrap_or(self.library);
        let compatibility =
            self.check_compatibility(declared.major, declared.minor, declared.patch)?;

        let report = self.validate();
        if !report.is_ok() {
            return Err(ConfigError::Rejected(report));
        }

        let config = self.typed_config()?;
        let bindings = BindingSet::from_config(&config, self.library);
        debug!(
            check = %config.check,
            log_level = %config.log.verbosity.level(),
            general_alloc = %config.general_alloc.backend.alloc_type(),
            plugin_support = config.plugin_support,
            "configuration bound"
        );

        Ok(Resolution {
            config,
            bindings,
            declared_version: declared,
            compatibility,
            warnings: report.warnings,
        })
    }

    /// Every active option with its resolved value, including defaults.
    ///
    /// Unknown keys and options behind closed gates are left out, so the
    /// result is a fully specified mapping for the current schema.
    pub fn effective_options(&self) -> Result<OptionMap, ConfigError> {
        let mut out = OptionMap::new();
        for spec in OPTIONS {
            if !self.is_active(spec) {
                continue;
            }
            let value = match spec.key {
                keys::SCHEMA_VERSION => OptionValue::Text(self.library.to_string()),
                _ => self.resolve_spec(spec)?,
            };
            out.insert(spec.key, value);
        }
        Ok(out)
    }

    /// Build the typed configuration. Assumes a mapping that validated.
    pub fn typed_config(&self) -> Result<UtilsConfig, ConfigError> {
        let check: CheckHandleMethod = self.parsed(keys::CHECK_HANDLE_METHOD)?;
        let level: LogLevel = self.parsed(keys::LOG_LEVEL)?;
        let verbosity = match level {
            LogLevel::Debug => LogVerbosity::Debug {
                trace_enter_exit: self.flag(keys::TRACE_ON_ENTER_EXIT)?,
            },
            LogLevel::Info => LogVerbosity::Info,
            LogLevel::Warning => LogVerbosity::Warning,
            LogLevel::Error => LogVerbosity::Error,
            LogLevel::None => LogVerbosity::None,
        };
        let backend: LogBackend = self.parsed(keys::LOG_BACKEND)?;

        let general_alloc = self.memory_config(&GENERAL_ALLOC)?;
        let cxx_alloc = if self.flag(keys::ENABLE_CXX_GLOBAL_ALLOC_OVERRIDE)? {
            CxxAllocOverride::Enabled(self.memory_config(&CXX_ALLOC)?)
        } else {
            CxxAllocOverride::Disabled
        };

        Ok(UtilsConfig {
            check,
            log: LogConfig { verbosity, backend },
            general_alloc,
            cxx_alloc,
            plugin_support: self.flag(keys::PLUGIN_SUPPORT)?,
        })
    }

    fn memory_config(&self, keys: &AllocKeys) -> Result<MemoryConfig, ConfigError> {
        let alloc_type: AllocType = self.parsed(keys.alloc_type)?;
        let backend = match alloc_type {
            AllocType::StandardLibrary => AllocBackend::StandardLibrary,
            AllocType::EmbeddedRuntime => AllocBackend::EmbeddedRuntime,
            AllocType::PlatformHeap => AllocBackend::PlatformHeap {
                align: self.align(keys.align)?,
                caps: self.caps(keys.caps)?,
            },
            AllocType::Custom => AllocBackend::Custom(CustomAlloc {
                include: self.text(keys.include)?,
                malloc_symbol: self.text(keys.malloc)?,
                free_symbol: self.text(keys.free)?,
            }),
        };
        Ok(MemoryConfig {
            default_enabled: self.flag(keys.default_enabled)?,
            backend,
        })
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.resolve(key)?;
        value
            .as_text()
            .and_then(|s| s.parse::<T>().ok())
            .ok_or_else(|| shape_error(key, &value))
    }

    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        let value = self.resolve(key)?;
        value.as_bool().ok_or_else(|| shape_error(key, &value))
    }

    fn text(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.resolve(key)?;
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| shape_error(key, &value))
    }

    fn align(&self, key: &str) -> Result<u32, ConfigError> {
        let value = self.resolve(key)?;
        value
            .as_uint()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| shape_error(key, &value))
    }

    fn caps(&self, key: &str) -> Result<HeapCaps, ConfigError> {
        let value = self.resolve(key)?;
        let items = value.as_list().ok_or_else(|| shape_error(key, &value))?;
        let caps = items
            .iter()
            .map(|s| s.parse::<HeapCap>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| shape_error(key, &value))?;
        Ok(HeapCaps::new(caps))
    }
}

fn shape_error(key: &str, value: &OptionValue) -> ConfigError {
    let expected = lookup(key)
        .map(|spec| spec.kind.describe())
        .unwrap_or_default();
    ConfigError::Invalid(ValidationError::InvalidType {
        key: key.to_string(),
        expected,
        found: value.to_string(),
    })
}

//! Utils-conf configuration resolution.
//!
//! This crate provides:
//! - The option catalog (keys, legal values, documented defaults, gates)
//! - Option mapping sources (file → env → CLI overrides)
//! - The resolver: per-option lookup, validation, schema compatibility
//! - Typed sum-type configuration and the resolved binding set
//! - Presets, resolution snapshots, and Rust code generation for build scripts

pub mod binding;
pub mod catalog;
pub mod codegen;
pub mod error;
pub mod model;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod sources;
pub mod validate;
pub mod value;

pub use binding::{AllocBinding, BindingSet, LogBinding};
pub use catalog::{lookup, OptionKind, OptionSpec, OPTIONS};
pub use error::ConfigError;
pub use codegen::{generate, render_bindings, BuildOutput, GENERATED_FILE_NAME};
pub use model::{
    AllocBackend, AllocType, CheckHandleMethod, CustomAlloc, CxxAllocOverride, HeapCap, HeapCaps,
    LogBackend, LogConfig, LogLevel, LogVerbosity, MemoryConfig, UtilsConfig,
};
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{Resolution, Resolver};
pub use snapshot::ResolutionSnapshot;
pub use sources::{load_file, load_options, ConfigSources, CONFIG_FILE_NAME, ENV_CONFIG_PATH};
pub use validate::{ValidationError, ValidationReport, ValidationWarning};
pub use value::{OptionMap, OptionValue};

pub use uc_common::{Compatibility, SchemaVersion, SCHEMA_VERSION};

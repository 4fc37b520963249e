//! Configuration presets for common deployment scenarios.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uc_common::SCHEMA_VERSION;

use crate::catalog::keys;
use crate::value::OptionMap;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("unknown preset '{0}' (available: minimal, recommended, debug, psram)")]
    Unknown(String),
}

/// Named presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetName {
    /// Smallest code size: no checks, no logs.
    Minimal,
    /// The documented defaults.
    Recommended,
    /// Assert on failed checks, debug logs with enter/exit tracing.
    Debug,
    /// Platform heap in external RAM, with the C++ operator override.
    Psram,
}

impl PresetName {
    pub const ALL: &'static [PresetName] = &[
        PresetName::Minimal,
        PresetName::Recommended,
        PresetName::Debug,
        PresetName::Psram,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PresetName::Minimal => "minimal",
            PresetName::Recommended => "recommended",
            PresetName::Debug => "debug",
            PresetName::Psram => "psram",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PresetName::Minimal => "No check handling and no log output; minimum code size",
            PresetName::Recommended => "Documented defaults: error-log checks, info logs, standard library allocator",
            PresetName::Debug => "Assert on failed checks, debug logs with enter/exit tracing",
            PresetName::Psram => "Platform heap in external RAM for general and C++ allocations",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| PresetError::Unknown(s.to_string()))
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PresetInfo {
    pub name: &'static str,
    pub description: &'static str,
}

pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|p| PresetInfo {
            name: p.as_str(),
            description: p.description(),
        })
        .collect()
}

/// Option mapping for a preset. Every preset declares the current schema.
pub fn get_preset(name: PresetName) -> OptionMap {
    let base = OptionMap::new().with(keys::SCHEMA_VERSION, SCHEMA_VERSION.to_string());
    match name {
        PresetName::Minimal => base
            .with(keys::CHECK_HANDLE_METHOD, "none")
            .with(keys::LOG_LEVEL, "none")
            .with(keys::DEFAULT_GENERAL_ALLOC_ENABLED, false),
        PresetName::Recommended => base,
        PresetName::Debug => base
            .with(keys::CHECK_HANDLE_METHOD, "assert")
            .with(keys::LOG_LEVEL, "debug")
            .with(keys::TRACE_ON_ENTER_EXIT, true),
        PresetName::Psram => base
            .with(keys::GENERAL_ALLOC_TYPE, "platform-heap")
            .with(keys::PLATFORM_HEAP_ALIGN, 1u64)
            .with(keys::PLATFORM_HEAP_CAPS, vec!["spiram", "8bit"])
            .with(keys::ENABLE_CXX_GLOBAL_ALLOC_OVERRIDE, true)
            .with(keys::CXX_ALLOC_TYPE, "platform-heap")
            .with(keys::CXX_PLATFORM_HEAP_CAPS, vec!["spiram"]),
    }
}

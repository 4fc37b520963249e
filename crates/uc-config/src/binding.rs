//! The binding set: concrete symbols and constants selected by a resolution.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uc_common::SchemaVersion;

use crate::model::{
    AllocBackend, AllocType, CheckHandleMethod, CxxAllocOverride, HeapCap, LogBackend, LogLevel,
    MemoryConfig, UtilsConfig,
};

/// Allocator symbols bound for one allocation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AllocBinding {
    pub backend: AllocType,
    /// Route allocations through `backend` by default; otherwise raw
    /// malloc/free is used unless the caller opts in.
    pub default_enabled: bool,
    pub include: String,
    pub malloc_symbol: String,
    pub free_symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caps: Option<Vec<HeapCap>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caps_mask: Option<u32>,
}

impl AllocBinding {
    pub fn from_memory(memory: &MemoryConfig) -> Self {
        let (include, malloc, free) = match &memory.backend {
            AllocBackend::StandardLibrary => ("stdlib.h", "malloc", "free"),
            AllocBackend::PlatformHeap { .. } => {
                ("esp_heap_caps.h", "heap_caps_aligned_alloc", "heap_caps_free")
            }
            AllocBackend::EmbeddedRuntime => ("py/misc.h", "m_malloc", "m_free"),
            AllocBackend::Custom(custom) => (
                custom.include.as_str(),
                custom.malloc_symbol.as_str(),
                custom.free_symbol.as_str(),
            ),
        };
        let (align, caps, caps_mask) = match &memory.backend {
            AllocBackend::PlatformHeap { align, caps } => {
                (Some(*align), Some(caps.flags().to_vec()), Some(caps.mask()))
            }
            _ => (None, None, None),
        };
        Self {
            backend: memory.backend.alloc_type(),
            default_enabled: memory.default_enabled,
            include: include.to_string(),
            malloc_symbol: malloc.to_string(),
            free_symbol: free.to_string(),
            align,
            caps,
            caps_mask,
        }
    }
}

/// Logging primitives bound for the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LogBinding {
    pub level: LogLevel,
    pub backend: LogBackend,
    pub trace_enter_exit: bool,
}

/// Everything a consumer needs from a resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BindingSet {
    #[schemars(with = "String")]
    pub schema_version: SchemaVersion,
    pub check_handle_method: CheckHandleMethod,
    pub log: LogBinding,
    pub general_alloc: AllocBinding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cxx_global_alloc: Option<AllocBinding>,
    pub plugin_support: bool,
}

impl BindingSet {
    pub fn from_config(config: &UtilsConfig, schema_version: SchemaVersion) -> Self {
        Self {
            schema_version,
            check_handle_method: config.check,
            log: LogBinding {
                level: config.log.verbosity.level(),
                backend: config.log.backend,
                trace_enter_exit: config.log.verbosity.trace_enter_exit(),
            },
            general_alloc: AllocBinding::from_memory(&config.general_alloc),
            cxx_global_alloc: match &config.cxx_alloc {
                CxxAllocOverride::Disabled => None,
                CxxAllocOverride::Enabled(memory) => Some(AllocBinding::from_memory(memory)),
            },
            plugin_support: config.plugin_support,
        }
    }

    /// Compact JSON form; field order is fixed by the struct definitions.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// SHA-256 hex digest of the canonical JSON form.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = self.to_canonical_json()?;
        Ok(sha256_hex(json.as_bytes()))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomAlloc, HeapCaps, LogConfig, LogVerbosity};
    use uc_common::SCHEMA_VERSION;

    fn config(backend: AllocBackend) -> UtilsConfig {
        UtilsConfig {
            check: CheckHandleMethod::ErrorLog,
            log: LogConfig {
                verbosity: LogVerbosity::Info,
                backend: LogBackend::StandardLibrary,
            },
            general_alloc: MemoryConfig {
                default_enabled: true,
                backend,
            },
            cxx_alloc: CxxAllocOverride::Disabled,
            plugin_support: false,
        }
    }

    #[test]
    fn standard_library_binds_malloc_free() {
        let b = BindingSet::from_config(&config(AllocBackend::StandardLibrary), SCHEMA_VERSION);
        assert_eq!(b.general_alloc.include, "stdlib.h");
        assert_eq!(b.general_alloc.malloc_symbol, "malloc");
        assert_eq!(b.general_alloc.free_symbol, "free");
        assert_eq!(b.general_alloc.align, None);
        assert!(b.cxx_global_alloc.is_none());
    }

    #[test]
    fn platform_heap_binds_caps_mask() {
        let backend = AllocBackend::PlatformHeap {
            align: 8,
            caps: HeapCaps::new([HeapCap::Default, HeapCap::Bit8]),
        };
        let b = BindingSet::from_config(&config(backend), SCHEMA_VERSION);
        assert_eq!(b.general_alloc.malloc_symbol, "heap_caps_aligned_alloc");
        assert_eq!(b.general_alloc.align, Some(8));
        assert_eq!(b.general_alloc.caps_mask, Some(0x1004));
    }

    #[test]
    fn embedded_runtime_binds_runtime_symbols() {
        let b = BindingSet::from_config(&config(AllocBackend::EmbeddedRuntime), SCHEMA_VERSION);
        assert_eq!(b.general_alloc.malloc_symbol, "m_malloc");
        assert_eq!(b.general_alloc.free_symbol, "m_free");
    }

    #[test]
    fn cxx_override_gets_separate_binding() {
        let mut cfg = config(AllocBackend::StandardLibrary);
        cfg.cxx_alloc = CxxAllocOverride::Enabled(MemoryConfig {
            default_enabled: false,
            backend: AllocBackend::Custom(CustomAlloc {
                include: "op_alloc.h".into(),
                malloc_symbol: "op_new".into(),
                free_symbol: "op_delete".into(),
            }),
        });
        let b = BindingSet::from_config(&cfg, SCHEMA_VERSION);
        let cxx = b.cxx_global_alloc.expect("override bound");
        assert_eq!(cxx.backend, AllocType::Custom);
        assert!(!cxx.default_enabled);
        assert_eq!(cxx.malloc_symbol, "op_new");
        assert_eq!(b.general_alloc.malloc_symbol, "malloc");
    }

    #[test]
    fn json_roundtrip_preserves_fingerprint() {
        let b = BindingSet::from_config(&config(AllocBackend::StandardLibrary), SCHEMA_VERSION);
        let back = BindingSet::from_json(&b.to_canonical_json().unwrap()).unwrap();
        assert_eq!(back, b);
        assert_eq!(back.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(b.fingerprint().unwrap().len(), 64);
    }

    #[test]
    fn fingerprint_changes_with_bindings() {
        let a = BindingSet::from_config(&config(AllocBackend::StandardLibrary), SCHEMA_VERSION);
        let b = BindingSet::from_config(&config(AllocBackend::EmbeddedRuntime), SCHEMA_VERSION);
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}

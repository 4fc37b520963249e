//! Typed configuration.
//!
//! Each mutually exclusive option group is a sum type: one tag selects the
//! active variant and each variant carries only the fields its branch needs.
//! A trace flag therefore only exists under `LogVerbosity::Debug`, and custom
//! allocator symbols only exist under `AllocBackend::Custom`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generates `as_str`, `ALL`, `Display` and `FromStr` for a fieldless enum
/// whose serialized names are fixed strings.
macro_rules! named_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }

            /// Legal names, in declaration order.
            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err(other.to_string()),
                }
            }
        }
    };
}

/// Behavior when a validation check fails in consuming code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CheckHandleMethod {
    /// Do nothing (minimum code size).
    None,
    /// Emit an error log line.
    ErrorLog,
    /// Abort on failure.
    Assert,
}

named_enum!(CheckHandleMethod {
    None => "none",
    ErrorLog => "error-log",
    Assert => "assert",
});

/// Minimum severity compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    None,
}

named_enum!(LogLevel {
    Debug => "debug",
    Info => "info",
    Warning => "warning",
    Error => "error",
    None => "none",
});

/// Log level with the options that only exist at that level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "kebab-case")]
pub enum LogVerbosity {
    Debug { trace_enter_exit: bool },
    Info,
    Warning,
    Error,
    None,
}

impl LogVerbosity {
    pub fn level(self) -> LogLevel {
        match self {
            LogVerbosity::Debug { .. } => LogLevel::Debug,
            LogVerbosity::Info => LogLevel::Info,
            LogVerbosity::Warning => LogLevel::Warning,
            LogVerbosity::Error => LogLevel::Error,
            LogVerbosity::None => LogLevel::None,
        }
    }

    pub fn trace_enter_exit(self) -> bool {
        matches!(
            self,
            LogVerbosity::Debug {
                trace_enter_exit: true
            }
        )
    }
}

/// Which logging primitives are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LogBackend {
    StandardLibrary,
}

named_enum!(LogBackend {
    StandardLibrary => "standard-library",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub verbosity: LogVerbosity,
    pub backend: LogBackend,
}

/// Tag of an allocator backend, without its branch parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AllocType {
    StandardLibrary,
    PlatformHeap,
    EmbeddedRuntime,
    Custom,
}

named_enum!(AllocType {
    StandardLibrary => "standard-library",
    PlatformHeap => "platform-heap",
    EmbeddedRuntime => "embedded-runtime",
    Custom => "custom",
});

/// Platform heap capability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum HeapCap {
    #[serde(rename = "exec")]
    Exec,
    #[serde(rename = "32bit")]
    Bit32,
    #[serde(rename = "8bit")]
    Bit8,
    #[serde(rename = "dma")]
    Dma,
    #[serde(rename = "spiram", alias = "psram")]
    Spiram,
    #[serde(rename = "internal", alias = "sram")]
    Internal,
    #[serde(rename = "default")]
    Default,
}

impl HeapCap {
    pub const ALL: &'static [HeapCap] = &[
        HeapCap::Default,
        HeapCap::Bit8,
        HeapCap::Bit32,
        HeapCap::Internal,
        HeapCap::Spiram,
        HeapCap::Dma,
        HeapCap::Exec,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HeapCap::Exec => "exec",
            HeapCap::Bit32 => "32bit",
            HeapCap::Bit8 => "8bit",
            HeapCap::Dma => "dma",
            HeapCap::Spiram => "spiram",
            HeapCap::Internal => "internal",
            HeapCap::Default => "default",
        }
    }

    /// Bit in the platform heap's capability mask.
    pub fn bit(self) -> u32 {
        match self {
            HeapCap::Exec => 1 << 0,
            HeapCap::Bit32 => 1 << 1,
            HeapCap::Bit8 => 1 << 2,
            HeapCap::Dma => 1 << 3,
            HeapCap::Spiram => 1 << 10,
            HeapCap::Internal => 1 << 11,
            HeapCap::Default => 1 << 12,
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }
}

impl fmt::Display for HeapCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeapCap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exec" => Ok(HeapCap::Exec),
            "32bit" => Ok(HeapCap::Bit32),
            "8bit" => Ok(HeapCap::Bit8),
            "dma" => Ok(HeapCap::Dma),
            "spiram" | "psram" => Ok(HeapCap::Spiram),
            "internal" | "sram" => Ok(HeapCap::Internal),
            "default" => Ok(HeapCap::Default),
            other => Err(other.to_string()),
        }
    }
}

/// Ordered, duplicate-free set of capability flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct HeapCaps(Vec<HeapCap>);

impl HeapCaps {
    pub fn new(caps: impl IntoIterator<Item = HeapCap>) -> Self {
        let mut out: Vec<HeapCap> = Vec::new();
        for cap in caps {
            if !out.contains(&cap) {
                out.push(cap);
            }
        }
        Self(out)
    }

    pub fn mask(&self) -> u32 {
        self.0.iter().fold(0, |acc, cap| acc | cap.bit())
    }

    pub fn flags(&self) -> &[HeapCap] {
        &self.0
    }
}

/// Caller-supplied allocator symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAlloc {
    pub include: String,
    pub malloc_symbol: String,
    pub free_symbol: String,
}

/// Allocator backend with its branch parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AllocBackend {
    StandardLibrary,
    PlatformHeap { align: u32, caps: HeapCaps },
    EmbeddedRuntime,
    Custom(CustomAlloc),
}

impl AllocBackend {
    pub fn alloc_type(&self) -> AllocType {
        match self {
            AllocBackend::StandardLibrary => AllocType::StandardLibrary,
            AllocBackend::PlatformHeap { .. } => AllocType::PlatformHeap,
            AllocBackend::EmbeddedRuntime => AllocType::EmbeddedRuntime,
            AllocBackend::Custom(_) => AllocType::Custom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Use the configured backend by default instead of raw malloc/free.
    pub default_enabled: bool,
    pub backend: AllocBackend,
}

/// Process-wide allocation operator override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "memory", rename_all = "kebab-case")]
pub enum CxxAllocOverride {
    Disabled,
    Enabled(MemoryConfig),
}

/// Fully resolved, typed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilsConfig {
    pub check: CheckHandleMethod,
    pub log: LogConfig,
    pub general_alloc: MemoryConfig,
    pub cxx_alloc: CxxAllocOverride,
    pub plugin_support: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_enums_roundtrip_through_strings() {
        for m in CheckHandleMethod::ALL {
            assert_eq!(m.as_str().parse::<CheckHandleMethod>().unwrap(), *m);
        }
        for l in LogLevel::ALL {
            assert_eq!(l.to_string().parse::<LogLevel>().unwrap(), *l);
        }
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(AllocType::names(), vec!["standard-library", "platform-heap", "embedded-runtime", "custom"]);
    }

    #[test]
    fn serde_names_match_display() {
        let json = serde_json::to_string(&CheckHandleMethod::ErrorLog).unwrap();
        assert_eq!(json, "\"error-log\"");
        let json = serde_json::to_string(&HeapCap::Bit8).unwrap();
        assert_eq!(json, "\"8bit\"");
    }

    #[test]
    fn heap_cap_aliases() {
        assert_eq!("psram".parse::<HeapCap>().unwrap(), HeapCap::Spiram);
        assert_eq!("SRAM".parse::<HeapCap>().unwrap(), HeapCap::Internal);
        assert!("flash".parse::<HeapCap>().is_err());
    }

    #[test]
    fn heap_caps_mask_dedups() {
        let caps = HeapCaps::new([HeapCap::Default, HeapCap::Bit8, HeapCap::Default]);
        assert_eq!(caps.flags().len(), 2);
        assert_eq!(caps.mask(), (1 << 12) | (1 << 2));
    }

    #[test]
    fn trace_flag_only_under_debug() {
        assert!(LogVerbosity::Debug {
            trace_enter_exit: true
        }
        .trace_enter_exit());
        assert!(!LogVerbosity::Info.trace_enter_exit());
        assert_eq!(LogVerbosity::Warning.level(), LogLevel::Warning);
    }

    #[test]
    fn log_levels_order_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::None);
    }
}

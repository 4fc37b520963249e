//! The option catalog: every recognized key, its legal values, its documented
//! default, and the gate under which it is meaningful.
//!
//! Entries are ordered so that a gated option always follows the option that
//! gates it.

use uc_common::SchemaVersion;

use crate::model::HeapCap;
use crate::validate::ValidationError;
use crate::value::OptionValue;

/// Option keys.
pub mod keys {
    pub const SCHEMA_VERSION: &str = "schema-version";
    pub const CHECK_HANDLE_METHOD: &str = "check-handle-method";
    pub const LOG_LEVEL: &str = "log-level";
    pub const LOG_BACKEND: &str = "log-backend";
    pub const TRACE_ON_ENTER_EXIT: &str = "trace-on-enter-exit";
    pub const DEFAULT_GENERAL_ALLOC_ENABLED: &str = "default-general-alloc-enabled";
    pub const GENERAL_ALLOC_TYPE: &str = "general-alloc-type";
    pub const PLATFORM_HEAP_ALIGN: &str = "platform-heap-align";
    pub const PLATFORM_HEAP_CAPS: &str = "platform-heap-caps";
    pub const CUSTOM_ALLOC_INCLUDE: &str = "custom-alloc-include";
    pub const CUSTOM_MALLOC_SYMBOL: &str = "custom-malloc-symbol";
    pub const CUSTOM_FREE_SYMBOL: &str = "custom-free-symbol";
    pub const ENABLE_CXX_GLOBAL_ALLOC_OVERRIDE: &str = "enable-cxx-global-alloc-override";
    pub const CXX_DEFAULT_ENABLED: &str = "cxx-global-alloc-default-enabled";
    pub const CXX_ALLOC_TYPE: &str = "cxx-global-alloc-type";
    pub const CXX_PLATFORM_HEAP_ALIGN: &str = "cxx-global-alloc-platform-heap-align";
    pub const CXX_PLATFORM_HEAP_CAPS: &str = "cxx-global-alloc-platform-heap-caps";
    pub const CXX_CUSTOM_INCLUDE: &str = "cxx-global-alloc-custom-include";
    pub const CXX_CUSTOM_MALLOC_SYMBOL: &str = "cxx-global-alloc-custom-malloc-symbol";
    pub const CXX_CUSTOM_FREE_SYMBOL: &str = "cxx-global-alloc-custom-free-symbol";
    pub const PLUGIN_SUPPORT: &str = "plugin-support";
}

/// Largest alignment accepted for platform heap allocations.
pub const MAX_HEAP_ALIGN: u64 = 4096;

/// Shape and constraints of an option's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Enum(&'static [&'static str]),
    /// Alignment: bounded and a power of two.
    Align { min: u64, max: u64 },
    Text,
    CapFlags,
    Version,
}

impl OptionKind {
    /// Human-readable description of the legal values.
    pub fn describe(&self) -> String {
        match self {
            OptionKind::Bool => "true | false".to_string(),
            OptionKind::Enum(values) => values.join(" | "),
            OptionKind::Align { min, max } => format!("power of two in {}..={}", min, max),
            OptionKind::Text => "string".to_string(),
            OptionKind::CapFlags => format!("list of {}", HeapCap::names().join(" | ")),
            OptionKind::Version => "MAJOR.MINOR.PATCH".to_string(),
        }
    }

    /// Check `value` against this kind and return its canonical form.
    pub fn coerce(&self, key: &str, value: &OptionValue) -> Result<OptionValue, ValidationError> {
        let invalid_type = || ValidationError::InvalidType {
            key: key.to_string(),
            expected: self.describe(),
            found: value.type_name().to_string(),
        };

        match self {
            OptionKind::Bool => match value {
                OptionValue::Bool(b) => Ok(OptionValue::Bool(*b)),
                // Header-style 0/1 toggles.
                OptionValue::UInt(0) => Ok(OptionValue::Bool(false)),
                OptionValue::UInt(1) => Ok(OptionValue::Bool(true)),
                OptionValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(OptionValue::Bool(true)),
                    "false" | "0" => Ok(OptionValue::Bool(false)),
                    _ => Err(invalid_type()),
                },
                _ => Err(invalid_type()),
            },
            OptionKind::Enum(allowed) => match value {
                OptionValue::Text(s) => {
                    let s = s.trim();
                    if allowed.contains(&s) {
                        Ok(OptionValue::Text(s.to_string()))
                    } else {
                        Err(ValidationError::NotInEnumeration {
                            key: key.to_string(),
                            value: s.to_string(),
                            allowed: allowed.iter().map(|v| v.to_string()).collect(),
                        })
                    }
                }
                _ => Err(invalid_type()),
            },
            OptionKind::Align { min, max } => {
                let n = match value {
                    OptionValue::UInt(n) => *n,
                    OptionValue::Text(s) => s.trim().parse::<u64>().map_err(|_| invalid_type())?,
                    _ => return Err(invalid_type()),
                };
                if n < *min || n > *max {
                    return Err(ValidationError::OutOfRange {
                        key: key.to_string(),
                        value: n,
                        min: *min,
                        max: *max,
                    });
                }
                if !n.is_power_of_two() {
                    return Err(ValidationError::NotPowerOfTwo {
                        key: key.to_string(),
                        value: n,
                    });
                }
                Ok(OptionValue::UInt(n))
            }
            OptionKind::Text => match value {
                OptionValue::Text(s) if s.trim().is_empty() => Err(ValidationError::EmptyValue {
                    key: key.to_string(),
                }),
                OptionValue::Text(s) => Ok(OptionValue::Text(s.trim().to_string())),
                // CLI and env literals that happen to parse as scalars.
                OptionValue::Bool(_) | OptionValue::UInt(_) => {
                    Ok(OptionValue::Text(value.to_string()))
                }
                OptionValue::List(_) => Err(invalid_type()),
            },
            OptionKind::CapFlags => {
                let items: Vec<String> = match value {
                    OptionValue::List(items) => items.clone(),
                    OptionValue::Text(s) => s
                        .split(['|', ','])
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect(),
                    _ => return Err(invalid_type()),
                };
                if items.is_empty() {
                    return Err(ValidationError::EmptyValue {
                        key: key.to_string(),
                    });
                }
                let mut canonical: Vec<String> = Vec::with_capacity(items.len());
                for item in &items {
                    let cap = item.parse::<HeapCap>().map_err(|bad| {
                        ValidationError::NotInEnumeration {
                            key: key.to_string(),
                            value: bad,
                            allowed: HeapCap::names().iter().map(|s| s.to_string()).collect(),
                        }
                    })?;
                    let name = cap.as_str().to_string();
                    if !canonical.contains(&name) {
                        canonical.push(name);
                    }
                }
                Ok(OptionValue::List(canonical))
            }
            OptionKind::Version => match value {
                OptionValue::Text(s) => s
                    .parse::<SchemaVersion>()
                    .map(|v| OptionValue::Text(v.to_string()))
                    .map_err(|_| ValidationError::InvalidVersion {
                        value: s.to_string(),
                    }),
                _ => Err(invalid_type()),
            },
        }
    }
}

/// Documented default of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Bool(bool),
    UInt(u64),
    Text(&'static str),
    Flags(&'static [&'static str]),
    /// The library's own schema version.
    LibraryVersion,
    /// No default: the option must be supplied whenever its gate is open.
    Required,
}

/// Condition under which a nested option is meaningful: the parent option's
/// resolved value is one of `values`, and the parent's own gate is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub parent: &'static str,
    pub values: &'static [&'static str],
}

impl Gate {
    pub fn describe(&self) -> String {
        format!("{} = {}", self.parent, self.values.join(" | "))
    }
}

/// A named, enumerated build-time choice point.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub key: &'static str,
    pub kind: OptionKind,
    pub default: DefaultValue,
    pub gate: Option<Gate>,
    pub description: &'static str,
}

impl OptionSpec {
    /// The documented default, or `None` for required options.
    pub fn default_value(&self, library: SchemaVersion) -> Option<OptionValue> {
        match self.default {
            DefaultValue::Bool(b) => Some(OptionValue::Bool(b)),
            DefaultValue::UInt(n) => Some(OptionValue::UInt(n)),
            DefaultValue::Text(s) => Some(OptionValue::Text(s.to_string())),
            DefaultValue::Flags(flags) => Some(OptionValue::List(
                flags.iter().map(|f| f.to_string()).collect(),
            )),
            DefaultValue::LibraryVersion => Some(OptionValue::Text(library.to_string())),
            DefaultValue::Required => None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.default == DefaultValue::Required
    }
}

const CHECK_METHODS: &[&str] = &["none", "error-log", "assert"];
const LOG_LEVELS: &[&str] = &["debug", "info", "warning", "error", "none"];
const LOG_BACKENDS: &[&str] = &["standard-library"];
const GENERAL_ALLOC_TYPES: &[&str] = &["standard-library", "platform-heap", "embedded-runtime", "custom"];
const CXX_ALLOC_TYPES: &[&str] = &["platform-heap", "embedded-runtime", "custom"];
const ALIGN: OptionKind = OptionKind::Align {
    min: 1,
    max: MAX_HEAP_ALIGN,
};

const GATE_DEBUG: Gate = Gate {
    parent: keys::LOG_LEVEL,
    values: &["debug"],
};
const GATE_GENERAL_HEAP: Gate = Gate {
    parent: keys::GENERAL_ALLOC_TYPE,
    values: &["platform-heap"],
};
const GATE_GENERAL_CUSTOM: Gate = Gate {
    parent: keys::GENERAL_ALLOC_TYPE,
    values: &["custom"],
};
const GATE_CXX: Gate = Gate {
    parent: keys::ENABLE_CXX_GLOBAL_ALLOC_OVERRIDE,
    values: &["true"],
};
const GATE_CXX_HEAP: Gate = Gate {
    parent: keys::CXX_ALLOC_TYPE,
    values: &["platform-heap"],
};
const GATE_CXX_CUSTOM: Gate = Gate {
    parent: keys::CXX_ALLOC_TYPE,
    values: &["custom"],
};

/// Every recognized option.
pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        key: keys::SCHEMA_VERSION,
        kind: OptionKind::Version,
        default: DefaultValue::LibraryVersion,
        gate: None,
        description: "Schema version the configuration was written against",
    },
    OptionSpec {
        key: keys::CHECK_HANDLE_METHOD,
        kind: OptionKind::Enum(CHECK_METHODS),
        default: DefaultValue::Text("error-log"),
        gate: None,
        description: "Behavior when a validation check fails",
    },
    OptionSpec {
        key: keys::LOG_LEVEL,
        kind: OptionKind::Enum(LOG_LEVELS),
        default: DefaultValue::Text("info"),
        gate: None,
        description: "Minimum severity compiled in",
    },
    OptionSpec {
        key: keys::LOG_BACKEND,
        kind: OptionKind::Enum(LOG_BACKENDS),
        default: DefaultValue::Text("standard-library"),
        gate: None,
        description: "Logging primitives to bind",
    },
    OptionSpec {
        key: keys::TRACE_ON_ENTER_EXIT,
        kind: OptionKind::Bool,
        default: DefaultValue::Bool(false),
        gate: Some(GATE_DEBUG),
        description: "Emit trace lines when entering and leaving functions",
    },
    OptionSpec {
        key: keys::DEFAULT_GENERAL_ALLOC_ENABLED,
        kind: OptionKind::Bool,
        default: DefaultValue::Bool(true),
        gate: None,
        description: "Use the general allocator by default instead of raw malloc/free",
    },
    OptionSpec {
        key: keys::GENERAL_ALLOC_TYPE,
        kind: OptionKind::Enum(GENERAL_ALLOC_TYPES),
        default: DefaultValue::Text("standard-library"),
        gate: None,
        description: "General allocator backend",
    },
    OptionSpec {
        key: keys::PLATFORM_HEAP_ALIGN,
        kind: ALIGN,
        default: DefaultValue::UInt(1),
        gate: Some(GATE_GENERAL_HEAP),
        description: "Alignment for platform heap allocations",
    },
    OptionSpec {
        key: keys::PLATFORM_HEAP_CAPS,
        kind: OptionKind::CapFlags,
        default: DefaultValue::Flags(&["default", "8bit"]),
        gate: Some(GATE_GENERAL_HEAP),
        description: "Capability flags for platform heap allocations",
    },
    OptionSpec {
        key: keys::CUSTOM_ALLOC_INCLUDE,
        kind: OptionKind::Text,
        default: DefaultValue::Required,
        gate: Some(GATE_GENERAL_CUSTOM),
        description: "Header declaring the custom allocator symbols",
    },
    OptionSpec {
        key: keys::CUSTOM_MALLOC_SYMBOL,
        kind: OptionKind::Text,
        default: DefaultValue::Required,
        gate: Some(GATE_GENERAL_CUSTOM),
        description: "Custom allocation function",
    },
    OptionSpec {
        key: keys::CUSTOM_FREE_SYMBOL,
        kind: OptionKind::Text,
        default: DefaultValue::Required,
        gate: Some(GATE_GENERAL_CUSTOM),
        description: "Custom release function",
    },
    OptionSpec {
        key: keys::ENABLE_CXX_GLOBAL_ALLOC_OVERRIDE,
        kind: OptionKind::Bool,
        default: DefaultValue::Bool(false),
        gate: None,
        description: "Override language-level allocation operators process-wide",
    },
    OptionSpec {
        key: keys::CXX_DEFAULT_ENABLED,
        kind: OptionKind::Bool,
        default: DefaultValue::Bool(true),
        gate: Some(GATE_CXX),
        description: "Route overridden operators through the configured backend by default",
    },
    OptionSpec {
        key: keys::CXX_ALLOC_TYPE,
        kind: OptionKind::Enum(CXX_ALLOC_TYPES),
        default: DefaultValue::Text("platform-heap"),
        gate: Some(GATE_CXX),
        description: "Backend for overridden allocation operators",
    },
    OptionSpec {
        key: keys::CXX_PLATFORM_HEAP_ALIGN,
        kind: ALIGN,
        default: DefaultValue::UInt(1),
        gate: Some(GATE_CXX_HEAP),
        description: "Alignment for overridden operators on the platform heap",
    },
    OptionSpec {
        key: keys::CXX_PLATFORM_HEAP_CAPS,
        kind: OptionKind::CapFlags,
        default: DefaultValue::Flags(&["default"]),
        gate: Some(GATE_CXX_HEAP),
        description: "Capability flags for overridden operators on the platform heap",
    },
    OptionSpec {
        key: keys::CXX_CUSTOM_INCLUDE,
        kind: OptionKind::Text,
        default: DefaultValue::Required,
        gate: Some(GATE_CXX_CUSTOM),
        description: "Header declaring the custom operator backend",
    },
    OptionSpec {
        key: keys::CXX_CUSTOM_MALLOC_SYMBOL,
        kind: OptionKind::Text,
        default: DefaultValue::Required,
        gate: Some(GATE_CXX_CUSTOM),
        description: "Custom allocation function for overridden operators",
    },
    OptionSpec {
        key: keys::CXX_CUSTOM_FREE_SYMBOL,
        kind: OptionKind::Text,
        default: DefaultValue::Required,
        gate: Some(GATE_CXX_CUSTOM),
        description: "Custom release function for overridden operators",
    },
    OptionSpec {
        key: keys::PLUGIN_SUPPORT,
        kind: OptionKind::Bool,
        default: DefaultValue::Bool(false),
        gate: None,
        description: "Enable the plugin handler registry",
    },
];

/// Find an option by key (normalized: `log_level` finds `log-level`).
pub fn lookup(key: &str) -> Option<&'static OptionSpec> {
    let key = crate::value::normalize_key(key);
    OPTIONS.iter().find(|spec| spec.key == key)
}

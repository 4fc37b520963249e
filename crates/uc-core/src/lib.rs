//! Utils-conf core.
//!
//! Consumers of the utility library link against this crate. The binding set
//! is resolved from `utils_conf.toml` when the crate is built and exposed
//! through [`baked`]. Around it sit the runtime pieces the bindings select:
//! - [`check::CheckHandler`]: what a failed handle check does
//! - [`logging`]: tracing bring-up at the bound level, enter/exit guards
//! - [`memory::GeneralAllocator`]: allocation through an injected backend
//! - [`plugin::PluginRegistry`]: handlers keyed by stable id

pub mod baked;
pub mod check;
pub mod exit_codes;
pub mod logging;
pub mod memory;
pub mod plugin;

pub use check::CheckHandler;
pub use exit_codes::ExitCode;
pub use logging::EnterExitGuard;
pub use memory::{Allocation, GeneralAllocator, MemoryBackend, SystemBackend};
pub use plugin::{PluginHandler, PluginRegistry};

use uc_config::BindingSet;

/// Registry holding the built-in plugins for `bindings`.
pub fn builtin_registry(
    bindings: &BindingSet,
    effective: uc_config::OptionMap,
) -> uc_common::Result<PluginRegistry> {
    PluginRegistry::new(bindings)?
        .with(Box::new(plugin::OptionQueryPlugin::new(effective)))?
        .with(Box::new(plugin::BindingsPlugin::new(bindings.clone())))
}

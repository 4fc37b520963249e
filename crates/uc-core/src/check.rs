//! Handle and precondition checks.
//!
//! The bound check-handle method decides what happens when a check fails:
//! nothing, an error event, or a panic.

use std::fmt::Display;
use std::panic::Location;
use tracing::error;
use uc_config::{BindingSet, CheckHandleMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckHandler {
    method: CheckHandleMethod,
}

impl CheckHandler {
    pub fn new(method: CheckHandleMethod) -> Self {
        Self { method }
    }

    pub fn from_bindings(bindings: &BindingSet) -> Self {
        Self::new(bindings.check_handle_method)
    }

    pub fn method(&self) -> CheckHandleMethod {
        self.method
    }

    /// Check `condition`, returning it.
    ///
    /// Under `assert` a failed check panics.
    #[track_caller]
    pub fn check(&self, condition: bool, message: impl Display) -> bool {
        if !condition {
            self.fail(Location::caller(), &message);
        }
        condition
    }

    /// Check that a handle is present.
    #[track_caller]
    pub fn check_handle<T>(&self, handle: Option<T>, name: &str) -> Option<T> {
        if handle.is_none() {
            self.fail(Location::caller(), &format_args!("invalid handle: {}", name));
        }
        handle
    }

    fn fail(&self, location: &Location<'_>, message: &dyn Display) {
        match self.method {
            CheckHandleMethod::None => {}
            CheckHandleMethod::ErrorLog => error!(
                file = location.file(),
                line = location.line(),
                "check failed: {}",
                message
            ),
            CheckHandleMethod::Assert => {
                panic!("check failed at {}: {}", location, message)
            }
        }
    }
}

//! Utils-conf common types and errors.
//!
//! This crate provides foundational types shared by the resolver and its consumers:
//! - Schema versioning and the compatibility policy for configuration files
//! - Common error types with stable codes

pub mod error;
pub mod schema;

pub use error::{Error, Result};
pub use schema::{check_compatibility, Compatibility, SchemaVersion, SCHEMA_VERSION};

//! Bindings baked in at build time.
//!
//! `build.rs` resolves `utils_conf.toml` (or the file named by
//! `UTILS_CONF_PATH`) and generates the constants below. A configuration
//! that fails to resolve fails the build, so these always describe a valid
//! binding set.

use uc_config::{BindingSet, SchemaVersion};

include!(concat!(env!("OUT_DIR"), "/utils_conf_bindings.rs"));

/// Schema version the baked bindings were resolved against.
pub fn schema_version() -> SchemaVersion {
    SchemaVersion::new(SCHEMA_VERSION_MAJOR, SCHEMA_VERSION_MINOR, SCHEMA_VERSION_PATCH)
}

/// The baked binding set.
pub fn bindings() -> Result<BindingSet, serde_json::Error> {
    BindingSet::from_json(BINDINGS_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_and_constants_agree() {
        let b = bindings().unwrap();
        assert_eq!(b.schema_version, schema_version());
        assert_eq!(b.check_handle_method.as_str(), CHECK_HANDLE_METHOD);
        assert_eq!(b.log.level.as_str(), LOG_LEVEL);
        assert_eq!(b.general_alloc.malloc_symbol, GENERAL_ALLOC_MALLOC.unwrap_or_default());
        assert_eq!(b.cxx_global_alloc.is_some(), CXX_GLOBAL_ALLOC_OVERRIDE);
        assert_eq!(b.plugin_support, PLUGIN_SUPPORT);
        assert_eq!(b.fingerprint().unwrap(), BINDINGS_FINGERPRINT);
    }

    #[test]
    fn baked_schema_is_compatible_with_library() {
        assert!(uc_common::check_compatibility(uc_config::SCHEMA_VERSION, schema_version()).is_ok());
    }
}

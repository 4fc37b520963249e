//! Resolution snapshots: a serializable record of what was bound, from where.

use serde::Serialize;
use uc_common::{Compatibility, SchemaVersion};

use crate::binding::BindingSet;
use crate::resolve::Resolution;
use crate::validate::ValidationWarning;

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionSnapshot {
    pub library_version: SchemaVersion,
    pub declared_version: SchemaVersion,
    pub compatibility: Compatibility,
    pub fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub resolved_at: String,
    pub warnings: Vec<ValidationWarning>,
    pub bindings: BindingSet,
}

impl ResolutionSnapshot {
    pub fn capture(
        resolution: &Resolution,
        source: Option<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            library_version: resolution.bindings.schema_version,
            declared_version: resolution.declared_version,
            compatibility: resolution.compatibility,
            fingerprint: resolution.bindings.fingerprint()?,
            source,
            resolved_at: chrono::Utc::now().to_rfc3339(),
            warnings: resolution.warnings.clone(),
            bindings: resolution.bindings.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolver;
    use crate::value::OptionMap;

    #[test]
    fn snapshot_carries_fingerprint_and_warnings() {
        let map = OptionMap::new().with("schema-version", "1.6.0");
        let resolution = Resolver::new(map).bind().unwrap();
        let snap = ResolutionSnapshot::capture(&resolution, Some("utils_conf.toml".into())).unwrap();
        assert_eq!(snap.fingerprint, resolution.bindings.fingerprint().unwrap());
        assert_eq!(snap.compatibility, Compatibility::MinorDrift);
        assert_eq!(snap.warnings.len(), 1);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["library_version"], "1.5.0");
        assert_eq!(json["declared_version"], "1.6.0");
        assert_eq!(json["compatibility"], "minor_drift");
        assert!(chrono::DateTime::parse_from_rfc3339(json["resolved_at"].as_str().unwrap()).is_ok());
    }
}

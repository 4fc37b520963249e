//! Schema versioning and compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Current schema version of the configuration surface.
///
/// Follows semver: MAJOR.MINOR.PATCH
/// - MAJOR: Breaking changes (options removed or renamed, value sets narrowed)
/// - MINOR: Additive changes (new options with defaults)
/// - PATCH: Documentation and default-neutral fixes
pub const SCHEMA_VERSION: SchemaVersion = SchemaVersion::new(1, 5, 0);

/// A `(major, minor, patch)` compatibility descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidVersion(s.to_string()));
        }
        let parse = |p: &str| {
            p.parse::<u32>()
                .map_err(|_| Error::InvalidVersion(s.to_string()))
        };
        Ok(Self::new(parse(parts[0])?, parse(parts[1])?, parse(parts[2])?))
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(v: SchemaVersion) -> Self {
        v.to_string()
    }
}

/// Outcome of a successful compatibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    /// Versions are identical.
    Exact,
    /// Only the patch component differs; no functional effect.
    PatchDrift,
    /// The minor component differs; options missing from the configuration
    /// take their defaults and options unknown to the library are ignored.
    MinorDrift,
}

impl Compatibility {
    /// Whether the outcome should be surfaced to the user as a warning.
    pub fn is_warning(self) -> bool {
        matches!(self, Compatibility::MinorDrift)
    }
}

/// Compare the version a configuration declares against the library's schema.
///
/// A major mismatch is a hard failure: the configuration must be replaced with
/// the one shipped with the library.
pub fn check_compatibility(
    library: SchemaVersion,
    declared: SchemaVersion,
) -> Result<Compatibility, Error> {
    if library.major != declared.major {
        return Err(Error::IncompatibleSchema {
            library: library.to_string(),
            declared: declared.to_string(),
        });
    }
    if library.minor != declared.minor {
        return Ok(Compatibility::MinorDrift);
    }
    if library.patch != declared.patch {
        return Ok(Compatibility::PatchDrift);
    }
    Ok(Compatibility::Exact)
}

//! Declared module versions.
//!
//! Versions are only ever compared for equality and ordered for stable
//! output; no range or compatibility logic lives here.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A version string as declared by a module (`v0.1.0`, `1.2.3`, a commit hash...).
///
/// Two versions are equal when their raw strings are equal. Ordering uses
/// semver precedence when both sides parse (a leading `v` is ignored) and
/// falls back to plain string order otherwise.
#[derive(Debug, Clone)]
pub struct ModuleVersion {
    raw: String,
    semver: Option<semver::Version>,
}

impl ModuleVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        let semver = semver::Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed)).ok();
        Self {
            raw: trimmed.to_string(),
            semver,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed semantic version, if the raw string is one.
    pub fn semver(&self) -> Option<&semver::Version> {
        self.semver.as_ref()
    }
}

impl PartialEq for ModuleVersion {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ModuleVersion {}

impl Hash for ModuleVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Ord for ModuleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_semver = match (&self.semver, &other.semver) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        // Raw tiebreak keeps Ord consistent with Eq.
        by_semver.then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for ModuleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ModuleVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for ModuleVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ModuleVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

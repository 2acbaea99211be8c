//! The validated in-memory manifest of a single module.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::version::ModuleVersion;

/// Path-like identity of a module, e.g. `modules/ssh`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identity lives under the given path prefix.
    pub fn in_namespace(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One module: identity, declared tier, direct dependencies and version.
///
/// Construction validates the declaration in isolation. Properties that
/// involve other modules (unresolved edges, cycles, tier ordering) are
/// checked when the graph is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    id: ModuleId,
    tier: u32,
    dependencies: Vec<ModuleId>,
    version: Option<ModuleVersion>,
    resolution_key: Option<String>,
}

impl Module {
    /// Validate and construct a module declaration.
    ///
    /// Duplicate dependency entries are collapsed, keeping first-seen order.
    pub fn new<I, D>(
        id: impl Into<String>,
        tier: i64,
        dependencies: I,
        version: Option<ModuleVersion>,
    ) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        let id: String = id.into();
        let invalid = |reason: String| ModelError::InvalidManifest {
            module: id.clone(),
            reason,
        };

        if id.trim().is_empty() {
            return Err(invalid("module identity is empty".to_string()));
        }
        let tier = u32::try_from(tier).map_err(|_| {
            invalid(format!("tier must be a non-negative integer, got {tier}"))
        })?;

        let mut deps: Vec<ModuleId> = Vec::new();
        for dep in dependencies {
            let dep: String = dep.into();
            if dep.trim().is_empty() {
                return Err(invalid("dependency identity is empty".to_string()));
            }
            if dep == id {
                return Err(invalid("a module cannot depend on itself".to_string()));
            }
            let dep = ModuleId::new(dep);
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }

        Ok(Self {
            id: ModuleId::new(id),
            tier,
            dependencies: deps,
            version,
            resolution_key: None,
        })
    }

    /// Group this module under a resolution key other than its identity.
    ///
    /// Used when the same logical module is reachable under several paths
    /// (e.g. a vendored copy).
    pub fn with_resolution_key(mut self, key: impl Into<String>) -> Result<Self, ModelError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ModelError::InvalidManifest {
                module: self.id.to_string(),
                reason: "resolution key is empty".to_string(),
            });
        }
        self.resolution_key = Some(key);
        Ok(self)
    }

    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    /// Direct dependencies, in declaration order.
    pub fn dependencies(&self) -> &[ModuleId] {
        &self.dependencies
    }

    pub fn version(&self) -> Option<&ModuleVersion> {
        self.version.as_ref()
    }

    /// The key conflict detection groups this module under.
    pub fn resolution_key(&self) -> &str {
        self.resolution_key.as_deref().unwrap_or(self.id.as_str())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.id, v),
            None => write!(f, "{}", self.id),
        }
    }
}

//! `Modguard.toml`: the verification request and how modules are found.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use modguard_util::errors::ModguardError;

use crate::error::ModelError;
use crate::module::{Module, ModuleId};
use crate::policy::{ImportBundle, TierBound};
use crate::version::ModuleVersion;

/// The parsed representation of a `Modguard.toml` file: one verification request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModguardConfig {
    #[serde(default)]
    pub workspace: WorkspaceSettings,

    #[serde(default)]
    pub modules: BTreeMap<String, ModuleDecl>,

    #[serde(default)]
    pub bounds: BTreeMap<String, TierBound>,

    #[serde(default)]
    pub bundles: Vec<BundleDecl>,

    #[serde(default)]
    pub oracle: OracleConfig,
}

/// Repository layout settings from `[workspace]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Module path prefix of the monorepo, stripped from scanned `go.mod` paths.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Directory globs scanned for `go.mod` files. Empty disables scanning.
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A module declared directly in `[modules."<id>"]`.
///
/// When scanning is enabled, an entry may carry only a `tier` to pin the
/// tier of a scanned module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDecl {
    #[serde(default)]
    pub tier: Option<i64>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "resolution-key")]
    pub resolution_key: Option<String>,
}

/// One entry of `[[bundles]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDecl {
    #[serde(default)]
    pub name: Option<String>,
    pub members: Vec<String>,
}

/// External build oracle settings from `[oracle]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_program")]
    pub program: String,
    /// Version requested for every module when generating consumer projects.
    #[serde(default = "default_oracle_version")]
    pub version: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            version: default_oracle_version(),
            env: BTreeMap::new(),
        }
    }
}

fn default_program() -> String {
    "go".to_string()
}

fn default_oracle_version() -> String {
    "v0.1.0".to_string()
}

impl ModguardConfig {
    /// Load and parse a `Modguard.toml` from disk.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ModguardError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Ok(Self::parse(&content)?)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ModguardError> {
        toml::from_str(content).map_err(|e| ModguardError::Config {
            message: format!("Failed to parse Modguard.toml: {e}"),
        })
    }

    /// Find `Modguard.toml` in `start` or one of its ancestors and load it.
    ///
    /// Returns the directory containing the file alongside the config.
    pub fn discover(start: &Path) -> miette::Result<(PathBuf, Self)> {
        let root = modguard_util::fs::find_ancestor_with(start, crate::CONFIG_FILE_NAME)
            .ok_or_else(|| ModguardError::Config {
                message: format!(
                    "Could not find {} in {} or any parent directory",
                    crate::CONFIG_FILE_NAME,
                    start.display()
                ),
            })?;
        let config = Self::from_path(&root.join(crate::CONFIG_FILE_NAME))?;
        Ok((root, config))
    }

    /// Whether modules should be discovered from `go.mod` files.
    pub fn scans(&self) -> bool {
        !self.workspace.include.is_empty()
    }

    /// Build validated modules from the `[modules]` table.
    ///
    /// Every entry must declare a tier here; tier-only pins for scanned
    /// modules are read with [`ModguardConfig::pinned_tiers`] instead.
    pub fn declared_modules(&self) -> Result<Vec<Module>, ModelError> {
        self.modules
            .iter()
            .map(|(id, decl)| {
                let tier = decl.tier.ok_or_else(|| ModelError::InvalidManifest {
                    module: id.clone(),
                    reason: "tier is not declared".to_string(),
                })?;
                decl.to_module(id, tier)
            })
            .collect()
    }

    /// Tiers pinned in `[modules]`, used to override derived tiers of scanned modules.
    pub fn pinned_tiers(&self) -> BTreeMap<ModuleId, i64> {
        self.modules
            .iter()
            .filter_map(|(id, decl)| decl.tier.map(|t| (ModuleId::from(id.as_str()), t)))
            .collect()
    }

    pub fn tier_bounds(&self) -> Vec<(ModuleId, TierBound)> {
        self.bounds
            .iter()
            .map(|(id, bound)| (ModuleId::from(id.as_str()), bound.clone()))
            .collect()
    }

    pub fn import_bundles(&self) -> Vec<ImportBundle> {
        self.bundles
            .iter()
            .map(|decl| {
                let bundle = ImportBundle::new(decl.members.iter().map(String::as_str));
                match &decl.name {
                    Some(name) => bundle.named(name.clone()),
                    None => bundle,
                }
            })
            .collect()
    }
}

impl ModuleDecl {
    /// Turn this declaration into a validated module with the given tier.
    pub fn to_module(&self, id: &str, tier: i64) -> Result<Module, ModelError> {
        let module = Module::new(
            id,
            tier,
            self.dependencies.iter().map(String::as_str),
            self.version.as_deref().map(ModuleVersion::new),
        )?;
        match &self.resolution_key {
            Some(key) => module.with_resolution_key(key.clone()),
            None => Ok(module),
        }
    }
}

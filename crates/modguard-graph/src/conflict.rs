//! Ambiguous-import detection for modules imported together.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use modguard_core::error::ModelError;
use modguard_core::module::ModuleId;
use modguard_core::policy::ImportBundle;
use modguard_core::version::ModuleVersion;
use serde::Serialize;

use crate::closure::ClosureCache;

/// A resolution key that resolves to more than one version once the
/// bundle's closures are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub key: String,
    /// Ordered by version, then identity.
    pub candidates: Vec<ConflictCandidate>,
}

/// One module competing for a conflicting resolution key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictCandidate {
    pub module: ModuleId,
    pub version: Option<ModuleVersion>,
    /// Bundle members whose import brings this module in.
    pub requested_by: BTreeSet<ModuleId>,
}

/// The bundle members plus the union of their closures.
pub fn merged_resolution_set(
    cache: &ClosureCache,
    bundle: &ImportBundle,
) -> Result<BTreeSet<ModuleId>, ModelError> {
    Ok(requesters(cache, bundle)?.into_keys().collect())
}

/// For every module in the merged set, the bundle members that pull it in.
fn requesters(
    cache: &ClosureCache,
    bundle: &ImportBundle,
) -> Result<BTreeMap<ModuleId, BTreeSet<ModuleId>>, ModelError> {
    let mut requested: BTreeMap<ModuleId, BTreeSet<ModuleId>> = BTreeMap::new();
    for root in bundle.members() {
        let closure = cache.get(root.as_str())?;
        for id in std::iter::once(root).chain(closure.iter()) {
            requested
                .entry(id.clone())
                .or_default()
                .insert(root.clone());
        }
    }
    Ok(requested)
}

/// Find every resolution key that maps to more than one distinct version.
///
/// An absent version is a distinct value of its own. The result is sorted by
/// key and does not depend on bundle order; an empty result means the
/// bundle resolves unambiguously.
pub fn detect_conflicts(
    cache: &ClosureCache,
    bundle: &ImportBundle,
) -> Result<Vec<Conflict>, ModelError> {
    let graph = cache.graph();
    let mut by_key: BTreeMap<&str, Vec<ConflictCandidate>> = BTreeMap::new();

    for (id, requested_by) in requesters(cache, bundle)? {
        let module = graph
            .get(id.as_str())
            .ok_or_else(|| ModelError::UnknownModule { module: id.clone() })?;
        by_key
            .entry(module.resolution_key())
            .or_default()
            .push(ConflictCandidate {
                module: id,
                version: module.version().cloned(),
                requested_by,
            });
    }

    let mut conflicts = Vec::new();
    for (key, mut candidates) in by_key {
        let versions: BTreeSet<Option<&ModuleVersion>> =
            candidates.iter().map(|c| c.version.as_ref()).collect();
        if versions.len() < 2 {
            continue;
        }
        candidates.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.module.cmp(&b.module)));
        conflicts.push(Conflict {
            key: key.to_string(),
            candidates,
        });
    }

    if !conflicts.is_empty() {
        tracing::debug!(
            "Bundle {} has {} ambiguous resolution key(s)",
            bundle,
            conflicts.len()
        );
    }
    Ok(conflicts)
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ambiguous import '{}':", self.key)?;
        for (i, c) in self.candidates.iter().enumerate() {
            let sep = if i == 0 { " " } else { "; " };
            let version = c
                .version
                .as_ref()
                .map(ModuleVersion::as_str)
                .unwrap_or("unversioned");
            let requested: Vec<&str> = c.requested_by.iter().map(ModuleId::as_str).collect();
            write!(
                f,
                "{sep}{} {version} needed by {}",
                c.module,
                requested.join(", ")
            )?;
        }
        Ok(())
    }
}

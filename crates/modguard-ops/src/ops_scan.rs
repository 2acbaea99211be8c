//! Operation: gather module manifests, from `Modguard.toml` or by scanning
//! the repository for `go.mod` files.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use modguard_core::config::ModguardConfig;
use modguard_core::error::ModelError;
use modguard_core::gomod::GoMod;
use modguard_core::module::{Module, ModuleId};
use modguard_core::version::ModuleVersion;
use modguard_graph::graph::DependencyGraph;
use modguard_util::errors::ModguardError;
use modguard_util::fs::{build_globset, find_files_named};

/// A module found on disk, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedModule {
    pub id: ModuleId,
    /// Directory holding the module's `go.mod`.
    pub dir: PathBuf,
    /// Internal requirements, in `go.mod` order.
    pub requires: Vec<ScannedRequire>,
}

/// One internal `require` entry of a scanned module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRequire {
    pub id: ModuleId,
    pub version: ModuleVersion,
    /// Marked `// indirect`: needed by a dependency, not imported directly.
    pub indirect: bool,
}

impl ScannedModule {
    pub fn dependency_ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.requires.iter().map(|r| &r.id)
    }
}

/// Discover modules under `root` when `[workspace].include` is set.
///
/// Returns an empty list when scanning is disabled.
pub fn scan(root: &Path, config: &ModguardConfig) -> miette::Result<Vec<ScannedModule>> {
    if !config.scans() {
        return Ok(Vec::new());
    }
    let include = build_globset(&config.workspace.include)?;
    let exclude = build_globset(&config.workspace.exclude)?;
    let files = find_files_named(root, "go.mod", &include, &exclude).map_err(|e| {
        ModguardError::Scan {
            message: format!("Failed to walk {}: {e}", root.display()),
        }
    })?;

    let namespace = config.workspace.namespace.as_deref();
    let mut parsed = Vec::with_capacity(files.len());
    for file in &files {
        let gomod = GoMod::from_path(file)?;
        let dir = file.parent().unwrap_or(root).to_path_buf();
        parsed.push((dir, gomod));
    }

    let known: HashSet<&str> = parsed.iter().map(|(_, g)| g.module.as_str()).collect();
    let is_internal = |path: &str| match namespace {
        Some(prefix) => path.starts_with(prefix),
        None => known.contains(path),
    };

    let modules = parsed
        .iter()
        .map(|(dir, gomod)| {
            let requires: Vec<ScannedRequire> = gomod
                .requires
                .iter()
                .filter(|r| is_internal(&r.path))
                .map(|r| ScannedRequire {
                    id: strip_namespace(&r.path, namespace),
                    version: ModuleVersion::new(&r.version),
                    indirect: r.indirect,
                })
                .collect();
            let id = strip_namespace(&gomod.module, namespace);
            tracing::debug!(
                "{id}: {} internal requirement(s), {} indirect",
                requires.len(),
                requires.iter().filter(|r| r.indirect).count()
            );
            ScannedModule {
                id,
                dir: dir.clone(),
                requires,
            }
        })
        .collect::<Vec<_>>();

    tracing::info!("Scanned {} go.mod file(s) under {}", modules.len(), root.display());
    Ok(modules)
}

fn strip_namespace(path: &str, namespace: Option<&str>) -> ModuleId {
    let stripped = namespace
        .and_then(|prefix| path.strip_prefix(prefix))
        .unwrap_or(path);
    ModuleId::from(stripped)
}

/// Turn scanned modules and config declarations into validated manifests.
///
/// Scanned modules take version and resolution key from a matching
/// `[modules]` entry, and their tier from it when pinned; otherwise the tier
/// is derived from the dependency structure and the version is the one
/// selected from sibling requirements. Config entries without a scanned
/// counterpart are added as fully declared modules.
pub fn manifests(
    config: &ModguardConfig,
    scanned: &[ScannedModule],
) -> Result<Vec<Module>, ModelError> {
    if scanned.is_empty() {
        return config.declared_modules();
    }

    let pinned = config.pinned_tiers();
    let tiers = derive_tiers(scanned, &pinned);
    let selected = select_versions(scanned);
    let mut modules = Vec::with_capacity(scanned.len() + config.modules.len());
    let mut seen = HashSet::new();

    for sm in scanned {
        let mut decl = config.modules.get(sm.id.as_str()).cloned().unwrap_or_default();
        let tier = tiers.get(&sm.id).copied().unwrap_or(0);
        decl.dependencies = sm.dependency_ids().map(|d| d.to_string()).collect();
        if decl.version.is_none() {
            decl.version = selected.get(&sm.id).map(|v| v.as_str().to_string());
        }
        modules.push(decl.to_module(sm.id.as_str(), tier)?);
        seen.insert(sm.id.as_str());
    }

    for (id, decl) in &config.modules {
        if seen.contains(id.as_str()) {
            continue;
        }
        let tier = decl.tier.ok_or_else(|| ModelError::InvalidManifest {
            module: id.clone(),
            reason: "tier is not declared and the module was not found by scanning".to_string(),
        })?;
        modules.push(decl.to_module(id, tier)?);
    }

    Ok(modules)
}

/// Version of each internal module as the Go toolchain would select it: the
/// highest version any scanned module requires. Modules nobody requires are
/// absent.
pub fn select_versions(scanned: &[ScannedModule]) -> BTreeMap<ModuleId, ModuleVersion> {
    let mut selected: BTreeMap<ModuleId, ModuleVersion> = BTreeMap::new();
    for req in scanned.iter().flat_map(|sm| sm.requires.iter()) {
        match selected.get_mut(&req.id) {
            Some(current) if *current >= req.version => {}
            Some(current) => {
                tracing::info!(
                    "{} is required at {current} and {}; selecting the higher",
                    req.id,
                    req.version
                );
                *current = req.version.clone();
            }
            None => {
                selected.insert(req.id.clone(), req.version.clone());
            }
        }
    }
    selected
}

/// Tier for each scanned module: the pinned value when declared, otherwise
/// one above its highest dependency (0 for modules without internal deps).
///
/// Cycles and unknown dependencies are tolerated here and reported by the
/// graph builder.
pub fn derive_tiers(
    scanned: &[ScannedModule],
    pinned: &BTreeMap<ModuleId, i64>,
) -> BTreeMap<ModuleId, i64> {
    let deps: BTreeMap<&ModuleId, Vec<&ModuleId>> = scanned
        .iter()
        .map(|sm| (&sm.id, sm.dependency_ids().collect()))
        .collect();
    let mut tiers = BTreeMap::new();
    let mut visiting = HashSet::new();
    for sm in scanned {
        tier_of(&sm.id, &deps, pinned, &mut tiers, &mut visiting);
    }
    tiers
}

fn tier_of(
    id: &ModuleId,
    deps: &BTreeMap<&ModuleId, Vec<&ModuleId>>,
    pinned: &BTreeMap<ModuleId, i64>,
    tiers: &mut BTreeMap<ModuleId, i64>,
    visiting: &mut HashSet<ModuleId>,
) -> i64 {
    let known = pinned.get(id).or_else(|| tiers.get(id)).copied();
    if let Some(tier) = known {
        tiers.entry(id.clone()).or_insert(tier);
        return tier;
    }
    if !visiting.insert(id.clone()) {
        return 0;
    }
    let tier = deps
        .get(id)
        .map(|ds| {
            ds.iter()
                .map(|d| tier_of(d, deps, pinned, tiers, visiting) + 1)
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    visiting.remove(id);
    tiers.insert(id.clone(), tier);
    tier
}

/// Load the manifests for `root` and build the graph, failing on any
/// structural error.
pub fn load_graph(root: &Path, config: &ModguardConfig) -> miette::Result<DependencyGraph> {
    let scanned = scan(root, config)?;
    let modules = manifests(config, &scanned)?;
    Ok(DependencyGraph::build(&modules)?)
}

/// Print the module inventory: identity, tier, version, direct deps.
pub fn list(root: &Path, config: &ModguardConfig) -> miette::Result<()> {
    let graph = load_graph(root, config)?;
    modguard_util::progress::status_info(
        "Found",
        &format!("{} module(s), {} edge(s)", graph.len(), graph.edge_count()),
    );
    for module in graph.modules() {
        let deps: Vec<&str> = module.dependencies().iter().map(ModuleId::as_str).collect();
        println!(
            "{:<40} tier {:<3} {:<10} [{}]",
            module.id().as_str(),
            module.tier(),
            module.version().map(|v| v.as_str()).unwrap_or("-"),
            deps.join(", ")
        );
    }
    Ok(())
}

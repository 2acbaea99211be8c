//! Operation: compare the engine's predictions with what a real toolchain
//! resolves and builds.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use modguard_core::config::ModguardConfig;
use modguard_core::module::ModuleId;
use modguard_core::policy::ImportBundle;
use modguard_graph::closure::ClosureCache;
use modguard_graph::conflict::detect_conflicts;
use modguard_graph::graph::DependencyGraph;
use modguard_util::errors::ModguardError;
use serde::Serialize;

use crate::ops_scan;
use crate::ops_scan::ScannedModule;
use crate::oracle::{BuildOracle, GoToolchainOracle};

/// Predicted versus observed closure of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCrossCheck {
    pub module: ModuleId,
    pub predicted: BTreeSet<ModuleId>,
    pub observed: BTreeSet<ModuleId>,
    /// Resolved by the toolchain but absent from the graph closure.
    pub missing: BTreeSet<ModuleId>,
    /// In the graph closure but not resolved by the toolchain.
    pub unexpected: BTreeSet<ModuleId>,
}

impl ModuleCrossCheck {
    pub fn agrees(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

impl fmt::Display for ModuleCrossCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.agrees() {
            return write!(
                f,
                "{}: graph and toolchain agree on {} module(s)",
                self.module,
                self.predicted.len()
            );
        }
        write!(f, "{}: closure differs from toolchain", self.module)?;
        if !self.missing.is_empty() {
            write!(f, "; missing from graph: {}", join(&self.missing))?;
        }
        if !self.unexpected.is_empty() {
            write!(f, "; not resolved by toolchain: {}", join(&self.unexpected))?;
        }
        Ok(())
    }
}

/// Predicted versus observed ambiguity of one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleCrossCheck {
    pub bundle: String,
    pub predicted_ambiguous: bool,
    pub observed_ambiguous: bool,
    pub build_succeeded: bool,
}

impl BundleCrossCheck {
    pub fn agrees(&self) -> bool {
        self.predicted_ambiguous == self.observed_ambiguous
    }
}

impl fmt::Display for BundleCrossCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = |ambiguous: bool| if ambiguous { "ambiguous" } else { "unambiguous" };
        write!(
            f,
            "{}: graph predicts {}, toolchain reports {}",
            self.bundle,
            verdict(self.predicted_ambiguous),
            verdict(self.observed_ambiguous)
        )?;
        if !self.build_succeeded && !self.observed_ambiguous {
            write!(f, " (build failed)")?;
        }
        Ok(())
    }
}

/// Whether a module builds on its own from its directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleBuildCheck {
    pub module: ModuleId,
    pub success: bool,
    /// Toolchain output, kept for failed builds only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ModuleBuildCheck {
    pub fn agrees(&self) -> bool {
        self.success
    }
}

impl fmt::Display for ModuleBuildCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            return write!(f, "{}: builds on its own", self.module);
        }
        write!(f, "{}: build failed", self.module)?;
        let output = self.output.as_deref().map(str::trim_end).unwrap_or_default();
        if !output.is_empty() {
            write!(f, "\n{output}")?;
        }
        Ok(())
    }
}

fn join(ids: &BTreeSet<ModuleId>) -> String {
    ids.iter().map(ModuleId::as_str).collect::<Vec<_>>().join(", ")
}

/// Cross-check one module's closure against the oracle.
pub fn cross_check_module(
    cache: &ClosureCache,
    oracle: &dyn BuildOracle,
    module: &ModuleId,
) -> miette::Result<ModuleCrossCheck> {
    let predicted = cache.get(module.as_str())?.as_ref().clone();
    let observed = oracle.resolve_module(module)?.modules;
    let missing = observed.difference(&predicted).cloned().collect();
    let unexpected = predicted.difference(&observed).cloned().collect();
    Ok(ModuleCrossCheck {
        module: module.clone(),
        predicted,
        observed,
        missing,
        unexpected,
    })
}

/// Cross-check one bundle's ambiguity verdict against the oracle.
pub fn cross_check_bundle(
    cache: &ClosureCache,
    oracle: &dyn BuildOracle,
    bundle: &ImportBundle,
) -> miette::Result<BundleCrossCheck> {
    let predicted_ambiguous = !detect_conflicts(cache, bundle)?.is_empty();
    let build = oracle.build_bundle(bundle)?;
    Ok(BundleCrossCheck {
        bundle: bundle.label(),
        predicted_ambiguous,
        observed_ambiguous: build.ambiguous,
        build_succeeded: build.success,
    })
}

/// Build one scanned module with the oracle.
pub fn check_module_build(
    oracle: &dyn BuildOracle,
    module: &ScannedModule,
) -> miette::Result<ModuleBuildCheck> {
    let build = oracle.build_module(module)?;
    Ok(ModuleBuildCheck {
        module: module.id.clone(),
        success: build.success,
        output: (!build.success).then_some(build.output),
    })
}

/// Options for `modguard crosscheck`.
#[derive(Debug, Default)]
pub struct CrossCheckOptions {
    /// Modules to resolve; empty means every module with a configured bound.
    pub modules: Vec<String>,
    /// Also build every configured bundle.
    pub bundles: bool,
    /// Also build every scanned module on its own; restricted to `modules`
    /// when those are named.
    pub module_builds: bool,
}

/// Results of one cross-check run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrossCheckReport {
    pub modules: Vec<ModuleCrossCheck>,
    pub bundles: Vec<BundleCrossCheck>,
    pub builds: Vec<ModuleBuildCheck>,
}

impl CrossCheckReport {
    pub fn disagreements(&self) -> usize {
        self.modules.iter().filter(|m| !m.agrees()).count()
            + self.bundles.iter().filter(|b| !b.agrees()).count()
            + self.builds.iter().filter(|b| !b.agrees()).count()
    }

    pub fn total(&self) -> usize {
        self.modules.len() + self.bundles.len() + self.builds.len()
    }
}

/// Run the cross-check against the oracle configured in `[oracle]`.
pub fn crosscheck(
    root: &Path,
    config: &ModguardConfig,
    opts: &CrossCheckOptions,
) -> miette::Result<CrossCheckReport> {
    let oracle = GoToolchainOracle::from_config(config)?;
    crosscheck_with(root, config, opts, &oracle)
}

/// Run the cross-check against an arbitrary oracle.
pub fn crosscheck_with(
    root: &Path,
    config: &ModguardConfig,
    opts: &CrossCheckOptions,
    oracle: &dyn BuildOracle,
) -> miette::Result<CrossCheckReport> {
    let scanned = ops_scan::scan(root, config)?;
    let graph = DependencyGraph::build(&ops_scan::manifests(config, &scanned)?)?;
    let cache = ClosureCache::new(Arc::new(graph));

    let named: Vec<ModuleId> = opts
        .modules
        .iter()
        .map(|m| ModuleId::from(m.as_str()))
        .collect();
    let modules: Vec<ModuleId> = if named.is_empty() {
        config.tier_bounds().into_iter().map(|(id, _)| id).collect()
    } else {
        named.clone()
    };
    if modules.is_empty() && !opts.bundles && !opts.module_builds {
        return Err(ModguardError::Config {
            message: "Nothing to cross-check: name a module or declare [bounds]".to_string(),
        }
        .into());
    }

    let mut report = CrossCheckReport::default();
    for module in &modules {
        let pb = modguard_util::progress::spinner(&format!("Resolving {module}"));
        let result = cross_check_module(&cache, oracle, module);
        pb.finish_and_clear();
        let check = result?;
        if check.agrees() {
            modguard_util::progress::status("Agrees", &check.to_string());
        } else {
            modguard_util::progress::status_warn("Differs", &check.to_string());
        }
        report.modules.push(check);
    }

    if opts.bundles {
        for bundle in config.import_bundles() {
            let pb = modguard_util::progress::spinner(&format!("Building {bundle}"));
            let result = cross_check_bundle(&cache, oracle, &bundle);
            pb.finish_and_clear();
            let check = result?;
            if check.agrees() {
                modguard_util::progress::status("Agrees", &check.to_string());
            } else {
                modguard_util::progress::status_warn("Differs", &check.to_string());
            }
            report.bundles.push(check);
        }
    }

    if opts.module_builds {
        if scanned.is_empty() {
            return Err(ModguardError::Config {
                message: "Module builds need [workspace].include to locate module directories"
                    .to_string(),
            }
            .into());
        }
        for module in scanned
            .iter()
            .filter(|sm| named.is_empty() || named.contains(&sm.id))
        {
            let pb = modguard_util::progress::spinner(&format!("Building {}", module.id));
            let result = check_module_build(oracle, module);
            pb.finish_and_clear();
            let check = result?;
            if check.success {
                modguard_util::progress::status("Built", module.id.as_str());
            } else {
                modguard_util::progress::status_error("Failed", module.id.as_str());
            }
            report.builds.push(check);
        }
    }

    tracing::info!(
        "Cross-check finished: {} of {} disagreement(s)",
        report.disagreements(),
        report.total()
    );
    Ok(report)
}

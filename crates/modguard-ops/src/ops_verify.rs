//! Operation: run every tier and ambiguous-import check of a request.

use std::path::Path;
use std::sync::Arc;

use modguard_core::config::ModguardConfig;
use modguard_core::module::ModuleId;
use modguard_core::policy::{ImportBundle, TierBound};
use modguard_graph::closure::ClosureCache;
use modguard_graph::conflict::detect_conflicts;
use modguard_graph::graph::DependencyGraph;
use modguard_graph::report::{BundleCheck, TierCheck, VerificationReport};
use modguard_graph::tier::validate_tier;
use modguard_util::errors::ModguardError;
use tokio::task::JoinSet;

use crate::ops_scan;

/// Verify the request described by `config` for the repository at `root`.
///
/// A graph that fails to build yields a report with a single structural
/// failure instead of an error; only I/O and configuration problems are
/// returned as `Err`.
pub async fn verify(root: &Path, config: &ModguardConfig) -> miette::Result<VerificationReport> {
    let scanned = ops_scan::scan(root, config)?;
    let built = ops_scan::manifests(config, &scanned)
        .and_then(|modules| DependencyGraph::build(&modules));
    let graph = match built {
        Ok(graph) => graph,
        Err(err) => {
            tracing::warn!("Dependency graph rejected: {err}");
            return Ok(VerificationReport::structural_failure(&err));
        }
    };

    let bounds = config.tier_bounds();
    let bundles = config.import_bundles();
    modguard_util::progress::status(
        "Verifying",
        &format!(
            "{} module(s): {} tier bound(s), {} import bundle(s)",
            graph.len(),
            bounds.len(),
            bundles.len()
        ),
    );
    run_checks(Arc::new(graph), bounds, bundles).await
}

/// Run all checks concurrently over one shared graph.
///
/// Each check is an independent blocking task; they share only the
/// read-only graph and its closure cache. Results are returned in input
/// order regardless of completion order.
pub async fn run_checks(
    graph: Arc<DependencyGraph>,
    bounds: Vec<(ModuleId, TierBound)>,
    bundles: Vec<ImportBundle>,
) -> miette::Result<VerificationReport> {
    let cache = Arc::new(ClosureCache::new(graph));

    let mut tier_tasks = JoinSet::new();
    for (i, (root, bound)) in bounds.into_iter().enumerate() {
        let cache = Arc::clone(&cache);
        tier_tasks.spawn_blocking(move || {
            let result = validate_tier(&cache, root.as_str(), &bound);
            (i, (root, result))
        });
    }

    let mut bundle_tasks = JoinSet::new();
    for (i, bundle) in bundles.into_iter().enumerate() {
        let cache = Arc::clone(&cache);
        bundle_tasks.spawn_blocking(move || {
            let result = detect_conflicts(&cache, &bundle);
            (i, (bundle, result))
        });
    }

    let tier_checks: Vec<TierCheck> = join_ordered(tier_tasks).await?;
    let bundle_checks: Vec<BundleCheck> = join_ordered(bundle_tasks).await?;
    tracing::debug!("Computed {} closure(s)", cache.len());

    Ok(VerificationReport::assemble(tier_checks, bundle_checks))
}

async fn join_ordered<T: Send + 'static>(
    mut tasks: JoinSet<(usize, T)>,
) -> miette::Result<Vec<T>> {
    let mut done = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let item = joined.map_err(|e| ModguardError::Generic {
            message: format!("Verification task failed: {e}"),
        })?;
        done.push(item);
    }
    done.sort_by_key(|(i, _)| *i);
    Ok(done.into_iter().map(|(_, item)| item).collect())
}

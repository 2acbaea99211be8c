//! Transitive dependency closures.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use modguard_core::error::ModelError;
use modguard_core::module::ModuleId;
use petgraph::visit::Dfs;

use crate::graph::DependencyGraph;

/// Every module reachable from `root` through dependency edges, excluding
/// `root` itself.
pub fn closure(graph: &DependencyGraph, root: &str) -> Result<BTreeSet<ModuleId>, ModelError> {
    let start = graph.node_index(root)?;
    let inner = graph.inner();
    let mut dfs = Dfs::new(inner, start);
    let mut reached = BTreeSet::new();
    while let Some(idx) = dfs.next(inner) {
        if idx != start {
            reached.insert(inner[idx].id().clone());
        }
    }
    Ok(reached)
}

/// Per-run memo of closures for one graph instance.
///
/// The cache holds its graph, so entries can never outlive or mismatch the
/// topology they were computed from. Safe to share between threads.
#[derive(Debug)]
pub struct ClosureCache {
    graph: Arc<DependencyGraph>,
    entries: RwLock<HashMap<ModuleId, Arc<BTreeSet<ModuleId>>>>,
}

impl ClosureCache {
    pub fn new(graph: Arc<DependencyGraph>) -> Self {
        Self {
            graph,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Closure of `root`, computed on first request.
    pub fn get(&self, root: &str) -> Result<Arc<BTreeSet<ModuleId>>, ModelError> {
        if let Ok(entries) = self.entries.read() {
            if let Some(hit) = entries.get(root) {
                return Ok(Arc::clone(hit));
            }
        }

        let computed = Arc::new(closure(&self.graph, root)?);
        // Poisoned lock: return the result without memoising it.
        if let Ok(mut entries) = self.entries.write() {
            let entry = entries
                .entry(ModuleId::from(root))
                .or_insert_with(|| Arc::clone(&computed));
            return Ok(Arc::clone(entry));
        }
        Ok(computed)
    }

    /// Number of roots computed so far.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

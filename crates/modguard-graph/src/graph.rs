//! Dependency graph construction and traversal.

use std::collections::{HashMap, HashSet};

use modguard_core::error::ModelError;
use modguard_core::module::{Module, ModuleId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// A validated module dependency graph backed by petgraph.
///
/// Edges point from a module to each of its direct dependencies. A graph
/// only exists once [`DependencyGraph::build`] has proven it well-formed:
/// unique identities, every edge resolved, acyclic, tiers strictly
/// decreasing along edges. It is never mutated afterwards; a topology change
/// means building a new graph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<Module, ()>,
    /// Lookup from module identity to node index.
    index: HashMap<ModuleId, NodeIndex>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Assemble and validate a graph from a set of module manifests.
    ///
    /// Checks run in a fixed order and the first failure aborts the build:
    /// duplicate identities, unresolved dependencies, cycles, tier inversions.
    pub fn build(manifests: &[Module]) -> Result<Self, ModelError> {
        let mut graph = DiGraph::with_capacity(manifests.len(), 0);
        let mut index = HashMap::with_capacity(manifests.len());

        for module in manifests {
            if index.contains_key(module.id()) {
                return Err(ModelError::DuplicateModule {
                    module: module.id().clone(),
                });
            }
            let idx = graph.add_node(module.clone());
            index.insert(module.id().clone(), idx);
        }

        for module in manifests {
            let from = index[module.id()];
            for dep in module.dependencies() {
                let Some(&to) = index.get(dep) else {
                    return Err(ModelError::UnresolvedDependency {
                        module: module.id().clone(),
                        dependency: dep.clone(),
                    });
                };
                graph.add_edge(from, to, ());
            }
        }

        let built = Self { graph, index };
        built.check_acyclic()?;
        built.check_tiers()?;

        tracing::debug!(
            "Built dependency graph: {} modules, {} edges",
            built.graph.node_count(),
            built.graph.edge_count()
        );
        Ok(built)
    }

    /// Three-colour DFS over modules in identity order.
    ///
    /// Iterative: each frame on `path` is a node still in progress and the
    /// position of the next dependency to visit.
    fn check_acyclic(&self) -> Result<(), ModelError> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut path: Vec<(NodeIndex, usize)> = Vec::new();

        for start in self.sorted_indices() {
            if marks[start.index()] != Mark::Unvisited {
                continue;
            }
            marks[start.index()] = Mark::InProgress;
            path.push((start, 0));

            while let Some(frame) = path.last_mut() {
                let (idx, pos) = *frame;
                let Some(dep) = self.graph[idx].dependencies().get(pos) else {
                    marks[idx.index()] = Mark::Done;
                    path.pop();
                    continue;
                };
                frame.1 += 1;

                let dep_idx = self.index[dep];
                match marks[dep_idx.index()] {
                    Mark::InProgress => {
                        let from = path.iter().position(|&(n, _)| n == dep_idx).unwrap_or(0);
                        let mut cycle: Vec<ModuleId> = path[from..]
                            .iter()
                            .map(|&(n, _)| self.graph[n].id().clone())
                            .collect();
                        cycle.push(dep.clone());
                        return Err(ModelError::CyclicDependency { cycle });
                    }
                    Mark::Unvisited => {
                        marks[dep_idx.index()] = Mark::InProgress;
                        path.push((dep_idx, 0));
                    }
                    Mark::Done => {}
                }
            }
        }
        Ok(())
    }

    fn check_tiers(&self) -> Result<(), ModelError> {
        for idx in self.sorted_indices() {
            let module = &self.graph[idx];
            for dep in module.dependencies() {
                let dep_module = &self.graph[self.index[dep]];
                if module.tier() <= dep_module.tier() {
                    return Err(ModelError::TierInversion {
                        module: module.id().clone(),
                        tier: module.tier(),
                        dependency: dep.clone(),
                        dependency_tier: dep_module.tier(),
                    });
                }
            }
        }
        Ok(())
    }

    fn sorted_indices(&self) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort_by(|a, b| self.graph[*a].id().cmp(self.graph[*b].id()));
        indices
    }

    /// Resolve an identity to its node, or fail with `UnknownModule`.
    pub(crate) fn node_index(&self, id: &str) -> Result<NodeIndex, ModelError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ModelError::UnknownModule {
                module: ModuleId::from(id),
            })
    }

    pub(crate) fn inner(&self) -> &DiGraph<Module, ()> {
        &self.graph
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All modules, ordered by identity.
    pub fn modules(&self) -> Vec<&Module> {
        self.sorted_indices()
            .into_iter()
            .map(|idx| &self.graph[idx])
            .collect()
    }

    /// Direct dependencies of a module, in declaration order.
    pub fn dependencies_of(&self, id: &str) -> Result<Vec<&Module>, ModelError> {
        let idx = self.node_index(id)?;
        Ok(self.graph[idx]
            .dependencies()
            .iter()
            .map(|dep| &self.graph[self.index[dep]])
            .collect())
    }

    /// Modules that directly depend on `id`, ordered by identity.
    pub fn dependents_of(&self, id: &str) -> Result<Vec<&Module>, ModelError> {
        let idx = self.node_index(id)?;
        Ok(self
            .dependent_indices(idx)
            .into_iter()
            .map(|n| &self.graph[n])
            .collect())
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Render the dependency tree below `root`.
    ///
    /// Subtrees already printed are abbreviated with `(*)`.
    pub fn print_tree(&self, root: &str, max_depth: Option<usize>) -> Result<String, ModelError> {
        let idx = self.node_index(root)?;
        let mut output = format!("{}\n", self.graph[idx]);
        let mut expanded = HashSet::new();
        expanded.insert(idx);

        let deps = self.graph[idx].dependencies();
        for (i, dep) in deps.iter().enumerate() {
            let is_last = i == deps.len() - 1;
            self.print_subtree(
                &mut output,
                self.index[dep],
                "",
                is_last,
                1,
                max_depth,
                &mut expanded,
            );
        }
        Ok(output)
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        expanded: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let module = &self.graph[idx];
        let deps = module.dependencies();

        if !deps.is_empty() && expanded.contains(&idx) {
            output.push_str(&format!("{prefix}{connector}{module} (*)\n"));
            return;
        }
        output.push_str(&format!("{prefix}{connector}{module}\n"));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }
        expanded.insert(idx);

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        for (i, dep) in deps.iter().enumerate() {
            let is_last = i == deps.len() - 1;
            self.print_subtree(
                output,
                self.index[dep],
                &child_prefix,
                is_last,
                depth + 1,
                max_depth,
                expanded,
            );
        }
    }

    /// Find a dependency chain from `from` down to `to`, both included.
    ///
    /// Returns `None` when `to` is not in the closure of `from`.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Option<Vec<&Module>>, ModelError> {
        let start = self.node_index(from)?;
        let target = self.node_index(to)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(start, target, &mut path, &mut visited) {
            Ok(Some(path.iter().map(|&idx| &self.graph[idx]).collect()))
        } else {
            Ok(None)
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        // Acyclic, so a node that failed once fails on every path.
        if visited.insert(current) {
            for dep in self.graph[current].dependencies() {
                if self.dfs_path(self.index[dep], target, path, visited) {
                    return true;
                }
            }
        }
        path.pop();
        false
    }

    /// Render the modules that depend on `target`, directly or not.
    ///
    /// Dependents already expanded are abbreviated with `(*)`.
    pub fn print_inverted_tree(&self, target: &str) -> Result<String, ModelError> {
        let idx = self.node_index(target)?;
        let mut output = format!("{}\n", self.graph[idx]);
        let mut expanded = HashSet::new();
        expanded.insert(idx);

        let dependents = self.dependent_indices(idx);
        for (i, &dependent) in dependents.iter().enumerate() {
            let is_last = i == dependents.len() - 1;
            self.print_inverted_subtree(&mut output, dependent, "", is_last, &mut expanded);
        }
        Ok(output)
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        expanded: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let module = &self.graph[idx];
        let dependents = self.dependent_indices(idx);

        if !dependents.is_empty() && !expanded.insert(idx) {
            output.push_str(&format!("{prefix}{connector}{module} (*)\n"));
            return;
        }
        output.push_str(&format!("{prefix}{connector}{module}\n"));

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        for (i, &dependent) in dependents.iter().enumerate() {
            let is_last = i == dependents.len() - 1;
            self.print_inverted_subtree(output, dependent, &child_prefix, is_last, expanded);
        }
    }

    /// Direct dependents of a node, in identity order.
    fn dependent_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut dependents: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect();
        dependents.sort_by(|a, b| self.graph[*a].id().cmp(self.graph[*b].id()));
        dependents.dedup();
        dependents
    }
}

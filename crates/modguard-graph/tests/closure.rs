use std::collections::BTreeSet;
use std::sync::Arc;

use modguard_core::error::ModelError;
use modguard_core::module::{Module, ModuleId};
use modguard_core::policy::ImportBundle;
use modguard_graph::closure::{closure, ClosureCache};
use modguard_graph::conflict::merged_resolution_set;
use modguard_graph::graph::DependencyGraph;

fn module(id: &str, tier: i64, deps: &[&str]) -> Module {
    Module::new(id, tier, deps.iter().copied(), None).unwrap()
}

fn repo() -> DependencyGraph {
    DependencyGraph::build(&[
        module("testing", 0, &[]),
        module("collections", 0, &[]),
        module("files", 0, &[]),
        module("logger", 1, &["testing"]),
        module("retry", 2, &["logger", "testing"]),
        module("shell", 2, &["logger", "testing"]),
        module("ssh", 3, &["collections", "files", "logger", "retry", "shell", "testing"]),
        module("docker", 3, &["logger", "shell"]),
    ])
    .unwrap()
}

#[test]
fn test_closure_is_transitive() {
    let graph = repo();
    let c = closure(&graph, "ssh").unwrap();
    let expected: BTreeSet<ModuleId> = ["collections", "files", "logger", "retry", "shell", "testing"]
        .into_iter()
        .map(ModuleId::from)
        .collect();
    assert_eq!(c, expected);
}

#[test]
fn test_closure_deterministic() {
    let graph = repo();
    assert_eq!(closure(&graph, "docker").unwrap(), closure(&graph, "docker").unwrap());
}

#[test]
fn test_closure_unknown_root() {
    let graph = repo();
    assert_eq!(
        closure(&graph, "aws").unwrap_err(),
        ModelError::UnknownModule {
            module: ModuleId::from("aws")
        }
    );
}

#[test]
fn test_merged_set_is_union_of_closures_and_members() {
    let graph = Arc::new(repo());
    let cache = ClosureCache::new(Arc::clone(&graph));
    let bundle = ImportBundle::new(["retry", "docker"]);

    let merged = merged_resolution_set(&cache, &bundle).unwrap();

    let mut expected = closure(&graph, "retry").unwrap();
    expected.extend(closure(&graph, "docker").unwrap());
    expected.insert(ModuleId::from("retry"));
    expected.insert(ModuleId::from("docker"));
    assert_eq!(merged, expected);
}

#[test]
fn test_cache_shared_across_threads() {
    let cache = Arc::new(ClosureCache::new(Arc::new(repo())));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                let root = if i % 2 == 0 { "ssh" } else { "docker" };
                cache.get(root).unwrap().len()
            })
        })
        .collect();
    let sizes: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (i, size) in sizes.iter().enumerate() {
        assert_eq!(*size, if i % 2 == 0 { 6 } else { 3 });
    }
    assert_eq!(cache.len(), 2);
}

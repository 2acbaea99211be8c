use std::sync::Arc;

use modguard_core::error::ModelError;
use modguard_core::module::{Module, ModuleId};
use modguard_core::policy::{ImportBundle, TierBound};
use modguard_core::version::ModuleVersion;
use modguard_graph::closure::ClosureCache;
use modguard_graph::conflict::detect_conflicts;
use modguard_graph::graph::DependencyGraph;
use modguard_graph::report::{CheckKind, Status, VerificationReport};
use modguard_graph::tier::validate_tier;

fn module(id: &str, tier: i64, deps: &[&str], version: &str) -> Module {
    Module::new(id, tier, deps.iter().copied(), Some(ModuleVersion::new(version))).unwrap()
}

fn cache() -> ClosureCache {
    ClosureCache::new(Arc::new(
        DependencyGraph::build(&[
            module("testing", 0, &[], "v0.1.0"),
            module("logger", 1, &["testing"], "v0.1.0"),
            module("old/testing", 0, &[], "v0.0.9")
                .with_resolution_key("testing")
                .unwrap(),
            module("legacy", 1, &["old/testing"], "v0.1.0"),
        ])
        .unwrap(),
    ))
}

#[test]
fn test_all_passing_report() {
    let cache = cache();
    let tier = vec![(
        ModuleId::from("logger"),
        validate_tier(&cache, "logger", &TierBound::new(1)),
    )];
    let bundle = ImportBundle::new(["logger", "testing"]);
    let conflicts = detect_conflicts(&cache, &bundle);
    let report = VerificationReport::assemble(tier, vec![(bundle, conflicts)]);

    assert!(report.is_success());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.entries().len(), 2);
    assert_eq!(report.entries()[0].check, CheckKind::Tier);
    assert_eq!(report.entries()[1].check, CheckKind::AmbiguousImport);
    assert_eq!(report.entries()[1].status, Status::Pass);
    assert!(report.to_string().ends_with("2 check(s) passed."));
}

#[test]
fn test_failures_are_collected_not_short_circuited() {
    let cache = cache();
    let tier = vec![
        (
            ModuleId::from("logger"),
            validate_tier(&cache, "logger", &TierBound::new(0)),
        ),
        (
            ModuleId::from("ghost"),
            validate_tier(&cache, "ghost", &TierBound::new(0)),
        ),
        (
            ModuleId::from("legacy"),
            validate_tier(&cache, "legacy", &TierBound::new(3)),
        ),
    ];
    let bundle = ImportBundle::new(["logger", "legacy"]).named("consumer");
    let conflicts = detect_conflicts(&cache, &bundle);
    let report = VerificationReport::assemble(tier, vec![(bundle, conflicts)]);

    let kinds: Vec<(CheckKind, Status)> = report
        .entries()
        .iter()
        .map(|e| (e.check, e.status))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (CheckKind::Tier, Status::Fail),
            (CheckKind::Structural, Status::Fail),
            (CheckKind::Tier, Status::Pass),
            (CheckKind::AmbiguousImport, Status::Fail),
        ]
    );
    assert_eq!(report.failures().count(), 3);
    assert_eq!(report.exit_code(), 1);

    let conflict_entry = &report.entries()[3];
    assert_eq!(
        conflict_entry.subjects,
        vec![ModuleId::from("old/testing"), ModuleId::from("testing")]
    );
    assert!(conflict_entry.message.starts_with("consumer: ambiguous import 'testing'"));
    assert!(report.to_string().ends_with("3 of 4 check(s) failed."));
}

#[test]
fn test_structural_failure_report() {
    let err = ModelError::CyclicDependency {
        cycle: vec!["a".into(), "b".into(), "a".into()],
    };
    let report = VerificationReport::structural_failure(&err);
    assert_eq!(report.entries().len(), 1);
    let entry = &report.entries()[0];
    assert_eq!(entry.check, CheckKind::Structural);
    assert_eq!(entry.status, Status::Fail);
    assert_eq!(entry.subjects, vec![ModuleId::from("a"), ModuleId::from("b")]);
    assert!(!report.is_success());
}

#[test]
fn test_json_shape() {
    let err = ModelError::DuplicateModule {
        module: ModuleId::from("a"),
    };
    let json = VerificationReport::structural_failure(&err).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let entry = &value["entries"][0];
    assert_eq!(entry["check"], "structural");
    assert_eq!(entry["status"], "fail");
    assert_eq!(entry["subjects"][0], "a");
    assert_eq!(entry["message"], "Module 'a' is declared more than once");
}

#[test]
fn test_empty_report_is_success() {
    let report = VerificationReport::assemble(vec![], vec![]);
    assert!(report.is_success());
    assert_eq!(report.to_string(), "0 check(s) passed.");
}

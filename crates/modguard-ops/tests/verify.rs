use std::sync::Arc;

use modguard_core::config::ModguardConfig;
use modguard_core::module::{Module, ModuleId};
use modguard_core::policy::{ImportBundle, TierBound};
use modguard_graph::graph::DependencyGraph;
use modguard_graph::report::{CheckKind, Status};
use modguard_ops::ops_verify::{run_checks, verify};
use tempfile::TempDir;

const REQUEST: &str = r#"
[modules."modules/testing"]
tier = 0

[modules."modules/logger"]
tier = 1
dependencies = ["modules/testing"]

[modules."modules/retry"]
tier = 2
dependencies = ["modules/logger", "modules/testing"]

[modules."modules/shared-v1"]
tier = 0
version = "v1.0.0"
resolution-key = "modules/shared"

[modules."modules/shared-v2"]
tier = 0
version = "v2.0.0"
resolution-key = "modules/shared"

[modules."modules/x"]
tier = 1
dependencies = ["modules/shared-v1"]

[modules."modules/y"]
tier = 1
dependencies = ["modules/shared-v2"]

[bounds."modules/retry"]
max = 2

[bounds."modules/logger"]
max = 0

[[bundles]]
name = "clean"
members = ["modules/retry", "modules/logger"]

[[bundles]]
members = ["modules/x", "modules/y"]
"#;

#[tokio::test]
async fn test_verify_reports_every_check_in_order() {
    let tmp = TempDir::new().unwrap();
    let config = ModguardConfig::parse(REQUEST).unwrap();
    let report = verify(tmp.path(), &config).await.unwrap();

    let entries = report.entries();
    assert_eq!(entries.len(), 4);

    assert_eq!(entries[0].check, CheckKind::Tier);
    assert_eq!(entries[0].subjects, vec![ModuleId::from("modules/logger")]);
    assert_eq!(entries[0].status, Status::Fail);
    assert_eq!(entries[1].subjects, vec![ModuleId::from("modules/retry")]);
    assert_eq!(entries[1].status, Status::Pass);

    assert_eq!(entries[2].check, CheckKind::AmbiguousImport);
    assert_eq!(entries[2].status, Status::Pass);
    assert_eq!(entries[3].status, Status::Fail);
    assert!(entries[3].message.contains("ambiguous import 'modules/shared'"));

    assert!(!report.is_success());
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_verify_turns_structural_errors_into_report() {
    let tmp = TempDir::new().unwrap();
    let config = ModguardConfig::parse(
        r#"
[modules.a]
tier = 1
dependencies = ["b"]

[modules.b]
tier = 0
dependencies = ["a"]

[bounds.a]
max = 10
"#,
    )
    .unwrap();
    let report = verify(tmp.path(), &config).await.unwrap();
    assert_eq!(report.entries().len(), 1);
    let entry = &report.entries()[0];
    assert_eq!(entry.check, CheckKind::Structural);
    assert_eq!(entry.status, Status::Fail);
    assert!(entry.message.contains("cycle"));
}

#[tokio::test]
async fn test_unknown_module_is_scoped_to_its_check() {
    let graph = DependencyGraph::build(&[
        Module::new("a", 0, std::iter::empty::<&str>(), None).unwrap(),
    ])
    .unwrap();
    let report = run_checks(
        Arc::new(graph),
        vec![
            (ModuleId::from("ghost"), TierBound::new(1)),
            (ModuleId::from("a"), TierBound::new(0)),
        ],
        vec![ImportBundle::new(["a"])],
    )
    .await
    .unwrap();

    let entries = report.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].check, CheckKind::Structural);
    assert_eq!(entries[0].subjects, vec![ModuleId::from("ghost")]);
    assert_eq!(entries[1].status, Status::Pass);
    assert_eq!(entries[2].status, Status::Pass);
}

#[tokio::test]
async fn test_empty_request_succeeds() {
    let graph = DependencyGraph::build(&[]).unwrap();
    let report = run_checks(Arc::new(graph), Vec::new(), Vec::new())
        .await
        .unwrap();
    assert!(report.is_success());
    assert_eq!(report.exit_code(), 0);
}

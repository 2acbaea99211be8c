use std::fs;
use std::path::Path;

use modguard_core::config::ModguardConfig;
use modguard_core::error::ModelError;
use modguard_core::module::ModuleId;
use modguard_ops::ops_scan::{
    derive_tiers, load_graph, manifests, scan, select_versions, ScannedModule, ScannedRequire,
};
use modguard_core::version::ModuleVersion;
use tempfile::TempDir;

const NS: &str = "github.com/acme/mono/";

/// Each entry of `requires` is a `path version` pair as written in go.mod.
fn write_go_mod(root: &Path, dir: &str, requires: &[&str]) {
    let path = root.join(dir);
    fs::create_dir_all(&path).unwrap();
    let mut content = format!("module {NS}{dir}\n\ngo 1.24.0\n\nrequire (\n");
    for req in requires {
        content.push_str(&format!("\t{req}\n"));
    }
    content.push_str("\tgithub.com/stretchr/testify v1.9.0 // indirect\n)\n");
    fs::write(path.join("go.mod"), content).unwrap();
}

fn repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_go_mod(root, "modules/testing", &[]);
    write_go_mod(root, "modules/logger", &["github.com/acme/mono/modules/testing v0.1.0"]);
    write_go_mod(
        root,
        "modules/retry",
        &[
            "github.com/acme/mono/modules/logger v0.2.0",
            "github.com/acme/mono/modules/testing v0.1.0 // indirect",
        ],
    );
    write_go_mod(root, "modules/retry/testdata/fixture", &[]);
    tmp
}

fn config(extra: &str) -> ModguardConfig {
    ModguardConfig::parse(&format!(
        r#"
[workspace]
namespace = "{NS}"
include = ["modules/*"]
exclude = ["**/testdata/**"]
{extra}
"#
    ))
    .unwrap()
}

#[test]
fn test_scan_finds_internal_requires_only() {
    let tmp = repo();
    let scanned = scan(tmp.path(), &config("")).unwrap();
    let ids: Vec<&str> = scanned.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["modules/logger", "modules/retry", "modules/testing"]);

    let retry = &scanned[1];
    let deps: Vec<&str> = retry.dependency_ids().map(ModuleId::as_str).collect();
    assert_eq!(deps, vec!["modules/logger", "modules/testing"]);
    assert_eq!(retry.requires[0].version.as_str(), "v0.2.0");
    assert!(!retry.requires[0].indirect);
    assert!(retry.requires[1].indirect);
    assert!(scanned[2].requires.is_empty());
}

#[test]
fn test_scan_disabled_without_include() {
    let tmp = repo();
    let config = ModguardConfig::parse("[workspace]\nnamespace = \"x/\"\n").unwrap();
    assert!(scan(tmp.path(), &config).unwrap().is_empty());
}

#[test]
fn test_derived_tiers_follow_dependencies() {
    let tmp = repo();
    let graph = load_graph(tmp.path(), &config("")).unwrap();
    assert_eq!(graph.get("modules/testing").unwrap().tier(), 0);
    assert_eq!(graph.get("modules/logger").unwrap().tier(), 1);
    assert_eq!(graph.get("modules/retry").unwrap().tier(), 2);
}

#[test]
fn test_pinned_tier_overrides_derivation() {
    let tmp = repo();
    let config = config(
        r#"
[modules."modules/retry"]
tier = 5
version = "v1.2.0"
"#,
    );
    let graph = load_graph(tmp.path(), &config).unwrap();
    let retry = graph.get("modules/retry").unwrap();
    assert_eq!(retry.tier(), 5);
    assert_eq!(retry.version().map(|v| v.as_str()), Some("v1.2.0"));
}

#[test]
fn test_pinned_tier_can_produce_inversion() {
    let tmp = repo();
    let config = config("[modules.\"modules/logger\"]\ntier = 0\n");
    let scanned = scan(tmp.path(), &config).unwrap();
    let modules = manifests(&config, &scanned).unwrap();
    let err = modguard_graph::graph::DependencyGraph::build(&modules).unwrap_err();
    assert!(matches!(err, ModelError::TierInversion { .. }));
}

#[test]
fn test_config_only_module_needs_tier() {
    let tmp = repo();
    let config = config("[modules.\"modules/extra\"]\nversion = \"v0.1.0\"\n");
    let scanned = scan(tmp.path(), &config).unwrap();
    let err = manifests(&config, &scanned).unwrap_err();
    assert!(matches!(err, ModelError::InvalidManifest { .. }));
}

fn scanned_module(id: &str, requires: &[(&str, &str)]) -> ScannedModule {
    ScannedModule {
        id: ModuleId::from(id),
        dir: id.into(),
        requires: requires
            .iter()
            .map(|(dep, version)| ScannedRequire {
                id: ModuleId::from(*dep),
                version: ModuleVersion::new(*version),
                indirect: false,
            })
            .collect(),
    }
}

#[test]
fn test_derive_tiers_tolerates_cycles() {
    let scanned = vec![
        scanned_module("a", &[("b", "v0.1.0")]),
        scanned_module("b", &[("a", "v0.1.0")]),
    ];
    let tiers = derive_tiers(&scanned, &Default::default());
    assert_eq!(tiers.len(), 2);
}

#[test]
fn test_scanned_versions_come_from_requirements() {
    let tmp = repo();
    let graph = load_graph(tmp.path(), &config("")).unwrap();
    let version = |id: &str| graph.get(id).unwrap().version().map(|v| v.as_str().to_string());
    // logger is only required by retry, at v0.2.0.
    assert_eq!(version("modules/logger").as_deref(), Some("v0.2.0"));
    assert_eq!(version("modules/testing").as_deref(), Some("v0.1.0"));
    // Nothing requires retry.
    assert_eq!(version("modules/retry"), None);
}

#[test]
fn test_highest_required_version_is_selected() {
    let scanned = vec![
        scanned_module("x", &[("shared", "v1.2.0")]),
        scanned_module("y", &[("shared", "v1.10.0")]),
        scanned_module("z", &[("shared", "v1.3.0")]),
        scanned_module("shared", &[]),
    ];
    let selected = select_versions(&scanned);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[&ModuleId::from("shared")].as_str(), "v1.10.0");
}

#[test]
fn test_declared_version_wins_over_required() {
    let tmp = repo();
    let config = config("[modules.\"modules/logger\"]\nversion = \"v0.3.0\"\n");
    let graph = load_graph(tmp.path(), &config).unwrap();
    let logger = graph.get("modules/logger").unwrap();
    assert_eq!(logger.version().map(|v| v.as_str()), Some("v0.3.0"));
}

use modguard_core::gomod::GoMod;

#[test]
fn test_parse_require_block_with_indirect() {
    let content = r#"
module github.com/acme/mono/modules/ssh

go 1.24.0

require (
	github.com/acme/mono/modules/logger v0.1.0
	github.com/acme/mono/modules/retry v0.1.0
	golang.org/x/crypto v0.36.0 // indirect
)

replace (
	github.com/acme/mono/modules/logger => ../logger
)
"#;
    let gomod = GoMod::parse(content).unwrap();
    assert_eq!(gomod.module, "github.com/acme/mono/modules/ssh");
    assert_eq!(gomod.requires.len(), 3);
    assert_eq!(gomod.requires[1].path, "github.com/acme/mono/modules/retry");
    assert!(!gomod.requires[0].indirect);
    assert!(gomod.requires[2].indirect);
}

#[test]
fn test_quoted_module_path() {
    let gomod = GoMod::parse("module \"example.com/quoted\"\n").unwrap();
    assert_eq!(gomod.module, "example.com/quoted");
    assert!(gomod.requires.is_empty());
}

#[test]
fn test_malformed_require_reports_line() {
    let err = GoMod::parse("module a\nrequire (\n\tb\n)\n").unwrap_err();
    assert!(err.to_string().contains("line 3"), "got: {err}");
}

#[test]
fn test_from_path_reads_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("go.mod");
    std::fs::write(&path, "module example.com/x\n").unwrap();
    let gomod = GoMod::from_path(&path).unwrap();
    assert_eq!(gomod.module, "example.com/x");
}

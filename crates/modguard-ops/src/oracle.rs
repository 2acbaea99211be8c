//! External build oracle: ask a real toolchain what a consumer actually
//! downloads, so the engine's predictions can be cross-checked.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use modguard_core::config::ModguardConfig;
use modguard_core::module::ModuleId;
use modguard_core::policy::ImportBundle;
use modguard_util::errors::ModguardError;
use modguard_util::process::CommandBuilder;

use crate::ops_scan::ScannedModule;

/// Name of the throwaway consumer module written by the Go oracle.
pub const CONSUMER_MODULE: &str = "modguard-consumer";

/// Modules the toolchain resolved for a consumer of one module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OracleResolution {
    /// Internal modules other than the requested one, namespace stripped.
    pub modules: BTreeSet<ModuleId>,
}

/// Outcome of one toolchain build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleBuild {
    pub success: bool,
    /// The toolchain reported an ambiguous import.
    pub ambiguous: bool,
    pub output: String,
}

/// Something that can resolve and build real consumers.
pub trait BuildOracle: Send + Sync {
    fn resolve_module(&self, module: &ModuleId) -> Result<OracleResolution, ModguardError>;

    fn build_bundle(&self, bundle: &ImportBundle) -> Result<OracleBuild, ModguardError>;

    /// Build a module on its own, from its source directory.
    fn build_module(&self, module: &ScannedModule) -> Result<OracleBuild, ModguardError>;
}

/// [`BuildOracle`] backed by the `go` command.
///
/// Closure and bundle queries write a scratch consumer module into a
/// temporary directory that requires the modules under test at the
/// configured version. Module builds run in the module's own directory.
#[derive(Debug, Clone)]
pub struct GoToolchainOracle {
    program: String,
    namespace: String,
    version: String,
    env: BTreeMap<String, String>,
}

impl GoToolchainOracle {
    pub fn new(
        program: impl Into<String>,
        namespace: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            namespace: namespace.into(),
            version: version.into(),
            env: BTreeMap::new(),
        }
    }

    /// Build the oracle from the `[oracle]` table. Requires
    /// `[workspace].namespace` to turn identities into import paths.
    pub fn from_config(config: &ModguardConfig) -> Result<Self, ModguardError> {
        let namespace = config
            .workspace
            .namespace
            .clone()
            .ok_or_else(|| ModguardError::Config {
                message: "[workspace].namespace is required to run the build oracle".to_string(),
            })?;
        let mut oracle = Self::new(&config.oracle.program, namespace, &config.oracle.version);
        oracle.env = config.oracle.env.clone();
        Ok(oracle)
    }

    fn import_path(&self, id: &ModuleId) -> String {
        format!("{}{}", self.namespace, id)
    }

    fn command(&self, dir: &Path, args: &[&str]) -> CommandBuilder {
        CommandBuilder::new(&self.program)
            .args(args.iter().copied())
            .envs(&self.env)
            .cwd(dir)
    }

    fn write_consumer(
        &self,
        dir: &Path,
        modules: &[ModuleId],
        import: bool,
    ) -> Result<(), ModguardError> {
        let paths: Vec<String> = modules.iter().map(|id| self.import_path(id)).collect();
        std::fs::write(dir.join("go.mod"), render_consumer_go_mod(&paths, &self.version))?;
        let imports: &[String] = if import { &paths } else { &[] };
        std::fs::write(dir.join("main.go"), render_consumer_main(imports))?;
        Ok(())
    }
}

impl BuildOracle for GoToolchainOracle {
    fn resolve_module(&self, module: &ModuleId) -> Result<OracleResolution, ModguardError> {
        let dir = tempfile::tempdir()?;
        self.write_consumer(dir.path(), std::slice::from_ref(module), false)?;

        self.command(dir.path(), &["mod", "download"]).exec_checked()?;
        let listed = self.command(dir.path(), &["list", "-m", "all"]).exec_checked()?;

        let mut modules = parse_module_list(&listed.combined, &self.namespace);
        modules.remove(module);
        tracing::debug!("Oracle resolved {} module(s) for {module}", modules.len());
        Ok(OracleResolution { modules })
    }

    fn build_bundle(&self, bundle: &ImportBundle) -> Result<OracleBuild, ModguardError> {
        let dir = tempfile::tempdir()?;
        self.write_consumer(dir.path(), bundle.members(), true)?;

        let tidy = self.command(dir.path(), &["mod", "tidy"]).exec()?;
        let mut output = tidy.combined;
        let success = if tidy.success {
            let build = self.command(dir.path(), &["build", "./..."]).exec()?;
            output.push_str(&build.combined);
            build.success
        } else {
            false
        };
        let ambiguous = mentions_ambiguous_import(&output);
        if ambiguous {
            tracing::warn!("Toolchain reported an ambiguous import for {bundle}");
        }
        Ok(OracleBuild {
            success,
            ambiguous,
            output,
        })
    }

    fn build_module(&self, module: &ScannedModule) -> Result<OracleBuild, ModguardError> {
        let build = self.command(&module.dir, &["build", "./..."]).exec()?;
        if !build.success {
            tracing::warn!("{} does not build on its own", module.id);
        }
        Ok(OracleBuild {
            success: build.success,
            ambiguous: mentions_ambiguous_import(&build.combined),
            output: build.combined,
        })
    }
}

/// `go.mod` of a consumer requiring every path at `version`.
pub fn render_consumer_go_mod(paths: &[String], version: &str) -> String {
    let mut out = format!("module {CONSUMER_MODULE}\n\ngo 1.24.0\n");
    match paths {
        [] => {}
        [single] => out.push_str(&format!("\nrequire {single} {version}\n")),
        many => {
            out.push_str("\nrequire (\n");
            for path in many {
                out.push_str(&format!("\t{path} {version}\n"));
            }
            out.push_str(")\n");
        }
    }
    out
}

/// `main.go` with a blank import for each path.
pub fn render_consumer_main(imports: &[String]) -> String {
    let mut out = String::from("package main\n\n");
    if !imports.is_empty() {
        out.push_str("import (\n");
        for path in imports {
            out.push_str(&format!("\t_ \"{path}\"\n"));
        }
        out.push_str(")\n\n");
    }
    out.push_str("func main() {}\n");
    out
}

/// Internal modules named in `go list -m all` output, namespace stripped.
///
/// Only the first field of each line is considered, so version columns and
/// `=>` replacement targets are ignored.
pub fn parse_module_list(output: &str, namespace: &str) -> BTreeSet<ModuleId> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(|path| path.strip_prefix(namespace))
        .filter(|id| !id.is_empty())
        .map(ModuleId::from)
        .collect()
}

pub fn mentions_ambiguous_import(output: &str) -> bool {
    output.contains("ambiguous import")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_go_mod_single_and_block() {
        let one = render_consumer_go_mod(&["example.com/m/a".to_string()], "v0.1.0");
        assert!(one.starts_with("module modguard-consumer\n"));
        assert!(one.contains("require example.com/m/a v0.1.0\n"));

        let two = render_consumer_go_mod(
            &["example.com/m/a".to_string(), "example.com/m/b".to_string()],
            "v0.2.0",
        );
        assert!(two.contains("require (\n\texample.com/m/a v0.2.0\n\texample.com/m/b v0.2.0\n)\n"));
    }

    #[test]
    fn consumer_main_without_imports_is_empty_program() {
        assert_eq!(render_consumer_main(&[]), "package main\n\nfunc main() {}\n");
        let main = render_consumer_main(&["example.com/m/a".to_string()]);
        assert!(main.contains("\t_ \"example.com/m/a\"\n"));
    }
}

//! Command dispatch and handler modules.

mod crosscheck;
mod list;
mod tree;
mod verify;

use std::path::{Path, PathBuf};

use miette::Result;
use modguard_core::config::ModguardConfig;
use modguard_ops::ops_crosscheck::CrossCheckOptions;
use modguard_util::errors::ModguardError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let (root, config) = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Verify { format } => verify::exec(&root, &config, format).await,
        Command::List => list::exec(&root, &config),
        Command::Tree {
            module,
            depth,
            why,
            inverted,
            flat,
        } => tree::exec(&root, &config, module, depth, why, inverted, flat),
        Command::Crosscheck {
            modules,
            bundles,
            module_builds,
            format,
        } => {
            let opts = CrossCheckOptions {
                modules,
                bundles,
                module_builds,
            };
            crosscheck::exec(&root, &config, &opts, format)
        }
    }
}

/// Load `Modguard.toml` from an explicit path or by searching upward from the
/// current directory. Returns the repository root with the config.
fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, ModguardConfig)> {
    match explicit {
        Some(path) => {
            let config = ModguardConfig::from_path(path)?;
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((root, config))
        }
        None => {
            let cwd = std::env::current_dir().map_err(ModguardError::Io)?;
            ModguardConfig::discover(&cwd)
        }
    }
}

//! CLI argument definitions for Modguard.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "modguard",
    version,
    about = "Verify dependency isolation between the modules of a monorepo",
    long_about = "Modguard checks that importing one module of a monorepo pulls in only a \
                  bounded set of sibling modules, and that modules imported together never \
                  resolve the same import to two different versions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to Modguard.toml (default: search upward from the current directory)
    #[arg(short, long, global = true, env = "MODGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every tier and ambiguous-import check
    Verify {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List every module with its tier, version and direct dependencies
    #[command(alias = "scan")]
    List,

    /// Display the dependency tree of a module
    Tree {
        /// Module identity
        module: String,
        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,
        /// Show how MODULE reaches this dependency
        #[arg(long)]
        why: Option<String>,
        /// Show the modules that depend on MODULE
        #[arg(short, long)]
        inverted: bool,
        /// Print the transitive closure as a flat list
        #[arg(long)]
        flat: bool,
    },

    /// Compare predicted closures with what the Go toolchain resolves
    Crosscheck {
        /// Modules to check (default: every module with a bound)
        modules: Vec<String>,
        /// Also build every configured bundle
        #[arg(long)]
        bundles: bool,
        /// Also build every scanned module on its own, from its directory
        #[arg(long)]
        module_builds: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Parse command-line arguments into a [`Cli`] struct.
pub fn parse() -> Cli {
    Cli::parse()
}

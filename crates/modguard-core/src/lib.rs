//! Core data types for modguard.
//!
//! This crate defines the vocabulary shared by the verification engine and
//! its collaborators: module identities and versions, the validated module
//! manifest, the engine's error taxonomy, per-run policy (tier bounds and
//! import bundles), the `Modguard.toml` configuration, and `go.mod` parsing.
//!
//! This crate is intentionally free of async code and process spawning.

/// Name of the configuration file looked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "Modguard.toml";

pub mod config;
pub mod error;
pub mod gomod;
pub mod module;
pub mod policy;
pub mod version;

//! Operations behind each `modguard` command.
//!
//! These functions load configuration, gather manifests, build the graph
//! and hand it to the engine. They own all I/O; the engine crates stay pure.

pub mod ops_crosscheck;
pub mod ops_scan;
pub mod ops_tree;
pub mod ops_verify;
pub mod oracle;

//! Dependency-isolation verification engine: graph construction with
//! structural validation, transitive closures, tier bound checks,
//! ambiguous-import detection, and report assembly.
//!
//! Everything here is pure and synchronous. A built [`graph::DependencyGraph`]
//! is immutable and can be shared across threads without locking.

pub mod closure;
pub mod conflict;
pub mod graph;
pub mod report;
pub mod tier;

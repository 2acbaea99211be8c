//! Shared utilities for modguard.
//!
//! This crate provides cross-cutting concerns used by all other modguard crates:
//! the operational error type, filesystem helpers, external process spawning,
//! and terminal progress indicators.

pub mod errors;
pub mod fs;
pub mod process;
pub mod progress;

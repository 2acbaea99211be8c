//! Errors raised while validating manifests and querying the graph.

use miette::Diagnostic;
use thiserror::Error;

use crate::module::ModuleId;

/// Errors raised by the module model and the dependency graph engine.
///
/// Everything except [`ModelError::UnknownModule`] is structural: it aborts
/// graph construction and no graph is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ModelError {
    /// A single module declaration is malformed.
    #[error("Invalid manifest for '{module}': {reason}")]
    #[diagnostic(code(modguard::invalid_manifest))]
    InvalidManifest { module: String, reason: String },

    /// Two manifests declare the same identity.
    #[error("Module '{module}' is declared more than once")]
    #[diagnostic(code(modguard::duplicate_module))]
    DuplicateModule { module: ModuleId },

    /// A declared dependency does not name any module in the manifest set.
    #[error("Module '{module}' depends on '{dependency}', which is not declared")]
    #[diagnostic(
        code(modguard::unresolved_dependency),
        help("Declare the missing module or remove it from the dependency list")
    )]
    UnresolvedDependency {
        module: ModuleId,
        dependency: ModuleId,
    },

    /// The dependency graph contains a cycle.
    #[error("Dependency cycle detected: {}", render_cycle(.cycle))]
    #[diagnostic(code(modguard::cyclic_dependency))]
    CyclicDependency { cycle: Vec<ModuleId> },

    /// A module's tier is not strictly above one of its dependencies.
    #[error(
        "Module '{module}' (tier {tier}) depends on '{dependency}' (tier {dependency_tier}); \
         a module's tier must be greater than every dependency's tier"
    )]
    #[diagnostic(code(modguard::tier_inversion))]
    TierInversion {
        module: ModuleId,
        tier: u32,
        dependency: ModuleId,
        dependency_tier: u32,
    },

    /// A check referenced a module that is not part of the graph.
    #[error("Unknown module '{module}'")]
    #[diagnostic(code(modguard::unknown_module))]
    UnknownModule { module: ModuleId },
}

impl ModelError {
    /// Whether this error invalidates the whole graph rather than a single check.
    pub fn is_structural(&self) -> bool {
        !matches!(self, ModelError::UnknownModule { .. })
    }
}

fn render_cycle(cycle: &[ModuleId]) -> String {
    cycle
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

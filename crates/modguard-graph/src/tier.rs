//! Tier isolation checks: does importing a module pull in too much?

use std::collections::BTreeSet;
use std::fmt;

use modguard_core::error::ModelError;
use modguard_core::module::ModuleId;
use modguard_core::policy::TierBound;
use serde::Serialize;

use crate::closure::ClosureCache;

/// Outcome of checking one root against its bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierFinding {
    pub module: ModuleId,
    pub passed: bool,
    /// Number of counted closure members.
    pub actual: usize,
    pub bound: usize,
    /// The counted closure members.
    pub members: BTreeSet<ModuleId>,
    /// Counted members absent from the caller's expected closure, when one
    /// was supplied.
    pub unexpected: Option<BTreeSet<ModuleId>>,
}

/// Check the closure of `root` against `bound`.
pub fn validate_tier(
    cache: &ClosureCache,
    root: &str,
    bound: &TierBound,
) -> Result<TierFinding, ModelError> {
    let closure = cache.get(root)?;
    let members: BTreeSet<ModuleId> = closure
        .iter()
        .filter(|id| bound.counts(id))
        .cloned()
        .collect();
    let actual = members.len();
    let unexpected = bound
        .expected
        .as_ref()
        .map(|expected| members.difference(expected).cloned().collect());

    let finding = TierFinding {
        module: ModuleId::from(root),
        passed: actual <= bound.max,
        actual,
        bound: bound.max,
        members,
        unexpected,
    };
    tracing::debug!(
        "Tier check {}: {} of {} allowed",
        finding.module,
        finding.actual,
        finding.bound
    );
    Ok(finding)
}

fn join(ids: &BTreeSet<ModuleId>) -> String {
    ids.iter().map(ModuleId::as_str).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for TierFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            return write!(
                f,
                "{} pulls in {} module(s), within bound {}",
                self.module, self.actual, self.bound
            );
        }
        write!(
            f,
            "{} pulls in {} module(s), bound is {}: [{}]",
            self.module,
            self.actual,
            self.bound,
            join(&self.members)
        )?;
        if let Some(unexpected) = self.unexpected.as_ref().filter(|u| !u.is_empty()) {
            write!(f, "; not expected: [{}]", join(unexpected))?;
        }
        Ok(())
    }
}

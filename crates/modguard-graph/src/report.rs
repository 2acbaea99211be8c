//! Verification report: a stable, serializable projection of check results.

use std::fmt;

use modguard_core::error::ModelError;
use modguard_core::module::ModuleId;
use modguard_core::policy::ImportBundle;
use serde::Serialize;

use crate::conflict::Conflict;
use crate::tier::TierFinding;

/// Which check produced a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    Tier,
    AmbiguousImport,
    Structural,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckKind::Tier => "tier",
            CheckKind::AmbiguousImport => "ambiguous-import",
            CheckKind::Structural => "structural",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub check: CheckKind,
    pub subjects: Vec<ModuleId>,
    pub status: Status,
    pub message: String,
}

/// Result of a tier check for one root, as handed to the report.
pub type TierCheck = (ModuleId, Result<TierFinding, ModelError>);

/// Result of a conflict check for one bundle, as handed to the report.
pub type BundleCheck = (ImportBundle, Result<Vec<Conflict>, ModelError>);

/// Ordered, immutable findings of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    entries: Vec<ReportEntry>,
}

impl VerificationReport {
    /// Project check results into report entries: tier checks first, then
    /// bundles, each group in input order. A clean bundle yields one passing
    /// entry, a conflicted bundle one failing entry per conflict. Errors
    /// scoped to a single check become failing `structural` entries.
    pub fn assemble(tier_checks: Vec<TierCheck>, bundle_checks: Vec<BundleCheck>) -> Self {
        let mut entries = Vec::with_capacity(tier_checks.len() + bundle_checks.len());

        for (root, result) in tier_checks {
            entries.push(match result {
                Ok(finding) => ReportEntry {
                    check: CheckKind::Tier,
                    status: if finding.passed {
                        Status::Pass
                    } else {
                        Status::Fail
                    },
                    message: finding.to_string(),
                    subjects: vec![root],
                },
                Err(err) => structural_entry(vec![root], &err),
            });
        }

        for (bundle, result) in bundle_checks {
            let subjects = bundle.members().to_vec();
            match result {
                Ok(conflicts) if conflicts.is_empty() => entries.push(ReportEntry {
                    check: CheckKind::AmbiguousImport,
                    subjects,
                    status: Status::Pass,
                    message: format!("{bundle} resolves without ambiguous imports"),
                }),
                Ok(conflicts) => {
                    for conflict in conflicts {
                        let mut subjects: Vec<ModuleId> = conflict
                            .candidates
                            .iter()
                            .map(|c| c.module.clone())
                            .collect();
                        subjects.dedup();
                        entries.push(ReportEntry {
                            check: CheckKind::AmbiguousImport,
                            subjects,
                            status: Status::Fail,
                            message: format!("{bundle}: {conflict}"),
                        });
                    }
                }
                Err(err) => entries.push(structural_entry(subjects, &err)),
            }
        }

        Self { entries }
    }

    /// Report for a run whose graph could not be built.
    pub fn structural_failure(err: &ModelError) -> Self {
        let subjects = match err {
            ModelError::InvalidManifest { module, .. } => vec![ModuleId::from(module.as_str())],
            ModelError::DuplicateModule { module } | ModelError::UnknownModule { module } => {
                vec![module.clone()]
            }
            ModelError::UnresolvedDependency { module, dependency } => {
                vec![module.clone(), dependency.clone()]
            }
            ModelError::CyclicDependency { cycle } => {
                let mut ids = cycle.clone();
                ids.pop();
                ids
            }
            ModelError::TierInversion {
                module, dependency, ..
            } => vec![module.clone(), dependency.clone()],
        };
        Self {
            entries: vec![structural_entry(subjects, err)],
        }
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.status == Status::Fail)
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Process exit status for this report: 0 when every entry passed.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn structural_entry(subjects: Vec<ModuleId>, err: &ModelError) -> ReportEntry {
    ReportEntry {
        check: CheckKind::Structural,
        subjects,
        status: Status::Fail,
        message: err.to_string(),
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let status = match entry.status {
                Status::Pass => "PASS",
                Status::Fail => "FAIL",
            };
            writeln!(f, "{status} [{}] {}", entry.check, entry.message)?;
        }
        let failed = self.failures().count();
        if failed == 0 {
            write!(f, "{} check(s) passed.", self.entries.len())
        } else {
            write!(
                f,
                "{failed} of {} check(s) failed.",
                self.entries.len()
            )
        }
    }
}

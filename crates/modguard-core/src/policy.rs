//! Per-run verification policy: tier bounds and import bundles.
//!
//! Neither is part of the graph. Bounds express how many modules a consumer
//! is allowed to pull in, which the graph cannot decide on its own.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::module::ModuleId;

/// Maximum permitted closure size for one root module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBound {
    /// Largest acceptable number of counted closure members.
    pub max: usize,
    /// When set, only closure members whose identity starts with this
    /// prefix are counted.
    #[serde(default)]
    pub namespace: Option<String>,
    /// The closure the caller expects; used only to explain failures.
    #[serde(default)]
    pub expected: Option<BTreeSet<ModuleId>>,
}

impl TierBound {
    pub fn new(max: usize) -> Self {
        Self {
            max,
            namespace: None,
            expected: None,
        }
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>) -> Self {
        self.namespace = Some(prefix.into());
        self
    }

    pub fn with_expected<I, S>(mut self, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ModuleId>,
    {
        self.expected = Some(expected.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a closure member is counted against this bound.
    pub fn counts(&self, id: &ModuleId) -> bool {
        self.namespace
            .as_deref()
            .map_or(true, |prefix| id.in_namespace(prefix))
    }
}

/// Modules a hypothetical consumer imports at the same time.
///
/// Members keep first-seen order; repeated members are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImportBundle {
    pub name: Option<String>,
    members: Vec<ModuleId>,
}

impl ImportBundle {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ModuleId>,
    {
        let mut bundle = Self::default();
        for m in members {
            bundle.push(m.into());
        }
        bundle
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn push(&mut self, id: ModuleId) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }
    }

    pub fn members(&self) -> &[ModuleId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Label used in reports: the bundle name, or its members joined by `+`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .members
                .iter()
                .map(ModuleId::as_str)
                .collect::<Vec<_>>()
                .join("+"),
        }
    }
}

impl fmt::Display for ImportBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

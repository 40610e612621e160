//! Gap analysis: which required facts are still missing or ambiguous.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::answers::{IssuesSignal, NormalizedAnswerSet};
use crate::domain::packs::PackConfig;

/// Unresolved fields in priority order. Recomputed every turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GapList(Vec<String>);

impl GapList {
    /// Highest-priority gap.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Stateless gap analyzer.
pub struct GapAnalyzer;

impl GapAnalyzer {
    /// Returns true if the field still needs a probe.
    ///
    /// The pack's issues field is a gap only when unknown, affirmed or
    /// ambiguous; every other field is a gap when its answer is unknown.
    pub fn is_gap(pack: &PackConfig, field: &str, answers: &NormalizedAnswerSet) -> bool {
        if pack.issues_field() == Some(field) {
            let value = answers.get(field).cloned().unwrap_or_default();
            return IssuesSignal::classify(&value).is_gap();
        }
        answers.is_unknown(field)
    }

    /// Walks the effective priority order, skipping already-probed fields.
    pub fn compute(
        pack: &PackConfig,
        answers: &NormalizedAnswerSet,
        already_probed: &BTreeSet<String>,
    ) -> GapList {
        GapList(
            pack.priority_order()
                .iter()
                .filter(|field| !already_probed.contains(field.as_str()))
                .filter(|field| Self::is_gap(pack, field, answers))
                .cloned()
                .collect(),
        )
    }
}

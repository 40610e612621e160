//! Probe counters for one topic instance, owned by the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::decision::{ProbeDecision, ProbeRequest};
use super::stage::ProbeStage;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::domain::packs::MAX_PROBES_CEILING;

/// Probe budget bookkeeping.
///
/// # Invariants
///
/// - `1 <= max_probes <= MAX_PROBES_CEILING`
/// - `previous_probe_count <= max_probes`
/// - a field is recorded at most once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeState {
    previous_probe_count: u32,
    already_probed_fields: BTreeSet<String>,
    max_probes: u32,
}

impl ProbeState {
    /// Fresh state with no probes issued.
    pub fn new(max_probes: u32) -> Result<Self, ValidationError> {
        Self::from_parts(0, BTreeSet::new(), max_probes)
    }

    /// Rebuilds state from caller-held counters.
    pub fn from_parts(
        previous_probe_count: u32,
        already_probed_fields: BTreeSet<String>,
        max_probes: u32,
    ) -> Result<Self, ValidationError> {
        if !(1..=MAX_PROBES_CEILING).contains(&max_probes) {
            return Err(ValidationError::out_of_range(
                "max_probes",
                1,
                MAX_PROBES_CEILING as i64,
                max_probes as i64,
            ));
        }
        if previous_probe_count > max_probes {
            return Err(ValidationError::out_of_range(
                "previous_probe_count",
                0,
                max_probes as i64,
                previous_probe_count as i64,
            ));
        }
        Ok(Self {
            previous_probe_count,
            already_probed_fields,
            max_probes,
        })
    }

    pub fn previous_probe_count(&self) -> u32 {
        self.previous_probe_count
    }

    pub fn max_probes(&self) -> u32 {
        self.max_probes
    }

    pub fn already_probed_fields(&self) -> &BTreeSet<String> {
        &self.already_probed_fields
    }

    pub fn remaining(&self) -> u32 {
        self.max_probes - self.previous_probe_count
    }

    pub fn stage(&self) -> ProbeStage {
        ProbeStage::current(self.previous_probe_count, self.max_probes)
    }

    /// Records one issued probe. `None` records the catch-all question.
    pub fn record_probe(&mut self, field: Option<&str>) -> Result<(), DomainError> {
        if self.previous_probe_count >= self.max_probes {
            return Err(DomainError::new(
                ErrorCode::ProbeBudgetExhausted,
                format!("All {} probes have been issued", self.max_probes),
            ));
        }
        if let Some(field) = field {
            if self.already_probed_fields.contains(field) {
                return Err(DomainError::new(
                    ErrorCode::FieldAlreadyProbed,
                    format!("Field '{}' has already been probed", field),
                )
                .with_detail("field", field));
            }
            self.already_probed_fields.insert(field.to_string());
        }
        self.previous_probe_count += 1;
        Ok(())
    }

    /// Records the probe a decision asked for; a `DONE` decision records
    /// nothing.
    pub fn record_decision(&mut self, decision: &ProbeDecision) -> Result<(), DomainError> {
        if !decision.is_question() {
            return Ok(());
        }
        self.record_probe(decision.next_target_gap.as_deref())
    }

    /// Copies the counters into a request for the next turn.
    pub fn apply_to(&self, mut request: ProbeRequest) -> ProbeRequest {
        request.previous_probe_count = self.previous_probe_count;
        request.already_probed_fields = self.already_probed_fields.clone();
        request.override_max_probes = Some(self.max_probes);
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_zero_budget() {
        assert!(ProbeState::new(0).is_err());
        assert!(ProbeState::new(MAX_PROBES_CEILING + 1).is_err());
    }

    #[test]
    fn rejects_count_above_budget() {
        let err = ProbeState::from_parts(4, BTreeSet::new(), 3).unwrap_err();
        assert_eq!(err.field(), "previous_probe_count");
    }

    #[test]
    fn record_probe_advances_by_one() {
        let mut state = ProbeState::new(3).unwrap();
        state.record_probe(Some("monthYear")).unwrap();
        assert_eq!(state.previous_probe_count(), 1);
        assert_eq!(state.remaining(), 2);
        assert_eq!(state.stage(), ProbeStage::Probing);
        assert!(state.already_probed_fields().contains("monthYear"));
    }

    #[test]
    fn same_field_cannot_be_probed_twice() {
        let mut state = ProbeState::new(3).unwrap();
        state.record_probe(Some("reason")).unwrap();
        let err = state.record_probe(Some("reason")).unwrap_err();
        assert_eq!(err.code, ErrorCode::FieldAlreadyProbed);
        assert_eq!(state.previous_probe_count(), 1);
    }

    #[test]
    fn budget_is_enforced() {
        let mut state = ProbeState::new(1).unwrap();
        state.record_probe(None).unwrap();
        assert_eq!(state.stage(), ProbeStage::Done);
        let err = state.record_probe(Some("agency")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProbeBudgetExhausted);
    }

    #[test]
    fn decision_round_trip_carries_counters() {
        let mut state = ProbeState::new(3).unwrap();
        let decision = ProbeDecision {
            next_target_gap: Some("monthYear".to_string()),
            ..ProbeDecision::unsupported(&ProbeRequest::new("PACK_LE_APPS"))
        };

        // Not a question: nothing recorded
        state.record_decision(&decision).unwrap();
        assert_eq!(state.previous_probe_count(), 0);

        let question = ProbeDecision {
            mode: crate::domain::probing::ProbeMode::Question,
            ..decision
        };
        state.record_decision(&question).unwrap();

        let request = state.apply_to(ProbeRequest::new("PACK_LE_APPS"));
        assert_eq!(request.previous_probe_count, 1);
        assert!(request.already_probed_fields.contains("monthYear"));
        assert_eq!(request.override_max_probes, Some(3));
    }

    proptest! {
        #[test]
        fn count_never_exceeds_budget(max in 1u32..=MAX_PROBES_CEILING, attempts in 0usize..30) {
            let mut state = ProbeState::new(max).unwrap();
            for i in 0..attempts {
                let field = format!("field_{i}");
                let _ = state.record_probe(Some(&field));
                prop_assert!(state.previous_probe_count() <= state.max_probes());
            }
        }
    }
}

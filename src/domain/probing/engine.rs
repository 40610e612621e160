//! Probe Engine - per-turn decision for one topic instance.
//!
//! Pure with respect to its inputs: the registry is read-only and every
//! counter comes from the request.

use std::sync::Arc;

use super::answers::NormalizedAnswerSet;
use super::decision::{ProbeDecision, ProbeMode, ProbeRequest};
use super::gaps::GapAnalyzer;
use super::stage::ProbeStage;
use crate::domain::anchors::AnchorSet;
use crate::domain::foundation::{StateMachine, ValidationError};
use crate::domain::packs::{PackConfig, PackRegistry, MAX_PROBES_CEILING};
use crate::domain::questions::{QuestionRenderer, FINAL_QUESTION_TEXT};

/// Decides whether to ask another question and which gap to target.
#[derive(Debug, Clone)]
pub struct ProbeEngine {
    registry: Arc<PackRegistry>,
}

impl ProbeEngine {
    pub fn new(registry: Arc<PackRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PackRegistry {
        &self.registry
    }

    /// Decides the next step from the request alone.
    pub fn decide(&self, request: &ProbeRequest) -> Result<ProbeDecision, ValidationError> {
        self.decide_with_anchors(request, &AnchorSet::new())
    }

    /// Decides the next step, letting anchors answer fields the raw
    /// answers left unknown.
    ///
    /// An unsupported pack is a normal outcome, not an error. Only
    /// malformed requests fail.
    pub fn decide_with_anchors(
        &self,
        request: &ProbeRequest,
        anchors: &AnchorSet,
    ) -> Result<ProbeDecision, ValidationError> {
        validate_request(request)?;

        let Some(pack) = self.registry.get_config(&request.pack_id) else {
            tracing::debug!(pack_id = %request.pack_id, "Pack not supported for probing");
            return Ok(ProbeDecision::unsupported(request));
        };

        let max_probes = request.override_max_probes.unwrap_or_else(|| pack.max_probes());
        let answers =
            NormalizedAnswerSet::from_raw(pack, &request.incident_answers).with_anchor_fallbacks(anchors);

        Ok(Self::evaluate(pack, &answers, request, max_probes))
    }

    /// Computes gaps, advances the stage and renders the question.
    pub fn evaluate(
        pack: &PackConfig,
        answers: &NormalizedAnswerSet,
        request: &ProbeRequest,
        max_probes: u32,
    ) -> ProbeDecision {
        let previous = request.previous_probe_count;
        if previous > max_probes {
            tracing::warn!(
                pack_id = pack.pack_id(),
                previous_probe_count = previous,
                max_probes,
                "Probe count already exceeds budget; closing instance"
            );
        }

        let gaps = GapAnalyzer::compute(pack, answers, &request.already_probed_fields);
        let stage = advance(previous, max_probes, !gaps.is_empty());

        let (question, next_target_gap) = match stage {
            ProbeStage::FinalQuestion => (Some(FINAL_QUESTION_TEXT.to_string()), None),
            ProbeStage::Probing => match gaps.first() {
                Some(target) => (
                    Some(QuestionRenderer::render(target, pack)),
                    Some(target.to_string()),
                ),
                None => (None, None),
            },
            ProbeStage::Collecting | ProbeStage::Done => (None, None),
        };

        let mode = if question.is_some() && previous < max_probes {
            ProbeMode::Question
        } else {
            ProbeMode::Done
        };

        tracing::debug!(
            pack_id = pack.pack_id(),
            mode = ?mode,
            stage = ?stage,
            gaps = ?gaps.as_slice(),
            next_target_gap = next_target_gap.as_deref(),
            "Probe decision"
        );

        ProbeDecision {
            mode,
            question,
            message: None,
            pack_id: pack.pack_id().to_string(),
            previous_probe_count: previous,
            max_probes,
            final_question: stage == ProbeStage::FinalQuestion,
            all_gaps: gaps.into_vec(),
            next_target_gap,
            already_probed: request.already_probed_fields.iter().cloned().collect(),
            normalized_incident: answers.to_raw(),
            anchors: None,
            collected_anchors: None,
            stage: Some(stage),
        }
    }
}

/// Moves the instance from its current stage to the one this turn implies.
fn advance(previous: u32, max_probes: u32, gaps_remaining: bool) -> ProbeStage {
    let current = ProbeStage::current(previous, max_probes);
    if current.is_terminal() {
        return current;
    }
    let next = ProbeStage::next(previous, max_probes, gaps_remaining);
    match current.transition_to(next) {
        Ok(stage) => stage,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected probe stage transition; closing instance");
            ProbeStage::Done
        }
    }
}

fn validate_request(request: &ProbeRequest) -> Result<(), ValidationError> {
    if request.pack_id.trim().is_empty() {
        return Err(ValidationError::empty_field("packId"));
    }
    if let Some(max) = request.override_max_probes {
        if !(1..=MAX_PROBES_CEILING).contains(&max) {
            return Err(ValidationError::out_of_range(
                "overrideMaxProbes",
                1,
                MAX_PROBES_CEILING as i64,
                max as i64,
            ));
        }
    }
    Ok(())
}

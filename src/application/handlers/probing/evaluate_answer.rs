//! EvaluateAnswer command handler.
//!
//! One candidate turn end to end:
//!
//! 1. Validate the command and look up the pack
//! 2. Extract anchors from the answer (deterministic, then optionally
//!    generative merged underneath)
//! 3. Let the instance's anchors answer fields left unknown
//! 4. Decide the next probe
//! 5. Guard the field-specific question; the catch-all question is fixed
//!    text and is delivered as is

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::generative_extraction::GenerativeAnchorExtractor;
use super::guard_question::GuardQuestionHandler;
use crate::domain::anchors::{AnchorExtractor, AnchorSet, ExtractionContext, ExtractionOutput};
use crate::domain::foundation::{BestEffort, ValidationError};
use crate::domain::probing::{is_unknown_answer, ProbeDecision, ProbeEngine, ProbeRequest};
use crate::domain::questions::{GuardrailOutcome, Tone};

/// Command carrying one answer plus the instance's probe state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateAnswerCommand {
    #[serde(flatten)]
    pub probe: ProbeRequest,
    /// Raw input slot the answer was given in.
    pub field_key: String,
    #[serde(default)]
    pub answer_text: String,
    /// Anchors collected on earlier turns of this instance.
    #[serde(default)]
    pub collected_anchors: BTreeMap<String, String>,
    #[serde(default)]
    pub tone: Tone,
}

impl EvaluateAnswerCommand {
    pub fn new(probe: ProbeRequest, field_key: impl Into<String>, answer_text: impl Into<String>) -> Self {
        Self {
            probe,
            field_key: field_key.into(),
            answer_text: answer_text.into(),
            ..Self::default()
        }
    }

    pub fn with_collected_anchor(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.collected_anchors.insert(key.into(), value.into());
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

/// Result of evaluating one answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateAnswerResult {
    pub decision: ProbeDecision,
    pub extraction: ExtractionOutput,
    /// Present when a field-specific question was guarded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardrail: Option<GuardrailOutcome>,
    /// Why generative extraction contributed nothing this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_fallback_reason: Option<String>,
}

/// Errors that can occur when evaluating an answer.
#[derive(Debug, Clone, Error)]
pub enum EvaluateAnswerError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Handler for EvaluateAnswer commands.
pub struct EvaluateAnswerHandler {
    engine: ProbeEngine,
    extractor: Arc<AnchorExtractor>,
    generative: Option<GenerativeAnchorExtractor>,
    guard: GuardQuestionHandler,
}

impl EvaluateAnswerHandler {
    pub fn new(engine: ProbeEngine, extractor: Arc<AnchorExtractor>, guard: GuardQuestionHandler) -> Self {
        Self {
            engine,
            extractor,
            generative: None,
            guard,
        }
    }

    /// Enables generative extraction alongside the deterministic strategies.
    pub fn with_generative_extraction(mut self, generative: GenerativeAnchorExtractor) -> Self {
        self.generative = Some(generative);
        self
    }

    pub async fn handle(&self, cmd: EvaluateAnswerCommand) -> Result<EvaluateAnswerResult, EvaluateAnswerError> {
        let EvaluateAnswerCommand {
            mut probe,
            field_key,
            answer_text,
            collected_anchors,
            tone,
        } = cmd;

        if field_key.trim().is_empty() {
            return Err(ValidationError::empty_field("fieldKey").into());
        }

        let collected = AnchorSet::from_collected(&collected_anchors);

        let Some(pack) = self.engine.registry().get_config(&probe.pack_id) else {
            // Validates the pack id and yields the unsupported decision.
            let decision = self.engine.decide(&probe)?;
            return Ok(EvaluateAnswerResult {
                decision,
                extraction: ExtractionOutput::empty(&collected),
                guardrail: None,
                extraction_fallback_reason: None,
            });
        };

        // This turn's answer fills its slot unless the snapshot already holds
        // a substantive value for it.
        if !answer_text.trim().is_empty() {
            let slot = probe.incident_answers.entry(field_key.clone()).or_insert(None);
            if slot.as_deref().map_or(true, is_unknown_answer) {
                *slot = Some(answer_text.clone());
            }
        }

        let context = ExtractionContext {
            pack_id: pack.pack_id(),
            field_key: &field_key,
            answer_text: &answer_text,
            collected_anchors: &collected,
        };
        let deterministic = self.extractor.extract_anchors(&context);
        let (anchors, extraction_fallback_reason) = match &self.generative {
            Some(generative) => match generative.extract(pack, &context, deterministic).await {
                BestEffort::Generated(anchors) => (anchors, None),
                BestEffort::Fallback { value, reason } => (value, Some(reason)),
            },
            None => (deterministic, None),
        };
        let extraction = ExtractionOutput::new(anchors, &collected);

        let all_anchors = collected.overlay(extraction.anchor_set());
        let mut decision = self.engine.decide_with_anchors(&probe, &all_anchors)?;

        let guardrail = match decision.question.as_deref() {
            Some(question) if decision.is_question() && !decision.final_question => {
                Some(self.guard.guard(pack.pack_id(), question, pack.topic(), tone).await)
            }
            _ => None,
        };
        if let Some(outcome) = &guardrail {
            decision.question = Some(outcome.final_question.clone());
        }

        tracing::debug!(
            pack_id = pack.pack_id(),
            field_key = %field_key,
            mode = ?decision.mode,
            gaps = ?decision.all_gaps,
            anchors = extraction.anchors.len(),
            "Answer evaluated"
        );

        let decision = decision.with_anchors(extraction.anchors.clone(), extraction.collected_anchors.clone());
        Ok(EvaluateAnswerResult {
            decision,
            extraction,
            guardrail,
            extraction_fallback_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError, OfflineProvider};
    use crate::domain::packs::{pack_ids, PackRegistry};
    use crate::domain::probing::ProbeMode;
    use crate::domain::questions::{QuestionGuardrail, FINAL_QUESTION_TEXT};
    use crate::ports::AIProvider;

    fn handler(provider: Arc<dyn AIProvider>) -> EvaluateAnswerHandler {
        let registry = Arc::new(PackRegistry::builtin().unwrap());
        EvaluateAnswerHandler::new(
            ProbeEngine::new(registry),
            Arc::new(AnchorExtractor::default()),
            GuardQuestionHandler::new(provider, QuestionGuardrail::new()),
        )
    }

    fn offline() -> EvaluateAnswerHandler {
        handler(Arc::new(OfflineProvider::new()))
    }

    mod validation {
        use super::*;

        #[tokio::test]
        async fn empty_field_key_is_rejected() {
            let cmd = EvaluateAnswerCommand::new(ProbeRequest::new(pack_ids::LE_APPS), " ", "Mesa PD");
            let result = offline().handle(cmd).await;
            assert!(matches!(result, Err(EvaluateAnswerError::Validation(_))));
        }

        #[tokio::test]
        async fn empty_pack_id_is_rejected() {
            let cmd = EvaluateAnswerCommand::new(ProbeRequest::new(""), "agency", "Mesa PD");
            let result = offline().handle(cmd).await;
            assert!(matches!(result, Err(EvaluateAnswerError::Validation(_))));
        }

        #[tokio::test]
        async fn unsupported_pack_returns_typed_mode() {
            let cmd = EvaluateAnswerCommand::new(ProbeRequest::new("PACK_UNKNOWN"), "q1", "yes");

            let result = offline().handle(cmd).await.unwrap();

            assert_eq!(result.decision.mode, ProbeMode::UnsupportedPack);
            assert!(result.decision.message.is_some());
            assert!(result.decision.all_gaps.is_empty());
            assert!(result.extraction.is_empty());
            assert_eq!(result.guardrail, None);
        }
    }

    mod pipeline {
        use super::*;

        #[tokio::test]
        async fn narrative_anchor_fills_the_outcome_gap() {
            // Given a narrative answer that states the outcome only
            let cmd = EvaluateAnswerCommand::new(
                ProbeRequest::new(pack_ids::PRIOR_LE_APPS_STANDARD),
                "prior_le_narrative",
                "I was disqualified during the background investigation.",
            );

            // When the answer is evaluated
            let result = offline().handle(cmd).await.unwrap();

            // Then the outcome is anchored and no longer a gap
            assert_eq!(result.extraction.anchors.get("application_outcome").map(String::as_str), Some("disqualified"));
            assert_eq!(result.extraction.confidence.get("application_outcome"), Some(&2));
            assert!(!result.decision.all_gaps.contains(&"application_outcome".to_string()));
            assert_eq!(result.decision.next_target_gap.as_deref(), Some("agency_name"));
            assert_eq!(
                result.decision.question.as_deref(),
                Some("What was the name of the agency you applied to?")
            );
            assert_eq!(
                result.decision.collected_anchors.as_ref().and_then(|c| c.get("application_outcome")).map(String::as_str),
                Some("disqualified")
            );
        }

        #[tokio::test]
        async fn earlier_anchors_carry_into_the_decision() {
            let cmd = EvaluateAnswerCommand::new(
                ProbeRequest::new(pack_ids::PRIOR_LE_APPS_STANDARD),
                "prior_le_outcome",
                "dq'd",
            )
            .with_collected_anchor("agency_name", "Mesa PD");

            let result = offline().handle(cmd).await.unwrap();

            assert_eq!(result.extraction.confidence.get("application_outcome"), Some(&4));
            assert_eq!(result.extraction.collected_anchors.get("agency_name").map(String::as_str), Some("Mesa PD"));
            assert_eq!(result.decision.next_target_gap.as_deref(), Some("application_month_year"));
        }

        #[tokio::test]
        async fn answer_fills_a_null_slot_in_the_snapshot() {
            // Given a snapshot where the reason slot is still null
            let probe = ProbeRequest::new(pack_ids::LE_APPS)
                .with_answer("agency", Some("Mesa PD"))
                .with_answer("position", Some("Officer"))
                .with_answer("monthYear", Some("March 2019"))
                .with_answer("outcome", Some("not hired"))
                .with_answer("reason", None)
                .with_answer("issues", Some("no"))
                .with_answer("stageReached", Some("oral board"));

            // When the candidate answers the reason question
            let cmd = EvaluateAnswerCommand::new(probe, "reason", "Failed the polygraph");
            let result = offline().handle(cmd).await.unwrap();

            // Then the reason is no longer a gap and nothing is left to ask
            assert!(!result.decision.all_gaps.contains(&"reason".to_string()));
            assert_eq!(result.decision.mode, ProbeMode::Done);
        }

        #[tokio::test]
        async fn answer_replaces_an_earlier_hedge() {
            let probe = ProbeRequest::new(pack_ids::LE_APPS)
                .with_answer("agency", Some("I don't remember"));

            let cmd = EvaluateAnswerCommand::new(probe, "agency", "Tempe Police Department");
            let result = offline().handle(cmd).await.unwrap();

            assert!(!result.decision.all_gaps.contains(&"agency".to_string()));
            assert_eq!(result.decision.next_target_gap.as_deref(), Some("position"));
        }

        #[tokio::test]
        async fn substantive_snapshot_value_is_kept() {
            let probe = ProbeRequest::new(pack_ids::LE_APPS).with_answer("agency", Some("Mesa PD"));

            let cmd = EvaluateAnswerCommand::new(probe, "agency", "I don't remember");
            let result = offline().handle(cmd).await.unwrap();

            assert!(!result.decision.all_gaps.contains(&"agency".to_string()));
        }

        #[tokio::test]
        async fn final_question_bypasses_the_guardrail() {
            let provider = Arc::new(MockAIProvider::new());
            let cmd = EvaluateAnswerCommand::new(
                ProbeRequest::new(pack_ids::DOMESTIC_VIOLENCE_STANDARD).with_previous_probe_count(2),
                "dv_location",
                "Phoenix, AZ",
            );

            let result = handler(provider.clone()).handle(cmd).await.unwrap();

            assert!(result.decision.final_question);
            assert_eq!(result.decision.question.as_deref(), Some(FINAL_QUESTION_TEXT));
            assert_eq!(result.guardrail, None);
            assert_eq!(provider.call_count(), 0);
        }
    }

    mod guarding {
        use super::*;

        #[tokio::test]
        async fn sensitive_topic_question_is_softened() {
            // Given a provider that returns a softened question
            let provider = Arc::new(
                MockAIProvider::new().with_response("If you recall, about what month and year did this incident occur?"),
            );
            let cmd = EvaluateAnswerCommand::new(
                ProbeRequest::new(pack_ids::DOMESTIC_VIOLENCE_STANDARD),
                "dv_location",
                "Phoenix, AZ",
            );

            // When the answer is evaluated
            let result = handler(provider).handle(cmd).await.unwrap();

            // Then the delivered question is the rewrite
            assert_eq!(result.decision.mode, ProbeMode::Question);
            let guardrail = result.guardrail.unwrap();
            assert_eq!(guardrail.recommended_tone, Tone::Soft);
            assert_eq!(
                result.decision.question.as_deref(),
                Some("If you recall, about what month and year did this incident occur?")
            );
        }

        #[tokio::test]
        async fn unavailable_rewrite_delivers_the_template() {
            let cmd = EvaluateAnswerCommand::new(
                ProbeRequest::new(pack_ids::DOMESTIC_VIOLENCE_STANDARD),
                "dv_location",
                "Phoenix, AZ",
            );

            let result = offline().handle(cmd).await.unwrap();

            let guardrail = result.guardrail.unwrap();
            assert!(guardrail.fallback_reason.is_some());
            assert_eq!(
                result.decision.question.as_deref(),
                Some("About what month and year did this incident occur?")
            );
        }
    }

    mod generative {
        use super::*;

        #[tokio::test]
        async fn generated_anchors_join_the_extraction() {
            let provider = Arc::new(MockAIProvider::new().with_response(
                r#"{"agency_name": "Mesa Police Department", "application_outcome": "hired"}"#,
            ));
            let handler =
                offline().with_generative_extraction(GenerativeAnchorExtractor::new(provider.clone()));
            let cmd = EvaluateAnswerCommand::new(
                ProbeRequest::new(pack_ids::PRIOR_LE_APPS_STANDARD),
                "prior_le_narrative",
                "I was disqualified during the background investigation.",
            );

            let result = handler.handle(cmd).await.unwrap();

            assert_eq!(result.extraction_fallback_reason, None);
            assert_eq!(
                result.extraction.anchors.get("agency_name").map(String::as_str),
                Some("Mesa Police Department")
            );
            // Deterministic result wins the confidence tie.
            assert_eq!(
                result.extraction.anchors.get("application_outcome").map(String::as_str),
                Some("disqualified")
            );
            assert_eq!(result.decision.next_target_gap.as_deref(), Some("application_month_year"));
        }

        #[tokio::test]
        async fn failed_generation_keeps_deterministic_anchors() {
            let provider = Arc::new(MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 5 }));
            let handler = offline().with_generative_extraction(GenerativeAnchorExtractor::new(provider));
            let cmd = EvaluateAnswerCommand::new(
                ProbeRequest::new(pack_ids::PRIOR_LE_APPS_STANDARD),
                "prior_le_narrative",
                "I was disqualified during the background investigation.",
            );

            let result = handler.handle(cmd).await.unwrap();

            assert!(result.extraction_fallback_reason.unwrap().contains("rate limited"));
            assert_eq!(
                result.extraction.anchors.get("application_outcome").map(String::as_str),
                Some("disqualified")
            );
        }
    }

    #[test]
    fn command_deserializes_from_caller_json() {
        let json = r#"{
            "packId": "PACK_LE_APPS",
            "incidentAnswers": {"agency": "Mesa PD"},
            "previousProbesCount": 1,
            "maxAiFollowups": 3,
            "fieldKey": "outcome",
            "answerText": "dq",
            "tone": "soft"
        }"#;

        let cmd: EvaluateAnswerCommand = serde_json::from_str(json).unwrap();

        assert_eq!(cmd.probe.pack_id, "PACK_LE_APPS");
        assert_eq!(cmd.probe.previous_probe_count, 1);
        assert_eq!(cmd.probe.override_max_probes, Some(3));
        assert_eq!(cmd.field_key, "outcome");
        assert_eq!(cmd.tone, Tone::Soft);
        assert!(cmd.collected_anchors.is_empty());
    }
}

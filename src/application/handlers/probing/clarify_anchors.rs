//! ClarifyAnchors command handler.
//!
//! Finds the required facts an instance still has no anchor for and asks
//! for all of them in one guarded question.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::guard_question::GuardQuestionHandler;
use crate::domain::foundation::ValidationError;
use crate::domain::packs::{PackConfig, PackRegistry};
use crate::domain::questions::{GuardrailOutcome, QuestionRenderer, Tone};

/// Command to build a clarification question for missing anchors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarifyAnchorsCommand {
    pub pack_id: String,
    #[serde(default)]
    pub collected_anchors: BTreeMap<String, String>,
    #[serde(default)]
    pub tone: Tone,
}

impl ClarifyAnchorsCommand {
    pub fn new(pack_id: impl Into<String>) -> Self {
        Self {
            pack_id: pack_id.into(),
            ..Self::default()
        }
    }

    pub fn with_anchor(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.collected_anchors.insert(key.into(), value.into());
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

/// Result of a clarification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarifyAnchorsResult {
    pub pack_id: String,
    /// Missing fields in pack priority order.
    pub missing_anchors: Vec<String>,
    /// None when nothing is missing.
    pub question: Option<GuardrailOutcome>,
}

/// Errors that can occur when building a clarification question.
#[derive(Debug, Clone, Error)]
pub enum ClarifyAnchorsError {
    #[error("Pack '{0}' is not supported")]
    UnsupportedPack(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Handler for ClarifyAnchors commands.
pub struct ClarifyAnchorsHandler {
    registry: Arc<PackRegistry>,
    guard: GuardQuestionHandler,
}

impl ClarifyAnchorsHandler {
    pub fn new(registry: Arc<PackRegistry>, guard: GuardQuestionHandler) -> Self {
        Self { registry, guard }
    }

    pub async fn handle(&self, cmd: ClarifyAnchorsCommand) -> Result<ClarifyAnchorsResult, ClarifyAnchorsError> {
        if cmd.pack_id.trim().is_empty() {
            return Err(ValidationError::empty_field("packId").into());
        }
        let pack = self
            .registry
            .get_config(&cmd.pack_id)
            .ok_or_else(|| ClarifyAnchorsError::UnsupportedPack(cmd.pack_id.clone()))?;

        let missing = missing_anchors(pack, &cmd.collected_anchors);
        let keys: Vec<&str> = missing.iter().map(String::as_str).collect();

        let question = match QuestionRenderer::render_for_anchors(&keys, cmd.tone) {
            Some(text) => Some(self.guard.guard(pack.pack_id(), &text, pack.topic(), cmd.tone).await),
            None => None,
        };

        tracing::debug!(
            pack_id = pack.pack_id(),
            missing = ?missing,
            "Clarification computed"
        );

        Ok(ClarifyAnchorsResult {
            pack_id: pack.pack_id().to_string(),
            missing_anchors: missing,
            question,
        })
    }
}

/// Priority-ordered fields with no non-blank collected anchor.
///
/// The issues field is never asked for directly; it has its own probe.
fn missing_anchors(pack: &PackConfig, collected: &BTreeMap<String, String>) -> Vec<String> {
    pack.priority_order()
        .iter()
        .filter(|field| pack.issues_field() != Some(field.as_str()))
        .filter(|field| {
            collected
                .get(field.as_str())
                .map_or(true, |value| value.trim().is_empty())
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, OfflineProvider};
    use crate::domain::packs::pack_ids;
    use crate::domain::questions::QuestionGuardrail;

    fn handler(provider: Arc<dyn crate::ports::AIProvider>) -> ClarifyAnchorsHandler {
        ClarifyAnchorsHandler::new(
            Arc::new(PackRegistry::builtin().unwrap()),
            GuardQuestionHandler::new(provider, QuestionGuardrail::new()),
        )
    }

    #[tokio::test]
    async fn asks_for_missing_fields_in_one_question() {
        // Given an instance where only the outcome and agency are known
        let provider = Arc::new(MockAIProvider::new());
        let cmd = ClarifyAnchorsCommand::new(pack_ids::PRIOR_LE_APPS_STANDARD)
            .with_anchor("application_outcome", "disqualified")
            .with_anchor("agency_name", "Mesa PD");

        // When a clarification is requested
        let result = handler(provider.clone()).handle(cmd).await.unwrap();

        // Then the remaining non-issues fields are asked for together
        assert_eq!(
            result.missing_anchors,
            vec!["application_month_year", "position", "disqualification_reason"]
        );
        let question = result.question.unwrap();
        assert!(question.final_question.starts_with("Can you tell me "));
        assert!(question.final_question.ends_with('?'));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_anchor_counts_as_missing() {
        let cmd = ClarifyAnchorsCommand::new(pack_ids::PRIOR_LE_APPS_STANDARD)
            .with_anchor("application_outcome", "hired")
            .with_anchor("agency_name", "Mesa PD")
            .with_anchor("application_month_year", "March 2019")
            .with_anchor("position", "  ")
            .with_anchor("disqualification_reason", "n/a");

        let result = handler(Arc::new(OfflineProvider::new())).handle(cmd).await.unwrap();

        assert_eq!(result.missing_anchors, vec!["position"]);
    }

    #[tokio::test]
    async fn complete_instance_needs_no_question() {
        let cmd = ClarifyAnchorsCommand::new(pack_ids::PRIOR_LE_APPS_STANDARD)
            .with_anchor("application_outcome", "hired")
            .with_anchor("agency_name", "Mesa PD")
            .with_anchor("application_month_year", "March 2019")
            .with_anchor("position", "Officer")
            .with_anchor("disqualification_reason", "none");

        let result = handler(Arc::new(OfflineProvider::new())).handle(cmd).await.unwrap();

        assert!(result.missing_anchors.is_empty());
        assert_eq!(result.question, None);
    }

    #[tokio::test]
    async fn unknown_pack_is_an_error() {
        let result = handler(Arc::new(OfflineProvider::new()))
            .handle(ClarifyAnchorsCommand::new("PACK_UNKNOWN"))
            .await;
        assert!(matches!(result, Err(ClarifyAnchorsError::UnsupportedPack(id)) if id == "PACK_UNKNOWN"));
    }

    #[tokio::test]
    async fn empty_pack_id_is_rejected() {
        let result = handler(Arc::new(OfflineProvider::new()))
            .handle(ClarifyAnchorsCommand::new(""))
            .await;
        assert!(matches!(result, Err(ClarifyAnchorsError::Validation(_))));
    }
}

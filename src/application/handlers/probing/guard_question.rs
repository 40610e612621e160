//! GuardQuestion command handler.
//!
//! Inspects a question against the guardrail rules and, when it breaks one
//! or needs a different tone, asks the text-generation port for a rewrite.
//! Delivery is never blocked: any failure returns the original question
//! with the reason recorded.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::{BestEffort, ValidationError};
use crate::domain::questions::{GuardrailOutcome, GuardrailReport, QuestionGuardrail, Tone};
use crate::ports::{AIProvider, CompletionPurpose, CompletionRequest, MessageRole, RequestMetadata};

/// Completion ceiling for a rewritten question.
const REWRITE_MAX_TOKENS: u32 = 200;

/// Command to check (and possibly rewrite) one question.
#[derive(Debug, Clone)]
pub struct GuardQuestionCommand {
    pub pack_id: String,
    pub question: String,
    /// Human label of the topic; drives the recommended tone.
    pub topic: String,
    pub tone: Tone,
}

impl GuardQuestionCommand {
    pub fn new(pack_id: impl Into<String>, question: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            pack_id: pack_id.into(),
            question: question.into(),
            topic: topic.into(),
            tone: Tone::default(),
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

/// Errors that can occur when guarding a question.
#[derive(Debug, Clone, Error)]
pub enum GuardQuestionError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Handler for GuardQuestion commands.
pub struct GuardQuestionHandler {
    ai_provider: Arc<dyn AIProvider>,
    guardrail: QuestionGuardrail,
    rewrite_enabled: bool,
}

impl GuardQuestionHandler {
    pub fn new(ai_provider: Arc<dyn AIProvider>, guardrail: QuestionGuardrail) -> Self {
        Self {
            ai_provider,
            guardrail,
            rewrite_enabled: true,
        }
    }

    /// Disables generative rewrites; flagged questions then fall back.
    pub fn with_rewrite_enabled(mut self, enabled: bool) -> Self {
        self.rewrite_enabled = enabled;
        self
    }

    pub fn guardrail(&self) -> &QuestionGuardrail {
        &self.guardrail
    }

    /// Handles a guard question command.
    pub async fn handle(&self, cmd: GuardQuestionCommand) -> Result<GuardrailOutcome, GuardQuestionError> {
        if cmd.question.trim().is_empty() {
            return Err(ValidationError::empty_field("question").into());
        }
        Ok(self.guard(&cmd.pack_id, &cmd.question, &cmd.topic, cmd.tone).await)
    }

    /// Guards a question; never fails.
    pub async fn guard(&self, pack_id: &str, question: &str, topic: &str, tone: Tone) -> GuardrailOutcome {
        let report = self.guardrail.inspect(question, topic, tone);
        if !report.needs_rewrite() {
            return GuardrailOutcome::passed(question, &report);
        }

        match self.rewrite(pack_id, question, &report).await {
            BestEffort::Generated(rewrite) => {
                tracing::debug!(pack_id, issues = ?report.issues, "Question rewritten");
                GuardrailOutcome::rewritten(question, rewrite, &report)
            }
            BestEffort::Fallback { reason, .. } => {
                tracing::warn!(
                    pack_id,
                    issues = ?report.issues,
                    reason = %reason,
                    "Question rewrite unavailable; delivering original"
                );
                GuardrailOutcome::fell_back(question, reason, &report)
            }
        }
    }

    /// Asks the port for a rewrite that satisfies every rule.
    ///
    /// The fallback value is always the original question.
    pub async fn rewrite(&self, pack_id: &str, question: &str, report: &GuardrailReport) -> BestEffort<String> {
        if !self.rewrite_enabled {
            return BestEffort::fallback(question.to_string(), "question rewriting is disabled");
        }

        let request = CompletionRequest::new(RequestMetadata::new(pack_id, CompletionPurpose::QuestionRewrite))
            .with_system_prompt(self.guardrail.rewrite_instructions(report))
            .with_message(MessageRole::User, question)
            .with_max_tokens(REWRITE_MAX_TOKENS)
            .with_temperature(0.0);

        let response = match self.ai_provider.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                return BestEffort::fallback(question.to_string(), format!("rewrite failed: {}", e));
            }
        };

        if !response.is_complete() {
            return BestEffort::fallback(question.to_string(), "rewrite was truncated");
        }

        let candidate = clean_rewrite(&response.content);
        if candidate.is_empty() {
            return BestEffort::fallback(question.to_string(), "rewrite was empty");
        }

        let recheck = self.guardrail.inspect(&candidate, "", report.recommended_tone);
        if !recheck.approved() {
            let issues: Vec<&str> = recheck.issues.iter().map(|i| i.as_str()).collect();
            return BestEffort::fallback(
                question.to_string(),
                format!("rewrite still flagged: {}", issues.join(", ")),
            );
        }

        BestEffort::Generated(candidate)
    }
}

/// Trims whitespace and wrapping quotes from model output.
fn clean_rewrite(content: &str) -> String {
    let trimmed = content.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError, OfflineProvider};
    use crate::domain::questions::GuardrailIssue;

    const TOPIC: &str = "prior law enforcement applications";

    fn handler(provider: Arc<dyn AIProvider>) -> GuardQuestionHandler {
        GuardQuestionHandler::new(provider, QuestionGuardrail::new())
    }

    mod pass_through {
        use super::*;

        #[tokio::test]
        async fn clean_question_skips_generation() {
            let provider = Arc::new(MockAIProvider::new());
            let handler = handler(provider.clone());

            let outcome = handler
                .guard("PACK_LE_APPS", "What position did you apply for?", TOPIC, Tone::Neutral)
                .await;

            assert!(outcome.approved);
            assert_eq!(outcome.final_question, "What position did you apply for?");
            assert_eq!(outcome.adjusted_question, None);
            assert_eq!(provider.call_count(), 0);
        }

        #[tokio::test]
        async fn empty_question_is_rejected() {
            let handler = handler(Arc::new(OfflineProvider::new()));
            let result = handler
                .handle(GuardQuestionCommand::new("PACK_LE_APPS", "   ", TOPIC))
                .await;
            assert!(matches!(result, Err(GuardQuestionError::Validation(_))));
        }
    }

    mod rewrite {
        use super::*;

        #[tokio::test]
        async fn narrative_request_is_rewritten() {
            // Given a provider that returns a clean question
            let provider = Arc::new(
                MockAIProvider::new().with_response("\"What was the outcome of your application?\""),
            );
            let handler = handler(provider.clone());

            // When a narrative request is guarded
            let outcome = handler
                .guard("PACK_LE_APPS", "Can you walk me through what happened?", TOPIC, Tone::Neutral)
                .await;

            // Then the rewrite is delivered and the issue is reported
            assert!(!outcome.approved);
            assert_eq!(outcome.issues, vec![GuardrailIssue::ContainsNarrativeRequest]);
            assert_eq!(outcome.final_question, "What was the outcome of your application?");
            assert!(!outcome.final_question.to_lowercase().contains("walk me through"));
            assert_eq!(outcome.fallback_reason, None);

            let call = provider.last_call().unwrap();
            assert_eq!(call.metadata.purpose, CompletionPurpose::QuestionRewrite);
            assert!(call.system_prompt.unwrap().contains("contains_narrative_request"));
        }

        #[tokio::test]
        async fn provider_failure_falls_back_to_original() {
            let provider = Arc::new(MockAIProvider::new().with_error(MockError::Unavailable {
                message: "down".to_string(),
            }));
            let handler = handler(provider);

            let outcome = handler
                .guard("PACK_LE_APPS", "Can you walk me through what happened?", TOPIC, Tone::Neutral)
                .await;

            assert!(!outcome.approved);
            assert_eq!(outcome.final_question, "Can you walk me through what happened?");
            assert!(outcome.fallback_reason.unwrap().contains("rewrite failed"));
        }

        #[tokio::test]
        async fn rewrite_that_still_violates_falls_back() {
            let provider = Arc::new(MockAIProvider::new().with_response("Tell me the story. Why did you apply?"));
            let handler = handler(provider);

            let outcome = handler
                .guard("PACK_LE_APPS", "Walk me through it?", TOPIC, Tone::Neutral)
                .await;

            assert_eq!(outcome.final_question, "Walk me through it?");
            assert!(outcome.fallback_reason.unwrap().starts_with("rewrite still flagged"));
        }

        #[tokio::test]
        async fn tone_mismatch_requests_rewrite() {
            let provider = Arc::new(MockAIProvider::new().with_response("If you recall, were the police involved?"));
            let handler = handler(provider.clone());

            let outcome = handler
                .guard(
                    "PACK_DOMESTIC_VIOLENCE_STANDARD",
                    "Were the police involved?",
                    "domestic violence incident",
                    Tone::Neutral,
                )
                .await;

            assert!(outcome.approved);
            assert_eq!(outcome.recommended_tone, Tone::Soft);
            assert_eq!(outcome.adjusted_question.as_deref(), Some("If you recall, were the police involved?"));
            assert_eq!(provider.call_count(), 1);
        }

        #[tokio::test]
        async fn truncated_rewrite_falls_back() {
            let provider = Arc::new(MockAIProvider::new().with_truncated_response("What was the"));
            let handler = handler(provider);

            let outcome = handler
                .guard("PACK_LE_APPS", "Walk me through it?", TOPIC, Tone::Neutral)
                .await;

            assert_eq!(outcome.final_question, "Walk me through it?");
            assert_eq!(outcome.fallback_reason.as_deref(), Some("rewrite was truncated"));
        }

        #[tokio::test]
        async fn disabled_rewrite_falls_back_without_calling_provider() {
            let provider = Arc::new(MockAIProvider::new());
            let handler = handler(provider.clone()).with_rewrite_enabled(false);

            let outcome = handler
                .guard("PACK_LE_APPS", "Why would you do that?", TOPIC, Tone::Neutral)
                .await;

            assert_eq!(outcome.issues, vec![GuardrailIssue::ContainsShamingLanguage]);
            assert_eq!(outcome.fallback_reason.as_deref(), Some("question rewriting is disabled"));
            assert_eq!(provider.call_count(), 0);
        }
    }

    #[test]
    fn clean_rewrite_strips_quotes() {
        assert_eq!(clean_rewrite("  \"What was the date?\" \n"), "What was the date?");
        assert_eq!(clean_rewrite("What was the date?"), "What was the date?");
    }
}

//! Question guardrail: phrasing rules every probe must satisfy.
//!
//! Inspection is deterministic. Rewriting is left to the application layer,
//! which asks the text-generation port and falls back to the original.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::tone::Tone;
use crate::domain::foundation::text;

/// Default ceiling on question length, in characters.
pub const DEFAULT_MAX_QUESTION_LENGTH: usize = 300;

/// Phrases that solicit an open narrative instead of a fact.
const NARRATIVE_PHRASES: &[&str] = &[
    "walk me through",
    "take me through",
    "tell me the story",
    "tell me everything",
    "tell me what happened",
    "describe everything",
    "explain what happened",
    "in your own words",
    "start from the beginning",
    "how did that make you feel",
    "how did you feel",
];

/// Phrases that blame or shame the candidate.
const SHAMING_PHRASES: &[&str] = &[
    "why would you",
    "why did you",
    "you should have",
    "you should've",
    "how could you",
    "what were you thinking",
    "you knew better",
    "don't you think you",
    "shame on you",
    "irresponsible",
];

/// A rule a question broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailIssue {
    ContainsNarrativeRequest,
    ContainsShamingLanguage,
    ExceedsLengthLimit,
    MultipleQuestions,
}

impl GuardrailIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardrailIssue::ContainsNarrativeRequest => "contains_narrative_request",
            GuardrailIssue::ContainsShamingLanguage => "contains_shaming_language",
            GuardrailIssue::ExceedsLengthLimit => "exceeds_length_limit",
            GuardrailIssue::MultipleQuestions => "multiple_questions",
        }
    }
}

impl fmt::Display for GuardrailIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of inspecting one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailReport {
    pub issues: Vec<GuardrailIssue>,
    pub requested_tone: Tone,
    pub recommended_tone: Tone,
}

impl GuardrailReport {
    /// No rule was broken.
    pub fn approved(&self) -> bool {
        self.issues.is_empty()
    }

    /// The question must be rewritten, either to fix an issue or to change tone.
    pub fn needs_rewrite(&self) -> bool {
        !self.approved() || self.requested_tone != self.recommended_tone
    }
}

/// Wire shape returned to callers of the guardrail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailOutcome {
    pub approved: bool,
    pub question: String,
    pub adjusted_question: Option<String>,
    pub final_question: String,
    pub issues: Vec<GuardrailIssue>,
    pub recommended_tone: Tone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl GuardrailOutcome {
    /// Outcome for a question that needed no change.
    pub fn passed(question: impl Into<String>, report: &GuardrailReport) -> Self {
        let question = question.into();
        Self {
            approved: report.approved(),
            final_question: question.clone(),
            question,
            adjusted_question: None,
            issues: report.issues.clone(),
            recommended_tone: report.recommended_tone,
            fallback_reason: None,
        }
    }

    /// Outcome for a question replaced by a rewrite.
    pub fn rewritten(question: impl Into<String>, rewrite: String, report: &GuardrailReport) -> Self {
        Self {
            approved: report.approved(),
            question: question.into(),
            adjusted_question: Some(rewrite.clone()),
            final_question: rewrite,
            issues: report.issues.clone(),
            recommended_tone: report.recommended_tone,
            fallback_reason: None,
        }
    }

    /// Outcome for a rewrite that could not be obtained.
    pub fn fell_back(question: impl Into<String>, reason: impl Into<String>, report: &GuardrailReport) -> Self {
        let mut outcome = Self::passed(question, report);
        outcome.fallback_reason = Some(reason.into());
        outcome
    }
}

/// Deterministic question inspector.
#[derive(Debug, Clone)]
pub struct QuestionGuardrail {
    max_length: usize,
}

impl Default for QuestionGuardrail {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionGuardrail {
    pub fn new() -> Self {
        Self {
            max_length: DEFAULT_MAX_QUESTION_LENGTH,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Checks a question against every rule and recommends a tone.
    pub fn inspect(&self, question: &str, topic: &str, requested_tone: Tone) -> GuardrailReport {
        let folded = text::fold(question);
        let mut issues = Vec::new();

        if NARRATIVE_PHRASES.iter().any(|p| folded.contains(p)) {
            issues.push(GuardrailIssue::ContainsNarrativeRequest);
        }
        if SHAMING_PHRASES.iter().any(|p| folded.contains(p)) {
            issues.push(GuardrailIssue::ContainsShamingLanguage);
        }
        if question.chars().count() > self.max_length {
            issues.push(GuardrailIssue::ExceedsLengthLimit);
        }
        if question.matches('?').count() > 1 {
            issues.push(GuardrailIssue::MultipleQuestions);
        }

        GuardrailReport {
            issues,
            requested_tone,
            recommended_tone: Tone::recommended_for(topic, requested_tone),
        }
    }

    /// Instructions for a generative rewrite of a flagged question.
    pub fn rewrite_instructions(&self, report: &GuardrailReport) -> String {
        let mut rules = vec![
            "Ask for one specific fact in a single short question.".to_string(),
            "Do not ask the candidate to narrate, tell a story, or describe feelings.".to_string(),
            "Do not blame, shame, or judge the candidate.".to_string(),
            format!("Keep the question under {} characters with exactly one question mark.", self.max_length),
        ];
        rules.push(match report.recommended_tone {
            Tone::Soft => "Use a gentle, non-judgmental register.".to_string(),
            Tone::Neutral => "Use a neutral, professional register.".to_string(),
            Tone::Firm => "Use a direct, professional register.".to_string(),
        });
        if !report.issues.is_empty() {
            let flagged: Vec<&str> = report.issues.iter().map(GuardrailIssue::as_str).collect();
            rules.push(format!("The original was flagged for: {}.", flagged.join(", ")));
        }

        format!(
            "You rewrite interview questions for a background investigation.\n{}\nReply with the rewritten question only.",
            rules.iter().map(|r| format!("- {}", r)).collect::<Vec<_>>().join("\n")
        )
    }
}

//! Question guardrail configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::questions::{QuestionGuardrail, DEFAULT_MAX_QUESTION_LENGTH};

/// Question guardrail configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GuardrailConfig {
    /// Longest question delivered without a rewrite, in characters
    #[serde(default = "default_max_question_length")]
    pub max_question_length: usize,

    /// Ask the text-generation provider to rewrite flagged questions
    #[serde(default = "default_rewrite_enabled")]
    pub rewrite_enabled: bool,
}

impl GuardrailConfig {
    pub fn guardrail(&self) -> QuestionGuardrail {
        QuestionGuardrail::new().with_max_length(self.max_question_length)
    }

    /// Validate guardrail configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_question_length == 0 {
            return Err(ValidationError::InvalidQuestionLength);
        }
        Ok(())
    }
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            max_question_length: default_max_question_length(),
            rewrite_enabled: default_rewrite_enabled(),
        }
    }
}

fn default_max_question_length() -> usize {
    DEFAULT_MAX_QUESTION_LENGTH
}

fn default_rewrite_enabled() -> bool {
    true
}

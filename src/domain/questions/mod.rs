//! Question rendering, tone and guardrail rules.

mod guardrail;
mod renderer;
mod tone;

pub use guardrail::{
    GuardrailIssue, GuardrailOutcome, GuardrailReport, QuestionGuardrail, DEFAULT_MAX_QUESTION_LENGTH,
};
pub use renderer::{PhraseGroup, QuestionRenderer, FINAL_QUESTION_TEXT};
pub use tone::Tone;

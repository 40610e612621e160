//! Probing command handlers.

mod clarify_anchors;
mod evaluate_answer;
mod generative_extraction;
mod guard_question;

pub use clarify_anchors::{
    ClarifyAnchorsCommand, ClarifyAnchorsError, ClarifyAnchorsHandler, ClarifyAnchorsResult,
};
pub use evaluate_answer::{
    EvaluateAnswerCommand, EvaluateAnswerError, EvaluateAnswerHandler, EvaluateAnswerResult,
};
pub use generative_extraction::GenerativeAnchorExtractor;
pub use guard_question::{GuardQuestionCommand, GuardQuestionError, GuardQuestionHandler};

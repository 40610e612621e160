//! Application handlers.
//!
//! Command handlers that orchestrate domain operations and the
//! text-generation port.

pub mod probing;

pub use probing::{
    ClarifyAnchorsCommand, ClarifyAnchorsError, ClarifyAnchorsHandler, ClarifyAnchorsResult,
    EvaluateAnswerCommand, EvaluateAnswerError, EvaluateAnswerHandler, EvaluateAnswerResult,
    GenerativeAnchorExtractor, GuardQuestionCommand, GuardQuestionError, GuardQuestionHandler,
};

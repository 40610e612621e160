//! Foundation module - Shared domain primitives.
//!
//! Error types, the state machine trait, the best-effort result type and
//! text folding helpers that the packs, anchors, probing and questions
//! modules all build on.

mod best_effort;
mod errors;
mod state_machine;
pub mod text;

pub use best_effort::BestEffort;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use state_machine::StateMachine;

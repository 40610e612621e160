//! Gap analysis and the per-turn probe decision.
//!
//! Raw answers are normalized onto the pack's fields, gaps are computed in
//! priority order, and an explicit stage machine decides whether the next
//! question targets a gap, is the catch-all, or whether the instance is done.

mod answers;
mod decision;
mod engine;
mod gaps;
mod probe_state;
mod stage;

pub use answers::{is_unknown_answer, AnswerValue, IssuesSignal, NormalizedAnswerSet};
pub use decision::{ProbeDecision, ProbeMode, ProbeRequest};
pub use engine::ProbeEngine;
pub use gaps::{GapAnalyzer, GapList};
pub use probe_state::ProbeState;
pub use stage::ProbeStage;

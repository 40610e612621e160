//! Probe stage - per-instance lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle of one topic instance.
///
/// `Collecting` (no probes yet) -> `Probing` (targeted follow-ups) ->
/// `FinalQuestion` (the single catch-all) -> `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeStage {
    Collecting,
    Probing,
    FinalQuestion,
    Done,
}

impl ProbeStage {
    /// Stage of an instance that has already issued `previous` probes.
    pub fn current(previous: u32, max_probes: u32) -> Self {
        if previous >= max_probes {
            ProbeStage::Done
        } else if previous == 0 {
            ProbeStage::Collecting
        } else {
            ProbeStage::Probing
        }
    }

    /// Stage this turn moves the instance into.
    ///
    /// The last permitted turn is reserved for the catch-all question
    /// whenever gaps remain.
    pub fn next(previous: u32, max_probes: u32, gaps_remaining: bool) -> Self {
        if previous >= max_probes || !gaps_remaining {
            ProbeStage::Done
        } else if previous.saturating_add(1) >= max_probes {
            ProbeStage::FinalQuestion
        } else {
            ProbeStage::Probing
        }
    }

    /// Returns true if this stage issues a question.
    pub fn asks_question(&self) -> bool {
        matches!(self, ProbeStage::Probing | ProbeStage::FinalQuestion)
    }
}

impl StateMachine for ProbeStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ProbeStage::*;
        match self {
            Collecting => vec![Probing, FinalQuestion, Done],
            Probing => vec![Probing, FinalQuestion, Done],
            FinalQuestion => vec![Done],
            Done => vec![],
        }
    }
}

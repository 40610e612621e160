//! Result of a call that prefers a generative answer but can always fall
//! back to a deterministic one.

use serde::{Deserialize, Serialize};

/// A value that was either generated or substituted after a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BestEffort<T> {
    /// The generative path produced the value.
    Generated(T),
    /// The deterministic fallback produced the value.
    Fallback { value: T, reason: String },
}

impl<T> BestEffort<T> {
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        BestEffort::Fallback {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            BestEffort::Generated(value) | BestEffort::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            BestEffort::Generated(value) | BestEffort::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, BestEffort::Fallback { .. })
    }

    /// Why the fallback was used, if it was.
    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            BestEffort::Generated(_) => None,
            BestEffort::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BestEffort<U> {
        match self {
            BestEffort::Generated(value) => BestEffort::Generated(f(value)),
            BestEffort::Fallback { value, reason } => BestEffort::Fallback {
                value: f(value),
                reason,
            },
        }
    }
}

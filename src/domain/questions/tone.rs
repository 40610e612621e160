//! Question tone and topic-driven tone recommendation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::text;

/// Topics that call for a gentle register.
const SENSITIVE_TOPIC_TERMS: &[&str] = &[
    "domestic violence",
    "domestic",
    "abuse",
    "assault",
    "trauma",
    "minor",
    "minors",
    "child",
    "juvenile",
    "mental health",
    "suicide",
    "self-harm",
];

/// Topics that call for a direct register.
const INTEGRITY_TOPIC_TERMS: &[&str] = &[
    "dishonesty",
    "dishonest",
    "integrity",
    "fraud",
    "false statement",
    "false statements",
    "falsified",
    "lying",
    "deception",
    "cheating",
];

/// Register of a rendered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Soft,
    #[default]
    Neutral,
    Firm,
}

impl Tone {
    /// Phrase prepended to single-anchor questions.
    pub fn prefix(&self) -> &'static str {
        match self {
            Tone::Soft => "If you recall, ",
            Tone::Neutral => "",
            Tone::Firm => "Please specify: ",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Soft => "soft",
            Tone::Neutral => "neutral",
            Tone::Firm => "firm",
        }
    }

    /// Applies the tone prefix to a question.
    pub fn apply(&self, question: &str) -> String {
        match self {
            Tone::Neutral => question.to_string(),
            _ => format!("{}{}", self.prefix(), text::lowercase_first(question)),
        }
    }

    /// Sensitive topics recommend soft, integrity topics firm, anything else
    /// keeps the requested tone.
    pub fn recommended_for(topic: &str, requested: Tone) -> Tone {
        let folded = format!(" {} ", text::fold(topic));
        let mentions = |terms: &[&str]| terms.iter().any(|t| folded.contains(&format!(" {} ", t)));

        if mentions(SENSITIVE_TOPIC_TERMS) {
            Tone::Soft
        } else if mentions(INTEGRITY_TOPIC_TERMS) {
            Tone::Firm
        } else {
            requested
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitive_topics_recommend_soft() {
        assert_eq!(Tone::recommended_for("Domestic violence incident", Tone::Firm), Tone::Soft);
        assert_eq!(Tone::recommended_for("contact with minors", Tone::Neutral), Tone::Soft);
    }

    #[test]
    fn integrity_topics_recommend_firm() {
        assert_eq!(
            Tone::recommended_for("dishonesty or false statements during a hiring process", Tone::Soft),
            Tone::Firm
        );
    }

    #[test]
    fn other_topics_keep_requested_tone() {
        assert_eq!(Tone::recommended_for("prior law enforcement applications", Tone::Firm), Tone::Firm);
        assert_eq!(Tone::recommended_for("driving history", Tone::Neutral), Tone::Neutral);
    }

    #[test]
    fn partial_words_do_not_match() {
        assert_eq!(Tone::recommended_for("minority hiring programs", Tone::Neutral), Tone::Neutral);
    }

    #[test]
    fn apply_prefixes_and_lowercases() {
        assert_eq!(Tone::Soft.apply("What was the outcome?"), "If you recall, what was the outcome?");
        assert_eq!(Tone::Firm.apply("What was the outcome?"), "Please specify: what was the outcome?");
        assert_eq!(Tone::Neutral.apply("What was the outcome?"), "What was the outcome?");
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tone::Soft).unwrap(), "\"soft\"");
    }
}

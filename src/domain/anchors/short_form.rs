//! Short-form extraction for direct answers.
//!
//! A short answer is taken as the target value itself. Known phrases map to
//! canonical tokens at explicit confidence; anything else is kept as a
//! normalized raw string at weak confidence.

use super::anchor::{Anchor, AnchorSet, AnchorSource, Confidence};
use super::extractor::{ExtractionContext, ExtractionError, ExtractionStrategy};
use crate::domain::foundation::text;
use crate::domain::packs::pack_ids;

/// Canonical token -> phrases, checked in order.
pub type Vocabulary = &'static [(&'static str, &'static [&'static str])];

/// Application outcomes. `not_selected` precedes `hired` so that
/// "not hired" never reads as a hire.
pub const OUTCOME_VOCABULARY: Vocabulary = &[
    (
        "disqualified",
        &[
            "dq",
            "dq'd",
            "dqd",
            "dq'ed",
            "dqed",
            "disqualified",
            "disqualification",
            "failed background",
            "failed the background",
        ],
    ),
    (
        "withdrew",
        &["withdrew", "withdrawn", "i withdrew", "self-withdrew", "pulled out", "pulled my application"],
    ),
    (
        "not_selected",
        &["not selected", "not hired", "rejected", "denied", "passed over", "not chosen", "no offer"],
    ),
    (
        "in_process",
        &["pending", "in process", "in progress", "still in process", "waiting", "still waiting"],
    ),
    ("hired", &["hired", "offered", "got the job", "accepted", "offer accepted"]),
];

/// Yes/no answers.
pub const YES_NO_VOCABULARY: Vocabulary = &[
    ("yes", &["yes", "y", "yeah", "yep", "they were", "correct"]),
    ("no", &["no", "n", "nope", "they were not", "none"]),
];

#[derive(Debug, Clone)]
struct ShortFormScope {
    pack_id: &'static str,
    field_key: &'static str,
    anchor_key: &'static str,
    vocabulary: Vocabulary,
}

/// Maps short, direct answers onto canonical tokens.
#[derive(Debug, Clone)]
pub struct ShortFormStrategy {
    scopes: Vec<ShortFormScope>,
}

impl ShortFormStrategy {
    /// Short-form slots of the built-in packs.
    pub fn standard() -> Self {
        Self { scopes: Vec::new() }
            .with_scope(
                pack_ids::PRIOR_LE_APPS_STANDARD,
                "prior_le_outcome",
                "application_outcome",
                OUTCOME_VOCABULARY,
            )
            .with_scope(pack_ids::LE_APPS, "outcome", "outcome", OUTCOME_VOCABULARY)
            .with_scope(pack_ids::LE_APPS, "application_outcome", "outcome", OUTCOME_VOCABULARY)
            .with_scope(
                pack_ids::DOMESTIC_VIOLENCE_STANDARD,
                "dv_police",
                "police_involved",
                YES_NO_VOCABULARY,
            )
            .with_scope(
                pack_ids::DOMESTIC_VIOLENCE_STANDARD,
                "dv_charges",
                "charges_filed",
                YES_NO_VOCABULARY,
            )
    }

    /// Adds a short-form slot.
    pub fn with_scope(
        mut self,
        pack_id: &'static str,
        field_key: &'static str,
        anchor_key: &'static str,
        vocabulary: Vocabulary,
    ) -> Self {
        self.scopes.push(ShortFormScope {
            pack_id,
            field_key,
            anchor_key,
            vocabulary,
        });
        self
    }

    fn scope_for(&self, pack_id: &str, field_key: &str) -> Option<&ShortFormScope> {
        self.scopes
            .iter()
            .find(|s| s.pack_id == pack_id && s.field_key == field_key)
    }
}

impl ExtractionStrategy for ShortFormStrategy {
    fn name(&self) -> &'static str {
        "short_form"
    }

    fn applies_to(&self, pack_id: &str, field_key: &str) -> bool {
        self.scope_for(pack_id, field_key).is_some()
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> Result<AnchorSet, ExtractionError> {
        let Some(scope) = self.scope_for(context.pack_id, context.field_key) else {
            return Ok(AnchorSet::new());
        };

        let raw = text::collapse_whitespace(context.answer_text);
        if raw.is_empty() {
            return Ok(AnchorSet::new());
        }

        let anchor = match match_vocabulary(&raw, scope.vocabulary) {
            Some(token) => Anchor::new(scope.anchor_key, token, Confidence::Explicit, AnchorSource::ShortForm),
            None => Anchor::new(scope.anchor_key, raw, Confidence::Weak, AnchorSource::ShortForm),
        };

        Ok(std::iter::once(anchor).collect())
    }
}

/// Finds the canonical token whose phrase appears as whole words in
/// `answer`. A phrase next to a negation ("they were not") does not count.
pub fn match_vocabulary(answer: &str, vocabulary: Vocabulary) -> Option<&'static str> {
    let words = text::words(answer);
    vocabulary
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| text::contains_affirmed_phrase(&words, p)))
        .map(|(token, _)| *token)
}

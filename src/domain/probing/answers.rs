//! Normalized answers for one topic instance.
//!
//! Raw answer slots are re-keyed onto the pack's semantic field names and
//! every required field ends up either answered or unknown.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::anchors::AnchorSet;
use crate::domain::foundation::text;
use crate::domain::packs::PackConfig;

/// Answers that carry no usable fact once folded.
const UNKNOWN_EXACT: &[&str] = &[
    "n/a", "na", "n.a", "idk", "unknown", "?", "??", "-", "--", "dunno", "unsure", "not sure", "no idea",
    "not applicable",
];

/// Hedges that make an answer unknown wherever they appear.
const UNKNOWN_CONTAINS: &[&str] = &[
    "not sure",
    "unsure",
    "don't know",
    "dont know",
    "do not know",
    "don't recall",
    "dont recall",
    "do not recall",
    "can't recall",
    "cannot recall",
    "don't remember",
    "dont remember",
    "do not remember",
    "can't remember",
    "cant remember",
    "cannot remember",
    "no idea",
    "not certain",
    "i forget",
    "i forgot",
    "no recollection",
    "hard to say",
    "can't say",
    "cannot say",
];

const AFFIRMATIVE_WORDS: &[&str] = &["yes", "y", "yeah", "yep", "yup"];

const AMBIGUOUS_WORDS: &[&str] = &["maybe", "possibly", "perhaps", "probably", "might be", "kind of", "sort of"];

const DENIAL_EXACT: &[&str] = &[
    "no",
    "n",
    "nope",
    "none",
    "nothing",
    "no issues",
    "no concerns",
    "no issues or concerns",
    "not that i know of",
    "none that i know of",
];

const DENIAL_PREFIXES: &[&str] = &["no ", "no,", "none ", "none,", "nope ", "nope,", "nothing "];

/// Words that turn a denial into "there is something after all".
const QUALIFIER_WORDS: &[&str] = &["but", "except", "although", "though", "however"];

/// Returns true if the answer is one of the hedge-phrase family.
pub fn is_unknown_answer(answer: &str) -> bool {
    let folded = text::fold(answer);
    if folded.is_empty() {
        return true;
    }
    UNKNOWN_EXACT.contains(&folded.as_str()) || UNKNOWN_CONTAINS.iter().any(|p| folded.contains(p))
}

/// Value of one required field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum AnswerValue {
    Answered(String),
    #[default]
    Unknown,
}

impl AnswerValue {
    /// Answered text, or None for unknown.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Answered(text) => Some(text),
            AnswerValue::Unknown => None,
        }
    }

    /// True for a missing value or a hedge phrase.
    pub fn is_unknown(&self) -> bool {
        match self {
            AnswerValue::Answered(text) => is_unknown_answer(text),
            AnswerValue::Unknown => true,
        }
    }
}

impl From<Option<String>> for AnswerValue {
    fn from(value: Option<String>) -> Self {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => AnswerValue::Answered(v),
            _ => AnswerValue::Unknown,
        }
    }
}

impl From<AnswerValue> for Option<String> {
    fn from(value: AnswerValue) -> Self {
        match value {
            AnswerValue::Answered(text) => Some(text),
            AnswerValue::Unknown => None,
        }
    }
}

/// How an answer to the issues field reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuesSignal {
    Unknown,
    Affirmed,
    Ambiguous,
    Denied,
    Described,
}

impl IssuesSignal {
    /// Classifies an issues answer.
    pub fn classify(value: &AnswerValue) -> Self {
        let Some(answer) = value.as_text() else {
            return IssuesSignal::Unknown;
        };
        if is_unknown_answer(answer) {
            return IssuesSignal::Unknown;
        }

        let folded = text::fold(answer);
        if DENIAL_EXACT.contains(&folded.as_str()) {
            return IssuesSignal::Denied;
        }
        if DENIAL_PREFIXES.iter().any(|p| folded.starts_with(p)) {
            let qualified = text::words(&folded)
                .iter()
                .any(|w| QUALIFIER_WORDS.contains(&w.as_str()));
            return if qualified {
                IssuesSignal::Ambiguous
            } else {
                IssuesSignal::Denied
            };
        }
        if starts_with_word(&folded, AFFIRMATIVE_WORDS) {
            return IssuesSignal::Affirmed;
        }
        if starts_with_word(&folded, AMBIGUOUS_WORDS) {
            return IssuesSignal::Ambiguous;
        }
        IssuesSignal::Described
    }

    /// Affirmative, ambiguous or unknown issues answers warrant a probe.
    pub fn is_gap(&self) -> bool {
        matches!(
            self,
            IssuesSignal::Unknown | IssuesSignal::Affirmed | IssuesSignal::Ambiguous
        )
    }
}

fn starts_with_word(folded: &str, words: &[&str]) -> bool {
    words.iter().any(|w| {
        folded
            .strip_prefix(w)
            .is_some_and(|rest| rest.chars().next().map_or(true, |c| !c.is_alphanumeric()))
    })
}

/// Required field -> answer, for one topic instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedAnswerSet(BTreeMap<String, AnswerValue>);

impl NormalizedAnswerSet {
    /// Re-keys raw answer slots onto the pack's required fields.
    ///
    /// Raw keys are visited in lexical order; a field keeps its first
    /// substantive answer, and a hedge is replaced by a later substantive
    /// one. Unrecognized raw keys are ignored.
    pub fn from_raw(pack: &PackConfig, raw: &BTreeMap<String, Option<String>>) -> Self {
        let mut answers: BTreeMap<String, AnswerValue> = pack
            .required_fields()
            .iter()
            .map(|f| (f.clone(), AnswerValue::Unknown))
            .collect();

        for (raw_key, raw_value) in raw {
            let Some(field) = pack.resolve_field(raw_key) else {
                tracing::debug!(pack_id = pack.pack_id(), raw_key = %raw_key, "Ignoring unrecognized answer key");
                continue;
            };
            let candidate = AnswerValue::from(raw_value.clone());
            if candidate == AnswerValue::Unknown {
                continue;
            }

            let slot = answers.entry(field.to_string()).or_default();
            if slot.is_unknown() && !(candidate.is_unknown() && *slot != AnswerValue::Unknown) {
                *slot = candidate;
            }
        }

        Self(answers)
    }

    /// Fills still-unknown fields from anchors keyed by the same field name.
    pub fn with_anchor_fallbacks(mut self, anchors: &AnchorSet) -> Self {
        for (field, value) in self.0.iter_mut() {
            if !value.is_unknown() {
                continue;
            }
            if let Some(anchored) = anchors.value_of(field) {
                if !is_unknown_answer(anchored) {
                    *value = AnswerValue::Answered(anchored.to_string());
                }
            }
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&AnswerValue> {
        self.0.get(field)
    }

    /// True when the field is absent or its answer is unknown.
    pub fn is_unknown(&self, field: &str) -> bool {
        self.0.get(field).map_or(true, AnswerValue::is_unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Snapshot in the raw `field -> string|null` shape.
    pub fn to_raw(&self) -> BTreeMap<String, Option<String>> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.as_text().map(str::to_string)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

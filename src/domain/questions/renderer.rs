//! Question rendering from pack templates and the anchor phrase table.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::tone::Tone;
use crate::domain::foundation::text;
use crate::domain::packs::PackConfig;

/// Catch-all question reserved for the last permitted probe.
pub const FINAL_QUESTION_TEXT: &str =
    "Is there anything else about this topic that you feel is important for us to know?";

/// Semantic group used to order phrases in a compound question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PhraseGroup {
    Date,
    Organization,
    Location,
    Position,
    Outcome,
    Other,
}

#[derive(Debug, Clone, Copy)]
struct AnchorPhrase {
    question: &'static str,
    phrase: &'static str,
    group: PhraseGroup,
}

const fn phrase(question: &'static str, phrase: &'static str, group: PhraseGroup) -> AnchorPhrase {
    AnchorPhrase {
        question,
        phrase,
        group,
    }
}

static PHRASES: Lazy<HashMap<&'static str, AnchorPhrase>> = Lazy::new(|| {
    use PhraseGroup::*;

    let month_year = phrase(
        "About what month and year did this take place?",
        "the month and year it took place",
        Date,
    );
    let agency = phrase(
        "What was the name of the agency?",
        "the name of the agency",
        Organization,
    );
    let outcome = phrase("What was the outcome?", "the outcome", Outcome);
    let reason = phrase(
        "What reason were you given for the outcome?",
        "the reason you were given",
        Outcome,
    );

    HashMap::from([
        ("application_month_year", month_year),
        ("incident_month_year", month_year),
        ("monthYear", month_year),
        ("agency_name", agency),
        ("agency", agency),
        (
            "location",
            phrase(
                "In what city and state did this take place?",
                "the city and state where it took place",
                Location,
            ),
        ),
        (
            "position",
            phrase("What position did you apply for?", "the position you applied for", Position),
        ),
        ("application_outcome", outcome),
        ("outcome", outcome),
        ("disqualification_reason", reason),
        ("reason", reason),
        (
            "stageReached",
            phrase(
                "How far did you get in the hiring process?",
                "how far you got in the hiring process",
                Outcome,
            ),
        ),
        (
            "consequence",
            phrase(
                "What action was taken as a result?",
                "any action taken as a result",
                Outcome,
            ),
        ),
        (
            "charges_filed",
            phrase("Were any charges filed?", "whether any charges were filed", Outcome),
        ),
        (
            "police_involved",
            phrase("Were the police involved?", "whether the police were involved", Other),
        ),
        (
            "relationship",
            phrase(
                "What was your relationship to the other person?",
                "your relationship to the other person",
                Other,
            ),
        ),
    ])
});

/// Stateless question renderer.
pub struct QuestionRenderer;

impl QuestionRenderer {
    /// Probe text for a target field: the pack template, or a generic
    /// fallback naming the field.
    pub fn render(target: &str, pack: &PackConfig) -> String {
        match pack.template_for(target) {
            Some(template) => template.to_string(),
            None => format!("Can you provide more details about the {}?", target),
        }
    }

    /// One question covering every listed anchor, or None for an empty list.
    ///
    /// A single anchor gets its phrase-table question with the tone prefix.
    /// Several anchors are ordered by group and joined into one sentence.
    pub fn render_for_anchors(anchors: &[&str], tone: Tone) -> Option<String> {
        let mut unique: Vec<&str> = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            if !unique.contains(anchor) {
                unique.push(anchor);
            }
        }

        match unique.as_slice() {
            [] => None,
            [single] => Some(tone.apply(&single_question(single))),
            many => {
                let mut phrased: Vec<(PhraseGroup, String)> =
                    many.iter().map(|a| (group_of(a), compound_phrase(a))).collect();
                phrased.sort_by_key(|(group, _)| *group);
                let phrases: Vec<String> = phrased.into_iter().map(|(_, p)| p).collect();
                Some(format!("Can you tell me {}?", join_phrases(&phrases)))
            }
        }
    }
}

fn single_question(anchor: &str) -> String {
    match PHRASES.get(anchor) {
        Some(entry) => entry.question.to_string(),
        None => format!("What was the {}?", text::de_slug(anchor)),
    }
}

fn compound_phrase(anchor: &str) -> String {
    match PHRASES.get(anchor) {
        Some(entry) => entry.phrase.to_string(),
        None => format!("the {}", text::de_slug(anchor)),
    }
}

fn group_of(anchor: &str) -> PhraseGroup {
    PHRASES
        .get(anchor)
        .map(|entry| entry.group)
        .unwrap_or(PhraseGroup::Other)
}

/// `a and b`, or `a, b, and c`.
fn join_phrases(phrases: &[String]) -> String {
    match phrases {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{} and {}", first, second),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

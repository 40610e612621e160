//! Narrative extraction from long free-text answers.
//!
//! Outcome language is inferred from the story; agency names, positions and
//! dates near temporal cue words are picked out by structural patterns.

use once_cell::sync::Lazy;
use regex::Regex;

use super::anchor::{Anchor, AnchorSet, AnchorSource, Confidence};
use super::extractor::{ExtractionContext, ExtractionError, ExtractionStrategy};
use crate::domain::foundation::text;
use crate::domain::packs::pack_ids;

/// Outcome phrases, checked in order; negative outcomes come before `hired`
/// so "was not hired" never reads as a hire.
const OUTCOME_PHRASES: &[(&str, &[&str])] = &[
    (
        "disqualified",
        &[
            "disqualified",
            "dq'd",
            "dq'ed",
            "got dq",
            "was dq",
            "failed the background",
            "failed my background",
            "failed the polygraph",
            "failed the psych",
        ],
    ),
    (
        "withdrew",
        &[
            "withdrew",
            "withdrawn",
            "pulled my application",
            "pulled out of the process",
            "dropped out of the process",
            "decided not to continue",
        ],
    ),
    (
        "not_selected",
        &[
            "not selected",
            "wasn't selected",
            "was not selected",
            "not hired",
            "wasn't hired",
            "didn't get the job",
            "did not get the job",
            "rejected",
            "not chosen",
            "passed over",
        ],
    ),
    (
        "in_process",
        &[
            "still in process",
            "still in the process",
            "currently in process",
            "still pending",
            "haven't heard back",
            "have not heard back",
            "awaiting a decision",
            "still waiting",
        ],
    ),
    (
        "hired",
        &[
            "was hired",
            "got hired",
            "got the job",
            "was offered",
            "received an offer",
            "accepted an offer",
            "accepted the offer",
            "offered the position",
            "was sworn in",
        ],
    ),
];

static AGENCY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b((?:[A-Z][A-Za-z'.&-]*\s+){1,4}(?:Police Department|Sheriff's Office|Sheriff's Department|Sheriff Office|Highway Patrol|State Police|Department of Public Safety|Department of Corrections|Marshals? Service|Police|PD|SO|DPS))\b",
    )
    .expect("valid agency regex")
});

static POSITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:for|as)\s+(?:an?|the)\s+((?:[a-z]+\s+){0,2}?(?:officer|deputy|trooper|dispatcher|detective|agent|cadet|recruit|sergeant|investigator|jailer))\b",
    )
    .expect("valid position regex")
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:around|in|during|about|approximately|since|by)\s+((?:(?:early|mid|late)[\s-]+)?(?:(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?,?\s+(?:of\s+)?(?:19|20)\d{2}|\d{1,2}/(?:19|20)\d{2}|(?:19|20)\d{2}))\b",
    )
    .expect("valid date regex")
});

/// Anchor keys a narrative slot writes to.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeKeys {
    pub outcome: &'static str,
    pub agency: &'static str,
    pub position: &'static str,
    pub date: &'static str,
}

#[derive(Debug, Clone)]
struct NarrativeScope {
    pack_id: &'static str,
    field_key: &'static str,
    keys: NarrativeKeys,
}

/// Scans free text for outcome, agency, position and date anchors.
#[derive(Debug, Clone)]
pub struct NarrativeStrategy {
    scopes: Vec<NarrativeScope>,
}

impl NarrativeStrategy {
    /// Narrative slots of the built-in packs.
    pub fn standard() -> Self {
        Self {
            scopes: vec![NarrativeScope {
                pack_id: pack_ids::PRIOR_LE_APPS_STANDARD,
                field_key: "prior_le_narrative",
                keys: NarrativeKeys {
                    outcome: "application_outcome",
                    agency: "agency_name",
                    position: "position",
                    date: "application_month_year",
                },
            }],
        }
    }

    /// Adds a narrative slot.
    pub fn with_scope(
        mut self,
        pack_id: &'static str,
        field_key: &'static str,
        keys: NarrativeKeys,
    ) -> Self {
        self.scopes.push(NarrativeScope {
            pack_id,
            field_key,
            keys,
        });
        self
    }

    fn scope_for(&self, pack_id: &str, field_key: &str) -> Option<&NarrativeScope> {
        self.scopes
            .iter()
            .find(|s| s.pack_id == pack_id && s.field_key == field_key)
    }
}

impl ExtractionStrategy for NarrativeStrategy {
    fn name(&self) -> &'static str {
        "narrative"
    }

    fn applies_to(&self, pack_id: &str, field_key: &str) -> bool {
        self.scope_for(pack_id, field_key).is_some()
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> Result<AnchorSet, ExtractionError> {
        let Some(scope) = self.scope_for(context.pack_id, context.field_key) else {
            return Ok(AnchorSet::new());
        };
        let keys = scope.keys;
        let mut anchors = AnchorSet::new();

        if let Some(outcome) = detect_outcome(context.answer_text) {
            anchors.insert(Anchor::new(keys.outcome, outcome, Confidence::Inferred, AnchorSource::Narrative));
        }
        if let Some(agency) = find_agency(context.answer_text) {
            anchors.insert(Anchor::new(keys.agency, agency, Confidence::Structural, AnchorSource::Narrative));
        }
        if let Some(position) = find_position(context.answer_text) {
            anchors.insert(Anchor::new(keys.position, position, Confidence::Structural, AnchorSource::Narrative));
        }
        if let Some(date) = find_date(context.answer_text) {
            anchors.insert(Anchor::new(keys.date, date, Confidence::Structural, AnchorSource::Narrative));
        }

        Ok(anchors)
    }
}

/// Canonical outcome token implied by the story, if any.
///
/// Negated mentions ("never disqualified") are skipped.
pub fn detect_outcome(answer: &str) -> Option<&'static str> {
    let words = text::words(answer);
    OUTCOME_PHRASES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| text::contains_affirmed_phrase(&words, p)))
        .map(|(token, _)| *token)
}

fn find_agency(answer: &str) -> Option<String> {
    let normalized = text::normalize_quotes(answer);
    let captured = AGENCY_RE.captures(&normalized)?.get(1)?.as_str();
    let name = captured.strip_prefix("The ").unwrap_or(captured);
    Some(text::collapse_whitespace(name))
}

fn find_position(answer: &str) -> Option<String> {
    let captured = POSITION_RE.captures(answer)?.get(1)?.as_str();
    Some(text::collapse_whitespace(&captured.to_lowercase()))
}

fn find_date(answer: &str) -> Option<String> {
    let captured = DATE_RE.captures(answer)?.get(1)?.as_str();
    Some(text::collapse_whitespace(captured))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(answer: &str) -> AnchorSet {
        let collected = AnchorSet::new();
        let context = ExtractionContext {
            pack_id: pack_ids::PRIOR_LE_APPS_STANDARD,
            field_key: "prior_le_narrative",
            answer_text: answer,
            collected_anchors: &collected,
        };
        NarrativeStrategy::standard().extract(&context).unwrap()
    }

    mod outcomes {
        use super::*;

        #[test]
        fn disqualification_is_inferred_at_confidence_two() {
            let anchors = extract(
                "I made it pretty far but was disqualified during the background investigation.",
            );
            let outcome = anchors.get("application_outcome").unwrap();
            assert_eq!(outcome.value, "disqualified");
            assert_eq!(outcome.confidence, Confidence::Inferred);
        }

        #[test]
        fn negated_hire_reads_as_not_selected() {
            assert_eq!(detect_outcome("In the end I was not hired."), Some("not_selected"));
            assert_eq!(detect_outcome("I wasn\u{2019}t hired"), Some("not_selected"));
        }

        #[test]
        fn hire_language_is_detected() {
            assert_eq!(detect_outcome("I got hired and worked there two years"), Some("hired"));
        }

        #[test]
        fn withdrawal_and_pending_are_detected() {
            assert_eq!(detect_outcome("I withdrew after the oral board"), Some("withdrew"));
            assert_eq!(detect_outcome("I'm still waiting on them"), Some("in_process"));
        }

        #[test]
        fn negated_disqualification_is_skipped() {
            assert_eq!(
                detect_outcome("I was never disqualified; I withdrew on my own."),
                Some("withdrew")
            );
            assert_eq!(detect_outcome("I wasn't disqualified, they just never called."), None);
        }

        #[test]
        fn no_outcome_language_yields_nothing() {
            assert_eq!(detect_outcome("I applied there once."), None);
        }
    }

    mod structural {
        use super::*;

        #[test]
        fn extracts_agency_position_and_date() {
            let anchors = extract(
                "I applied to the Phoenix Police Department in March 2019 for a police officer position.",
            );

            assert_eq!(anchors.value_of("agency_name"), Some("Phoenix Police Department"));
            assert_eq!(anchors.value_of("position"), Some("police officer"));
            assert_eq!(anchors.value_of("application_month_year"), Some("March 2019"));
            assert_eq!(anchors.confidence_of("agency_name"), Confidence::Structural);
        }

        #[test]
        fn agency_abbreviations_are_recognized() {
            let anchors = extract("Back then I tried Mesa PD as a detention officer.");
            assert_eq!(anchors.value_of("agency_name"), Some("Mesa PD"));
            assert_eq!(anchors.value_of("position"), Some("detention officer"));
        }

        #[test]
        fn sheriffs_office_with_smart_apostrophe() {
            let anchors = extract("It was the Maricopa County Sheriff\u{2019}s Office around 2017.");
            assert_eq!(anchors.value_of("agency_name"), Some("Maricopa County Sheriff's Office"));
            assert_eq!(anchors.value_of("application_month_year"), Some("2017"));
        }

        #[test]
        fn date_requires_a_temporal_cue() {
            let anchors = extract("2019 was a hard year.");
            assert!(anchors.value_of("application_month_year").is_none());
        }

        #[test]
        fn numeric_month_year_is_captured() {
            let anchors = extract("I applied in 04/2020 and never heard back");
            assert_eq!(anchors.value_of("application_month_year"), Some("04/2020"));
        }
    }

    mod scoping {
        use super::*;

        #[test]
        fn does_not_fire_outside_its_scope() {
            let strategy = NarrativeStrategy::standard();
            assert!(!strategy.applies_to(pack_ids::LE_APPS, "prior_le_narrative"));
            assert!(!strategy.applies_to(pack_ids::PRIOR_LE_APPS_STANDARD, "prior_le_outcome"));
        }

        #[test]
        fn out_of_scope_context_extracts_nothing() {
            let collected = AnchorSet::new();
            let context = ExtractionContext {
                pack_id: pack_ids::LE_APPS,
                field_key: "prior_le_narrative",
                answer_text: "I was disqualified",
                collected_anchors: &collected,
            };
            assert!(NarrativeStrategy::standard().extract(&context).unwrap().is_empty());
        }

        #[test]
        fn added_scope_does_not_change_existing_output() {
            let base = extract("I was disqualified by Mesa PD");
            let extended = NarrativeStrategy::standard().with_scope(
                pack_ids::INTEGRITY_APPS,
                "integrity_narrative",
                NarrativeKeys {
                    outcome: "consequence",
                    agency: "agency_name",
                    position: "position",
                    date: "incident_month_year",
                },
            );
            let collected = AnchorSet::new();
            let context = ExtractionContext {
                pack_id: pack_ids::PRIOR_LE_APPS_STANDARD,
                field_key: "prior_le_narrative",
                answer_text: "I was disqualified by Mesa PD",
                collected_anchors: &collected,
            };
            assert_eq!(extended.extract(&context).unwrap(), base);
        }
    }
}

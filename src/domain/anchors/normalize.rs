//! Per-key canonicalization of anchor values.

use crate::domain::foundation::text;

/// Keys whose values are enum-like tokens and get case-folded.
const TOKEN_KEYS: &[&str] = &[
    "application_outcome",
    "outcome",
    "police_involved",
    "charges_filed",
];

/// Keys whose values are names, places or dates and keep their casing.
const TEXT_KEYS: &[&str] = &[
    "agency",
    "agency_name",
    "position",
    "application_month_year",
    "monthYear",
    "incident_month_year",
    "location",
    "disqualification_reason",
    "reason",
];

/// Canonicalizes `raw` into the stored form for `key`.
///
/// Unknown keys pass through unchanged. Applying this twice yields the
/// same result as applying it once.
pub fn normalize_anchor_value(key: &str, raw: &str) -> String {
    if TOKEN_KEYS.contains(&key) {
        text::fold(raw)
    } else if TEXT_KEYS.contains(&key) {
        let collapsed = text::collapse_whitespace(&text::normalize_quotes(raw));
        text::trim_trailing_punctuation(&collapsed).to_string()
    } else {
        raw.to_string()
    }
}

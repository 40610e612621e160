//! Text folding helpers shared by extraction, gap analysis and the guardrail.

/// Replaces typographic quotes and apostrophes with their ASCII forms.
pub fn normalize_quotes(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' | '`' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
            other => other,
        })
        .collect()
}

/// Collapses every whitespace run to a single space and trims the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Folds free text for phrase matching.
///
/// ASCII quotes, lowercase, single spaces, no trailing sentence punctuation.
pub fn fold(s: &str) -> String {
    let folded = collapse_whitespace(&normalize_quotes(s).to_lowercase());
    trim_trailing_punctuation(&folded).to_string()
}

/// Strips trailing sentence punctuation and any whitespace between it.
pub fn trim_trailing_punctuation(s: &str) -> &str {
    s.trim_end_matches(|c: char| matches!(c, '.' | '!' | ',' | ';' | ':') || c.is_whitespace())
}

/// Words that cancel a phrase they sit next to.
const NEGATIONS: &[&str] = &[
    "not", "never", "wasn't", "weren't", "isn't", "aren't", "didn't", "hasn't", "haven't",
];

/// Openers of phrases that are themselves negative.
const NEGATIVE_OPENERS: &[&str] = &["no", "none", "nope", "n"];

/// Folds `s` and splits it into words; punctuation other than apostrophes
/// and hyphens separates words.
pub fn words(s: &str) -> Vec<String> {
    fold(s)
        .split(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '"' | '(' | ')'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when `phrase` occurs as whole words in `words` without a negation
/// directly before or after it.
///
/// A phrase that itself opens with a negation ("no", "not selected") is
/// exempt, so "no, not really" still reads as "no".
pub fn contains_affirmed_phrase(words: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    let exempt = NEGATIONS.contains(&needle[0]) || NEGATIVE_OPENERS.contains(&needle[0]);

    words.windows(needle.len()).enumerate().any(|(start, window)| {
        if !window.iter().zip(&needle).all(|(w, n)| w == n) {
            return false;
        }
        if exempt {
            return true;
        }
        let negated_before = start > 0 && NEGATIONS.contains(&words[start - 1].as_str());
        let negated_after = words
            .get(start + needle.len())
            .is_some_and(|next| NEGATIONS.contains(&next.as_str()));
        !(negated_before || negated_after)
    })
}

/// Turns a field identifier into words: `application_month_year` and
/// `monthYear` become `application month year` and `month year`.
pub fn de_slug(s: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in s.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.extend(c.to_lowercase());
        } else {
            current.extend(c.to_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join(" ")
}

/// Uppercases the first character.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercases the first character.
pub fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_quotes_become_ascii() {
        assert_eq!(normalize_quotes("I don\u{2019}t recall"), "I don't recall");
        assert_eq!(normalize_quotes("\u{201C}none\u{201D}"), "\"none\"");
    }

    #[test]
    fn fold_lowercases_and_strips_trailing_punctuation() {
        assert_eq!(fold("  No   Issues. "), "no issues");
        assert_eq!(fold("I DON\u{2019}T REMEMBER!"), "i don't remember");
    }

    #[test]
    fn fold_is_idempotent() {
        let once = fold("  Yes, A Few!! ");
        assert_eq!(fold(&once), once);
    }

    #[test]
    fn de_slug_handles_snake_and_camel_case() {
        assert_eq!(de_slug("application_month_year"), "application month year");
        assert_eq!(de_slug("monthYear"), "month year");
        assert_eq!(de_slug("stageReached"), "stage reached");
        assert_eq!(de_slug("agency"), "agency");
    }

    #[test]
    fn first_character_case_helpers() {
        assert_eq!(capitalize_first("what was it?"), "What was it?");
        assert_eq!(lowercase_first("What was it?"), "what was it?");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn words_split_on_punctuation_but_keep_apostrophes() {
        assert_eq!(words("No, they WEREN\u{2019}T (really)."), vec!["no", "they", "weren't", "really"]);
    }

    #[test]
    fn negation_next_to_a_phrase_cancels_it() {
        assert!(!contains_affirmed_phrase(&words("They were not"), "they were"));
        assert!(!contains_affirmed_phrase(&words("I was never disqualified"), "disqualified"));
        assert!(contains_affirmed_phrase(&words("They were there"), "they were"));
    }

    #[test]
    fn phrase_opening_with_a_negation_is_exempt() {
        assert!(contains_affirmed_phrase(&words("No, not really"), "no"));
        assert!(contains_affirmed_phrase(&words("I was not selected"), "not selected"));
    }

    #[test]
    fn partial_words_do_not_match() {
        assert!(!contains_affirmed_phrase(&words("Nobody called"), "no"));
    }
}

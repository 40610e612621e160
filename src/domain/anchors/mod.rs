//! Anchor extraction and merging.
//!
//! Turns one candidate answer into named, confidence-scored facts and
//! combines results from several strategies into one value per key.

mod anchor;
mod extractor;
mod merger;
mod narrative;
mod normalize;
mod sanitizer;
mod short_form;

pub use anchor::{Anchor, AnchorSet, AnchorSource, Confidence};
pub use extractor::{
    AnchorExtractor, ExtractionContext, ExtractionError, ExtractionOutput, ExtractionStrategy,
};
pub use merger::AnchorMerger;
pub use narrative::{detect_outcome, NarrativeKeys, NarrativeStrategy};
pub use normalize::normalize_anchor_value;
pub use sanitizer::{SanitizationError, TextSanitizer, MAX_TEXT_LENGTH};
pub use short_form::{
    match_vocabulary, ShortFormStrategy, Vocabulary, OUTCOME_VOCABULARY, YES_NO_VOCABULARY,
};

//! Anchor Merger - best value per key across extraction sources.

use std::collections::BTreeSet;

use super::anchor::AnchorSet;

/// Confidence-based merge of anchor sets.
pub struct AnchorMerger;

impl AnchorMerger {
    /// Merges two extraction results into one value per key.
    ///
    /// The strictly more confident side wins. An equal non-zero tie goes to
    /// `second`, which callers pass as the more explicit (short-form)
    /// source. Keys at zero confidence on both sides are dropped.
    pub fn merge(first: &AnchorSet, second: &AnchorSet) -> AnchorSet {
        let keys: BTreeSet<&str> = first.keys().chain(second.keys()).collect();
        let mut merged = AnchorSet::new();

        for key in keys {
            let a = first.confidence_of(key);
            let b = second.confidence_of(key);

            let winner = if a > b {
                first.get(key)
            } else if b.is_zero() {
                None
            } else {
                second.get(key)
            };

            if let Some(anchor) = winner {
                merged.insert(anchor.clone());
            }
        }

        merged
    }

    /// Folds any number of results left to right; later results win ties.
    pub fn merge_all<'a, I>(results: I) -> AnchorSet
    where
        I: IntoIterator<Item = &'a AnchorSet>,
    {
        results
            .into_iter()
            .fold(AnchorSet::new(), |acc, next| Self::merge(&acc, next))
    }
}

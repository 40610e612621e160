//! Anchor Extractor - pack- and field-scoped extraction entry point.
//!
//! Runs every strategy that declares the `(pack_id, field_key)` pair,
//! merges their results and normalizes values per key. The public entry
//! point never fails: any strategy error becomes an empty contribution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::anchor::{Anchor, AnchorSet};
use super::merger::AnchorMerger;
use super::narrative::NarrativeStrategy;
use super::normalize::normalize_anchor_value;
use super::sanitizer::{SanitizationError, TextSanitizer};
use super::short_form::ShortFormStrategy;

/// Errors that can occur inside an extraction strategy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Sanitization failed: {0}")]
    Sanitization(#[from] SanitizationError),

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Generative extraction failed: {0}")]
    Generative(String),
}

/// Everything a strategy may look at for one answer.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    pub pack_id: &'a str,
    /// Raw input slot the answer was given in.
    pub field_key: &'a str,
    pub answer_text: &'a str,
    /// Anchors from earlier turns; read-only reference.
    pub collected_anchors: &'a AnchorSet,
}

/// One way of turning an answer into anchors.
pub trait ExtractionStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns true if this strategy understands the slot.
    fn applies_to(&self, pack_id: &str, field_key: &str) -> bool;

    /// Extracts anchors; only called when `applies_to` is true.
    fn extract(&self, context: &ExtractionContext<'_>) -> Result<AnchorSet, ExtractionError>;
}

/// Wire shape of an extraction result.
///
/// Always present; empty maps when nothing matched or extraction failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    pub anchors: BTreeMap<String, String>,
    pub confidence: BTreeMap<String, u8>,
    pub collected_anchors: BTreeMap<String, String>,
    #[serde(skip)]
    anchor_set: AnchorSet,
}

impl ExtractionOutput {
    /// Builds the output for this turn's anchors on top of earlier ones.
    pub fn new(anchors: AnchorSet, previously_collected: &AnchorSet) -> Self {
        let collected = previously_collected.overlay(&anchors);
        Self {
            anchors: anchors.values(),
            confidence: anchors.confidences(),
            collected_anchors: collected.values(),
            anchor_set: anchors,
        }
    }

    /// Output carrying no new anchors.
    pub fn empty(previously_collected: &AnchorSet) -> Self {
        Self::new(AnchorSet::new(), previously_collected)
    }

    /// This turn's anchors with confidence and source.
    pub fn anchor_set(&self) -> &AnchorSet {
        &self.anchor_set
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Runs the registered strategies for an answer slot.
#[derive(Debug)]
pub struct AnchorExtractor {
    sanitizer: TextSanitizer,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for AnchorExtractor {
    fn default() -> Self {
        Self::new()
            .with_strategy(Box::new(NarrativeStrategy::standard()))
            .with_strategy(Box::new(ShortFormStrategy::standard()))
    }
}

impl AnchorExtractor {
    /// Creates an extractor with no strategies.
    pub fn new() -> Self {
        Self {
            sanitizer: TextSanitizer::new(),
            strategies: Vec::new(),
        }
    }

    /// Replaces the sanitizer.
    pub fn with_sanitizer(mut self, sanitizer: TextSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Appends a strategy. Later strategies win confidence ties, so the more
    /// explicit strategies go last.
    pub fn with_strategy(mut self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Returns true if any strategy understands the slot.
    pub fn supports(&self, pack_id: &str, field_key: &str) -> bool {
        self.strategies.iter().any(|s| s.applies_to(pack_id, field_key))
    }

    /// Extracts anchors for one answer; never fails.
    pub fn extract(&self, context: &ExtractionContext<'_>) -> ExtractionOutput {
        let anchors = self.extract_anchors(context);
        ExtractionOutput::new(anchors, context.collected_anchors)
    }

    /// Extracts this turn's anchors only; never fails.
    pub fn extract_anchors(&self, context: &ExtractionContext<'_>) -> AnchorSet {
        if !self.supports(context.pack_id, context.field_key) {
            return AnchorSet::new();
        }

        let sanitized = match self.sanitizer.sanitize(context.answer_text) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    pack_id = context.pack_id,
                    field_key = context.field_key,
                    error = %e,
                    "Answer rejected by sanitizer; extraction skipped"
                );
                return AnchorSet::new();
            }
        };
        let context = ExtractionContext {
            answer_text: &sanitized,
            ..*context
        };

        let results: Vec<AnchorSet> = self
            .strategies
            .iter()
            .filter(|s| s.applies_to(context.pack_id, context.field_key))
            .map(|strategy| match strategy.extract(&context) {
                Ok(anchors) => anchors,
                Err(e) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        pack_id = context.pack_id,
                        field_key = context.field_key,
                        error = %e,
                        "Extraction strategy failed; contributing no anchors"
                    );
                    AnchorSet::new()
                }
            })
            .collect();

        let merged = AnchorMerger::merge_all(&results);
        let normalized = normalize_set(&merged);
        tracing::debug!(
            pack_id = context.pack_id,
            field_key = context.field_key,
            anchors = normalized.len(),
            "Extracted anchors"
        );
        normalized
    }
}

fn normalize_set(anchors: &AnchorSet) -> AnchorSet {
    anchors
        .iter()
        .map(|a| {
            Anchor::new(
                a.key.clone(),
                normalize_anchor_value(&a.key, &a.value),
                a.confidence,
                a.source,
            )
        })
        .filter(|a| !a.value.is_empty())
        .collect()
}

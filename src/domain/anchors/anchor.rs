//! Anchor value objects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// How explicitly a value was stated (0 = not at all, 4 = stated outright).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Confidence {
    #[default]
    None = 0,
    /// Raw fallback with no vocabulary match.
    Weak = 1,
    /// Inferred from story language.
    Inferred = 2,
    /// Pulled out by a structural pattern match.
    Structural = 3,
    /// Direct keyword answer.
    Explicit = 4,
}

impl Confidence {
    /// Returns the numeric value.
    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn is_zero(&self) -> bool {
        *self == Confidence::None
    }
}

impl TryFrom<u8> for Confidence {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Confidence::None),
            1 => Ok(Confidence::Weak),
            2 => Ok(Confidence::Inferred),
            3 => Ok(Confidence::Structural),
            4 => Ok(Confidence::Explicit),
            _ => Err(ValidationError::out_of_range("confidence", 0, 4, i64::from(value))),
        }
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> Self {
        c.value()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Which strategy produced an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSource {
    Narrative,
    ShortForm,
    Generative,
    /// Carried over from an earlier turn of the same instance.
    Collected,
}

/// A single fact derived from candidate language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub key: String,
    pub value: String,
    pub confidence: Confidence,
    pub source: AnchorSource,
}

impl Anchor {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        confidence: Confidence,
        source: AnchorSource,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            confidence,
            source,
        }
    }
}

/// At most one anchor per key, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorSet(BTreeMap<String, Anchor>);

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from plain key/value pairs carried between turns.
    pub fn from_collected(values: &BTreeMap<String, String>) -> Self {
        values
            .iter()
            .map(|(k, v)| Anchor::new(k.clone(), v.clone(), Confidence::Explicit, AnchorSource::Collected))
            .collect()
    }

    /// Inserts an anchor, replacing any existing anchor for the key.
    pub fn insert(&mut self, anchor: Anchor) {
        self.0.insert(anchor.key.clone(), anchor);
    }

    pub fn get(&self, key: &str) -> Option<&Anchor> {
        self.0.get(key)
    }

    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|a| a.value.as_str())
    }

    /// Confidence for a key; absent keys count as zero.
    pub fn confidence_of(&self, key: &str) -> Confidence {
        self.0.get(key).map(|a| a.confidence).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Key -> value view used by the wire contracts.
    pub fn values(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(k, a)| (k.clone(), a.value.clone()))
            .collect()
    }

    /// Key -> numeric confidence view.
    pub fn confidences(&self) -> BTreeMap<String, u8> {
        self.0
            .iter()
            .map(|(k, a)| (k.clone(), a.confidence.value()))
            .collect()
    }

    /// Returns a copy of `self` with every anchor of `newer` laid over it.
    pub fn overlay(&self, newer: &AnchorSet) -> AnchorSet {
        let mut merged = self.clone();
        for anchor in newer.iter() {
            merged.insert(anchor.clone());
        }
        merged
    }
}

impl FromIterator<Anchor> for AnchorSet {
    fn from_iter<I: IntoIterator<Item = Anchor>>(iter: I) -> Self {
        let mut set = AnchorSet::new();
        for anchor in iter {
            set.insert(anchor);
        }
        set
    }
}

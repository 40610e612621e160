//! Per-topic pack configuration.
//!
//! A pack is parsed from a loose [`PackDefinition`] and validated into an
//! immutable [`PackConfig`]. Only validated configs reach the engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Hard ceiling on any pack's probe budget.
pub const MAX_PROBES_CEILING: u32 = 10;

/// Errors raised while loading or registering packs.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("Pack '{pack_id}' is invalid: {source}")]
    Invalid {
        pack_id: String,
        #[source]
        source: ValidationError,
    },

    #[error("Pack '{0}' is already registered")]
    Duplicate(String),

    #[error("Failed to parse pack definitions: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to read pack file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackError {
    fn invalid(pack_id: &str, source: ValidationError) -> Self {
        PackError::Invalid {
            pack_id: pack_id.to_string(),
            source,
        }
    }
}

/// Raw, unvalidated pack data as it appears in a packs file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackDefinition {
    pub pack_id: String,
    #[serde(default)]
    pub topic: String,
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub priority_order: Vec<String>,
    #[serde(default)]
    pub field_key_map: BTreeMap<String, String>,
    pub max_probes: u32,
    #[serde(default)]
    pub issues_field: Option<String>,
    #[serde(default)]
    pub field_templates: BTreeMap<String, String>,
}

/// Immutable configuration for one topic/incident type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackConfig {
    pack_id: String,
    topic: String,
    required_fields: Vec<String>,
    /// Declared priority followed by any required field it omitted.
    priority_order: Vec<String>,
    field_key_map: BTreeMap<String, String>,
    max_probes: u32,
    issues_field: Option<String>,
    field_templates: BTreeMap<String, String>,
}

impl TryFrom<PackDefinition> for PackConfig {
    type Error = PackError;

    fn try_from(def: PackDefinition) -> Result<Self, Self::Error> {
        let pack_id = def.pack_id.trim().to_string();
        if pack_id.is_empty() {
            return Err(PackError::invalid("<unnamed>", ValidationError::empty_field("pack_id")));
        }
        if pack_id.chars().any(char::is_whitespace) {
            return Err(PackError::invalid(
                &pack_id,
                ValidationError::invalid_format("pack_id", "must not contain whitespace"),
            ));
        }

        if def.required_fields.is_empty() {
            return Err(PackError::invalid(&pack_id, ValidationError::empty_field("required_fields")));
        }
        let mut required = BTreeSet::new();
        for field in &def.required_fields {
            if field.trim().is_empty() {
                return Err(PackError::invalid(&pack_id, ValidationError::empty_field("required_fields")));
            }
            if !required.insert(field.as_str()) {
                return Err(PackError::invalid(
                    &pack_id,
                    ValidationError::invalid_format(
                        "required_fields",
                        format!("'{}' is listed twice", field),
                    ),
                ));
            }
        }

        if def.max_probes == 0 || def.max_probes > MAX_PROBES_CEILING {
            return Err(PackError::invalid(
                &pack_id,
                ValidationError::out_of_range(
                    "max_probes",
                    1,
                    i64::from(MAX_PROBES_CEILING),
                    i64::from(def.max_probes),
                ),
            ));
        }

        let mut seen = BTreeSet::new();
        for field in &def.priority_order {
            if !required.contains(field.as_str()) {
                return Err(PackError::invalid(
                    &pack_id,
                    unknown_field("priority_order", field),
                ));
            }
            if !seen.insert(field.as_str()) {
                return Err(PackError::invalid(
                    &pack_id,
                    ValidationError::invalid_format(
                        "priority_order",
                        format!("'{}' is listed twice", field),
                    ),
                ));
            }
        }

        for (raw, semantic) in &def.field_key_map {
            if raw.trim().is_empty() {
                return Err(PackError::invalid(&pack_id, ValidationError::empty_field("field_key_map")));
            }
            if !required.contains(semantic.as_str()) {
                return Err(PackError::invalid(&pack_id, unknown_field("field_key_map", semantic)));
            }
        }

        for field in def.field_templates.keys() {
            if !required.contains(field.as_str()) {
                return Err(PackError::invalid(&pack_id, unknown_field("field_templates", field)));
            }
        }

        if let Some(issues) = &def.issues_field {
            if !required.contains(issues.as_str()) {
                return Err(PackError::invalid(&pack_id, unknown_field("issues_field", issues)));
            }
        }

        let mut priority_order = def.priority_order.clone();
        for field in &def.required_fields {
            if !seen.contains(field.as_str()) {
                priority_order.push(field.clone());
            }
        }

        Ok(Self {
            pack_id,
            topic: def.topic.trim().to_string(),
            required_fields: def.required_fields,
            priority_order,
            field_key_map: def.field_key_map,
            max_probes: def.max_probes,
            issues_field: def.issues_field,
            field_templates: def.field_templates,
        })
    }
}

fn unknown_field(section: &str, field: &str) -> ValidationError {
    ValidationError::invalid_format(section, format!("'{}' is not a required field", field))
}

impl PackConfig {
    pub fn pack_id(&self) -> &str {
        &self.pack_id
    }

    /// Human label for the topic, used for tone selection.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    /// Order in which missing fields are targeted.
    pub fn priority_order(&self) -> &[String] {
        &self.priority_order
    }

    pub fn max_probes(&self) -> u32 {
        self.max_probes
    }

    /// The field that receives the three-way issues rule, if any.
    pub fn issues_field(&self) -> Option<&str> {
        self.issues_field.as_deref()
    }

    /// Returns true if `field` is one of this pack's semantic fields.
    pub fn is_required(&self, field: &str) -> bool {
        self.required_fields.iter().any(|f| f == field)
    }

    /// Translates a raw input identifier into its semantic field name.
    ///
    /// Semantic names resolve to themselves; anything else not present in
    /// the key map is rejected with `None`.
    pub fn resolve_field(&self, raw_key: &str) -> Option<&str> {
        if let Some(semantic) = self.field_key_map.get(raw_key) {
            return Some(semantic.as_str());
        }
        self.required_fields
            .iter()
            .find(|f| f.as_str() == raw_key)
            .map(String::as_str)
    }

    /// Pack-specific probe text for a field.
    pub fn template_for(&self, field: &str) -> Option<&str> {
        self.field_templates.get(field).map(String::as_str)
    }
}

//! Probe request and decision wire types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::stage::ProbeStage;

/// What the caller should do next for this instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeMode {
    Question,
    Done,
    UnsupportedPack,
}

/// Inputs of one probing decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRequest {
    pub pack_id: String,
    /// Raw answer slots for the instance; unknown keys are ignored.
    #[serde(default)]
    pub incident_answers: BTreeMap<String, Option<String>>,
    #[serde(default, alias = "previousProbesCount")]
    pub previous_probe_count: u32,
    #[serde(default)]
    pub already_probed_fields: BTreeSet<String>,
    /// Replaces the pack budget for this call.
    #[serde(default, alias = "maxAiFollowups")]
    pub override_max_probes: Option<u32>,
}

impl ProbeRequest {
    pub fn new(pack_id: impl Into<String>) -> Self {
        Self {
            pack_id: pack_id.into(),
            ..Self::default()
        }
    }

    pub fn with_answer(mut self, key: impl Into<String>, value: Option<&str>) -> Self {
        self.incident_answers.insert(key.into(), value.map(str::to_string));
        self
    }

    pub fn with_previous_probe_count(mut self, count: u32) -> Self {
        self.previous_probe_count = count;
        self
    }

    pub fn with_already_probed(mut self, field: impl Into<String>) -> Self {
        self.already_probed_fields.insert(field.into());
        self
    }

    pub fn with_max_probes(mut self, max_probes: u32) -> Self {
        self.override_max_probes = Some(max_probes);
        self
    }
}

/// Result of one probing decision.
///
/// Counters are echoed unmodified; the caller increments them for the next
/// turn after delivering a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeDecision {
    pub mode: ProbeMode,
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub pack_id: String,
    pub previous_probe_count: u32,
    pub max_probes: u32,
    pub all_gaps: Vec<String>,
    pub next_target_gap: Option<String>,
    pub already_probed: Vec<String>,
    pub final_question: bool,
    pub normalized_incident: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchors: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_anchors: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<ProbeStage>,
}

impl ProbeDecision {
    /// Decision for a pack with no configuration. Nothing is computed.
    pub fn unsupported(request: &ProbeRequest) -> Self {
        Self {
            mode: ProbeMode::UnsupportedPack,
            question: None,
            message: Some(format!(
                "Pack '{}' is not supported for adaptive probing",
                request.pack_id
            )),
            pack_id: request.pack_id.clone(),
            previous_probe_count: request.previous_probe_count,
            max_probes: 0,
            all_gaps: Vec::new(),
            next_target_gap: None,
            already_probed: request.already_probed_fields.iter().cloned().collect(),
            final_question: false,
            normalized_incident: BTreeMap::new(),
            anchors: None,
            collected_anchors: None,
            stage: None,
        }
    }

    pub fn is_question(&self) -> bool {
        self.mode == ProbeMode::Question
    }

    /// Attaches this turn's anchors and the instance's collected anchors.
    pub fn with_anchors(
        mut self,
        anchors: BTreeMap<String, String>,
        collected_anchors: BTreeMap<String, String>,
    ) -> Self {
        self.anchors = Some(anchors);
        self.collected_anchors = Some(collected_anchors);
        self
    }
}

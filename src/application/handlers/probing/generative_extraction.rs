//! Generative anchor extraction.
//!
//! Asks the text-generation port for a JSON object of field values. The
//! result is merged under the deterministic anchors, so a generated value
//! only survives where no strategy produced something at least as
//! confident. Any failure yields the deterministic anchors unchanged.

use std::sync::Arc;

use crate::domain::anchors::{
    normalize_anchor_value, Anchor, AnchorMerger, AnchorSet, AnchorSource, Confidence, ExtractionContext,
    ExtractionError, TextSanitizer,
};
use crate::domain::foundation::BestEffort;
use crate::domain::packs::PackConfig;
use crate::ports::{AIProvider, CompletionPurpose, CompletionRequest, MessageRole, RequestMetadata};

/// Completion ceiling for an extraction reply.
const EXTRACTION_MAX_TOKENS: u32 = 400;

/// Extracts anchors with the text-generation port.
pub struct GenerativeAnchorExtractor {
    ai_provider: Arc<dyn AIProvider>,
    sanitizer: TextSanitizer,
}

impl GenerativeAnchorExtractor {
    pub fn new(ai_provider: Arc<dyn AIProvider>) -> Self {
        Self {
            ai_provider,
            sanitizer: TextSanitizer::new(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: TextSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Generated anchors merged under `deterministic`, or `deterministic`
    /// alone if generation fails.
    pub async fn extract(
        &self,
        pack: &PackConfig,
        context: &ExtractionContext<'_>,
        deterministic: AnchorSet,
    ) -> BestEffort<AnchorSet> {
        match self.generate(pack, context).await {
            Ok(generated) => {
                tracing::debug!(
                    pack_id = pack.pack_id(),
                    field_key = context.field_key,
                    generated = generated.len(),
                    "Generative extraction succeeded"
                );
                BestEffort::Generated(AnchorMerger::merge(&generated, &deterministic))
            }
            Err(e) => {
                tracing::warn!(
                    pack_id = pack.pack_id(),
                    field_key = context.field_key,
                    error = %e,
                    "Generative extraction failed; using deterministic anchors"
                );
                BestEffort::fallback(deterministic, e.to_string())
            }
        }
    }

    async fn generate(
        &self,
        pack: &PackConfig,
        context: &ExtractionContext<'_>,
    ) -> Result<AnchorSet, ExtractionError> {
        let answer = self.sanitizer.sanitize(context.answer_text)?;
        if answer.trim().is_empty() {
            return Ok(AnchorSet::new());
        }

        let request =
            CompletionRequest::new(RequestMetadata::new(pack.pack_id(), CompletionPurpose::AnchorExtraction))
                .with_system_prompt(extraction_prompt(pack))
                .with_message(MessageRole::User, answer)
                .with_max_tokens(EXTRACTION_MAX_TOKENS)
                .with_temperature(0.0);

        let response = self
            .ai_provider
            .complete(request)
            .await
            .map_err(|e| ExtractionError::Generative(e.to_string()))?;

        if !response.is_complete() {
            return Err(ExtractionError::Generative("reply was truncated".to_string()));
        }

        let response = self.sanitizer.sanitize(&response.content)?;
        parse_anchors(pack, &response)
    }
}

fn extraction_prompt(pack: &PackConfig) -> String {
    format!(
        r#"You extract facts from a candidate's answer in a background investigation about {}.

Reply with a single JSON object whose keys are drawn from this list:
{}

Use a string value only for facts the answer states. Use null for anything
not stated. Do not guess, and do not add other keys."#,
        pack.topic(),
        pack.required_fields()
            .iter()
            .map(|f| format!("- {}", f))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

/// Reads required-field values out of a model reply.
fn parse_anchors(pack: &PackConfig, response: &str) -> Result<AnchorSet, ExtractionError> {
    let json = extract_json_object(response)
        .ok_or_else(|| ExtractionError::ParseError("no JSON object in response".to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ExtractionError::ParseError(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ExtractionError::ParseError("response is not a JSON object".to_string()))?;

    Ok(object
        .iter()
        .filter(|(key, _)| pack.is_required(key))
        .filter_map(|(key, value)| {
            let normalized = normalize_anchor_value(key, value.as_str()?);
            if normalized.is_empty() {
                return None;
            }
            Some(Anchor::new(
                key.clone(),
                normalized,
                Confidence::Inferred,
                AnchorSource::Generative,
            ))
        })
        .collect())
}

/// Finds the JSON object in a reply, inside a fenced block or bare.
fn extract_json_object(response: &str) -> Option<&str> {
    let trimmed = response.trim();
    let body = fenced_block(trimmed).unwrap_or(trimmed);
    let start = body.find('{')?;
    balanced_object(body, start)
}

fn fenced_block(s: &str) -> Option<&str> {
    for pattern in ["```json\n", "```json\r\n", "```\n", "```\r\n"] {
        if let Some(start) = s.find(pattern) {
            let body_start = start + pattern.len();
            if let Some(end) = s[body_start..].find("```") {
                return Some(s[body_start..body_start + end].trim());
            }
        }
    }
    None
}

fn balanced_object(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

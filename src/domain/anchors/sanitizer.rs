//! Text sanitization for candidate answers and generated text.
//!
//! Answers are sanitized before extraction and before they are embedded in
//! generative prompts; generated text is sanitized before it can become a
//! question.

use thiserror::Error;

/// Maximum accepted text length in bytes.
pub const MAX_TEXT_LENGTH: usize = 20_000;

/// Errors that can occur during sanitization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanitizationError {
    #[error("Text too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },

    #[error("Invalid UTF-8 encoding at character position {position}")]
    InvalidUtf8 { position: usize },
}

/// Strips control characters and prompt-injection markers.
#[derive(Debug, Clone)]
pub struct TextSanitizer {
    max_length: usize,
    additional_patterns: Vec<String>,
}

impl Default for TextSanitizer {
    fn default() -> Self {
        Self {
            max_length: MAX_TEXT_LENGTH,
            additional_patterns: Vec::new(),
        }
    }
}

impl TextSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the maximum accepted length.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Adds additional patterns to strip.
    pub fn with_additional_patterns(mut self, patterns: Vec<String>) -> Self {
        self.additional_patterns = patterns;
        self
    }

    /// Sanitizes text.
    ///
    /// # Steps
    /// 1. Validate length
    /// 2. Remove control characters (except newlines/tabs)
    /// 3. Strip prompt injection markers
    /// 4. Reject replacement characters left by lossy decoding
    pub fn sanitize(&self, text: &str) -> Result<String, SanitizationError> {
        if text.len() > self.max_length {
            return Err(SanitizationError::TooLong {
                max: self.max_length,
                actual: text.len(),
            });
        }

        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
            .collect();

        let stripped = self.strip_injection_markers(&cleaned);

        if let Some(position) = stripped.chars().position(|c| c == '\u{FFFD}') {
            return Err(SanitizationError::InvalidUtf8 { position });
        }

        Ok(stripped)
    }

    fn strip_injection_markers(&self, s: &str) -> String {
        let patterns = [
            "```system",
            "```assistant",
            "[INST]",
            "[/INST]",
            "<|system|>",
            "<|assistant|>",
            "<|user|>",
            "<|im_start|>",
            "<|im_end|>",
            "<<SYS>>",
            "<</SYS>>",
        ];

        let mut result = s.to_string();
        for pattern in patterns {
            result = result.replace(pattern, "");
        }
        for pattern in &self.additional_patterns {
            result = result.replace(pattern.as_str(), "");
        }
        result
    }
}

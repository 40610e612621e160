//! Offline provider used when no text-generation service is configured.
//!
//! Every call fails with `Unavailable`, so rewrite and generative extraction
//! always take their deterministic fallback.

use async_trait::async_trait;

use crate::ports::{AIError, AIProvider, CompletionRequest, CompletionResponse, ProviderInfo};

#[derive(Debug, Clone, Default)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AIProvider for OfflineProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        tracing::debug!(
            pack_id = %request.metadata.pack_id,
            purpose = request.metadata.purpose.as_str(),
            "Text generation not configured"
        );
        Err(AIError::unavailable("no text-generation provider configured"))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("offline", "none")
    }
}

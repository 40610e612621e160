//! Scripted provider for tests.
//!
//! Replies are dequeued in order; an empty queue answers with
//! [`DEFAULT_MOCK_RESPONSE`]. Every request is recorded so tests can check
//! what the rewrite and extraction paths sent.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo, TokenUsage,
};

/// Reply used once the script runs out.
pub const DEFAULT_MOCK_RESPONSE: &str = "Mock response";

/// Failure a scripted reply can produce.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Refused,
    Unavailable { message: String },
    AuthenticationFailed,
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Refused => AIError::content_filtered("model declined the request"),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply { content: String, finish_reason: FinishReason },
    Fail(MockError),
}

/// Scripted `AIProvider`. Clones share the script and the call log.
#[derive(Debug, Clone, Default)]
pub struct MockAIProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a complete reply.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(Scripted::Reply {
            content: content.into(),
            finish_reason: FinishReason::Stop,
        })
    }

    /// Queues a reply cut off at the token ceiling.
    pub fn with_truncated_response(self, content: impl Into<String>) -> Self {
        self.push(Scripted::Reply {
            content: content.into(),
            finish_reason: FinishReason::Length,
        })
    }

    /// Queues a failure.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(Scripted::Fail(error))
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn last_call(&self) -> Option<CompletionRequest> {
        lock(&self.calls).last().cloned()
    }

    fn push(self, entry: Scripted) -> Self {
        lock(&self.script).push_back(entry);
        self
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        lock(&self.calls).push(request);

        let next = lock(&self.script).pop_front();
        match next {
            Some(Scripted::Fail(err)) => Err(err.into()),
            Some(Scripted::Reply { content, finish_reason }) => Ok(completion(content, finish_reason)),
            None => Ok(completion(DEFAULT_MOCK_RESPONSE.to_string(), FinishReason::Stop)),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", "mock-model")
    }
}

fn completion(content: String, finish_reason: FinishReason) -> CompletionResponse {
    CompletionResponse {
        content,
        usage: TokenUsage::new(10, 20),
        model: "mock-model".to_string(),
        finish_reason,
    }
}

//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `AnthropicProvider` - Anthropic Messages API, single attempt per call
//! - `MockAIProvider` - Configurable mock for testing
//! - `OfflineProvider` - Always unavailable; used when no API key is configured

mod anthropic_provider;
mod mock_provider;
mod offline_provider;

pub use anthropic_provider::{
    AnthropicConfig, AnthropicProvider, DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_MODEL,
};
pub use mock_provider::{MockAIProvider, MockError, DEFAULT_MOCK_RESPONSE};
pub use offline_provider::OfflineProvider;

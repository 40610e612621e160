//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - Text-generation providers (Anthropic, mock, offline)

pub mod ai;

pub use ai::{AnthropicConfig, AnthropicProvider, MockAIProvider, MockError, OfflineProvider};

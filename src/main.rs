//! probe-engine: runs one probing turn.
//!
//! Reads an `EvaluateAnswerCommand` JSON document from stdin and prints the
//! `EvaluateAnswerResult` as JSON on stdout. Logs go to stderr.

use std::io::{self, Read};
use std::process::ExitCode;
use std::sync::Arc;

use probe_engine::adapters::ai::{AnthropicConfig, AnthropicProvider, OfflineProvider};
use probe_engine::application::{
    EvaluateAnswerCommand, EvaluateAnswerHandler, GenerativeAnchorExtractor, GuardQuestionHandler,
};
use probe_engine::config::AppConfig;
use probe_engine::domain::anchors::AnchorExtractor;
use probe_engine::domain::probing::ProbeEngine;
use probe_engine::ports::AIProvider;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("probe-engine: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    config.logging.init()?;

    let handler = build_handler(&config)?;

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let cmd: EvaluateAnswerCommand = serde_json::from_str(&input)?;

    let result = handler.handle(cmd).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn build_handler(config: &AppConfig) -> Result<EvaluateAnswerHandler, Box<dyn std::error::Error>> {
    let registry = Arc::new(config.probing.registry()?);
    let provider = build_provider(config)?;
    tracing::info!(
        provider = %provider.provider_info().name,
        packs = registry.len(),
        "Probe engine ready"
    );

    let guard = GuardQuestionHandler::new(provider.clone(), config.guardrail.guardrail())
        .with_rewrite_enabled(config.guardrail.rewrite_enabled);
    let handler = EvaluateAnswerHandler::new(
        ProbeEngine::new(registry),
        Arc::new(AnchorExtractor::default()),
        guard,
    );

    if config.probing.generative_extraction {
        Ok(handler.with_generative_extraction(GenerativeAnchorExtractor::new(provider)))
    } else {
        Ok(handler)
    }
}

fn build_provider(config: &AppConfig) -> Result<Arc<dyn AIProvider>, Box<dyn std::error::Error>> {
    match &config.ai.anthropic_api_key {
        Some(key) if config.ai.has_anthropic() => {
            let anthropic = AnthropicConfig::new(key.clone())
                .with_model(config.ai.model.clone())
                .with_base_url(config.ai.base_url.clone())
                .with_timeout(config.ai.timeout());
            Ok(Arc::new(AnthropicProvider::new(anthropic)?))
        }
        _ => Ok(Arc::new(OfflineProvider::new())),
    }
}

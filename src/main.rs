//! Cost-aware task delegation fabric — CLI entry point.
//!
//! A thin wrapper over `QualityAwareOrchestrator`: load config, build the
//! provider chain from whatever credentials are present in the environment,
//! route and execute one task, print the result. Matches the teacher's
//! `dotenv` + `tracing_subscriber` startup sequence in `main.rs`, scaled down
//! from an interactive loop to a single-shot CLI per §2a/§6.

use anyhow::Result;
use clap::Parser;
use delegation_fabric::llm::{LLMClient, OpenAICompatibleProvider, ProviderDescriptor};
use delegation_fabric::types::Requirements;
use delegation_fabric::{Config, QualityAwareOrchestrator};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "delegation_fabric", about = "Cost-aware task delegation fabric for multi-agent workflows")]
struct Cli {
    /// Task text to route and execute.
    task: String,

    /// Require file:line references in the result.
    #[arg(long)]
    needs_file_line_refs: bool,

    /// Reject placeholder/TODO-bearing output.
    #[arg(long)]
    no_placeholders: bool,

    /// Allow escalation to a premium provider instead of rejecting.
    #[arg(long)]
    allow_premium: bool,

    /// Skip quality routing and delegate directly.
    #[arg(long)]
    force_delegate: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let config = Config::load()?;

    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let cli = Cli::parse();

    let llm = Arc::new(LLMClient::new(build_provider_chain(&config)));
    let premium_llm = Arc::new(LLMClient::new(build_premium_provider_chain(&config)));
    let orchestrator = QualityAwareOrchestrator::new(llm, premium_llm, config);

    let requirements = Requirements {
        needs_file_line_refs: cli.needs_file_line_refs,
        no_placeholders: cli.no_placeholders,
        allow_premium: cli.allow_premium,
    };

    match orchestrator.orchestrate(&cli.task, requirements, cli.force_delegate).await {
        Ok(envelope) => {
            println!("{}", envelope.result);
            eprintln!(
                "\n[{}] quality={} cost_estimate=${:.2}",
                envelope.orchestrator_name, envelope.quality_score, envelope.cost_estimate
            );
            Ok(ExitCode::from(0))
        }
        Err(delegation_fabric::OrchestratorError::Llm(delegation_fabric::LlmError::ProvidersExhausted { diagnostics })) => {
            eprintln!("no provider available: {diagnostics:?}");
            Ok(ExitCode::from(1))
        }
        Err(err) => {
            eprintln!("task rejected or failed: {err}");
            Ok(ExitCode::from(2))
        }
    }
}

/// One `OpenAICompatibleProvider` per credential set found in the
/// environment, ordered cheapest-first per §4.1. `OPENAI_API_KEY` /
/// `OPENAI_BASE_URL` is the baseline; `OPENROUTER_API_KEY` is an optional
/// cheaper-tier fallback partner, mirroring the teacher's multi-provider
/// credential-probing idiom.
fn build_provider_chain(config: &Config) -> Vec<(ProviderDescriptor, Arc<dyn delegation_fabric::LLMProvider>)> {
    let mut chain: Vec<(ProviderDescriptor, Arc<dyn delegation_fabric::LLMProvider>)> = Vec::new();

    if let Some(key) = Config::first_credential(&["OPENAI_API_KEY"]) {
        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let descriptor = ProviderDescriptor {
            name: "openai_compatible".to_string(),
            default_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            input_price_per_token: 0.00000015,
            output_price_per_token: 0.0000006,
            max_output_tokens: 4096,
            auth_env_names: vec!["OPENAI_API_KEY".to_string()],
        };
        chain.push((descriptor, Arc::new(OpenAICompatibleProvider::new("openai_compatible", &base_url, Some(key)))));
    }

    if config.enable_fallback {
        if let Some(key) = Config::first_credential(&["OPENROUTER_API_KEY"]) {
            let base_url = std::env::var("OPENROUTER_BASE_URL").unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());
            let descriptor = ProviderDescriptor {
                name: "openrouter".to_string(),
                default_model: std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| "openai/gpt-4o".to_string()),
                input_price_per_token: 0.0000025,
                output_price_per_token: 0.00001,
                max_output_tokens: 4096,
                auth_env_names: vec!["OPENROUTER_API_KEY".to_string()],
            };
            chain.push((descriptor, Arc::new(OpenAICompatibleProvider::new("openrouter", &base_url, Some(key)))));
        }
    }

    chain
}

/// The Escalate path's provider chain — deliberately separate credentials
/// from `build_provider_chain` so escalation reaches an actually distinct,
/// higher-tier model rather than the standard chain at a lower temperature.
/// Empty (and therefore `ProvidersExhausted` on first use) when no premium
/// credentials are configured.
fn build_premium_provider_chain(_config: &Config) -> Vec<(ProviderDescriptor, Arc<dyn delegation_fabric::LLMProvider>)> {
    let mut chain: Vec<(ProviderDescriptor, Arc<dyn delegation_fabric::LLMProvider>)> = Vec::new();

    if let Some(key) = Config::first_credential(&["PREMIUM_API_KEY", "OPENAI_PREMIUM_API_KEY"]) {
        let base_url = std::env::var("PREMIUM_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let descriptor = ProviderDescriptor {
            name: "premium".to_string(),
            default_model: std::env::var("PREMIUM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            input_price_per_token: 0.0000025,
            output_price_per_token: 0.00001,
            max_output_tokens: 8192,
            auth_env_names: vec!["PREMIUM_API_KEY".to_string(), "OPENAI_PREMIUM_API_KEY".to_string()],
        };
        chain.push((descriptor, Arc::new(OpenAICompatibleProvider::new("premium", &base_url, Some(key)))));
    }

    chain
}

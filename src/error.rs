//! Error taxonomy for the delegation fabric.
//!
//! Each subsystem owns a closed `thiserror::Error` enum; `main.rs` collapses
//! everything into `anyhow::Result` at the process boundary, the way the
//! teacher's `main.rs` does for its top-level run loop.

use thiserror::Error;

/// Errors raised by the LLM client, retry loop, and fallback chain.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited by provider {provider}")]
    RateLimited { provider: String },

    #[error("authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("transient network error calling {provider}: {message}")]
    TransientNetwork { provider: String, message: String },

    #[error("failed to parse response from {provider}: {message}")]
    ResponseParseError { provider: String, message: String },

    #[error("all providers exhausted: {diagnostics:?}")]
    ProvidersExhausted { diagnostics: Vec<(String, String)> },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Fatal configuration problems, surfaced at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no credentials found for provider '{0}'")]
    MissingCredentials(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("invalid threshold '{name}': {value} (must be in 0..=100)")]
    InvalidThreshold { name: String, value: i64 },
}

/// Errors raised by the quality-aware router.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("task rejected: predicted_quality={predicted_quality}, reasoning={reasoning}")]
    TaskRejection {
        predicted_quality: u8,
        reasoning: String,
        alternatives: Vec<String>,
    },
}

/// Errors raised during plan construction, worker assignment, and assembly.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to parse orchestration plan as JSON: {0}")]
    PlanParseError(String),

    #[error("plan subtask graph contains a cycle or references an unknown id: {0}")]
    PlanCycleError(String),

    #[error("no capable worker available for subtask '{0}'")]
    NoCapableWorker(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// Errors raised by the A2A message bus.
#[derive(Debug, Error)]
pub enum A2AError {
    #[error("agent '{0}' is already registered")]
    DuplicateAgent(String),

    #[error("no response for correlation_id '{0}' within {1}s")]
    Timeout(String, u64),

    #[error("recipient '{0}' is not a registered agent")]
    UnknownRecipient(String),
}

/// Errors raised by the session continuity core.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("recovery manifest not found at {0}; run recovery before bootstrapping")]
    BootstrapMissingManifest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize session state: {0}")]
    Serde(#[from] serde_json::Error),
}

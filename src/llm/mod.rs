//! LLM client, cost tracking, retry/fallback: §4.1.

pub mod client;
pub mod cost;
pub mod provider;

pub use client::LLMClient;
pub use cost::{CostGroupSummary, CostSummary, CostTracker, ProviderDescriptor};
pub use provider::{GenerationResult, LLMProvider, OpenAICompatibleProvider, Usage};

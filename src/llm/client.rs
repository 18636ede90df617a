//! Multi-provider LLM client: retry with backoff, fallback across a fixed
//! provider chain, and cost/latency recording per call.
//!
//! State machine per provider attempt (§4.1):
//! `Idle → Sending → {Success | TransientError → Backoff → Sending | FatalError → FallbackOrFail}`.

use crate::error::LlmError;
use crate::llm::cost::{CostSummary, CostTracker, ProviderDescriptor};
use crate::llm::provider::LLMProvider;
use crate::types::TaskCost;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const MAX_ATTEMPTS_PER_PROVIDER: u32 = 3;
const BACKOFF_CAP: Duration = Duration::from_secs(10);

struct ChainEntry {
    descriptor: ProviderDescriptor,
    provider: Arc<dyn LLMProvider>,
}

/// Entry point `call_llm`; hides provider differences behind a fixed
/// cheapest-first fallback chain, matching the teacher's `Router`/`Planner`
/// builder-constructed-`Arc<dyn LLMProvider>` ownership pattern.
pub struct LLMClient {
    chain: Vec<ChainEntry>,
    failed_this_session: Mutex<HashSet<String>>,
    cost_tracker: Mutex<CostTracker>,
}

impl LLMClient {
    /// `chain` is ordered cheapest → most reliable, per §4.1.
    pub fn new(chain: Vec<(ProviderDescriptor, Arc<dyn LLMProvider>)>) -> Self {
        Self {
            chain: chain.into_iter().map(|(descriptor, provider)| ChainEntry { descriptor, provider }).collect(),
            failed_this_session: Mutex::new(HashSet::new()),
            cost_tracker: Mutex::new(CostTracker::new()),
        }
    }

    /// Generate text for `prompt`, tagging the resulting `TaskCost` with
    /// `operation`. `deterministic` requests temperature ~0.1 per §2b's
    /// pattern-replication call contract.
    pub async fn call_llm(
        &self,
        prompt: &str,
        operation: &str,
        max_tokens: Option<u32>,
        deterministic: bool,
    ) -> Result<String, LlmError> {
        let temperature = if deterministic { 0.1 } else { 0.7 };
        let mut diagnostics = Vec::new();
        let mut attempted_any = false;

        for entry in &self.chain {
            {
                let failed = self.failed_this_session.lock().await;
                if failed.contains(&entry.descriptor.name) {
                    continue;
                }
            }
            attempted_any = true;
            let max_tokens = max_tokens.unwrap_or(entry.descriptor.max_output_tokens);

            match self.try_provider(entry, prompt, temperature, max_tokens, operation).await {
                Ok(text) => return Ok(text),
                Err(last_error) => {
                    let mut failed = self.failed_this_session.lock().await;
                    failed.insert(entry.descriptor.name.clone());
                    diagnostics.push((entry.descriptor.name.clone(), last_error.to_string()));
                }
            }
        }

        if !attempted_any && diagnostics.is_empty() {
            diagnostics.push(("<none>".to_string(), "no providers configured or all already failed".to_string()));
        }
        Err(LlmError::ProvidersExhausted { diagnostics })
    }

    /// Drive the retry loop for one provider: up to `MAX_ATTEMPTS_PER_PROVIDER`
    /// attempts with capped exponential backoff on retryable errors.
    async fn try_provider(
        &self,
        entry: &ChainEntry,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
        operation: &str,
    ) -> Result<String, LlmError> {
        let mut last_error = None;
        for attempt in 0..MAX_ATTEMPTS_PER_PROVIDER {
            let started = Instant::now();
            let outcome = entry.provider.generate(&entry.descriptor.default_model, prompt, None, temperature, max_tokens).await;
            match outcome {
                Ok(result) => {
                    let latency_ms = started.elapsed().as_millis();
                    let input_cost = result.usage.input_tokens as f64 * entry.descriptor.input_price_per_token;
                    let output_cost = result.usage.output_tokens as f64 * entry.descriptor.output_price_per_token;
                    let cost = TaskCost {
                        provider: entry.descriptor.name.clone(),
                        model: entry.descriptor.default_model.clone(),
                        operation: operation.to_string(),
                        input_tokens: result.usage.input_tokens,
                        output_tokens: result.usage.output_tokens,
                        input_cost,
                        output_cost,
                        total_cost: input_cost + output_cost,
                        latency_ms,
                        timestamp: chrono::Utc::now(),
                    };
                    self.cost_tracker.lock().await.record(cost);
                    return Ok(result.text);
                }
                Err(err) if is_retryable(&err) => {
                    last_error = Some(err);
                    if attempt + 1 < MAX_ATTEMPTS_PER_PROVIDER {
                        tokio::time::sleep(backoff(attempt)).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_error.expect("loop runs at least once"))
    }

    pub async fn current_cost(&self) -> f64 {
        self.cost_tracker.lock().await.current_cost()
    }

    pub async fn tokens(&self) -> (u64, u64) {
        self.cost_tracker.lock().await.tokens()
    }

    pub async fn cost_summary(&self) -> CostSummary {
        self.cost_tracker.lock().await.cost_summary()
    }

    pub async fn reset_stats(&self) {
        self.cost_tracker.lock().await.reset();
        self.failed_this_session.lock().await.clear();
    }

    /// Alias kept for parity with §6's `get_stats` surface name.
    pub async fn get_stats(&self) -> CostSummary {
        self.cost_summary().await
    }
}

fn is_retryable(err: &LlmError) -> bool {
    matches!(err, LlmError::TransientNetwork { .. } | LlmError::RateLimited { .. })
}

fn backoff(attempt: u32) -> Duration {
    let base = Duration::from_millis(100 * 2u64.saturating_pow(attempt));
    let capped = base.min(BACKOFF_CAP);
    let jitter_ms = rand::thread_rng().gen_range(0..50);
    capped + Duration::from_millis(jitter_ms)
}

//! Cost tracking: append-only `TaskCost` ledger plus the summary view
//! supplemented per §2b from the original source's `metrics.py`.

use crate::types::TaskCost;
use std::collections::HashMap;

/// Static pricing/capability facts about a configured provider, matching
/// §4.1's provider-descriptor shape.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub name: String,
    pub default_model: String,
    pub input_price_per_token: f64,
    pub output_price_per_token: f64,
    pub max_output_tokens: u32,
    pub auth_env_names: Vec<String>,
}

/// Per-group cost/latency aggregation.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CostGroupSummary {
    pub total_cost: f64,
    pub call_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub avg_latency_ms: f64,
    pub cost_per_1k_tokens: f64,
    pub input_output_ratio: f64,
}

/// Full cost summary: grouped by provider and by operation label.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CostSummary {
    pub by_provider: HashMap<String, CostGroupSummary>,
    pub by_operation: HashMap<String, CostGroupSummary>,
    pub grand_total: f64,
}

/// Append-only ledger of `TaskCost` records plus derived views. Mirrors the
/// teacher's pattern of owning mutable aggregation state behind a struct
/// rather than scattering counters across the call sites.
#[derive(Debug, Default)]
pub struct CostTracker {
    records: Vec<TaskCost>,
}

impl CostTracker {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    pub fn record(&mut self, cost: TaskCost) {
        self.records.push(cost);
    }

    pub fn current_cost(&self) -> f64 {
        self.records.iter().map(|r| r.total_cost).sum()
    }

    pub fn tokens(&self) -> (u64, u64) {
        let input = self.records.iter().map(|r| r.input_tokens).sum();
        let output = self.records.iter().map(|r| r.output_tokens).sum();
        (input, output)
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[TaskCost] {
        &self.records
    }

    pub fn cost_summary(&self) -> CostSummary {
        let mut by_provider: HashMap<String, Vec<&TaskCost>> = HashMap::new();
        let mut by_operation: HashMap<String, Vec<&TaskCost>> = HashMap::new();
        for record in &self.records {
            by_provider.entry(record.provider.clone()).or_default().push(record);
            by_operation.entry(record.operation.clone()).or_default().push(record);
        }

        let summarize = |records: &[&TaskCost]| -> CostGroupSummary {
            let call_count = records.len() as u64;
            let total_cost: f64 = records.iter().map(|r| r.total_cost).sum();
            let total_input_tokens: u64 = records.iter().map(|r| r.input_tokens).sum();
            let total_output_tokens: u64 = records.iter().map(|r| r.output_tokens).sum();
            let avg_latency_ms = if call_count > 0 {
                records.iter().map(|r| r.latency_ms as f64).sum::<f64>() / call_count as f64
            } else {
                0.0
            };
            let total_tokens = total_input_tokens + total_output_tokens;
            let cost_per_1k_tokens = if total_tokens > 0 {
                total_cost / (total_tokens as f64 / 1000.0)
            } else {
                0.0
            };
            let input_output_ratio = if total_output_tokens > 0 {
                total_input_tokens as f64 / total_output_tokens as f64
            } else {
                0.0
            };
            CostGroupSummary {
                total_cost,
                call_count,
                total_input_tokens,
                total_output_tokens,
                avg_latency_ms,
                cost_per_1k_tokens,
                input_output_ratio,
            }
        };

        CostSummary {
            by_provider: by_provider.into_iter().map(|(k, v)| (k, summarize(&v))).collect(),
            by_operation: by_operation.into_iter().map(|(k, v)| (k, summarize(&v))).collect(),
            grand_total: self.current_cost(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cost(provider: &str, operation: &str, in_tok: u64, out_tok: u64, total: f64) -> TaskCost {
        TaskCost {
            provider: provider.to_string(),
            model: "m".to_string(),
            operation: operation.to_string(),
            input_tokens: in_tok,
            output_tokens: out_tok,
            input_cost: total / 2.0,
            output_cost: total / 2.0,
            total_cost: total,
            latency_ms: 100,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn aggregates_by_provider_and_operation() {
        let mut tracker = CostTracker::new();
        tracker.record(cost("openai", "delegate", 100, 50, 0.01));
        tracker.record(cost("openai", "hybrid", 200, 100, 0.02));
        tracker.record(cost("anthropic", "delegate", 100, 50, 0.03));

        let summary = tracker.cost_summary();
        assert_eq!(summary.by_provider["openai"].call_count, 2);
        assert_eq!(summary.by_provider["anthropic"].call_count, 1);
        assert!((summary.grand_total - 0.06).abs() < 1e-9);
        assert_eq!(summary.by_operation["delegate"].call_count, 2);
    }

    #[test]
    fn reset_clears_ledger() {
        let mut tracker = CostTracker::new();
        tracker.record(cost("openai", "delegate", 100, 50, 0.01));
        tracker.reset();
        assert_eq!(tracker.current_cost(), 0.0);
        assert_eq!(tracker.tokens(), (0, 0));
    }
}

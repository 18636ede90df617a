//! Premium-model orchestrator: a distinct client/provider chain for the
//! router's Escalate path — §4.5 ("Escalate → construct a premium-model
//! orchestrator and single-shot"). Deliberately its own `Arc<LLMClient>`
//! rather than the standard chain's, so escalation actually reaches a
//! different provider/model instead of merely changing temperature on the
//! same cheap chain. If no premium credentials are configured the
//! constructing `LLMClient` has an empty chain and `single_shot` fails
//! visibly with `LlmError::ProvidersExhausted` rather than faking success.

use crate::error::OrchestratorError;
use crate::llm::LLMClient;
use std::sync::Arc;

pub struct PremiumOrchestrator {
    llm: Arc<LLMClient>,
}

impl PremiumOrchestrator {
    pub fn new(llm: Arc<LLMClient>) -> Self {
        Self { llm }
    }

    /// One deterministic-temperature call against the premium chain.
    /// Returns the generated text plus the actual cost this call added to
    /// the premium client's ledger (not a flat estimate).
    pub async fn single_shot(&self, task: &str, context: Option<&str>) -> Result<(String, f64), OrchestratorError> {
        let before = self.llm.current_cost().await;
        let prompt = format!("{}\n\nTask: {task}", context.unwrap_or_default());
        let result = self.llm.call_llm(&prompt, "premium_escalate", None, true).await?;
        let after = self.llm.current_cost().await;
        Ok((result, after - before))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_shot_fails_visibly_with_no_premium_providers_configured() {
        let premium = PremiumOrchestrator::new(Arc::new(LLMClient::new(vec![])));
        let err = premium.single_shot("audit this", None).await.unwrap_err();
        match err {
            OrchestratorError::Llm(crate::error::LlmError::ProvidersExhausted { .. }) => {}
            other => panic!("expected ProvidersExhausted, got {other:?}"),
        }
    }
}

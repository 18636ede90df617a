//! Quality-Aware Orchestrator facade — §4.5. Owns a `Router`, a
//! `SmartOrchestrator`, and a `HybridOrchestrator` by composition, per §9's
//! design note preferring composition over inheritance.

use crate::config::Config;
use crate::error::OrchestratorError;
use crate::llm::LLMClient;
use crate::orchestrator::hybrid::{HybridOrchestrator, HybridStatus};
use crate::orchestrator::premium::PremiumOrchestrator;
use crate::orchestrator::smart::{OrchestrationMode, SmartOrchestrator};
use crate::router::Router;
use crate::types::{Requirements, RoutingAction, RoutingDecision, Task};
use crate::validation;
use std::collections::HashMap;
use std::sync::Arc;

/// Final result of an `orchestrate` call.
#[derive(Debug, Clone)]
pub struct ResultEnvelope {
    pub result: String,
    pub routing_decision: RoutingDecision,
    pub orchestrator_name: String,
    pub cost_estimate: f64,
    pub quality_score: u8,
    pub metadata: HashMap<String, String>,
}

/// A snapshot of the facade's current configuration, for introspection.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub routing_enabled: bool,
    pub rejection_threshold: u8,
    pub hybrid_threshold: u8,
    pub validation_threshold: u8,
    pub default_provider: String,
    pub constituent_orchestrators: Vec<String>,
}

pub struct QualityAwareOrchestrator {
    router: Router,
    smart: SmartOrchestrator,
    hybrid: HybridOrchestrator,
    premium: PremiumOrchestrator,
    config: Config,
}

impl QualityAwareOrchestrator {
    /// `premium_llm` is a distinct `LLMClient` (its own provider chain,
    /// typically a higher-tier model) used only by the Escalate path — see
    /// `orchestrator::premium`. Pass an empty-chain `LLMClient` if no
    /// premium credentials are configured; escalation will then fail
    /// visibly with `ProvidersExhausted` instead of silently reusing the
    /// standard chain.
    pub fn new(llm: Arc<LLMClient>, premium_llm: Arc<LLMClient>, config: Config) -> Self {
        let router = Router::new(&config);
        let smart = SmartOrchestrator::new(llm.clone());
        let hybrid = HybridOrchestrator::new(llm, config.validation_threshold);
        let premium = PremiumOrchestrator::new(premium_llm);
        Self { router, smart, hybrid, premium, config }
    }

    /// Route (unless bypassed), dispatch on the action, and return a
    /// `ResultEnvelope`.
    pub async fn orchestrate(
        &self,
        task_text: &str,
        requirements: Requirements,
        force_delegate: bool,
    ) -> Result<ResultEnvelope, OrchestratorError> {
        let task = Task::new(task_text).with_requirements(requirements);

        let decision = if force_delegate || !self.config.enable_quality_routing {
            RoutingDecision {
                action: RoutingAction::Delegate,
                predicted_quality: 85,
                reasoning: "routing bypassed (force_delegate or routing disabled)".to_string(),
                provider: Some(self.config.default_provider.clone()),
                model: None,
                workflow: None,
                metadata: HashMap::new(),
            }
        } else {
            self.router.route(&task)?
        };

        match decision.action {
            RoutingAction::Delegate => {
                let result = self.smart.orchestrate(task_text, None, OrchestrationMode::Standard).await?;
                Ok(ResultEnvelope {
                    result,
                    quality_score: decision.predicted_quality,
                    cost_estimate: 0.10,
                    orchestrator_name: "SmartOrchestrator".to_string(),
                    metadata: HashMap::from([("workflow".to_string(), "delegate".to_string())]),
                    routing_decision: decision,
                })
            }
            RoutingAction::Hybrid => {
                let hybrid_result = self
                    .hybrid
                    .orchestrate_with_validation(task_text, self.config.max_retries, true)
                    .await?;
                let mut metadata = HashMap::from([
                    ("workflow".to_string(), "free_gen_premium_validation".to_string()),
                    ("iterations".to_string(), hybrid_result.iteration.to_string()),
                    (
                        "validation_passed".to_string(),
                        (hybrid_result.status == HybridStatus::Passed).to_string(),
                    ),
                ]);
                metadata.insert("status".to_string(), format!("{:?}", hybrid_result.status));
                Ok(ResultEnvelope {
                    result: hybrid_result.result,
                    quality_score: hybrid_result.validation_score,
                    cost_estimate: 0.25 * hybrid_result.iteration as f64,
                    orchestrator_name: "HybridOrchestrator".to_string(),
                    metadata,
                    routing_decision: decision,
                })
            }
            RoutingAction::Escalate => {
                let (result, cost_estimate) = self.premium.single_shot(task_text, None).await?;
                let report = validation::evaluate(&result, task_text);
                Ok(ResultEnvelope {
                    result,
                    quality_score: report.score,
                    cost_estimate,
                    orchestrator_name: "PremiumOrchestrator".to_string(),
                    metadata: HashMap::from([("workflow".to_string(), "escalate".to_string())]),
                    routing_decision: decision,
                })
            }
            RoutingAction::Reject => unreachable!("router never returns a Reject RoutingDecision, it raises TaskRejection"),
        }
    }

    /// Dry-run explanation with no side effects, per §4.2/§2b.
    pub fn explain_routing(&self, task_text: &str, requirements: Requirements) -> String {
        let task = Task::new(task_text).with_requirements(requirements);
        self.router.explain_decision(&task)
    }

    pub fn get_statistics(&self) -> Statistics {
        Statistics {
            routing_enabled: self.config.enable_quality_routing,
            rejection_threshold: self.config.rejection_threshold,
            hybrid_threshold: self.config.hybrid_threshold,
            validation_threshold: self.config.validation_threshold,
            default_provider: self.config.default_provider.clone(),
            constituent_orchestrators: vec![
                "Router".to_string(),
                "SmartOrchestrator".to_string(),
                "HybridOrchestrator".to_string(),
                "PremiumOrchestrator".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_reflect_config() {
        let llm = Arc::new(LLMClient::new(vec![]));
        let premium_llm = Arc::new(LLMClient::new(vec![]));
        let config = Config::default();
        let orchestrator = QualityAwareOrchestrator::new(llm, premium_llm, config);
        let stats = orchestrator.get_statistics();
        assert_eq!(stats.rejection_threshold, 60);
        assert_eq!(stats.constituent_orchestrators.len(), 4);
    }

    #[test]
    fn explain_routing_rejects_large_code_audit_with_alternatives() {
        let llm = Arc::new(LLMClient::new(vec![]));
        let premium_llm = Arc::new(LLMClient::new(vec![]));
        let orchestrator = QualityAwareOrchestrator::new(llm, premium_llm, Config::default());
        let mut text = "audit and review this for bugs, identify issues\n```python\n".to_string();
        text.push_str(&"padding ".repeat(15_000));
        text.push_str("```\n");
        let explanation = orchestrator.explain_routing(
            &text,
            Requirements { needs_file_line_refs: true, no_placeholders: true, allow_premium: false },
        );
        assert!(explanation.contains("action=Reject"));
        assert!(explanation.contains("alternatives"));
    }
}

//! Quality-Aware Task Router (Phase 0, rule-based) — §4.2.
//!
//! The classification idiom (a keyword array plus `.iter().any()`/counted
//! matches) is grounded in the teacher's `orchestrator/router.rs` heuristic
//! methods (`is_code_related`, `is_planning_related`, etc.), generalized
//! from boolean short-circuit matching to the additive keyword-bag scoring
//! §4.2 requires. The teacher's `RoutingDecision` (agent-type selection) and
//! this router's `RoutingDecision` (quality-prediction + action) are
//! different shapes entirely — only the pure, no-I/O heuristic style and
//! the teacher's direct-private-method unit test idiom carry forward.

use crate::config::Config;
use crate::error::RouterError;
use crate::types::{ModelCapability, RoutingAction, RoutingDecision, Task, TaskType};
use std::collections::HashMap;

/// Pure, deterministic task router. Holds only immutable configuration and
/// the model capability matrix; `route` performs no I/O.
pub struct Router {
    rejection_threshold: u8,
    hybrid_threshold: u8,
    default_provider: String,
    model_capabilities: HashMap<String, ModelCapability>,
}

impl Router {
    pub fn new(config: &Config) -> Self {
        Self {
            rejection_threshold: config.rejection_threshold,
            hybrid_threshold: config.hybrid_threshold,
            default_provider: config.default_provider.clone(),
            model_capabilities: default_model_capabilities(),
        }
    }

    /// Quality prediction starting at 85 and subtracting additive penalties,
    /// per §4.2's penalty table. Returns the clamped score and the list of
    /// penalty descriptions applied, for `reasoning`/`explain_decision`.
    fn predict_quality(&self, task: &Task) -> (u8, Vec<String>) {
        let metadata = task.metadata();
        let mut score: i32 = 85;
        let mut penalties = Vec::new();

        match metadata.task_type {
            TaskType::Analytical => {
                score -= 30;
                penalties.push("task_type == Analytical (-30)".to_string());
            }
            TaskType::Hybrid => {
                score -= 15;
                penalties.push("task_type == Hybrid (-15)".to_string());
            }
            TaskType::Generative => {}
        }

        if metadata.input_size_bytes > 100_000 {
            score -= 20;
            penalties.push("input_bytes > 100 KB (-20)".to_string());
        } else if metadata.input_size_bytes > 50_000 {
            score -= 10;
            penalties.push("50 KB < input_bytes <= 100 KB (-10)".to_string());
        }

        if metadata.has_embedded_code {
            score -= 15;
            penalties.push("has_embedded_code (-15)".to_string());
        }

        if task.requirements.needs_file_line_refs {
            score -= 15;
            penalties.push("requirements.needs_file_line_refs (-15)".to_string());
        }

        if task.requirements.no_placeholders {
            score -= 10;
            penalties.push("requirements.no_placeholders (-10)".to_string());
        }

        (score.clamp(0, 100) as u8, penalties)
    }

    /// Classify, predict quality, and return a `RoutingDecision`, or raise
    /// `TaskRejection` carrying the decision and ≥3 alternatives.
    pub fn route(&self, task: &Task) -> Result<RoutingDecision, RouterError> {
        let (predicted_quality, penalties) = self.predict_quality(task);
        let reasoning = if penalties.is_empty() {
            "no penalties applied".to_string()
        } else {
            penalties.join("; ")
        };

        if predicted_quality >= self.hybrid_threshold {
            return Ok(RoutingDecision {
                action: RoutingAction::Delegate,
                predicted_quality,
                reasoning,
                provider: Some(self.default_provider.clone()),
                model: None,
                workflow: None,
                metadata: HashMap::new(),
            });
        }

        if predicted_quality >= self.rejection_threshold {
            return Ok(RoutingDecision {
                action: RoutingAction::Hybrid,
                predicted_quality,
                reasoning,
                provider: Some(self.default_provider.clone()),
                model: None,
                workflow: Some("free_gen_premium_validation".to_string()),
                metadata: HashMap::new(),
            });
        }

        if task.requirements.allow_premium {
            return Ok(RoutingDecision {
                action: RoutingAction::Escalate,
                predicted_quality,
                reasoning,
                provider: Some("premium".to_string()),
                model: None,
                workflow: None,
                metadata: HashMap::new(),
            });
        }

        let alternatives = vec![
            "Use a premium model directly (set provider to a premium tier).".to_string(),
            "Enable premium escalation via requirements.allow_premium = true.".to_string(),
            "Simplify the task: reduce embedded code, drop file:line requirements, or split it up.".to_string(),
        ];
        Err(RouterError::TaskRejection { predicted_quality, reasoning, alternatives })
    }

    /// Render a human-readable explanation without side effects, matching
    /// the original source's `explain_decision`/`explain_routing` (§2b).
    pub fn explain_decision(&self, task: &Task) -> String {
        let metadata = task.metadata();
        match self.route(task) {
            Ok(decision) => format!(
                "task_type={:?} predicted_quality={} action={:?} provider={:?} model={:?}\nreasoning: {}",
                metadata.task_type, decision.predicted_quality, decision.action, decision.provider, decision.model, decision.reasoning
            ),
            Err(RouterError::TaskRejection { predicted_quality, reasoning, alternatives }) => {
                let mut block = format!(
                    "task_type={:?} predicted_quality={} action=Reject\nreasoning: {}\nalternatives:",
                    metadata.task_type, predicted_quality, reasoning
                );
                for (i, alt) in alternatives.iter().enumerate() {
                    block.push_str(&format!("\n  {}. {}", i + 1, alt));
                }
                block
            }
        }
    }

    pub fn get_model_capabilities(&self, model: &str) -> Option<&ModelCapability> {
        self.model_capabilities.get(model)
    }
}

fn default_model_capabilities() -> HashMap<String, ModelCapability> {
    let mut map = HashMap::new();
    map.insert(
        "gpt-4o-mini".to_string(),
        ModelCapability {
            strengths: vec!["cheap".into(), "fast".into(), "general chat".into()],
            weaknesses: vec!["long-context code audits".into()],
            max_effective_context_bytes: 100_000,
            quality_ceiling: 80,
        },
    );
    map.insert(
        "gpt-4o".to_string(),
        ModelCapability {
            strengths: vec!["code analysis".into(), "long context".into(), "precise citations".into()],
            weaknesses: vec!["cost".into()],
            max_effective_context_bytes: 1_000_000,
            quality_ceiling: 95,
        },
    );
    map
}

//! Seeded scenario 4: the same over-threshold audit task, but with
//! `allow_premium: true`, escalates to the distinct premium provider chain
//! instead of being rejected.

mod support;

use delegation_fabric::types::{Requirements, RoutingAction};
use delegation_fabric::{Config, LLMClient, QualityAwareOrchestrator};
use std::sync::Arc;
use support::{priced_descriptor, ScriptedProvider};

fn large_audit_task() -> String {
    let mut text = "audit and review this for bugs, identify issues\n```python\n".to_string();
    text.push_str(&"x = 1\n".repeat(3));
    text.push_str("```\n```python\n");
    text.push_str(&"y = 2\n".repeat(3));
    text.push_str("```\n```python\n");
    text.push_str(&"z = 3\n".repeat(3));
    text.push_str("```\n");
    text.push_str(&"padding ".repeat(15_000));
    text
}

#[tokio::test]
async fn escalation_on_allow_premium() {
    let standard_provider = Arc::new(ScriptedProvider::repeating("standard chain should never be called"));
    let llm = Arc::new(LLMClient::new(vec![(priced_descriptor("standard"), standard_provider)]));

    let premium_provider = Arc::new(ScriptedProvider::repeating(
        "```python\ndef audit(code: str) -> list:\n    try:\n        return [line for line in code.splitlines() if \"O(n^2)\" in line]\n    except Exception as err:\n        raise err\n```\n\
         # file:line references: issue at bugs.py:42 and bugs.py:58\n\
         def test_audit():\n    assert audit(\"x\") == []",
    ));
    let premium_llm = Arc::new(LLMClient::new(vec![(priced_descriptor("premium"), premium_provider.clone())]));

    let orchestrator = QualityAwareOrchestrator::new(llm, premium_llm, Config::default());

    let task = large_audit_task();
    let requirements = Requirements { needs_file_line_refs: true, no_placeholders: true, allow_premium: true };
    let envelope = orchestrator.orchestrate(&task, requirements, false).await.unwrap();

    assert_eq!(envelope.routing_decision.action, RoutingAction::Escalate);
    assert_eq!(envelope.orchestrator_name, "PremiumOrchestrator");
    assert_eq!(premium_provider.prompts_seen.lock().unwrap().len(), 1);
    assert!(envelope.quality_score >= 70, "expected a high quality_score from the premium call, got {}", envelope.quality_score);
    assert!(envelope.cost_estimate > 0.0, "cost_estimate should reflect the real premium call, not a hardcoded literal");
}

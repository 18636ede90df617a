//! Seeded scenario 3: a large, code-heavy audit task with strict
//! requirements and no premium opt-in is rejected with alternatives.

mod support;

use delegation_fabric::types::Requirements;
use delegation_fabric::{Config, LLMClient, OrchestratorError, QualityAwareOrchestrator, RouterError};
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
async fn rejection_large_code_audit() {
    let provider = Arc::new(ScriptedProvider::repeating("unused"));
    let llm = Arc::new(LLMClient::new(vec![(priced_descriptor("p"), provider)]));
    let premium_llm = Arc::new(LLMClient::new(vec![]));
    let orchestrator = QualityAwareOrchestrator::new(llm, premium_llm, Config::default());

    let task = large_audit_task();
    assert!(task.len() > 100_000, "fixture must exceed the 100 KB rejection threshold, got {}", task.len());

    let requirements = Requirements { needs_file_line_refs: true, no_placeholders: true, allow_premium: false };
    let err = orchestrator.orchestrate(&task, requirements, false).await.unwrap_err();

    match err {
        OrchestratorError::Router(RouterError::TaskRejection { predicted_quality, alternatives, .. }) => {
            assert!(predicted_quality <= 25, "expected predicted_quality <= 25, got {predicted_quality}");
            assert!(alternatives.len() >= 3);
        }
        other => panic!("expected a router task rejection, got {other}"),
    }

    let explanation = orchestrator.explain_routing(
        &task,
        Requirements { needs_file_line_refs: true, no_placeholders: true, allow_premium: false },
    );
    assert!(explanation.contains("action=Reject"));
    assert!(explanation.contains("1. "));
    assert!(explanation.contains("alternatives"));
}

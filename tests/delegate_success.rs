//! Seeded scenario 1: a simple generative task delegates straight through
//! to `SmartOrchestrator` at the default predicted quality.

mod support;

use delegation_fabric::types::Requirements;
use delegation_fabric::{Config, LLMClient, QualityAwareOrchestrator};
use std::sync::Arc;
use support::{priced_descriptor, ScriptedProvider};

#[tokio::test]
async fn delegate_success() {
    let provider = Arc::new(ScriptedProvider::repeating(
        "```python\ndef validate_email(email: str) -> bool:\n    return \"@\" in email\n```\n\
         assert validate_email(\"a@b.com\")\nassert not validate_email(\"nope\")",
    ));
    let llm = Arc::new(LLMClient::new(vec![(priced_descriptor("p"), provider)]));
    let premium_llm = Arc::new(LLMClient::new(vec![]));
    let orchestrator = QualityAwareOrchestrator::new(llm, premium_llm, Config::default());

    let task = "Implement a Python function validate_email(email:str)->bool with docstring and 3 pytest tests.";
    let envelope = orchestrator.orchestrate(task, Requirements::default(), false).await.unwrap();

    assert_eq!(envelope.routing_decision.action, delegation_fabric::types::RoutingAction::Delegate);
    assert_eq!(envelope.routing_decision.predicted_quality, 85);
    assert_eq!(envelope.orchestrator_name, "SmartOrchestrator");
    assert!(envelope.result.contains("def validate_email"));
    assert!(envelope.result.contains("assert"));
}

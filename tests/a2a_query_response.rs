//! Seeded scenario 5: a worker queries the APC adapter over the in-memory
//! message bus and gets back a correlated Response within a generous
//! timeout margin.

use delegation_fabric::a2a::{AgentHandler, MessageBus};
use delegation_fabric::apc::{ApcAdapter, ProjectIndex};
use delegation_fabric::types::{A2AMessage, Capability, MessageType};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

struct FakeProjectIndex;

#[async_trait]
impl ProjectIndex for FakeProjectIndex {
    async fn find_files_by_pattern(&self, pattern: &str) -> Vec<String> {
        vec![format!("src/{pattern}.rs")]
    }
    async fn find_by_export(&self, symbol: &str) -> Vec<String> {
        vec![format!("src/{symbol}_export.rs")]
    }
    async fn dependencies_of(&self, _file: &str) -> Vec<String> {
        vec!["src/lib.rs".to_string()]
    }
    async fn answer(&self, nl: &str) -> String {
        format!("answer to: {nl}")
    }
}

#[tokio::test]
async fn a2a_query_response() {
    let bus = Arc::new(MessageBus::new());
    let adapter: Arc<dyn AgentHandler> = Arc::new(ApcAdapter::new(FakeProjectIndex));
    bus.register_agent("apc", "adapter", vec![Capability::ProjectQuery], adapter).await.unwrap();
    tokio::spawn(bus.clone().start_listener("apc".to_string()));

    let query = A2AMessage::new(
        "worker_a",
        "apc",
        MessageType::Query,
        serde_json::json!({"query_subtype": "project_query", "query_type": "find_pattern", "query": "Validator"}),
    );
    let correlation_id = query.correlation_id.clone();

    let started = Instant::now();
    let response = bus.send_and_wait(query, 5).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response.correlation_id, correlation_id);
    let results = response.payload["results"].as_array().expect("results must be a list");
    assert!(!results.is_empty());
    assert!(elapsed.as_millis() < 1000, "expected an in-memory round trip well under a second, took {elapsed:?}");
}

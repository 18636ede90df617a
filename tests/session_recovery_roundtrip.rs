//! Seeded scenario 6: a recorded session history is summarized into a
//! recovery manifest (LLM mocked to echo a schema-valid JSON object), then
//! `bootstrap_session` restores a human-readable summary from it.

mod support;

use delegation_fabric::session::recovery_manifest_path;
use delegation_fabric::{BootstrapManager, LLMClient, RecoveryAgent};
use std::sync::Arc;
use std::time::Instant;
use support::{priced_descriptor, ScriptedProvider};

fn session_history_summary() -> String {
    let events = [
        "task_started: wire up the router",
        "file_written: src/router.rs",
        "llm_call: analyze_and_plan",
        "task_completed: router module",
        "task_started: wire up validation",
        "file_written: src/validation.rs",
        "llm_call: generate_specs",
        "task_completed: validation module",
        "task_started: wire up hybrid orchestrator",
        "llm_call: hybrid_generate",
        "error: validation score below threshold, retrying",
        "task_completed: hybrid orchestrator",
    ];
    assert_eq!(events.len(), 12);
    assert_eq!(events.iter().filter(|e| e.starts_with("file_written")).count(), 2);
    events.join("\n")
}

const MOCK_MANIFEST_JSON: &str = r#"{
  "session_metadata": {"project": "delegation_fabric", "phase": "build", "completed_count": 3},
  "completed_tasks": ["router module", "validation module", "hybrid orchestrator"],
  "pending_tasks": [{"task": "wire up the A2A message bus", "priority": "high", "status": "pending", "context": "next module per the component list"}],
  "active_state": "transforming",
  "critical_context": {"key_decisions": ["use an additive keyword-bag classifier"], "blockers": [], "next_steps": ["write DESIGN.md entries"]},
  "memory_pointers": {"project_state_file": "PROJECT_STATE.md", "session_logs": "session.log", "modified_files": ["src/router.rs", "src/validation.rs"], "git_branch": "feature/delegation-fabric"},
  "bootstrap_instructions": "resume from src/a2a.rs"
}"#;

#[tokio::test]
async fn session_recovery_roundtrip() {
    let started = Instant::now();

    let provider = Arc::new(ScriptedProvider::repeating(MOCK_MANIFEST_JSON));
    let llm = Arc::new(LLMClient::new(vec![(priced_descriptor("p"), provider)]));
    let agent = RecoveryAgent::new(llm, 8000);

    let dir = tempfile::tempdir().unwrap();
    let manifest_path = recovery_manifest_path(dir.path());

    let manifest = agent.prepare_recovery(&session_history_summary(), &manifest_path).await.unwrap();
    assert_eq!(manifest.memory_pointers.git_branch, "feature/delegation-fabric");

    let serialized = std::fs::read(&manifest_path).unwrap();
    assert!(serialized.len() <= 2048, "manifest should be <= 2 KB, was {} bytes", serialized.len());

    let manager = BootstrapManager::new(dir.path());
    let summary = manager.bootstrap_session(&manifest_path, false).await.unwrap();

    assert!(summary.contains("wire up the A2A message bus"), "summary should contain the next pending task");
    assert!(summary.contains("feature/delegation-fabric"), "summary should contain the mocked git branch");

    assert!(started.elapsed().as_secs() < 30, "bootstrap roundtrip should finish in under 30s");
}

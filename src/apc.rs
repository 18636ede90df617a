//! APC (Agent Preparer Context) Adapter — §4.7.
//!
//! A single adapter registered under `{ProjectQuery, ContextCompression,
//! Validation}` that dispatches on `query_subtype`/`command`. The project
//! scanner itself is an external collaborator (§1 Out of scope); this
//! adapter only requires the read-only `ProjectIndex` lookup interface.

use crate::a2a::AgentHandler;
use crate::types::{A2AMessage, MessageType, ValidationReport};
use crate::validation;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Read-only lookup surface the external project scanner must provide.
#[async_trait]
pub trait ProjectIndex: Send + Sync {
    async fn find_files_by_pattern(&self, pattern: &str) -> Vec<String>;
    async fn find_by_export(&self, symbol: &str) -> Vec<String>;
    async fn dependencies_of(&self, file: &str) -> Vec<String>;
    async fn answer(&self, natural_language: &str) -> String;
}

/// A rule-based conversation compressor: segments by role/code-fence, scores
/// by recency × type × keyword overlap, and selects under a token budget.
pub fn prepare_context(conversation_history: &[String], current_task: &str, target_tokens: usize) -> String {
    let task_keywords: Vec<String> = current_task
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > 3)
        .collect();

    let mut scored: Vec<(f64, &String)> = conversation_history
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let recency = (i + 1) as f64 / conversation_history.len().max(1) as f64;
            let is_code = if segment.contains("```") { 1.5 } else { 1.0 };
            let lower = segment.to_lowercase();
            let overlap = task_keywords.iter().filter(|k| lower.contains(k.as_str())).count() as f64;
            (recency * is_code * (1.0 + overlap), segment)
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let budget_bytes = target_tokens * 4;
    let mut used = 0;
    let mut selected = Vec::new();
    for (_, segment) in scored {
        if used + segment.len() > budget_bytes {
            continue;
        }
        used += segment.len();
        selected.push(segment.clone());
    }

    if selected.is_empty() {
        return format!("(summary) no context fit within {target_tokens} tokens");
    }
    selected.join("\n---\n")
}

/// Appends task-specific hints when a query carries `context.task`, per
/// §4.7's context-aware recommendations.
fn context_hints(context: Option<&Value>) -> Option<String> {
    let task = context?.get("task")?.as_str()?.to_lowercase();
    let mut hints = Vec::new();
    if task.contains("validation") {
        hints.push("see src/validation.rs for the scoring rubric".to_string());
    }
    if task.contains("orchestrator") {
        hints.push("see src/orchestrator/ for Smart/Hybrid/Quality orchestrators".to_string());
    }
    if task.contains("test") {
        hints.push("tests live in #[cfg(test)] mod tests blocks alongside each module".to_string());
    }
    if hints.is_empty() {
        None
    } else {
        Some(hints.join("; "))
    }
}

pub struct ApcAdapter<I: ProjectIndex> {
    index: I,
}

impl<I: ProjectIndex> ApcAdapter<I> {
    pub fn new(index: I) -> Self {
        Self { index }
    }

    async fn handle_project_query(&self, payload: &Value) -> Value {
        let query_type = payload.get("query_type").and_then(|v| v.as_str()).unwrap_or("");
        let query = payload.get("query").and_then(|v| v.as_str()).unwrap_or("");
        let results: Vec<String> = match query_type {
            "find_pattern" | "find_files_by_pattern" => self.index.find_files_by_pattern(query).await,
            "find_by_export" => self.index.find_by_export(query).await,
            "dependencies_of" => self.index.dependencies_of(query).await,
            _ => vec![self.index.answer(query).await],
        };
        json!({"results": results})
    }

    fn handle_prepare_context(&self, payload: &Value) -> Value {
        let history: Vec<String> = payload
            .get("conversation_history")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        let task = payload.get("current_task").and_then(|v| v.as_str()).unwrap_or("");
        let target_tokens = payload.get("target_tokens").and_then(|v| v.as_u64()).unwrap_or(8000) as usize;
        let compressed = prepare_context(&history, task, target_tokens);
        json!({"compressed_context": compressed})
    }

    fn handle_validate_output(&self, payload: &Value) -> Value {
        let task = payload.get("task").and_then(|v| v.as_str()).unwrap_or("");
        let output = payload.get("output").and_then(|v| v.as_str()).unwrap_or("");
        let report: ValidationReport = validation::evaluate(output, task);
        serde_json::to_value(report).unwrap_or(json!({}))
    }
}

#[async_trait]
impl<I: ProjectIndex> AgentHandler for ApcAdapter<I> {
    async fn handle(&self, message: A2AMessage) -> Option<Value> {
        if message.message_type == MessageType::Command {
            let command = message.payload.get("command").and_then(|v| v.as_str()).unwrap_or("");
            if command == "scan_project" {
                // The scanner itself is external; the adapter only triggers and acks.
                return Some(json!({"acknowledged": true, "command": "scan_project"}));
            }
            return Some(json!({"error": format!("unknown command '{command}'")}));
        }

        if message.message_type != MessageType::Query {
            return None;
        }

        let subtype = message.payload.get("query_subtype").and_then(|v| v.as_str()).unwrap_or("");
        let mut response = match subtype {
            "project_query" => self.handle_project_query(&message.payload).await,
            "prepare_context" => self.handle_prepare_context(&message.payload),
            "validate_output" => self.handle_validate_output(&message.payload),
            other => json!({"error": format!("unknown query_subtype '{other}'")}),
        };

        if let Some(hints) = context_hints(message.context.as_ref()) {
            if let Value::Object(ref mut map) = response {
                map.insert("hints".to_string(), json!(hints));
            }
        }

        Some(response)
    }
}

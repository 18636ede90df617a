//! Shared data model: tagged records for every boundary object in the fabric.
//!
//! Promotes the dictionary-shaped boundary objects of the original source to
//! explicit variants, matching the teacher's use of `#[derive(Serialize,
//! Deserialize)]` structs throughout `orchestrator/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A submitted unit of work plus its caller-supplied requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub text: String,
    #[serde(default)]
    pub requirements: Requirements,
}

impl Task {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), requirements: Requirements::default() }
    }

    pub fn with_requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Derive the metadata the router and orchestrators reason over.
    pub fn metadata(&self) -> TaskMetadata {
        TaskMetadata::derive(&self.text, &self.requirements)
    }
}

/// Recognized caller options, each with a precise routing/validation effect.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Requirements {
    #[serde(default)]
    pub needs_file_line_refs: bool,
    #[serde(default)]
    pub no_placeholders: bool,
    #[serde(default)]
    pub allow_premium: bool,
}

/// Derived, read-only facts about a task's text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskMetadata {
    pub input_size_bytes: usize,
    pub has_embedded_code: bool,
    pub code_block_count: usize,
    pub estimated_output_lines: usize,
    pub task_type: TaskType,
}

impl TaskMetadata {
    pub fn derive(text: &str, requirements: &Requirements) -> Self {
        let input_size_bytes = text.len();
        let code_block_count = text.matches("```").count() / 2;
        let has_embedded_code = code_block_count > 0;
        let estimated_output_lines = (text.lines().count() / 2).max(5);
        let task_type = TaskType::classify(text, requirements);
        Self {
            input_size_bytes,
            has_embedded_code,
            code_block_count,
            estimated_output_lines,
            task_type,
        }
    }
}

/// Task classification used to pick a quality penalty profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Generative,
    Analytical,
    Hybrid,
}

const ANALYTICAL_KEYWORDS: &[&str] =
    &["audit", "review", "analyze", "find bugs", "identify issues"];
const GENERATIVE_KEYWORDS: &[&str] = &["implement", "create", "build", "generate", "write"];

impl TaskType {
    /// Pure keyword-bag scoring; no I/O, deterministic, O(|task|).
    pub fn classify(text: &str, requirements: &Requirements) -> Self {
        let lower = text.to_lowercase();
        let mut analytical_score: i32 =
            ANALYTICAL_KEYWORDS.iter().filter(|k| lower.contains(*k)).count() as i32;
        let generative_score: i32 =
            GENERATIVE_KEYWORDS.iter().filter(|k| lower.contains(*k)).count() as i32;

        let code_block_count = text.matches("```").count() / 2;
        if code_block_count > 0 && text.len() > 10_000 {
            analytical_score += 3;
        }
        if lower.contains("file:line") || lower.contains("specific line") {
            analytical_score += 3;
        }
        if requirements.needs_file_line_refs {
            analytical_score += 3;
        }

        if analytical_score - generative_score >= 2 {
            TaskType::Analytical
        } else if generative_score > analytical_score {
            TaskType::Generative
        } else {
            TaskType::Hybrid
        }
    }
}

/// The action a `RoutingDecision` prescribes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAction {
    Delegate,
    Hybrid,
    Escalate,
    Reject,
}

/// Output of the quality-aware router: produced once per task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub action: RoutingAction,
    pub predicted_quality: u8,
    pub reasoning: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub workflow: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Immutable per-model capability record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCapability {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub max_effective_context_bytes: usize,
    pub quality_ceiling: u8,
}

/// A single LLM call's cost and latency, appended to an append-only ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCost {
    pub provider: String,
    pub model: String,
    pub operation: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub latency_ms: u128,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Complexity bucket assigned during decomposition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Difficulty/risk buckets attached to each subtask.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    Low,
    Medium,
    High,
}

/// A single unit of a decomposed task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub difficulty: Risk,
    pub error_risk: Risk,
    pub estimated_tokens: u64,
}

/// A decomposition of a task into a subtask DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub complexity: Complexity,
    pub decompose: bool,
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub requirements: HashMap<String, String>,
}

impl Plan {
    /// A trivial plan wrapping the whole goal as a single subtask; used when
    /// the orchestrator judges the task too simple to decompose.
    pub fn single_shot(goal: &str) -> Self {
        Self {
            complexity: Complexity::Low,
            decompose: false,
            subtasks: vec![Subtask {
                id: "task-1".to_string(),
                description: goal.to_string(),
                dependencies: Vec::new(),
                difficulty: Risk::Low,
                error_risk: Risk::Low,
                estimated_tokens: (goal.len() / 4) as u64,
            }],
            requirements: HashMap::new(),
        }
    }

    /// Validate the subtask graph is a DAG over known ids.
    pub fn validate(&self) -> Result<(), String> {
        let ids: std::collections::HashSet<&str> =
            self.subtasks.iter().map(|s| s.id.as_str()).collect();
        for subtask in &self.subtasks {
            for dep in &subtask.dependencies {
                if !ids.contains(dep.as_str()) {
                    return Err(format!(
                        "subtask '{}' depends on unknown id '{}'",
                        subtask.id, dep
                    ));
                }
            }
        }
        detect_cycle(&self.subtasks).map_err(|cycle| format!("cycle detected: {cycle}"))
    }

    /// Subtask ids in topological (dependency-respecting) order.
    pub fn topological_order(&self) -> Result<Vec<String>, String> {
        self.validate()?;
        let mut indegree: HashMap<&str, usize> =
            self.subtasks.iter().map(|s| (s.id.as_str(), 0)).collect();
        let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
        for s in &self.subtasks {
            for dep in &s.dependencies {
                *indegree.get_mut(s.id.as_str()).unwrap() += 1;
                edges.entry(dep.as_str()).or_default().push(s.id.as_str());
            }
        }
        let mut ready: Vec<&str> = indegree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(id, _)| *id)
            .collect();
        ready.sort();
        let mut order = Vec::with_capacity(self.subtasks.len());
        while let Some(id) = ready.pop() {
            order.push(id.to_string());
            if let Some(children) = edges.get(id) {
                for child in children {
                    let entry = indegree.get_mut(child).unwrap();
                    *entry -= 1;
                    if *entry == 0 {
                        ready.push(child);
                    }
                }
            }
            ready.sort();
        }
        Ok(order)
    }
}

fn detect_cycle(subtasks: &[Subtask]) -> Result<(), String> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }

    let index: HashMap<&str, usize> =
        subtasks.iter().enumerate().map(|(i, s)| (s.id.as_str(), i)).collect();
    let mut marks = vec![Mark::Unvisited; subtasks.len()];

    fn visit(
        i: usize,
        subtasks: &[Subtask],
        index: &HashMap<&str, usize>,
        marks: &mut Vec<Mark>,
    ) -> Result<(), String> {
        match marks[i] {
            Mark::Done => return Ok(()),
            Mark::Visiting => return Err(subtasks[i].id.clone()),
            Mark::Unvisited => {}
        }
        marks[i] = Mark::Visiting;
        for dep in &subtasks[i].dependencies {
            if let Some(&j) = index.get(dep.as_str()) {
                visit(j, subtasks, index, marks)?;
            }
        }
        marks[i] = Mark::Done;
        Ok(())
    }

    for i in 0..subtasks.len() {
        visit(i, subtasks, &index, &mut marks)?;
    }
    Ok(())
}

/// A single item in a `ValidationReport`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub component: String,
    pub severity: Risk,
    pub issue: String,
    pub fix_instruction: String,
    #[serde(default)]
    pub code_example: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Output of `validate_outputs`/the hybrid orchestrator's rubric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub score: u8,
    pub issues: Vec<ValidationIssue>,
    pub strengths: Vec<String>,
    pub completeness: u8,
    pub correctness: u8,
    pub production_ready: bool,
    pub improvement_summary: String,
    pub fix_instructions: Vec<String>,
}

/// Message kinds exchanged over the A2A bus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Query,
    Response,
    Command,
    Event,
    Clarification,
    Recommendation,
}

/// Delivery priority; higher values are more urgent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

/// A single message on the in-process A2A bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2AMessage {
    pub message_id: String,
    pub from_agent: String,
    pub to_agent: String,
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub correlation_id: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl A2AMessage {
    pub fn new(
        from_agent: impl Into<String>,
        to_agent: impl Into<String>,
        message_type: MessageType,
        payload: serde_json::Value,
    ) -> Self {
        let message_id = uuid::Uuid::new_v4().to_string();
        Self {
            correlation_id: message_id.clone(),
            message_id,
            from_agent: from_agent.into(),
            to_agent: to_agent.into(),
            message_type,
            payload,
            reply_to: None,
            priority: Priority::Normal,
            context: None,
            ttl_seconds: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Build the Response counterpart to this message, swapping from/to and
    /// inheriting the correlation id, per §4.6 `send_response` contract.
    pub fn respond(&self, payload: serde_json::Value) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            from_agent: self.to_agent.clone(),
            to_agent: self.from_agent.clone(),
            message_type: MessageType::Response,
            payload,
            correlation_id: self.correlation_id.clone(),
            reply_to: Some(self.message_id.clone()),
            priority: self.priority,
            context: None,
            ttl_seconds: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// A named agent's registered capabilities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ProjectQuery,
    ContextCompression,
    Validation,
    General,
}

/// Record of a worker's pricing, quality, and current load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub price: f64,
    pub quality: u8,
    pub speed: u8,
    pub best_for: Vec<String>,
    pub weaknesses: Vec<String>,
    pub reliability: f64,
    pub current_load: u32,
}

/// Append-only session telemetry record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub event_id: String,
    pub event_type: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub session_id: String,
    #[serde(default)]
    pub details: HashMap<String, String>,
}

/// Checkpoint status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    Active,
    Paused,
    Completed,
}

/// A paused/resumable snapshot of session state, written atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    pub session_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub data: HashMap<String, String>,
    pub status: CheckpointStatus,
    pub progress: f32,
}

/// A single pending task carried in a recovery manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTask {
    pub task: String,
    pub priority: String,
    pub status: String,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CriticalContext {
    #[serde(default)]
    pub key_decisions: Vec<String>,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemoryPointers {
    #[serde(default)]
    pub project_state_file: String,
    #[serde(default)]
    pub session_logs: String,
    #[serde(default)]
    pub modified_files: Vec<String>,
    #[serde(default)]
    pub git_branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionMetadata {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub completed_count: usize,
}

/// Fixed-shape recovery manifest, budget ≤2KB serialized, per §3/§6.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecoveryManifest {
    #[serde(default)]
    pub session_metadata: SessionMetadata,
    #[serde(default)]
    pub completed_tasks: Vec<String>,
    #[serde(default)]
    pub pending_tasks: Vec<PendingTask>,
    #[serde(default)]
    pub active_state: String,
    #[serde(default)]
    pub critical_context: CriticalContext,
    #[serde(default)]
    pub memory_pointers: MemoryPointers,
    #[serde(default)]
    pub bootstrap_instructions: String,
}

/// Cheap manifest peek, returned by `BootstrapManager::quick_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickStatus {
    pub project: String,
    pub phase: String,
    pub next_task: Option<String>,
    pub modified_file_count: usize,
    pub blockers: Vec<String>,
}

/// Cross-cutting aggregation, independent of the per-call `TaskCost` ledger.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrchestratorMetrics {
    pub active_tasks: u64,
    pub completed_tasks: u64,
    pub per_subtask_stats: MetricStats,
    pub model_usage: HashMap<String, u64>,
    pub error_counts: HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: u64,
}

impl MetricStats {
    pub fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.avg = (self.avg * self.count as f64 + value) / (self.count as f64 + 1.0);
        self.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_analytical_on_keyword_lead() {
        let t = TaskType::classify("Please audit and review this for bugs", &Requirements::default());
        assert_eq!(t, TaskType::Analytical);
    }

    #[test]
    fn classifies_generative_when_generative_wins() {
        let t = TaskType::classify("Please implement and build a new parser", &Requirements::default());
        assert_eq!(t, TaskType::Generative);
    }

    #[test]
    fn classifies_hybrid_on_tie() {
        let t = TaskType::classify("hello there", &Requirements::default());
        assert_eq!(t, TaskType::Hybrid);
    }

    #[test]
    fn large_code_block_pushes_analytical() {
        let mut text = "```\n".to_string();
        text.push_str(&"x".repeat(11_000));
        text.push_str("\n```\nwrite a summary");
        assert_eq!(TaskType::classify(&text, &Requirements::default()), TaskType::Analytical);
    }

    #[test]
    fn needs_file_line_refs_requirement_bumps_analytical_without_literal_phrase() {
        let requirements = Requirements { needs_file_line_refs: true, no_placeholders: false, allow_premium: false };
        let t = TaskType::classify("please look into this module", &requirements);
        assert_eq!(t, TaskType::Analytical);
        assert_eq!(TaskType::classify("please look into this module", &Requirements::default()), TaskType::Hybrid);
    }

    #[test]
    fn plan_validate_rejects_unknown_dependency() {
        let plan = Plan {
            complexity: Complexity::Low,
            decompose: true,
            subtasks: vec![Subtask {
                id: "a".into(),
                description: "x".into(),
                dependencies: vec!["ghost".into()],
                difficulty: Risk::Low,
                error_risk: Risk::Low,
                estimated_tokens: 10,
            }],
            requirements: HashMap::new(),
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn plan_validate_rejects_cycle() {
        let plan = Plan {
            complexity: Complexity::Low,
            decompose: true,
            subtasks: vec![
                Subtask {
                    id: "a".into(),
                    description: "x".into(),
                    dependencies: vec!["b".into()],
                    difficulty: Risk::Low,
                    error_risk: Risk::Low,
                    estimated_tokens: 10,
                },
                Subtask {
                    id: "b".into(),
                    description: "y".into(),
                    dependencies: vec!["a".into()],
                    difficulty: Risk::Low,
                    error_risk: Risk::Low,
                    estimated_tokens: 10,
                },
            ],
            requirements: HashMap::new(),
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn plan_topological_order_respects_dependencies() {
        let plan = Plan {
            complexity: Complexity::Medium,
            decompose: true,
            subtasks: vec![
                Subtask {
                    id: "b".into(),
                    description: "second".into(),
                    dependencies: vec!["a".into()],
                    difficulty: Risk::Low,
                    error_risk: Risk::Low,
                    estimated_tokens: 10,
                },
                Subtask {
                    id: "a".into(),
                    description: "first".into(),
                    dependencies: vec![],
                    difficulty: Risk::Low,
                    error_risk: Risk::Low,
                    estimated_tokens: 10,
                },
            ],
            requirements: HashMap::new(),
        };
        let order = plan.topological_order().unwrap();
        assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn a2a_respond_inherits_correlation_id() {
        let q = A2AMessage::new("worker_a", "apc", MessageType::Query, serde_json::json!({}));
        let r = q.respond(serde_json::json!({"ok": true}));
        assert_eq!(r.correlation_id, q.correlation_id);
        assert_eq!(r.reply_to, Some(q.message_id));
        assert_eq!(r.from_agent, "apc");
        assert_eq!(r.to_agent, "worker_a");
    }
}

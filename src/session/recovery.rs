//! RecoveryAgent: gathers git state and asks the LLM to produce a compact
//! `RecoveryManifest`, with a deterministic fallback manifest on failure —
//! §4.8. Grounded in the teacher's `orchestrator/session.rs::SessionManager`
//! persistence idiom, generalized to an LLM-authored manifest instead of a
//! raw state dump.

use crate::error::SessionError;
use crate::llm::LLMClient;
use crate::session::atomic::write_atomic;
use crate::types::{CriticalContext, MemoryPointers, PendingTask, RecoveryManifest, SessionMetadata};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const MAX_MODIFIED_FILES: usize = 20;
const MAX_MANIFEST_BYTES: usize = 2048;
const GIT_TIMEOUT_SECS: u64 = 5;

pub struct RecoveryAgent {
    llm: Arc<LLMClient>,
    context_limit: usize,
}

impl RecoveryAgent {
    pub fn new(llm: Arc<LLMClient>, context_limit: usize) -> Self {
        Self { llm, context_limit }
    }

    /// Gather git state, ask the LLM for a strict-JSON manifest, fall back to
    /// a minimal manifest on any call/parse failure, and atomically persist
    /// the result to `output_path`.
    pub async fn prepare_recovery(
        &self,
        conversation_summary: &str,
        output_path: &Path,
    ) -> Result<RecoveryManifest, SessionError> {
        let (git_branch, modified_files) = gather_git_state();

        let manifest = match self.ask_llm_for_manifest(conversation_summary, &git_branch, &modified_files).await {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!("recovery manifest generation failed, using fallback: {err}");
                fallback_manifest(&git_branch, &modified_files)
            }
        };

        let serialized = serde_json::to_string_pretty(&manifest)?;
        write_atomic(output_path, &serialized).await?;

        let ratio = 1.0 - (serialized.len() as f64 / (self.context_limit as f64 * 4.0));
        info!("recovery manifest written: {} bytes, compression ratio {:.3}", serialized.len(), ratio);

        Ok(manifest)
    }

    async fn ask_llm_for_manifest(
        &self,
        conversation_summary: &str,
        git_branch: &str,
        modified_files: &[String],
    ) -> Result<RecoveryManifest, crate::error::LlmError> {
        let prompt = manifest_prompt(conversation_summary, git_branch, modified_files);
        let response = self.llm.call_llm(&prompt, "recovery_manifest", Some(1024), true).await?;
        parse_manifest(&response).ok_or_else(|| crate::error::LlmError::ResponseParseError {
            provider: "recovery".to_string(),
            message: "manifest response was not valid JSON matching the expected schema".to_string(),
        })
    }
}

fn gather_git_state() -> (String, Vec<String>) {
    let branch = run_git(&["rev-parse", "--abbrev-ref", "HEAD"])
        .map(|out| out.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let modified = run_git(&["status", "--porcelain"])
        .map(|out| {
            out.lines()
                .filter_map(|line| line.get(3..).map(|s| s.to_string()))
                .take(MAX_MODIFIED_FILES)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    (branch, modified)
}

/// Run a git subcommand off-thread with a hard timeout, per §4.8's "git
/// subprocess calls must not block bootstrap/recovery past a few seconds."
fn run_git(args: &[&str]) -> Option<String> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let output = Command::new("git").args(&args).output();
        let _ = tx.send(output);
    });

    match rx.recv_timeout(Duration::from_secs(GIT_TIMEOUT_SECS)) {
        Ok(Ok(output)) if output.status.success() => Some(String::from_utf8_lossy(&output.stdout).to_string()),
        _ => None,
    }
}

fn manifest_prompt(conversation_summary: &str, git_branch: &str, modified_files: &[String]) -> String {
    let capped_summary = if conversation_summary.len() > 2000 {
        &conversation_summary[..2000]
    } else {
        conversation_summary
    };
    format!(
        "Summarize this session as strict JSON matching this schema exactly, no prose outside the JSON object:\n\
        {{\"session_metadata\": {{\"project\": string, \"phase\": string, \"completed_count\": number}}, \
        \"completed_tasks\": [string], \
        \"pending_tasks\": [{{\"task\": string, \"priority\": string, \"status\": string, \"context\": string}}], \
        \"active_state\": string, \
        \"critical_context\": {{\"key_decisions\": [string], \"blockers\": [string], \"next_steps\": [string]}}, \
        \"bootstrap_instructions\": string}}\n\n\
        Keep every string field under 200 characters and the whole object under {MAX_MANIFEST_BYTES} bytes.\n\n\
        git branch: {git_branch}\n\
        modified files: {modified_files:?}\n\n\
        Conversation summary:\n{capped_summary}"
    )
}

fn parse_manifest(response: &str) -> Option<RecoveryManifest> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&response[start..=end]).ok()
}

fn fallback_manifest(git_branch: &str, modified_files: &[String]) -> RecoveryManifest {
    RecoveryManifest {
        session_metadata: SessionMetadata { project: "unknown".to_string(), phase: "Unknown (fallback)".to_string(), completed_count: 0 },
        completed_tasks: Vec::new(),
        pending_tasks: vec![PendingTask {
            task: "resume from last checkpoint, manifest generation failed".to_string(),
            priority: "high".to_string(),
            status: "pending".to_string(),
            context: "LLM call or parse failed during recovery preparation".to_string(),
        }],
        active_state: "recovery_fallback".to_string(),
        critical_context: CriticalContext::default(),
        memory_pointers: MemoryPointers {
            project_state_file: "PROJECT_STATE.md".to_string(),
            session_logs: String::new(),
            modified_files: modified_files.to_vec(),
            git_branch: git_branch.to_string(),
        },
        bootstrap_instructions: "manifest generation failed; inspect git state manually before resuming".to_string(),
    }
}

pub fn recovery_manifest_path(base_dir: &Path) -> PathBuf {
    base_dir.join("session_recovery_latest.json")
}

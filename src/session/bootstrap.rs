//! BootstrapManager: restores a human-readable summary from a recovery
//! manifest and independently verifies the environment it describes — §4.8.

use crate::error::SessionError;
use crate::types::{QuickStatus, RecoveryManifest};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::warn;

const GIT_TIMEOUT_SECS: u64 = 5;

pub struct BootstrapManager {
    project_root: PathBuf,
}

impl BootstrapManager {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self { project_root: project_root.into() }
    }

    /// Load `manifest_path`, verify the environment it describes (unless
    /// `verify_environment` is false), and return the formatted summary in
    /// the fixed section order: status, progress, next task, blockers, next
    /// steps, modified files, key decisions, memory pointers, bootstrap
    /// instructions.
    pub async fn bootstrap_session(&self, manifest_path: &Path, verify_environment: bool) -> Result<String, SessionError> {
        if !manifest_path.exists() {
            return Err(SessionError::BootstrapMissingManifest(manifest_path.display().to_string()));
        }

        let raw = tokio::fs::read_to_string(manifest_path).await?;
        let manifest: RecoveryManifest = serde_json::from_str(&raw)?;

        let checks = if verify_environment { self.verify_environment(&manifest) } else { Vec::new() };

        Ok(format_summary(&manifest, &checks))
    }

    /// Cheap manifest peek: no environment verification, no restoration.
    pub async fn quick_status(&self, manifest_path: &Path) -> Result<QuickStatus, SessionError> {
        if !manifest_path.exists() {
            return Err(SessionError::BootstrapMissingManifest(manifest_path.display().to_string()));
        }
        let raw = tokio::fs::read_to_string(manifest_path).await?;
        let manifest: RecoveryManifest = serde_json::from_str(&raw)?;

        Ok(QuickStatus {
            project: manifest.session_metadata.project,
            phase: manifest.session_metadata.phase,
            next_task: manifest.pending_tasks.first().map(|t| t.task.clone()),
            modified_file_count: manifest.memory_pointers.modified_files.len(),
            blockers: manifest.critical_context.blockers,
        })
    }

    /// Three independently-loggable checks: git branch match, first-5
    /// modified files still exist, and `PROJECT_STATE.md` exists.
    fn verify_environment(&self, manifest: &RecoveryManifest) -> Vec<String> {
        let mut warnings = Vec::new();

        match current_git_branch() {
            Some(branch) if branch == manifest.memory_pointers.git_branch => {}
            Some(branch) => warnings.push(format!(
                "git branch mismatch: manifest expects '{}', currently on '{branch}'",
                manifest.memory_pointers.git_branch
            )),
            None => warnings.push("could not determine current git branch".to_string()),
        }

        for file in manifest.memory_pointers.modified_files.iter().take(5) {
            if !self.project_root.join(file).exists() {
                warnings.push(format!("modified file '{file}' from manifest no longer exists"));
            }
        }

        let project_state = self.project_root.join("PROJECT_STATE.md");
        if !project_state.exists() {
            warnings.push("PROJECT_STATE.md not found at project root".to_string());
        }

        for warning in &warnings {
            warn!("bootstrap verification: {warning}");
        }
        warnings
    }
}

fn current_git_branch() -> Option<String> {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let output = Command::new("git").args(["rev-parse", "--abbrev-ref", "HEAD"]).output();
        let _ = tx.send(output);
    });
    match rx.recv_timeout(Duration::from_secs(GIT_TIMEOUT_SECS)) {
        Ok(Ok(output)) if output.status.success() => Some(String::from_utf8_lossy(&output.stdout).trim().to_string()),
        _ => None,
    }
}

fn format_summary(manifest: &RecoveryManifest, checks: &[String]) -> String {
    let mut sections = Vec::new();

    sections.push(format!("## Status\n{} — {}", manifest.session_metadata.project, manifest.session_metadata.phase));
    sections.push(format!(
        "## Progress\n{} completed tasks, active state: {}",
        manifest.session_metadata.completed_count, manifest.active_state
    ));
    sections.push(format!(
        "## Next Task\n{}",
        manifest.pending_tasks.first().map(|t| t.task.as_str()).unwrap_or("(none pending)")
    ));
    sections.push(format!(
        "## Blockers\n{}",
        if manifest.critical_context.blockers.is_empty() {
            "(none)".to_string()
        } else {
            manifest.critical_context.blockers.join("\n- ")
        }
    ));
    sections.push(format!(
        "## Next Steps\n{}",
        if manifest.critical_context.next_steps.is_empty() {
            "(none)".to_string()
        } else {
            manifest.critical_context.next_steps.join("\n- ")
        }
    ));
    sections.push(format!(
        "## Modified Files\n{}",
        if manifest.memory_pointers.modified_files.is_empty() {
            "(none)".to_string()
        } else {
            manifest.memory_pointers.modified_files.join("\n- ")
        }
    ));
    sections.push(format!(
        "## Key Decisions\n{}",
        if manifest.critical_context.key_decisions.is_empty() {
            "(none)".to_string()
        } else {
            manifest.critical_context.key_decisions.join("\n- ")
        }
    ));
    sections.push(format!(
        "## Memory Pointers\nproject state file: {}\nsession logs: {}\ngit branch: {}",
        manifest.memory_pointers.project_state_file, manifest.memory_pointers.session_logs, manifest.memory_pointers.git_branch
    ));
    sections.push(format!("## Bootstrap Instructions\n{}", manifest.bootstrap_instructions));

    if !checks.is_empty() {
        sections.push(format!("## Verification Warnings\n- {}", checks.join("\n- ")));
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CriticalContext, MemoryPointers, PendingTask, SessionMetadata};

    fn sample_manifest() -> RecoveryManifest {
        RecoveryManifest {
            session_metadata: SessionMetadata { project: "fabric".to_string(), phase: "build".to_string(), completed_count: 3 },
            completed_tasks: vec!["wrote router".to_string()],
            pending_tasks: vec![PendingTask {
                task: "write bootstrap".to_string(),
                priority: "high".to_string(),
                status: "pending".to_string(),
                context: "next module".to_string(),
            }],
            active_state: "transforming".to_string(),
            critical_context: CriticalContext {
                key_decisions: vec!["use sha2 not md5".to_string()],
                blockers: vec![],
                next_steps: vec!["write DESIGN.md".to_string()],
            },
            memory_pointers: MemoryPointers {
                project_state_file: "PROJECT_STATE.md".to_string(),
                session_logs: "session.log".to_string(),
                modified_files: vec!["src/session/atomic.rs".to_string()],
                git_branch: "main".to_string(),
            },
            bootstrap_instructions: "resume from session/bootstrap.rs".to_string(),
        }
    }

    #[tokio::test]
    async fn bootstrap_session_errors_when_manifest_missing() {
        let manager = BootstrapManager::new(".");
        let err = manager.bootstrap_session(Path::new("/nonexistent/manifest.json"), false).await.unwrap_err();
        assert!(matches!(err, SessionError::BootstrapMissingManifest(_)));
    }

    #[tokio::test]
    async fn bootstrap_session_produces_sections_in_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        tokio::fs::write(&path, serde_json::to_string(&sample_manifest()).unwrap()).await.unwrap();

        let manager = BootstrapManager::new(dir.path());
        let summary = manager.bootstrap_session(&path, false).await.unwrap();

        let status_idx = summary.find("## Status").unwrap();
        let progress_idx = summary.find("## Progress").unwrap();
        let next_task_idx = summary.find("## Next Task").unwrap();
        let blockers_idx = summary.find("## Blockers").unwrap();
        let next_steps_idx = summary.find("## Next Steps").unwrap();
        let modified_idx = summary.find("## Modified Files").unwrap();
        let decisions_idx = summary.find("## Key Decisions").unwrap();
        let pointers_idx = summary.find("## Memory Pointers").unwrap();
        let instructions_idx = summary.find("## Bootstrap Instructions").unwrap();

        assert!(
            status_idx < progress_idx
                && progress_idx < next_task_idx
                && next_task_idx < blockers_idx
                && blockers_idx < next_steps_idx
                && next_steps_idx < modified_idx
                && modified_idx < decisions_idx
                && decisions_idx < pointers_idx
                && pointers_idx < instructions_idx
        );
    }

    #[tokio::test]
    async fn quick_status_reads_manifest_without_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        tokio::fs::write(&path, serde_json::to_string(&sample_manifest()).unwrap()).await.unwrap();

        let manager = BootstrapManager::new(dir.path());
        let status = manager.quick_status(&path).await.unwrap();
        assert_eq!(status.project, "fabric");
        assert_eq!(status.next_task, Some("write bootstrap".to_string()));
    }
}

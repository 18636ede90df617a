//! Hybrid Orchestrator: generate → validate → fix loop — §4.4.

use crate::error::OrchestratorError;
use crate::llm::LLMClient;
use crate::types::ValidationReport;
use crate::validation;
use std::sync::Arc;

/// Outcome of `orchestrate_with_validation`.
#[derive(Debug, Clone)]
pub struct HybridResult {
    pub result: String,
    pub validation_score: u8,
    pub iteration: u32,
    pub issues: Vec<String>,
    pub status: HybridStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HybridStatus {
    Passed,
    FailedValidation,
}

pub struct HybridOrchestrator {
    llm: Arc<LLMClient>,
    validation_threshold: u8,
}

impl HybridOrchestrator {
    pub fn new(llm: Arc<LLMClient>, validation_threshold: u8) -> Self {
        Self { llm, validation_threshold }
    }

    /// Generate, validate, and on failure re-delegate with increasingly
    /// specific fix instructions, up to `max_retries` additional attempts.
    ///
    /// `use_quality_guardian` is currently unused: it reserves the toggle
    /// for an additional guardian-model validation pass ahead of the
    /// rule-based rubric, without committing to that model choice yet.
    pub async fn orchestrate_with_validation(
        &self,
        task: &str,
        max_retries: u32,
        _use_quality_guardian: bool,
    ) -> Result<HybridResult, OrchestratorError> {
        let mut prompt = task.to_string();
        let mut last_report: Option<ValidationReport> = None;
        let mut last_output = String::new();

        for iteration in 1..=(max_retries + 1) {
            let output = self.llm.call_llm(&prompt, "hybrid_generate", None, false).await?;
            let report = validation::evaluate(&output, task);
            last_output = output.clone();

            if report.score >= self.validation_threshold {
                return Ok(HybridResult {
                    result: output,
                    validation_score: report.score,
                    iteration,
                    issues: vec![],
                    status: HybridStatus::Passed,
                });
            }

            let guidance = validation::fix_guidance(&report, iteration);
            prompt = format!(
                "{task}\n\nPrevious attempt (iteration {iteration}):\n{}\n\n{guidance}",
                truncate_for_context(&output)
            );
            last_report = Some(report);
        }

        let issues = last_report
            .as_ref()
            .map(|r| r.issues.iter().map(|i| i.issue.clone()).collect())
            .unwrap_or_default();
        let validation_score = last_report.map(|r| r.score).unwrap_or(0);

        Ok(HybridResult {
            result: last_output,
            validation_score,
            iteration: max_retries + 1,
            issues,
            status: HybridStatus::FailedValidation,
        })
    }
}

fn truncate_for_context(text: &str) -> String {
    crate::utils::truncate::truncate_text(text, crate::utils::truncate::TruncationPolicy::Bytes(2000))
}

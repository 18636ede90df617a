//! Real rule-based validation rubric — §4.4.
//!
//! The original source's validator (`hybrid_orchestrator.py::_validate_output`)
//! is a stub that always returns `score=0`, awaiting an external human/LLM
//! pass. Per §9 Open Question (a) that stub is explicitly not carried
//! forward: this module computes the score with concrete heuristics (length
//! threshold, absence of TODO markers, presence of code fences, keyword
//! overlap with the task, structural markers), shared by the Smart
//! Orchestrator's `validate_outputs`, the Hybrid Orchestrator's retry loop,
//! and the APC adapter's `validate_output` query.

use crate::types::{Risk, ValidationIssue, ValidationReport};

const TODO_MARKERS: &[&str] = &["TODO", "FIXME", "placeholder", "<result>", "<value>", "..."];

/// Score `output` against `task_description` using the Completeness(30) /
/// Correctness(40) / Production-readiness(30) rubric.
pub fn evaluate(output: &str, task_description: &str) -> ValidationReport {
    let mut issues = Vec::new();
    let mut strengths = Vec::new();

    let completeness = score_completeness(output, &mut issues, &mut strengths);
    let correctness = score_correctness(output, task_description, &mut issues, &mut strengths);
    let production_readiness = score_production_readiness(output, &mut issues, &mut strengths);

    let score = (completeness + correctness + production_readiness).clamp(0, 100) as u8;
    let production_ready = production_readiness >= 20 && issues.iter().all(|i| i.severity != Risk::High);

    let fix_instructions: Vec<String> = issues.iter().map(|i| i.fix_instruction.clone()).collect();
    let improvement_summary = if issues.is_empty() {
        "No issues found by the heuristic rubric.".to_string()
    } else {
        format!("{} issue(s) found; see fix_instructions.", issues.len())
    };

    ValidationReport {
        score,
        issues,
        strengths,
        completeness: completeness.clamp(0, 30) as u8,
        correctness: correctness.clamp(0, 40) as u8,
        production_ready,
        improvement_summary,
        fix_instructions,
    }
}

fn score_completeness(output: &str, issues: &mut Vec<ValidationIssue>, strengths: &mut Vec<String>) -> i32 {
    let mut score = 30;

    if output.trim().len() < 40 {
        score -= 15;
        issues.push(ValidationIssue {
            component: "completeness".to_string(),
            severity: Risk::High,
            issue: "Output is too short to plausibly cover the task.".to_string(),
            fix_instruction: "Expand the response: list every required component explicitly.".to_string(),
            code_example: None,
            location: None,
        });
    } else {
        strengths.push("Output has substantial length.".to_string());
    }

    let lower = output.to_lowercase();
    if TODO_MARKERS.iter().any(|m| lower.contains(&m.to_lowercase())) {
        score -= 15;
        issues.push(ValidationIssue {
            component: "completeness".to_string(),
            severity: Risk::Medium,
            issue: "Output contains TODO/placeholder markers.".to_string(),
            fix_instruction: "Replace every placeholder with an actual implementation or value.".to_string(),
            code_example: None,
            location: None,
        });
    } else {
        strengths.push("No TODO/placeholder markers found.".to_string());
    }

    score
}

fn score_correctness(
    output: &str,
    task_description: &str,
    issues: &mut Vec<ValidationIssue>,
    strengths: &mut Vec<String>,
) -> i32 {
    let mut score = 40;

    if unbalanced_braces(output) {
        score -= 20;
        issues.push(ValidationIssue {
            component: "correctness".to_string(),
            severity: Risk::High,
            issue: "Unbalanced braces/brackets/parens detected; likely a syntax error.".to_string(),
            fix_instruction: "Check every opening brace/bracket/paren has a matching close.".to_string(),
            code_example: None,
            location: None,
        });
    } else {
        strengths.push("Braces/brackets/parens are balanced.".to_string());
    }

    let task_keywords: Vec<String> = task_description
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > 4)
        .collect();
    let lower_output = output.to_lowercase();
    let overlap = task_keywords.iter().filter(|k| lower_output.contains(k.as_str())).count();
    let overlap_ratio = if task_keywords.is_empty() {
        1.0
    } else {
        overlap as f64 / task_keywords.len() as f64
    };
    if overlap_ratio < 0.2 {
        score -= 15;
        issues.push(ValidationIssue {
            component: "correctness".to_string(),
            severity: Risk::Medium,
            issue: "Output shares little vocabulary with the task description.".to_string(),
            fix_instruction: "Re-read the task requirements and address each one explicitly.".to_string(),
            code_example: None,
            location: None,
        });
    } else {
        strengths.push("Output addresses the task's stated requirements.".to_string());
    }

    if !output.contains("```") && task_description.to_lowercase().contains("function") {
        score -= 5;
        issues.push(ValidationIssue {
            component: "correctness".to_string(),
            severity: Risk::Low,
            issue: "Task implies code but output has no fenced code block.".to_string(),
            fix_instruction: "Wrap the implementation in a fenced code block.".to_string(),
            code_example: Some("```\nfn example() {}\n```".to_string()),
            location: None,
        });
    }

    score
}

fn score_production_readiness(output: &str, issues: &mut Vec<ValidationIssue>, strengths: &mut Vec<String>) -> i32 {
    let mut score = 30;
    let lower = output.to_lowercase();

    let has_error_handling = ["result", "error", "err(", "raise", "except", "try", "catch"]
        .iter()
        .any(|k| lower.contains(k));
    if !has_error_handling {
        score -= 10;
        issues.push(ValidationIssue {
            component: "production_readiness".to_string(),
            severity: Risk::Medium,
            issue: "No visible error handling.".to_string(),
            fix_instruction: "Add explicit error handling for the operation's failure modes.".to_string(),
            code_example: None,
            location: None,
        });
    } else {
        strengths.push("Error handling is present.".to_string());
    }

    let has_tests = ["assert", "test", "pytest", "#[test]"].iter().any(|k| lower.contains(k));
    if !has_tests {
        score -= 10;
        issues.push(ValidationIssue {
            component: "production_readiness".to_string(),
            severity: Risk::Medium,
            issue: "No tests or assertions detected.".to_string(),
            fix_instruction: "Add at least one test or assertion demonstrating correctness.".to_string(),
            code_example: None,
            location: None,
        });
    } else {
        strengths.push("Tests or assertions are present.".to_string());
    }

    if output.lines().count() < 3 {
        score -= 10;
        issues.push(ValidationIssue {
            component: "production_readiness".to_string(),
            severity: Risk::Low,
            issue: "Output has no discernible structure (single line).".to_string(),
            fix_instruction: "Structure the output across multiple lines/sections.".to_string(),
            code_example: None,
            location: None,
        });
    }

    score
}

fn unbalanced_braces(text: &str) -> bool {
    let mut stack = Vec::new();
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' => if stack.pop() != Some('(') { return true; },
            ']' => if stack.pop() != Some('[') { return true; },
            '}' => if stack.pop() != Some('{') { return true; },
            _ => {}
        }
    }
    !stack.is_empty()
}

/// Generate progressively more specific fix guidance for retry `iteration`
/// (1-indexed), per §4.4's iterative fix instruction policy.
pub fn fix_guidance(report: &ValidationReport, iteration: u32) -> String {
    match iteration {
        1 => {
            let missing: Vec<&str> = report.issues.iter().map(|i| i.component.as_str()).collect();
            format!("Broad fixes needed in: {}. Address every missing component.", missing.join(", "))
        }
        2 => {
            let mut lines = vec!["Exact issues to fix:".to_string()];
            for issue in &report.issues {
                lines.push(format!("- {}: {}", issue.issue, issue.fix_instruction));
                if let Some(example) = &issue.code_example {
                    lines.push(format!("  example: {example}"));
                }
            }
            lines.join("\n")
        }
        _ => {
            let mut lines = vec!["Itemized exact corrections:".to_string()];
            for (i, issue) in report.issues.iter().enumerate() {
                let location = issue.location.as_deref().unwrap_or("unspecified location");
                lines.push(format!("{}. [{}] {} -> {}", i + 1, location, issue.issue, issue.fix_instruction));
            }
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_output_scores_high() {
        let output = "```rust\nfn validate_email(email: &str) -> bool {\n    if email.is_empty() { return Err(\"bad\"); }\n    email.contains('@')\n}\n```\n#[test]\nfn test_validate_email() { assert!(validate_email(\"a@b.com\")); }";
        let report = evaluate(output, "implement a function validate_email with tests");
        assert!(report.score >= 70, "score was {}", report.score);
    }

    #[test]
    fn placeholder_output_scores_low() {
        let report = evaluate("TODO: implement this later", "implement a function validate_email with tests");
        assert!(report.score < 50);
        assert!(!report.issues.is_empty());
    }

    #[test]
    fn fix_guidance_escalates_specificity_by_iteration() {
        let report = evaluate("short", "implement something");
        let g1 = fix_guidance(&report, 1);
        let g2 = fix_guidance(&report, 2);
        let g3 = fix_guidance(&report, 3);
        assert!(g1.starts_with("Broad fixes"));
        assert!(g2.starts_with("Exact issues"));
        assert!(g3.starts_with("Itemized"));
    }
}

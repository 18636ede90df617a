//! SessionMonitor: context-pressure tracking — §4.8.
//!
//! Token estimate is `len(text)/4`, matching the original source's
//! `session_monitor.py`; the 4-tier pressure classification and the
//! `status_report()` formatted block are supplemented per §2b.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pressure {
    Normal,
    Elevated,
    Critical,
    Emergency,
}

impl Pressure {
    fn tag(&self) -> &'static str {
        match self {
            Pressure::Normal => "NORMAL",
            Pressure::Elevated => "ELEVATED",
            Pressure::Critical => "CRITICAL",
            Pressure::Emergency => "EMERGENCY",
        }
    }
}

pub struct SessionMonitor {
    context_limit: usize,
    warning_threshold: f64,
    tokens_used: usize,
    started_at: Instant,
    last_checkpoint_at: Instant,
}

impl SessionMonitor {
    pub fn new(context_limit: usize) -> Self {
        Self::with_warning_threshold(context_limit, 0.8)
    }

    pub fn with_warning_threshold(context_limit: usize, warning_threshold: f64) -> Self {
        let now = Instant::now();
        Self { context_limit, warning_threshold, tokens_used: 0, started_at: now, last_checkpoint_at: now }
    }

    /// Estimate tokens as `len(text)/4` and store usage.
    pub fn track(&mut self, text: &str) -> Pressure {
        self.tokens_used += text.len() / 4;
        self.pressure()
    }

    pub fn mark_checkpoint(&mut self) {
        self.last_checkpoint_at = Instant::now();
    }

    fn usage_fraction(&self) -> f64 {
        if self.context_limit == 0 {
            return 1.0;
        }
        self.tokens_used as f64 / self.context_limit as f64
    }

    pub fn pressure(&self) -> Pressure {
        let fraction = self.usage_fraction();
        if fraction >= 0.90 {
            Pressure::Emergency
        } else if fraction >= 0.80 {
            Pressure::Critical
        } else if fraction >= 0.60 {
            Pressure::Elevated
        } else {
            Pressure::Normal
        }
    }

    pub fn should_prepare_recovery(&self) -> bool {
        matches!(self.pressure(), Pressure::Critical | Pressure::Emergency)
    }

    pub fn should_force_recovery(&self) -> bool {
        matches!(self.pressure(), Pressure::Emergency)
    }

    /// Formatted multi-line status block, supplemented per §2b from
    /// `session_monitor.py::get_status_report`.
    pub fn status_report(&self) -> String {
        let pressure = self.pressure();
        let minutes_active = self.started_at.elapsed().as_secs() / 60;
        let since_checkpoint = self.last_checkpoint_at.elapsed().as_secs() / 60;

        let mut report = format!(
            "[{}] token usage: {:.1}% ({}/{})\nminutes active: {minutes_active}\nminutes since last checkpoint: {since_checkpoint}",
            pressure.tag(),
            self.usage_fraction() * 100.0,
            self.tokens_used,
            self.context_limit,
        );

        if self.should_prepare_recovery() {
            report.push_str("\nwarning: context pressure is high, recovery should be prepared");
        }
        if self.should_force_recovery() {
            report.push_str("\nwarning: context pressure is critical, recovery is being forced");
        }

        report
    }

    pub fn warning_threshold(&self) -> f64 {
        self.warning_threshold
    }

    pub fn tokens_used(&self) -> usize {
        self.tokens_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_tiers_match_fractions() {
        let mut monitor = SessionMonitor::new(1000);
        assert_eq!(monitor.pressure(), Pressure::Normal);

        monitor.track(&"x".repeat(4 * 650));
        assert_eq!(monitor.pressure(), Pressure::Elevated);

        let mut monitor = SessionMonitor::new(1000);
        monitor.track(&"x".repeat(4 * 850));
        assert_eq!(monitor.pressure(), Pressure::Critical);
        assert!(monitor.should_prepare_recovery());
        assert!(!monitor.should_force_recovery());

        let mut monitor = SessionMonitor::new(1000);
        monitor.track(&"x".repeat(4 * 950));
        assert_eq!(monitor.pressure(), Pressure::Emergency);
        assert!(monitor.should_force_recovery());
    }

    #[test]
    fn status_report_contains_pressure_tag() {
        let mut monitor = SessionMonitor::new(1000);
        monitor.track(&"x".repeat(4 * 900));
        let report = monitor.status_report();
        assert!(report.contains("EMERGENCY"));
        assert!(report.contains("warning"));
    }
}

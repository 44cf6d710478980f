//! Human-readable run reports.

use chrono::{DateTime, Utc};

use basketflow_baskets::BasketKey;
use basketflow_core::{CompanyId, RunId};

use crate::applier::RunMode;

/// How many per-customer lines a dry-run surfaces before eliding the rest.
pub const DRY_RUN_PREVIEW_LIMIT: usize = 20;

/// Report block for one scanned basket config.
#[derive(Debug, Clone)]
pub struct ConfigSection {
    pub basket_name: String,
    pub basket_key: BasketKey,
    pub fail_after_days: i64,
    /// Overdue records selected for this config.
    pub matched: usize,
    pub lines: Vec<String>,
    /// Lines elided by the dry-run preview cap.
    pub elided: usize,
}

/// Outcome of one batch transfer run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    pub company: CompanyId,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub sections: Vec<ConfigSection>,
    /// Records accepted by the planner (planned or unresolvable).
    pub processed: usize,
    /// Transitions committed (live) or simulated (dry-run).
    pub transferred: usize,
    /// Unresolvable plans plus failed commits.
    pub errors: usize,
}

impl RunReport {
    pub fn new(run_id: RunId, company: CompanyId, mode: RunMode, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            company,
            mode,
            started_at,
            sections: Vec::new(),
            processed: 0,
            transferred: 0,
            errors: 0,
        }
    }
}

impl core::fmt::Display for RunReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "===========================================")?;
        writeln!(f, "Monthly Basket Transfer")?;
        writeln!(f, "Run:     {}", self.run_id)?;
        writeln!(f, "Date:    {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "Company: {}", self.company)?;
        writeln!(f, "Mode:    {}", self.mode)?;
        writeln!(f, "===========================================")?;
        for section in &self.sections {
            writeln!(f)?;
            writeln!(
                f,
                "[{}] fail after {} days",
                section.basket_name, section.fail_after_days
            )?;
            writeln!(f, "  matched {} customers", section.matched)?;
            for line in &section.lines {
                writeln!(f, "  {line}")?;
            }
            if section.elided > 0 {
                writeln!(f, "  ... {} more not shown", section.elided)?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Summary:")?;
        writeln!(f, "  Processed:   {}", self.processed)?;
        writeln!(f, "  Transferred: {}", self.transferred)?;
        writeln!(f, "  Errors:      {}", self.errors)?;
        writeln!(f, "===========================================")
    }
}

/// Outcome of one bootstrap assignment run.
#[derive(Debug)]
pub struct BootstrapReport {
    pub run_id: RunId,
    pub company: CompanyId,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    /// Records selected for (re-)seeding.
    pub scanned: usize,
    pub assigned: usize,
    pub errors: usize,
    pub lines: Vec<String>,
    pub elided: usize,
}

impl BootstrapReport {
    pub fn new(run_id: RunId, company: CompanyId, mode: RunMode, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            company,
            mode,
            started_at,
            scanned: 0,
            assigned: 0,
            errors: 0,
            lines: Vec::new(),
            elided: 0,
        }
    }
}

impl core::fmt::Display for BootstrapReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "===========================================")?;
        writeln!(f, "Initial Basket Assignment")?;
        writeln!(f, "Run:     {}", self.run_id)?;
        writeln!(f, "Date:    {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "Company: {}", self.company)?;
        writeln!(f, "Mode:    {}", self.mode)?;
        writeln!(f, "===========================================")?;
        writeln!(f)?;
        for line in &self.lines {
            writeln!(f, "  {line}")?;
        }
        if self.elided > 0 {
            writeln!(f, "  ... {} more not shown", self.elided)?;
        }
        writeln!(f)?;
        writeln!(f, "Summary:")?;
        writeln!(f, "  Scanned:  {}", self.scanned)?;
        writeln!(f, "  Assigned: {}", self.assigned)?;
        writeln!(f, "  Errors:   {}", self.errors)?;
        writeln!(f, "===========================================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_report_renders_sections_and_summary() {
        let mut report = RunReport::new(
            RunId::new(),
            CompanyId::new(1),
            RunMode::DryRun,
            Utc::now(),
        );
        report.sections.push(ConfigSection {
            basket_name: "Month 1".to_string(),
            basket_key: BasketKey::from("month_1"),
            fail_after_days: 30,
            matched: 2,
            lines: vec!["- #1 A B: 40d in basket, 75d since order -> Pool [on_fail]".to_string()],
            elided: 1,
        });
        report.processed = 2;
        report.transferred = 2;

        let rendered = report.to_string();
        assert!(rendered.contains("Mode:    DRY RUN"));
        assert!(rendered.contains("[Month 1] fail after 30 days"));
        assert!(rendered.contains("matched 2 customers"));
        assert!(rendered.contains("... 1 more not shown"));
        assert!(rendered.contains("Processed:   2"));
        assert!(rendered.contains("Transferred: 2"));
        assert!(rendered.contains("Errors:      0"));
    }
}

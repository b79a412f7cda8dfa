//! Persistence layer.
//!
//! Each scan is written out as a `ScanReport` JSON file so downstream tools
//! (alerting, bet placement, dashboards) can pick it up. Only the latest
//! report is kept; history is the consumer's job.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DEFAULT_REPORT_PATH;
use crate::engine::SlateOutcome;
use crate::types::{Opportunity, OpportunityKind};

/// Everything one scan produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub games_analyzed: usize,
    pub games_skipped: usize,
    pub total_stake: f64,
    pub opportunities: Vec<Opportunity>,
}

/// Opportunity counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub ev: usize,
    pub arb2: usize,
    pub arb3: usize,
    pub middle: usize,
}

impl fmt::Display for KindCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} arb2, {} arb3, {} ev, {} middle",
            self.arb2, self.arb3, self.ev, self.middle
        )
    }
}

impl ScanReport {
    pub fn from_outcome(outcome: SlateOutcome, total_stake: f64, generated_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at,
            games_analyzed: outcome.games_analyzed,
            games_skipped: outcome.games_skipped,
            total_stake,
            opportunities: outcome.opportunities,
        }
    }

    pub fn counts(&self) -> KindCounts {
        let mut counts = KindCounts::default();
        for opp in &self.opportunities {
            match opp.kind() {
                OpportunityKind::Ev => counts.ev += 1,
                OpportunityKind::Arb2 => counts.arb2 += 1,
                OpportunityKind::Arb3 => counts.arb3 += 1,
                OpportunityKind::Middle => counts.middle += 1,
            }
        }
        counts
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scan {} at {}: {} games ({} skipped), {} opportunities ({})",
            self.run_id,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.games_analyzed,
            self.games_skipped,
            self.opportunities.len(),
            self.counts()
        )
    }
}

/// Save a scan report to a JSON file.
pub fn save_report(report: &ScanReport, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_REPORT_PATH);
    let json = serde_json::to_string_pretty(report).context("Failed to serialise scan report")?;

    std::fs::write(path, &json).context(format!("Failed to write report to {path}"))?;

    debug!(path, run_id = %report.run_id, opportunities = report.opportunities.len(), "Report saved");
    Ok(())
}

/// Load a scan report from a JSON file.
/// Returns None if the file doesn't exist.
pub fn load_report(path: Option<&str>) -> Result<Option<ScanReport>> {
    let path = path.unwrap_or(DEFAULT_REPORT_PATH);

    if !Path::new(path).exists() {
        info!(path, "No saved report found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path).context(format!("Failed to read report from {path}"))?;

    let report: ScanReport =
        serde_json::from_str(&json).context(format!("Failed to parse report from {path}"))?;

    info!(
        path,
        run_id = %report.run_id,
        opportunities = report.opportunities.len(),
        "Report loaded from disk"
    );

    Ok(Some(report))
}

/// Delete the report file.
pub fn delete_report(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_REPORT_PATH);
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete report file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

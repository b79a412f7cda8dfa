//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. The
//! `[engine]` table maps straight onto `EngineConfig`; every key there is
//! optional.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;

use crate::strategy::EngineConfig;

/// Default report file written after each scan.
pub const DEFAULT_REPORT_PATH: &str = "linewatch_report.json";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub scan: ScanConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    /// JSON slate file: an array of games, or an object with a `games` array.
    pub slate_path: String,
    /// Stake split across the legs of each arb and middle.
    #[serde(default = "default_total_stake")]
    pub total_stake: f64,
    /// Seconds between scans. 0 runs a single scan and exits.
    #[serde(default)]
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_report_path")]
    pub report_path: String,
    /// How many opportunities to log per scan.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: default_report_path(),
            top_n: default_top_n(),
        }
    }
}

fn default_total_stake() -> f64 {
    100.0
}

fn default_report_path() -> String {
    DEFAULT_REPORT_PATH.to_string()
}

fn default_top_n() -> usize {
    10
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate().context("Invalid [engine] section")?;
        if self.scan.slate_path.trim().is_empty() {
            bail!("scan.slate_path must not be empty");
        }
        if !(self.scan.total_stake.is_finite() && self.scan.total_stake > 0.0) {
            bail!("scan.total_stake must be positive, got {}", self.scan.total_stake);
        }
        if self.output.report_path.trim().is_empty() {
            bail!("output.report_path must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{ConsensusMethod, PushRiskPolicy};

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = AppConfig::parse(
            r#"
            [scan]
            slate_path = "slate.json"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.scan.slate_path, "slate.json");
        assert!((cfg.scan.total_stake - 100.0).abs() < 1e-12);
        assert_eq!(cfg.scan.interval_secs, 0);
        assert_eq!(cfg.output.report_path, DEFAULT_REPORT_PATH);
        assert_eq!(cfg.output.top_n, 10);
        assert_eq!(cfg.engine.min_books, 2);
        assert_eq!(cfg.engine.stale_window_ms, 300_000);
    }

    #[test]
    fn test_full_config() {
        let cfg = AppConfig::parse(
            r#"
            [engine]
            ev_threshold_pct = 3.5
            stale_window_ms = 60000
            min_books = 3
            push_risk = "ignore"

            [engine.consensus]
            method = "median"

            [scan]
            slate_path = "data/today.json"
            total_stake = 250.0
            interval_secs = 30

            [output]
            report_path = "out/report.json"
            top_n = 5
            "#,
        )
        .unwrap();

        assert!((cfg.engine.ev_threshold_pct - 3.5).abs() < 1e-12);
        assert_eq!(cfg.engine.stale_window_ms, 60_000);
        assert_eq!(cfg.engine.min_books, 3);
        assert_eq!(cfg.engine.push_risk, PushRiskPolicy::Ignore);
        assert!(matches!(cfg.engine.consensus, ConsensusMethod::Median));
        assert_eq!(cfg.scan.interval_secs, 30);
        assert_eq!(cfg.output.top_n, 5);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let bad_stake = r#"
            [scan]
            slate_path = "slate.json"
            total_stake = 0.0
        "#;
        assert!(AppConfig::parse(bad_stake).is_err());

        let bad_engine = r#"
            [engine]
            min_books = 0
            [scan]
            slate_path = "slate.json"
        "#;
        assert!(AppConfig::parse(bad_engine).is_err());

        let missing_scan = r#"
            [engine]
            min_books = 2
        "#;
        assert!(AppConfig::parse(missing_scan).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/tmp/linewatch_no_such_config_12345.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

//! LINEWATCH — multi-book odds analytics engine
//!
//! Entry point. Loads configuration, initialises structured logging, and
//! scans the configured slate file either once or on a fixed interval with
//! graceful shutdown. Each scan is persisted as a JSON report.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use linewatch::config::{self, AppConfig};
use linewatch::engine::Engine;
use linewatch::storage::{self, ScanReport};

const BANNER: &str = r#"
 _     ___ _   _ _______        ___  _____ ____ _   _
| |   |_ _| \ | | ____\ \      / / \|_   _/ ___| | | |
| |    | ||  \| |  _|  \ \ /\ / / _ \ | || |   | |_| |
| |___ | || |\  | |___  \ V  V / ___ \| || |___|  _  |
|_____|___|_| \_|_____|  \_/\_/_/   \_\_| \____|_| |_|

  +EV / Arbitrage / Middles across books
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");

    let engine = Engine::new(cfg.engine.clone())?;
    let engine_cfg = engine.config();
    info!(
        config = %config_path,
        slate = %cfg.scan.slate_path,
        total_stake = cfg.scan.total_stake,
        interval_secs = cfg.scan.interval_secs,
        ev_threshold_pct = engine_cfg.ev_threshold_pct,
        stale_window_ms = engine_cfg.stale_window_ms,
        min_books = engine_cfg.min_books,
        consensus = ?engine_cfg.consensus,
        push_risk = ?engine_cfg.push_risk,
        "LINEWATCH starting up"
    );

    if cfg.scan.interval_secs == 0 {
        let report = run_scan(&engine, &cfg)?;
        log_report(&report, cfg.output.top_n);
        return Ok(());
    }

    // -- Main loop -------------------------------------------------------

    let mut interval = tokio::time::interval(Duration::from_secs(cfg.scan.interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.scan.interval_secs,
        "Entering scan loop. Press Ctrl+C to stop."
    );

    let mut scans: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                scans += 1;
                match run_scan(&engine, &cfg) {
                    Ok(report) => log_report(&report, cfg.output.top_n),
                    Err(e) => error!(scan = scans, error = %e, "Scan failed — continuing to next"),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(scans, "LINEWATCH shut down cleanly.");
    Ok(())
}

/// Read the slate, run the engine over it and persist the report.
fn run_scan(engine: &Engine, cfg: &AppConfig) -> Result<ScanReport> {
    let raw_games = read_slate(&cfg.scan.slate_path)?;
    info!(games = raw_games.len(), "Slate loaded");

    let now = Utc::now();
    let outcome = engine.process_slate_at(&raw_games, cfg.scan.total_stake, now);
    let report = ScanReport::from_outcome(outcome, cfg.scan.total_stake, now);

    storage::save_report(&report, Some(&cfg.output.report_path))?;
    Ok(report)
}

/// A slate file is either a bare array of games or `{ "games": [...] }`.
fn read_slate(path: &str) -> Result<Vec<Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read slate file: {path}"))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse slate file: {path}"))?;

    match value {
        Value::Array(games) => Ok(games),
        Value::Object(mut obj) => match obj.remove("games") {
            Some(Value::Array(games)) => Ok(games),
            _ => bail!("Slate file {path} has no \"games\" array"),
        },
        _ => bail!("Slate file {path} must be a JSON array or an object with \"games\""),
    }
}

/// Log a scan summary and the top opportunities.
fn log_report(report: &ScanReport, top_n: usize) {
    info!(
        run_id = %report.run_id,
        analyzed = report.games_analyzed,
        skipped = report.games_skipped,
        opportunities = report.opportunities.len(),
        counts = %report.counts(),
        "Scan complete"
    );

    for (rank, opp) in report.opportunities.iter().take(top_n).enumerate() {
        let stakes = opp
            .rounded_stakes()
            .iter()
            .map(|s| format!("${s}"))
            .collect::<Vec<_>>()
            .join(" / ");
        info!(rank = rank + 1, kind = %opp.kind(), stakes = %stakes, "{opp}");
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linewatch=info"));

    let json_logging = std::env::var("LINEWATCH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

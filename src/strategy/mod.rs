//! Strategy layer: fair-price building and the four opportunity detectors.
//!
//! Every detector is a pure function of the snapshots it is handed, the
//! engine configuration and the instant `now` used to judge staleness.
//! "No opportunity" is a normal answer and is returned as `None`.

pub mod arb;
pub mod ev;
pub mod fair;
pub mod middle;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::odds::stats;
use crate::types::{is_integer_line, BookQuote, EngineError, OutcomeId};

// ---------------------------------------------------------------------------
// Configuration (defaults, overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// How per-book fair probabilities are combined into one consensus value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ConsensusMethod {
    /// Mean after trimming `trim_fraction` of the books from each end.
    TrimmedMean { trim_fraction: f64 },
    Median,
}

impl ConsensusMethod {
    pub fn aggregate(&self, values: &[f64]) -> f64 {
        match self {
            ConsensusMethod::TrimmedMean { trim_fraction } => {
                stats::trimmed_mean(values, *trim_fraction)
            }
            ConsensusMethod::Median => stats::median(values),
        }
    }
}

impl Default for ConsensusMethod {
    fn default() -> Self {
        ConsensusMethod::TrimmedMean { trim_fraction: 0.2 }
    }
}

/// When arbitrage and middle legs are flagged as able to push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushRiskPolicy {
    /// A leg whose line is an integer can push; moneylines never do.
    #[default]
    ExactLine,
    /// Never flag push risk.
    Ignore,
}

impl PushRiskPolicy {
    pub fn leg_can_push(&self, outcome: &OutcomeId) -> bool {
        match self {
            PushRiskPolicy::Ignore => false,
            PushRiskPolicy::ExactLine => outcome.line().is_some_and(is_integer_line),
        }
    }

    pub fn any_leg_can_push(&self, outcomes: &[&OutcomeId]) -> bool {
        outcomes.iter().any(|o| self.leg_can_push(o))
    }
}

/// Tunables shared by every detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum EV percentage to report (exclusive).
    pub ev_threshold_pct: f64,
    /// Quotes older than this are ignored everywhere.
    pub stale_window_ms: u64,
    /// Minimum books contributing to a fair price.
    pub min_books: usize,
    pub consensus: ConsensusMethod,
    pub push_risk: PushRiskPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ev_threshold_pct: 2.0,
            stale_window_ms: 5 * 60 * 1000,
            min_books: 2,
            consensus: ConsensusMethod::default(),
            push_risk: PushRiskPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Reject values no detector can work with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.ev_threshold_pct.is_finite() && self.ev_threshold_pct > 0.0) {
            return Err(EngineError::Config(format!(
                "ev_threshold_pct must be a positive number, got {}",
                self.ev_threshold_pct
            )));
        }
        if self.stale_window_ms == 0 {
            return Err(EngineError::Config("stale_window_ms must be positive".into()));
        }
        if self.min_books < 1 {
            return Err(EngineError::Config("min_books must be at least 1".into()));
        }
        if let ConsensusMethod::TrimmedMean { trim_fraction } = self.consensus {
            if !(0.0..0.5).contains(&trim_fraction) {
                return Err(EngineError::Config(format!(
                    "trim_fraction must be in [0, 0.5), got {trim_fraction}"
                )));
            }
        }
        Ok(())
    }

    /// Whether a quote is inside the staleness window at `now`.
    pub fn is_fresh(&self, quote: &BookQuote, now: DateTime<Utc>) -> bool {
        !quote.is_stale(now, self.stale_window_ms)
    }
}

// ---------------------------------------------------------------------------
// Quote selection
// ---------------------------------------------------------------------------

/// Highest-decimal fresh quote; the earliest wins a tie.
pub fn best_quote<'a>(
    quotes: &'a [BookQuote],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<&'a BookQuote> {
    let mut best: Option<&BookQuote> = None;
    for q in quotes.iter().filter(|q| config.is_fresh(q, now)) {
        if best.map_or(true, |b| q.decimal() > b.decimal()) {
            best = Some(q);
        }
    }
    best
}

/// First fresh quote from `book`.
pub fn quote_for_book<'a>(
    quotes: &'a [BookQuote],
    book: &str,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<&'a BookQuote> {
    quotes
        .iter()
        .find(|q| q.book() == book && config.is_fresh(q, now))
}

/// Valid total stake for a split.
pub(crate) fn is_valid_stake(total_stake: f64) -> bool {
    total_stake.is_finite() && total_stake > 0.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

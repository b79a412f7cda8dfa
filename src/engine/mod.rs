//! Core engine: pairs a game's outcome snapshots, runs every detector and
//! merges the results into one priority-ordered list.

pub mod slate;

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::debug;

use crate::strategy::arb::{detect_arb2, detect_arb3};
use crate::strategy::ev::detect_ev;
use crate::strategy::middle::{detect_middle_spreads, detect_middle_totals};
use crate::strategy::EngineConfig;
use crate::types::{
    BookQuote, EngineError, Opportunity, OutcomeId, OutcomeSnapshot, ThreeWaySide, TotalSide,
    TwoWaySide,
};
pub use slate::{process_slate, SlateOutcome};

// ---------------------------------------------------------------------------
// Game analysis
// ---------------------------------------------------------------------------

/// Run every detector over one game's snapshots.
///
/// Snapshots are grouped by market and line, each outcome is paired with
/// its logical opposite (home↔away, over↔under, or the other two legs of a
/// three-way market) and the EV, arbitrage and middle detectors run on each
/// pairing. Snapshots belonging to another game are ignored.
pub fn analyze_game(
    game_id: &str,
    snapshots: &[OutcomeSnapshot],
    total_stake: f64,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Vec<Opportunity> {
    let merged = merge_snapshots(game_id, snapshots);

    let mut ml_home = None;
    let mut ml_away = None;
    let mut three_way: [Option<&OutcomeSnapshot>; 3] = [None, None, None];
    let mut spread_home = Vec::new();
    let mut spread_away = Vec::new();
    let mut overs = Vec::new();
    let mut unders = Vec::new();

    for snap in &merged {
        match snap.outcome {
            OutcomeId::Moneyline { side: TwoWaySide::Home } => ml_home = Some(snap),
            OutcomeId::Moneyline { side: TwoWaySide::Away } => ml_away = Some(snap),
            OutcomeId::Moneyline3Way { side } => {
                let idx = match side {
                    ThreeWaySide::Home => 0,
                    ThreeWaySide::Draw => 1,
                    ThreeWaySide::Away => 2,
                };
                three_way[idx] = Some(snap);
            }
            OutcomeId::Spread { side: TwoWaySide::Home, .. } => spread_home.push(snap),
            OutcomeId::Spread { side: TwoWaySide::Away, .. } => spread_away.push(snap),
            OutcomeId::Total { side: TotalSide::Over, .. } => overs.push(snap),
            OutcomeId::Total { side: TotalSide::Under, .. } => unders.push(snap),
        }
    }

    let mut results = Vec::new();

    if let (Some(home), Some(away)) = (ml_home, ml_away) {
        analyze_pair(game_id, home, away, total_stake, config, now, &mut results);
    }

    if let [Some(home), Some(draw), Some(away)] = three_way {
        let legs = [home, draw, away];
        for (i, snap) in legs.iter().enumerate() {
            let others: Vec<&[BookQuote]> = legs
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, s)| s.quotes.as_slice())
                .collect();
            ev_for_side(game_id, snap, &others, config, now, &mut results);
        }
        if let Some(arb) = detect_arb3(game_id, home, draw, away, total_stake, config, now) {
            results.push(Opportunity::Arb3(arb));
        }
    }

    for home in &spread_home {
        for away in &spread_away {
            if home.outcome.is_opposite(&away.outcome) {
                analyze_pair(game_id, home, away, total_stake, config, now, &mut results);
            }
            if let Some(m) = detect_middle_spreads(game_id, home, away, total_stake, config, now) {
                results.push(Opportunity::Middle(m));
            }
        }
    }

    for over in &overs {
        for under in &unders {
            if over.outcome.is_opposite(&under.outcome) {
                analyze_pair(game_id, over, under, total_stake, config, now, &mut results);
            }
            if let Some(m) = detect_middle_totals(game_id, over, under, total_stake, config, now) {
                results.push(Opportunity::Middle(m));
            }
        }
    }

    debug!(
        game_id,
        snapshots = merged.len(),
        opportunities = results.len(),
        "Game analysed"
    );

    results
}

/// EV on both sides of a two-way pairing plus the two-leg arbitrage.
fn analyze_pair(
    game_id: &str,
    a: &OutcomeSnapshot,
    b: &OutcomeSnapshot,
    total_stake: f64,
    config: &EngineConfig,
    now: DateTime<Utc>,
    results: &mut Vec<Opportunity>,
) {
    ev_for_side(game_id, a, &[b.quotes.as_slice()], config, now, results);
    ev_for_side(game_id, b, &[a.quotes.as_slice()], config, now, results);
    if let Some(arb) = detect_arb2(game_id, a, b, total_stake, config, now) {
        results.push(Opportunity::Arb2(arb));
    }
}

/// Evaluate every book quoting `snap` against the consensus of the others.
fn ev_for_side(
    game_id: &str,
    snap: &OutcomeSnapshot,
    other_sides: &[&[BookQuote]],
    config: &EngineConfig,
    now: DateTime<Utc>,
    results: &mut Vec<Opportunity>,
) {
    for book in snap.books() {
        if let Some(ev) = detect_ev(game_id, &snap.outcome, &snap.quotes, other_sides, book, config, now) {
            results.push(Opportunity::Ev(ev));
        }
    }
}

/// Keep this game's snapshots, folding duplicates of the same outcome into
/// one snapshot.
fn merge_snapshots(game_id: &str, snapshots: &[OutcomeSnapshot]) -> Vec<OutcomeSnapshot> {
    let mut merged: Vec<OutcomeSnapshot> = Vec::new();
    for snap in snapshots.iter().filter(|s| s.game_id == game_id) {
        match merged.iter_mut().find(|m| m.outcome.same_as(&snap.outcome)) {
            Some(existing) => existing.quotes.extend(snap.quotes.iter().cloned()),
            None => merged.push(snap.clone()),
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Merge & prioritise
// ---------------------------------------------------------------------------

/// Flatten result lists and order them: arbitrage before EV before middles,
/// then by magnitude (ROI / EV%) descending, then by game start ascending.
/// Games with no known start time sort after those with one.
pub fn merge_and_prioritize<F>(result_lists: Vec<Vec<Opportunity>>, start_time_of: F) -> Vec<Opportunity>
where
    F: Fn(&str) -> Option<DateTime<Utc>>,
{
    let mut all: Vec<Opportunity> = result_lists.into_iter().flatten().collect();
    all.sort_by(|a, b| {
        a.priority()
            .cmp(&b.priority())
            .then_with(|| b.magnitude().total_cmp(&a.magnitude()))
            .then_with(|| {
                match (start_time_of(a.game_id()), start_time_of(b.game_id())) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            })
    });
    all
}

// ---------------------------------------------------------------------------
// Engine facade
// ---------------------------------------------------------------------------

/// Holds a validated configuration and exposes the entry points with it
/// bound. Stateless apart from the configuration; safe to share across
/// threads.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyse one game with staleness judged at the current wall-clock time.
    pub fn analyze_game(&self, game_id: &str, snapshots: &[OutcomeSnapshot], total_stake: f64) -> Vec<Opportunity> {
        analyze_game(game_id, snapshots, total_stake, &self.config, Utc::now())
    }

    /// Process a raw slate at the current wall-clock time.
    pub fn process_slate(&self, raw_games: &[serde_json::Value], total_stake: f64) -> SlateOutcome {
        self.process_slate_at(raw_games, total_stake, Utc::now())
    }

    pub fn process_slate_at(
        &self,
        raw_games: &[serde_json::Value],
        total_stake: f64,
        now: DateTime<Utc>,
    ) -> SlateOutcome {
        slate::process_slate(raw_games, total_stake, &self.config, now)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

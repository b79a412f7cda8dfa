//! Slate ingestion.
//!
//! Maps the external per-game / per-market / per-outcome quote feed into
//! `OutcomeSnapshot`s and runs the engine over every game. Malformed pieces
//! are dropped at the smallest granularity possible: a bad quote loses the
//! quote, a bad market loses the market, and a game with nothing usable is
//! skipped. Nothing here fails the whole batch.
//!
//! Accepted game shape:
//!
//! ```json
//! { "id": "g1", "commence_time": "2026-10-16T18:00:00Z",
//!   "markets": [ { "key": "spreads",
//!                  "outcomes": [ { "side": "home", "line": -3.5,
//!                                  "quotes": [ { "book": "fanduel", "price": -110,
//!                                                "last_update": "2026-10-16T17:55:00Z" } ] } ] } ] }
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::{analyze_game, merge_and_prioritize};
use crate::strategy::EngineConfig;
use crate::types::{BookQuote, MarketKind, Opportunity, OutcomeId, OutcomeSnapshot};

// ---------------------------------------------------------------------------
// Raw feed shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawGame {
    #[serde(alias = "game_id")]
    id: Option<String>,
    #[serde(default, alias = "start_time")]
    commence_time: Option<String>,
    #[serde(default)]
    markets: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    #[serde(alias = "market")]
    key: String,
    #[serde(default)]
    outcomes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawOutcome {
    #[serde(alias = "name")]
    side: String,
    #[serde(default, alias = "point")]
    line: Option<f64>,
    #[serde(default)]
    quotes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(alias = "bookmaker")]
    book: String,
    #[serde(alias = "odds")]
    price: f64,
    #[serde(alias = "last_updated", alias = "updated_at")]
    last_update: RawTimestamp,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            RawTimestamp::Text(s) => parse_time(s),
        }
    }
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Parsed games
// ---------------------------------------------------------------------------

/// One game mapped into engine inputs.
#[derive(Debug, Clone)]
pub struct SlateGame {
    pub id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub snapshots: Vec<OutcomeSnapshot>,
}

/// Result of processing a whole slate.
#[derive(Debug, Clone, Default)]
pub struct SlateOutcome {
    /// Every opportunity found, already priority-ordered.
    pub opportunities: Vec<Opportunity>,
    pub games_analyzed: usize,
    pub games_skipped: usize,
}

/// Map one raw game. `None` when the game is unusable.
pub fn parse_game(raw: &Value) -> Option<SlateGame> {
    let game: RawGame = match serde_json::from_value(raw.clone()) {
        Ok(g) => g,
        Err(e) => {
            debug!(error = %e, "Game does not match the feed shape");
            return None;
        }
    };

    let id = game.id.filter(|id| !id.trim().is_empty())?;
    let markets = game.markets.filter(|m| !m.is_empty())?;
    let start_time = game.commence_time.as_deref().and_then(parse_time);

    let mut snapshots = Vec::new();
    for raw_market in &markets {
        snapshots.extend(parse_market(&id, raw_market));
    }

    if snapshots.is_empty() {
        debug!(game_id = %id, "No usable outcomes");
        return None;
    }

    Some(SlateGame {
        id,
        start_time,
        snapshots,
    })
}

fn parse_market(game_id: &str, raw: &Value) -> Vec<OutcomeSnapshot> {
    let market: RawMarket = match serde_json::from_value(raw.clone()) {
        Ok(m) => m,
        Err(e) => {
            debug!(game_id, error = %e, "Dropping malformed market");
            return Vec::new();
        }
    };
    let kind = match MarketKind::from_key(&market.key) {
        Ok(k) => k,
        Err(e) => {
            debug!(game_id, error = %e, "Dropping unsupported market");
            return Vec::new();
        }
    };

    market
        .outcomes
        .iter()
        .filter_map(|raw_outcome| parse_outcome(game_id, kind, raw_outcome))
        .collect()
}

fn parse_outcome(game_id: &str, kind: MarketKind, raw: &Value) -> Option<OutcomeSnapshot> {
    let outcome: RawOutcome = serde_json::from_value(raw.clone())
        .map_err(|e| debug!(game_id, error = %e, "Dropping malformed outcome"))
        .ok()?;
    let id = OutcomeId::parse(kind, &outcome.side, outcome.line)
        .map_err(|e| debug!(game_id, error = %e, "Dropping invalid outcome"))
        .ok()?;

    let quotes: Vec<BookQuote> = outcome
        .quotes
        .iter()
        .filter_map(|raw_quote| parse_quote(game_id, raw_quote))
        .collect();

    if quotes.is_empty() {
        return None;
    }
    Some(OutcomeSnapshot::new(game_id, id, quotes))
}

fn parse_quote(game_id: &str, raw: &Value) -> Option<BookQuote> {
    let quote: RawQuote = serde_json::from_value(raw.clone())
        .map_err(|e| debug!(game_id, error = %e, "Dropping malformed quote"))
        .ok()?;

    // Prices must be whole moneyline numbers.
    if !quote.price.is_finite()
        || quote.price.fract() != 0.0
        || quote.price.abs() > f64::from(i32::MAX)
    {
        debug!(game_id, book = %quote.book, price = quote.price, "Dropping non-integer price");
        return None;
    }

    let Some(last_updated) = quote.last_update.to_utc() else {
        debug!(game_id, book = %quote.book, "Dropping quote with unreadable timestamp");
        return None;
    };

    BookQuote::new(quote.book, quote.price as i32, last_updated)
        .map_err(|e| debug!(game_id, error = %e, "Dropping invalid quote"))
        .ok()
}

// ---------------------------------------------------------------------------
// Slate processing
// ---------------------------------------------------------------------------

/// Map every raw game, analyse each usable one, and merge the results in
/// priority order with game start time as the final tiebreak.
pub fn process_slate(
    raw_games: &[Value],
    total_stake: f64,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> SlateOutcome {
    let mut per_game: Vec<Vec<Opportunity>> = Vec::with_capacity(raw_games.len());
    let mut start_times: HashMap<String, DateTime<Utc>> = HashMap::new();
    let mut games_analyzed = 0;
    let mut games_skipped = 0;

    for (index, raw) in raw_games.iter().enumerate() {
        let Some(game) = parse_game(raw) else {
            warn!(index, "Skipping malformed or incomplete game");
            games_skipped += 1;
            continue;
        };

        if let Some(start) = game.start_time {
            start_times.insert(game.id.clone(), start);
        }
        per_game.push(analyze_game(&game.id, &game.snapshots, total_stake, config, now));
        games_analyzed += 1;
    }

    let opportunities = merge_and_prioritize(per_game, |id| start_times.get(id).copied());

    info!(
        games = raw_games.len(),
        analyzed = games_analyzed,
        skipped = games_skipped,
        opportunities = opportunities.len(),
        "Slate processed"
    );

    SlateOutcome {
        opportunities,
        games_analyzed,
        games_skipped,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

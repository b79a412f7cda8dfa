//! Shared types for the LINEWATCH engine.
//!
//! Quotes, outcome identifiers, snapshots and the opportunity union returned
//! by every detector. They are plain data, created fresh for each analysis
//! call and discarded once the caller has consumed them.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::odds;

// ---------------------------------------------------------------------------
// Book quotes
// ---------------------------------------------------------------------------

/// One bookmaker's current moneyline price for one side of one market.
///
/// Construction validates the price, so a `BookQuote` always holds a real,
/// convertible moneyline value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedQuote")]
pub struct BookQuote {
    book: String,
    price: i32,
    last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
struct UncheckedQuote {
    book: String,
    price: i32,
    last_updated: DateTime<Utc>,
}

impl TryFrom<UncheckedQuote> for BookQuote {
    type Error = EngineError;

    fn try_from(raw: UncheckedQuote) -> Result<Self, Self::Error> {
        BookQuote::new(raw.book, raw.price, raw.last_updated)
    }
}

impl BookQuote {
    pub fn new(
        book: impl Into<String>,
        price: i32,
        last_updated: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        let book = book.into();
        if book.trim().is_empty() {
            return Err(EngineError::InvalidQuote {
                book,
                reason: "empty book identifier".to_string(),
            });
        }
        if !odds::is_valid_moneyline(f64::from(price)) {
            return Err(EngineError::InvalidQuote {
                book,
                reason: format!("{price} is not a valid moneyline price"),
            });
        }
        Ok(Self {
            book,
            price,
            last_updated,
        })
    }

    pub fn book(&self) -> &str {
        &self.book
    }

    pub fn price(&self) -> i32 {
        self.price
    }

    /// Decimal odds for this price.
    pub fn decimal(&self) -> f64 {
        odds::decimal_from_valid(f64::from(self.price))
    }

    /// Implied probability (vig included).
    pub fn probability(&self) -> f64 {
        1.0 / self.decimal()
    }

    /// Age of the quote in milliseconds at `now`. Negative for quotes
    /// stamped in the future.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_updated).num_milliseconds()
    }

    /// Whether the quote is older than `window_ms` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, window_ms: u64) -> bool {
        let age = self.age_ms(now);
        age > 0 && age as u64 > window_ms
    }
}

impl fmt::Display for BookQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.book,
            odds::format_moneyline(f64::from(self.price))
        )
    }
}

// ---------------------------------------------------------------------------
// Outcome identifiers
// ---------------------------------------------------------------------------

/// Side of a two-way market (moneyline or spread).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwoWaySide {
    Home,
    Away,
}

impl fmt::Display for TwoWaySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwoWaySide::Home => write!(f, "home"),
            TwoWaySide::Away => write!(f, "away"),
        }
    }
}

/// Side of a three-way (draw-capable) moneyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreeWaySide {
    Home,
    Draw,
    Away,
}

impl ThreeWaySide {
    pub const ALL: [ThreeWaySide; 3] = [ThreeWaySide::Home, ThreeWaySide::Draw, ThreeWaySide::Away];
}

impl fmt::Display for ThreeWaySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreeWaySide::Home => write!(f, "home"),
            ThreeWaySide::Draw => write!(f, "draw"),
            ThreeWaySide::Away => write!(f, "away"),
        }
    }
}

/// Side of a totals market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalSide {
    Over,
    Under,
}

impl fmt::Display for TotalSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TotalSide::Over => write!(f, "over"),
            TotalSide::Under => write!(f, "under"),
        }
    }
}

/// Market shape an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketKind {
    Moneyline,
    #[serde(rename = "moneyline_3way")]
    Moneyline3Way,
    Spread,
    Total,
}

impl MarketKind {
    /// Map a feed market key onto a market kind.
    pub fn from_key(key: &str) -> Result<Self, EngineError> {
        match key.trim().to_lowercase().as_str() {
            "h2h" | "moneyline" | "ml" => Ok(MarketKind::Moneyline),
            "h2h_3way" | "h2h_3_way" | "moneyline_3way" | "1x2" | "3way" => {
                Ok(MarketKind::Moneyline3Way)
            }
            "spreads" | "spread" | "handicap" => Ok(MarketKind::Spread),
            "totals" | "total" | "over_under" => Ok(MarketKind::Total),
            other => Err(EngineError::InvalidOutcome(format!(
                "unknown market key: {other}"
            ))),
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketKind::Moneyline => write!(f, "moneyline"),
            MarketKind::Moneyline3Way => write!(f, "moneyline-3way"),
            MarketKind::Spread => write!(f, "spread"),
            MarketKind::Total => write!(f, "total"),
        }
    }
}

/// What is being priced. Each market carries only the sides valid for it,
/// and only spreads and totals carry a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "market", rename_all = "snake_case")]
pub enum OutcomeId {
    Moneyline { side: TwoWaySide },
    #[serde(rename = "moneyline_3way")]
    Moneyline3Way { side: ThreeWaySide },
    Spread { side: TwoWaySide, line: f64 },
    Total { side: TotalSide, line: f64 },
}

impl OutcomeId {
    /// Build an outcome from feed strings, enforcing the side/line rules of
    /// each market.
    pub fn parse(market: MarketKind, side: &str, line: Option<f64>) -> Result<Self, EngineError> {
        let side_key = side.trim().to_lowercase();
        let bad_side = || {
            EngineError::InvalidOutcome(format!("side '{side}' is not valid for {market}"))
        };

        let outcome = match market {
            MarketKind::Moneyline => OutcomeId::Moneyline {
                side: parse_two_way(&side_key).ok_or_else(bad_side)?,
            },
            MarketKind::Moneyline3Way => OutcomeId::Moneyline3Way {
                side: match side_key.as_str() {
                    "home" => ThreeWaySide::Home,
                    "draw" | "tie" => ThreeWaySide::Draw,
                    "away" => ThreeWaySide::Away,
                    _ => return Err(bad_side()),
                },
            },
            MarketKind::Spread => OutcomeId::Spread {
                side: parse_two_way(&side_key).ok_or_else(bad_side)?,
                line: require_line(market, line)?,
            },
            MarketKind::Total => OutcomeId::Total {
                side: match side_key.as_str() {
                    "over" => TotalSide::Over,
                    "under" => TotalSide::Under,
                    _ => return Err(bad_side()),
                },
                line: require_line(market, line)?,
            },
        };

        if matches!(market, MarketKind::Moneyline | MarketKind::Moneyline3Way) && line.is_some() {
            return Err(EngineError::InvalidOutcome(format!(
                "{market} outcomes do not carry a line"
            )));
        }

        Ok(outcome)
    }

    pub fn market(&self) -> MarketKind {
        match self {
            OutcomeId::Moneyline { .. } => MarketKind::Moneyline,
            OutcomeId::Moneyline3Way { .. } => MarketKind::Moneyline3Way,
            OutcomeId::Spread { .. } => MarketKind::Spread,
            OutcomeId::Total { .. } => MarketKind::Total,
        }
    }

    pub fn line(&self) -> Option<f64> {
        match self {
            OutcomeId::Moneyline { .. } | OutcomeId::Moneyline3Way { .. } => None,
            OutcomeId::Spread { line, .. } | OutcomeId::Total { line, .. } => Some(*line),
        }
    }

    /// Whether `other` is the exact complement of this outcome in a two-way
    /// market: home/away on the same moneyline, home L against away -L, or
    /// over L against under L.
    pub fn is_opposite(&self, other: &OutcomeId) -> bool {
        match (self, other) {
            (OutcomeId::Moneyline { side: a }, OutcomeId::Moneyline { side: b }) => a != b,
            (
                OutcomeId::Spread { side: a, line: la },
                OutcomeId::Spread { side: b, line: lb },
            ) => a != b && line_key(*la) == line_key(-*lb),
            (
                OutcomeId::Total { side: a, line: la },
                OutcomeId::Total { side: b, line: lb },
            ) => a != b && line_key(*la) == line_key(*lb),
            _ => false,
        }
    }

    /// Whether both ids name the same outcome (lines compared at 1/100).
    pub fn same_as(&self, other: &OutcomeId) -> bool {
        match (self, other) {
            (OutcomeId::Moneyline { side: a }, OutcomeId::Moneyline { side: b }) => a == b,
            (OutcomeId::Moneyline3Way { side: a }, OutcomeId::Moneyline3Way { side: b }) => a == b,
            (
                OutcomeId::Spread { side: a, line: la },
                OutcomeId::Spread { side: b, line: lb },
            ) => a == b && line_key(*la) == line_key(*lb),
            (
                OutcomeId::Total { side: a, line: la },
                OutcomeId::Total { side: b, line: lb },
            ) => a == b && line_key(*la) == line_key(*lb),
            _ => false,
        }
    }
}

impl fmt::Display for OutcomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeId::Moneyline { side } => write!(f, "{side} ML"),
            OutcomeId::Moneyline3Way { side } => write!(f, "{side} 3W"),
            OutcomeId::Spread { side, line } => write!(f, "{side} {line:+}"),
            OutcomeId::Total { side, line } => write!(f, "{side} {line}"),
        }
    }
}

fn parse_two_way(side: &str) -> Option<TwoWaySide> {
    match side {
        "home" => Some(TwoWaySide::Home),
        "away" => Some(TwoWaySide::Away),
        _ => None,
    }
}

fn require_line(market: MarketKind, line: Option<f64>) -> Result<f64, EngineError> {
    match line {
        Some(l) if l.is_finite() => Ok(l),
        Some(l) => Err(EngineError::InvalidOutcome(format!(
            "{market} line must be finite, got {l}"
        ))),
        None => Err(EngineError::InvalidOutcome(format!(
            "{market} outcomes require a line"
        ))),
    }
}

/// Integer key for a line at 1/100 precision, used to group and match lines.
pub fn line_key(line: f64) -> i64 {
    (line * 100.0).round() as i64
}

/// Whether a line sits exactly on an integer, so a final result can land on
/// it and push.
pub fn is_integer_line(line: f64) -> bool {
    line.is_finite() && (line - line.round()).abs() < 1e-9
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One (game, outcome) pair with every book quote currently known for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSnapshot {
    pub game_id: String,
    pub outcome: OutcomeId,
    pub quotes: Vec<BookQuote>,
}

impl OutcomeSnapshot {
    pub fn new(game_id: impl Into<String>, outcome: OutcomeId, quotes: Vec<BookQuote>) -> Self {
        Self {
            game_id: game_id.into(),
            outcome,
            quotes,
        }
    }

    /// Distinct book ids in quote order.
    pub fn books(&self) -> Vec<&str> {
        let mut books: Vec<&str> = Vec::with_capacity(self.quotes.len());
        for q in &self.quotes {
            if !books.contains(&q.book()) {
                books.push(q.book());
            }
        }
        books
    }
}

// ---------------------------------------------------------------------------
// Opportunities
// ---------------------------------------------------------------------------

/// A book price beating the consensus fair price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvOpportunity {
    pub game_id: String,
    pub outcome: OutcomeId,
    pub book: String,
    pub price: i32,
    pub decimal: f64,
    /// fair_probability × decimal − 1
    pub edge: f64,
    pub ev_percent: f64,
    pub fair_probability: f64,
    /// Fair price in moneyline form (not rounded to an integer).
    pub fair_price: f64,
    pub fair_decimal: f64,
    /// Number of books behind the fair price.
    pub sample_size: usize,
    /// Mean hold of those books (overround − 1).
    pub avg_overround: f64,
}

impl fmt::Display for EvOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[EV +{:.2}%] {} {} @ {} {} (fair {:.1}% / {}, n={})",
            self.ev_percent,
            self.game_id,
            self.outcome,
            self.book,
            odds::format_moneyline(f64::from(self.price)),
            self.fair_probability * 100.0,
            odds::format_moneyline(self.fair_price),
            self.sample_size,
        )
    }
}

/// One leg of an arbitrage or middle, with its share of the stake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbLeg {
    pub outcome: OutcomeId,
    pub book: String,
    pub price: i32,
    pub decimal: f64,
    pub stake: f64,
    /// stake × decimal: total return if this leg wins.
    pub payout: f64,
}

impl fmt::Display for ArbLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} {} stake ${:.2}",
            self.outcome,
            self.book,
            odds::format_moneyline(f64::from(self.price)),
            self.stake,
        )
    }
}

/// Guaranteed-profit pair across two complementary outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arb2Opportunity {
    pub game_id: String,
    pub market: MarketKind,
    pub line: Option<f64>,
    pub legs: [ArbLeg; 2],
    pub roi_percent: f64,
    pub implied_sum: f64,
    pub total_stake: f64,
    pub push_risk: bool,
}

impl fmt::Display for Arb2Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ARB +{:.2}%] {} {} | {} | {}{}",
            self.roi_percent,
            self.game_id,
            self.market,
            self.legs[0],
            self.legs[1],
            if self.push_risk { " (push risk)" } else { "" },
        )
    }
}

/// Guaranteed-profit triple across a three-way moneyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arb3Opportunity {
    pub game_id: String,
    pub market: MarketKind,
    pub legs: [ArbLeg; 3],
    pub roi_percent: f64,
    pub implied_sum: f64,
    pub total_stake: f64,
    pub push_risk: bool,
}

impl fmt::Display for Arb3Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ARB3 +{:.2}%] {} | {} | {} | {}",
            self.roi_percent, self.game_id, self.legs[0], self.legs[1], self.legs[2],
        )
    }
}

/// Two offsetting spread/total bets that both win inside a window of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddleOpportunity {
    pub game_id: String,
    pub market: MarketKind,
    /// Over then under for totals, home then away for spreads.
    pub legs: [ArbLeg; 2],
    /// Number of integer final results for which both legs win.
    pub middle_size: u32,
    pub width: f64,
    /// Loss when exactly one leg wins (negative means a profit either way).
    pub worst_case_loss: f64,
    /// Profit when the result lands in the middle.
    pub best_case_profit: f64,
    pub total_stake: f64,
    pub push_risk: bool,
}

impl fmt::Display for MiddleOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[MIDDLE {} x{}] {} | {} | {} | risk ${:.2} to win ${:.2}{}",
            self.market,
            self.middle_size,
            self.game_id,
            self.legs[0],
            self.legs[1],
            self.worst_case_loss,
            self.best_case_profit,
            if self.push_risk { " (push risk)" } else { "" },
        )
    }
}

/// Opportunity kind, in descending certainty of profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    Ev,
    Arb2,
    Arb3,
    Middle,
}

impl OpportunityKind {
    /// Sort rank: arbitrage, then EV, then middles.
    pub fn priority(&self) -> u8 {
        match self {
            OpportunityKind::Arb2 | OpportunityKind::Arb3 => 0,
            OpportunityKind::Ev => 1,
            OpportunityKind::Middle => 2,
        }
    }
}

impl fmt::Display for OpportunityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpportunityKind::Ev => write!(f, "ev"),
            OpportunityKind::Arb2 => write!(f, "arb2"),
            OpportunityKind::Arb3 => write!(f, "arb3"),
            OpportunityKind::Middle => write!(f, "middle"),
        }
    }
}

/// Any detected opportunity, serialised with a `kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opportunity {
    Ev(EvOpportunity),
    Arb2(Arb2Opportunity),
    Arb3(Arb3Opportunity),
    Middle(MiddleOpportunity),
}

impl Opportunity {
    pub fn kind(&self) -> OpportunityKind {
        match self {
            Opportunity::Ev(_) => OpportunityKind::Ev,
            Opportunity::Arb2(_) => OpportunityKind::Arb2,
            Opportunity::Arb3(_) => OpportunityKind::Arb3,
            Opportunity::Middle(_) => OpportunityKind::Middle,
        }
    }

    pub fn game_id(&self) -> &str {
        match self {
            Opportunity::Ev(o) => &o.game_id,
            Opportunity::Arb2(o) => &o.game_id,
            Opportunity::Arb3(o) => &o.game_id,
            Opportunity::Middle(o) => &o.game_id,
        }
    }

    pub fn priority(&self) -> u8 {
        self.kind().priority()
    }

    /// Ranking magnitude within a kind: ROI for arbitrage, EV% for EV bets,
    /// best-case profit as a percentage of stake for middles.
    pub fn magnitude(&self) -> f64 {
        match self {
            Opportunity::Ev(o) => o.ev_percent,
            Opportunity::Arb2(o) => o.roi_percent,
            Opportunity::Arb3(o) => o.roi_percent,
            Opportunity::Middle(o) => {
                if o.total_stake > 0.0 {
                    o.best_case_profit / o.total_stake * 100.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Staked legs (empty for EV bets, which carry no stake split).
    pub fn legs(&self) -> &[ArbLeg] {
        match self {
            Opportunity::Ev(_) => &[],
            Opportunity::Arb2(o) => &o.legs,
            Opportunity::Arb3(o) => &o.legs,
            Opportunity::Middle(o) => &o.legs,
        }
    }

    /// Leg stakes rounded to cents, summing exactly to the rounded total.
    pub fn rounded_stakes(&self) -> Vec<Decimal> {
        let total = match self {
            Opportunity::Ev(_) => return Vec::new(),
            Opportunity::Arb2(o) => o.total_stake,
            Opportunity::Arb3(o) => o.total_stake,
            Opportunity::Middle(o) => o.total_stake,
        };
        let stakes: Vec<f64> = self.legs().iter().map(|l| l.stake).collect();
        round_stakes(&stakes, total)
    }
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opportunity::Ev(o) => fmt::Display::fmt(o, f),
            Opportunity::Arb2(o) => fmt::Display::fmt(o, f),
            Opportunity::Arb3(o) => fmt::Display::fmt(o, f),
            Opportunity::Middle(o) => fmt::Display::fmt(o, f),
        }
    }
}

/// Round stake amounts to cents. The residual cent(s) left by rounding go to
/// the largest leg so the result sums exactly to `total` rounded to cents.
pub fn round_stakes(stakes: &[f64], total: f64) -> Vec<Decimal> {
    let to_cents = |x: f64| {
        Decimal::from_f64(x)
            .unwrap_or(Decimal::ZERO)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    };

    let mut rounded: Vec<Decimal> = stakes.iter().map(|s| to_cents(*s)).collect();
    let residual = to_cents(total) - rounded.iter().copied().sum::<Decimal>();

    if !residual.is_zero() {
        let largest = rounded
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1))
            .map(|(i, _)| i);
        if let Some(i) = largest {
            rounded[i] += residual;
        }
    }
    rounded
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for LINEWATCH.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid moneyline price: {0} (must be finite, non-zero, |x| >= 100)")]
    InvalidMoneyline(f64),

    #[error("Invalid probability: {0} (must be strictly between 0 and 1)")]
    InvalidProbability(f64),

    #[error("Invalid quote from {book}: {reason}")]
    InvalidQuote { book: String, reason: String },

    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

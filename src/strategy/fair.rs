//! Consensus fair-price builder.
//!
//! Removes each book's margin before aggregating across books, so a book
//! that merely charges more vig does not move the consensus; only books that
//! actually lean one way do.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{quote_for_book, EngineConfig};
use crate::odds;
use crate::types::BookQuote;

/// Vig-free probability distribution over a market's sides.
#[derive(Debug, Clone, PartialEq)]
pub struct FairPrice {
    /// One probability per side, in the order the sides were supplied.
    /// Always sums to 1.
    pub probabilities: Vec<f64>,
    /// Books that contributed.
    pub sample_size: usize,
    /// Mean margin across contributing books (overround − 1).
    pub avg_overround: f64,
}

impl FairPrice {
    pub fn probability(&self, side: usize) -> Option<f64> {
        self.probabilities.get(side).copied()
    }

    /// Fair moneyline for a side.
    pub fn fair_price(&self, side: usize) -> Option<f64> {
        self.probability(side)
            .and_then(|p| odds::from_probability(p).ok())
    }

    pub fn fair_decimal(&self, side: usize) -> Option<f64> {
        self.probability(side).map(|p| 1.0 / p)
    }
}

/// Fair price for a two-way market. Index 0 is `side`, index 1 `opposite`.
pub fn build_fair_two_way(
    side: &[BookQuote],
    opposite: &[BookQuote],
    exclude_book: Option<&str>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<FairPrice> {
    build_fair(&[side, opposite], exclude_book, config, now)
}

/// Fair price for a three-way market. Only books quoting all three sides
/// contribute.
pub fn build_fair_three_way(
    home: &[BookQuote],
    draw: &[BookQuote],
    away: &[BookQuote],
    exclude_book: Option<&str>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<FairPrice> {
    build_fair(&[home, draw, away], exclude_book, config, now)
}

fn build_fair(
    sides: &[&[BookQuote]],
    exclude_book: Option<&str>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<FairPrice> {
    let (first, rest) = sides.split_first()?;

    let mut per_side: Vec<Vec<f64>> = vec![Vec::new(); sides.len()];
    let mut overrounds: Vec<f64> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for quote in first.iter() {
        let book = quote.book();
        if exclude_book == Some(book) || seen.contains(&book) || !config.is_fresh(quote, now) {
            continue;
        }
        seen.push(book);

        let mut probs = Vec::with_capacity(sides.len());
        probs.push(quote.probability());
        for other in rest {
            match quote_for_book(other, book, config, now) {
                Some(q) => probs.push(q.probability()),
                None => break,
            }
        }
        if probs.len() != sides.len() {
            continue;
        }

        let overround: f64 = probs.iter().sum();
        for (i, p) in probs.iter().enumerate() {
            per_side[i].push(p / overround);
        }
        overrounds.push(overround);
    }

    let sample_size = overrounds.len();
    if sample_size < config.min_books {
        debug!(
            sample_size,
            min_books = config.min_books,
            excluded = ?exclude_book,
            "Not enough books for a fair price"
        );
        return None;
    }

    let aggregated: Vec<f64> = per_side
        .iter()
        .map(|ps| config.consensus.aggregate(ps))
        .collect();
    let total: f64 = aggregated.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    let probabilities = if sides.len() == 2 {
        let p = aggregated[0] / total;
        vec![p, 1.0 - p]
    } else {
        aggregated.iter().map(|p| p / total).collect()
    };

    if probabilities.iter().any(|p| !(*p > 0.0 && *p < 1.0)) {
        return None;
    }

    let avg_overround = overrounds.iter().sum::<f64>() / sample_size as f64 - 1.0;

    Some(FairPrice {
        probabilities,
        sample_size,
        avg_overround,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

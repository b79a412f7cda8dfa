//! Positive-expected-value detection.
//!
//! Compares one book's price against the consensus fair price built from
//! every *other* book. The evaluated book never influences its own baseline.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::fair::{build_fair_three_way, build_fair_two_way};
use super::{quote_for_book, EngineConfig};
use crate::types::{BookQuote, EvOpportunity, OutcomeId};

/// Check whether `target_book`'s price on this side beats the fair price.
///
/// `other_sides` holds the opposite side for a two-way market, or the two
/// remaining sides for a three-way market. Any other shape yields `None`.
pub fn detect_ev(
    game_id: &str,
    outcome: &OutcomeId,
    this_side: &[BookQuote],
    other_sides: &[&[BookQuote]],
    target_book: &str,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<EvOpportunity> {
    let fair = match other_sides {
        [opposite] => build_fair_two_way(this_side, opposite, Some(target_book), config, now)?,
        [second, third] => {
            build_fair_three_way(this_side, second, third, Some(target_book), config, now)?
        }
        _ => {
            debug!(
                game_id,
                sides = other_sides.len() + 1,
                "Unsupported market shape for EV"
            );
            return None;
        }
    };

    let Some(quote) = quote_for_book(this_side, target_book, config, now) else {
        debug!(game_id, book = target_book, outcome = %outcome, "No fresh quote from target book");
        return None;
    };

    let fair_probability = fair.probability(0)?;
    let decimal = quote.decimal();
    let edge = fair_probability * decimal - 1.0;
    let ev_percent = edge * 100.0;

    if !(ev_percent > config.ev_threshold_pct) {
        debug!(
            game_id,
            book = target_book,
            outcome = %outcome,
            ev = format!("{ev_percent:.2}%"),
            threshold = format!("{:.2}%", config.ev_threshold_pct),
            "EV below threshold"
        );
        return None;
    }

    let fair_price = fair.fair_price(0)?;
    let fair_decimal = fair.fair_decimal(0)?;

    debug!(
        game_id,
        book = target_book,
        outcome = %outcome,
        ev = format!("{ev_percent:.2}%"),
        fair = format!("{:.1}%", fair_probability * 100.0),
        sample_size = fair.sample_size,
        hold = format!("{:.2}%", fair.avg_overround * 100.0),
        "EV detected"
    );

    Some(EvOpportunity {
        game_id: game_id.to_string(),
        outcome: *outcome,
        book: quote.book().to_string(),
        price: quote.price(),
        decimal,
        edge,
        ev_percent,
        fair_probability,
        fair_price,
        fair_decimal,
        sample_size: fair.sample_size,
        avg_overround: fair.avg_overround,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

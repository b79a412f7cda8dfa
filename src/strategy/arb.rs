//! Arbitrage detection across two or three mutually exclusive outcomes.
//!
//! Each leg takes the best fresh price available from any book. When the
//! combined implied probability of those best prices is below 1, a stake
//! split exists that returns the same payout whichever leg wins.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{best_quote, is_valid_stake, EngineConfig};
use crate::types::{
    Arb2Opportunity, Arb3Opportunity, ArbLeg, BookQuote, MarketKind, OutcomeId,
    OutcomeSnapshot, ThreeWaySide,
};

/// Sum of implied probabilities for a set of decimal prices.
pub fn implied_sum(decimals: &[f64]) -> f64 {
    decimals.iter().map(|d| 1.0 / d).sum()
}

/// Split `total_stake` so every leg pays out `total_stake / implied_sum`.
///
/// Each leg's share is its implied probability over the implied sum; the
/// last leg takes the remainder so the stakes add up to `total_stake`
/// exactly.
pub fn stake_split(decimals: &[f64], total_stake: f64) -> Vec<f64> {
    let sum = implied_sum(decimals);
    let mut stakes: Vec<f64> = Vec::with_capacity(decimals.len());
    let mut allocated = 0.0;
    for (i, d) in decimals.iter().enumerate() {
        let stake = if i + 1 == decimals.len() {
            total_stake - allocated
        } else {
            total_stake * (1.0 / d) / sum
        };
        allocated += stake;
        stakes.push(stake);
    }
    stakes
}

pub(crate) fn build_legs(
    picks: &[(&OutcomeId, &BookQuote)],
    total_stake: f64,
) -> Vec<ArbLeg> {
    let decimals: Vec<f64> = picks.iter().map(|(_, q)| q.decimal()).collect();
    let stakes = stake_split(&decimals, total_stake);
    picks
        .iter()
        .zip(stakes)
        .map(|((outcome, quote), stake)| ArbLeg {
            outcome: **outcome,
            book: quote.book().to_string(),
            price: quote.price(),
            decimal: quote.decimal(),
            stake,
            payout: stake * quote.decimal(),
        })
        .collect()
}

/// Two-leg arbitrage between complementary outcomes of the same game.
pub fn detect_arb2(
    game_id: &str,
    a: &OutcomeSnapshot,
    b: &OutcomeSnapshot,
    total_stake: f64,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<Arb2Opportunity> {
    if a.game_id != game_id || b.game_id != game_id {
        return None;
    }
    if !a.outcome.is_opposite(&b.outcome) {
        debug!(game_id, a = %a.outcome, b = %b.outcome, "Outcomes are not complements");
        return None;
    }
    if !is_valid_stake(total_stake) {
        return None;
    }

    let best_a = best_quote(&a.quotes, config, now)?;
    let best_b = best_quote(&b.quotes, config, now)?;

    let sum = implied_sum(&[best_a.decimal(), best_b.decimal()]);
    if !(sum < 1.0) {
        debug!(
            game_id,
            market = %a.outcome.market(),
            implied_sum = format!("{sum:.4}"),
            "No arbitrage"
        );
        return None;
    }

    let roi_percent = (1.0 / sum - 1.0) * 100.0;
    let legs = build_legs(&[(&a.outcome, best_a), (&b.outcome, best_b)], total_stake);
    let [leg_a, leg_b]: [ArbLeg; 2] = legs.try_into().ok()?;
    let push_risk = config.push_risk.any_leg_can_push(&[&a.outcome, &b.outcome]);

    info!(
        game_id,
        market = %a.outcome.market(),
        roi = format!("{roi_percent:.2}%"),
        leg_a = %leg_a,
        leg_b = %leg_b,
        push_risk,
        "ARB DETECTED"
    );

    Some(Arb2Opportunity {
        game_id: game_id.to_string(),
        market: a.outcome.market(),
        line: a.outcome.line(),
        legs: [leg_a, leg_b],
        roi_percent,
        implied_sum: sum,
        total_stake,
        push_risk,
    })
}

/// Three-leg arbitrage on a three-way moneyline.
pub fn detect_arb3(
    game_id: &str,
    home: &OutcomeSnapshot,
    draw: &OutcomeSnapshot,
    away: &OutcomeSnapshot,
    total_stake: f64,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<Arb3Opportunity> {
    let snapshots = [home, draw, away];
    for (snap, expected) in snapshots.iter().zip(ThreeWaySide::ALL) {
        if snap.game_id != game_id {
            return None;
        }
        match snap.outcome {
            OutcomeId::Moneyline3Way { side } if side == expected => {}
            _ => {
                debug!(game_id, outcome = %snap.outcome, "Not a three-way leg in home/draw/away order");
                return None;
            }
        }
    }
    if !is_valid_stake(total_stake) {
        return None;
    }

    let best_home = best_quote(&home.quotes, config, now)?;
    let best_draw = best_quote(&draw.quotes, config, now)?;
    let best_away = best_quote(&away.quotes, config, now)?;

    let sum = implied_sum(&[best_home.decimal(), best_draw.decimal(), best_away.decimal()]);
    if !(sum < 1.0) {
        debug!(game_id, implied_sum = format!("{sum:.4}"), "No three-way arbitrage");
        return None;
    }

    let roi_percent = (1.0 / sum - 1.0) * 100.0;
    let legs = build_legs(
        &[
            (&home.outcome, best_home),
            (&draw.outcome, best_draw),
            (&away.outcome, best_away),
        ],
        total_stake,
    );
    let legs: [ArbLeg; 3] = legs.try_into().ok()?;

    info!(
        game_id,
        roi = format!("{roi_percent:.2}%"),
        home = %legs[0],
        draw = %legs[1],
        away = %legs[2],
        "ARB3 DETECTED"
    );

    Some(Arb3Opportunity {
        game_id: game_id.to_string(),
        market: MarketKind::Moneyline3Way,
        legs,
        roi_percent,
        implied_sum: sum,
        total_stake,
        push_risk: false,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

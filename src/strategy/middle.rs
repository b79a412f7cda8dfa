//! Middle detection on totals and spreads.
//!
//! A middle is a pair of offsetting bets on different lines where a final
//! result landing between the lines wins both. Stakes use the same
//! payout-equalising split as arbitrage, so the loss when only one leg wins
//! is bounded and known up front.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::arb::{build_legs, implied_sum};
use super::{best_quote, is_valid_stake, EngineConfig};
use crate::odds::stats::count_integers;
use crate::types::{ArbLeg, MarketKind, MiddleOpportunity, OutcomeId, OutcomeSnapshot, TotalSide, TwoWaySide};

/// Over a lower total and under a higher total.
pub fn detect_middle_totals(
    game_id: &str,
    over: &OutcomeSnapshot,
    under: &OutcomeSnapshot,
    total_stake: f64,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<MiddleOpportunity> {
    let OutcomeId::Total { side: TotalSide::Over, line: over_line } = over.outcome else {
        return None;
    };
    let OutcomeId::Total { side: TotalSide::Under, line: under_line } = under.outcome else {
        return None;
    };
    if !(over_line < under_line) {
        return None;
    }

    let middle_size = count_integers(over_line, under_line);
    let width = under_line - over_line;
    build_middle(game_id, MarketKind::Total, over, under, middle_size, width, total_stake, config, now)
}

/// Home at one handicap and away at another, leaving a window of winning
/// margins between them.
///
/// With margin = home score − away score, the home leg covers when
/// `margin > -home_line` and the away leg when `margin < away_line`.
pub fn detect_middle_spreads(
    game_id: &str,
    home: &OutcomeSnapshot,
    away: &OutcomeSnapshot,
    total_stake: f64,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<MiddleOpportunity> {
    let OutcomeId::Spread { side: TwoWaySide::Home, line: home_line } = home.outcome else {
        return None;
    };
    let OutcomeId::Spread { side: TwoWaySide::Away, line: away_line } = away.outcome else {
        return None;
    };

    let width = away_line + home_line;
    if !(width > 0.0) {
        return None;
    }

    let middle_size = count_integers(-home_line, away_line);
    build_middle(game_id, MarketKind::Spread, home, away, middle_size, width, total_stake, config, now)
}

#[allow(clippy::too_many_arguments)]
fn build_middle(
    game_id: &str,
    market: MarketKind,
    first: &OutcomeSnapshot,
    second: &OutcomeSnapshot,
    middle_size: u32,
    width: f64,
    total_stake: f64,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<MiddleOpportunity> {
    if first.game_id != game_id || second.game_id != game_id || !is_valid_stake(total_stake) {
        return None;
    }
    if middle_size == 0 {
        debug!(
            game_id,
            market = %market,
            first = %first.outcome,
            second = %second.outcome,
            "No integer result inside the middle"
        );
        return None;
    }

    let best_first = best_quote(&first.quotes, config, now)?;
    let best_second = best_quote(&second.quotes, config, now)?;

    let legs = build_legs(
        &[(&first.outcome, best_first), (&second.outcome, best_second)],
        total_stake,
    );
    let legs: [ArbLeg; 2] = legs.try_into().ok()?;

    let sum = implied_sum(&[legs[0].decimal, legs[1].decimal]);
    let worst_case_loss = total_stake - total_stake / sum;
    let best_case_profit = legs[0].payout + legs[1].payout - total_stake;
    let push_risk = config.push_risk.any_leg_can_push(&[&first.outcome, &second.outcome]);

    info!(
        game_id,
        market = %market,
        middle_size,
        width,
        first = %legs[0],
        second = %legs[1],
        worst_case_loss = format!("${worst_case_loss:.2}"),
        best_case_profit = format!("${best_case_profit:.2}"),
        "MIDDLE DETECTED"
    );

    Some(MiddleOpportunity {
        game_id: game_id.to_string(),
        market,
        legs,
        middle_size,
        width,
        worst_case_loss,
        best_case_profit,
        total_stake,
        push_risk,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

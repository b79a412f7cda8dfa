//! Full slate → opportunity list runs through the `Engine` facade.

use chrono::{Duration, Utc};
use serde_json::json;

use linewatch::engine::{process_slate, Engine};
use linewatch::strategy::{EngineConfig, PushRiskPolicy};
use linewatch::types::{Opportunity, OpportunityKind};

use crate::fixtures::{game, market, outcome, quote, soft_home_game};

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).unwrap()
}

#[test]
fn test_slate_ordering_across_games() {
    let now = Utc::now();
    let middle_game = game(
        "mid",
        now + Duration::hours(2),
        vec![market(
            "totals",
            vec![
                outcome("over", Some(45.5), vec![quote("a", -110, now, 10)]),
                outcome("under", Some(47.5), vec![quote("c", -110, now, 10)]),
            ],
        )],
    );
    let slate = vec![
        soft_home_game("late", now, now + Duration::hours(5)),
        middle_game,
        soft_home_game("early", now, now + Duration::hours(1)),
    ];

    let out = engine().process_slate_at(&slate, 100.0, now);
    assert_eq!(out.games_analyzed, 3);
    assert_eq!(out.games_skipped, 0);

    let kinds: Vec<OpportunityKind> = out.opportunities.iter().map(|o| o.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            OpportunityKind::Arb2,
            OpportunityKind::Arb2,
            OpportunityKind::Ev,
            OpportunityKind::Ev,
            OpportunityKind::Middle,
        ]
    );
    let games: Vec<&str> = out.opportunities.iter().map(|o| o.game_id()).collect();
    assert_eq!(games, vec!["early", "late", "early", "late", "mid"]);
}

#[test]
fn test_ev_and_arb_values() {
    let now = Utc::now();
    let slate = vec![soft_home_game("g1", now, now + Duration::hours(1))];
    let out = engine().process_slate_at(&slate, 100.0, now);
    assert_eq!(out.opportunities.len(), 2);

    let Opportunity::Arb2(arb) = &out.opportunities[0] else {
        panic!("expected an arb first, got {:?}", out.opportunities[0]);
    };
    assert_eq!(arb.legs[0].book, "soft");
    assert!((arb.legs[0].stake + arb.legs[1].stake - 100.0).abs() < 1e-9);
    assert!((arb.legs[0].payout - arb.legs[1].payout).abs() < 1e-9);
    assert!(arb.implied_sum < 1.0);
    assert!(arb.roi_percent > 0.0);

    let Opportunity::Ev(ev) = &out.opportunities[1] else {
        panic!("expected an EV bet second, got {:?}", out.opportunities[1]);
    };
    assert_eq!(ev.book, "soft");
    assert_eq!(ev.price, 125);
    assert_eq!(ev.sample_size, 3);
    // Three sharp books at -110/-110 put the home side at 50%.
    assert!((ev.fair_probability - 0.5).abs() < 1e-9);
    assert!((ev.ev_percent - 12.5).abs() < 1e-9);
    assert!((ev.avg_overround - (220.0 / 210.0 - 1.0)).abs() < 1e-9);
}

#[test]
fn test_stale_quotes_ignored_until_window_widens() {
    let now = Utc::now();
    let slate = vec![game(
        "g1",
        now + Duration::hours(1),
        vec![market(
            "h2h",
            vec![
                outcome(
                    "home",
                    None,
                    vec![
                        quote("a", -110, now, 10),
                        quote("b", -110, now, 10),
                        quote("soft", 125, now, 3600),
                    ],
                ),
                outcome(
                    "away",
                    None,
                    vec![
                        quote("a", -110, now, 10),
                        quote("b", -110, now, 10),
                        quote("soft", -160, now, 3600),
                    ],
                ),
            ],
        )],
    )];

    let strict = engine().process_slate_at(&slate, 100.0, now);
    assert!(strict.opportunities.is_empty());
    assert_eq!(strict.games_analyzed, 1);

    let relaxed = Engine::new(EngineConfig {
        stale_window_ms: 2 * 60 * 60 * 1000,
        ..EngineConfig::default()
    })
    .unwrap();
    let out = relaxed.process_slate_at(&slate, 100.0, now);
    assert!(out.opportunities.iter().any(|o| o.kind() == OpportunityKind::Arb2));
    assert!(out.opportunities.iter().any(|o| o.kind() == OpportunityKind::Ev));
}

#[test]
fn test_three_way_arb() {
    let now = Utc::now();
    let slate = vec![game(
        "derby",
        now + Duration::hours(3),
        vec![market(
            "h2h_3way",
            vec![
                outcome("home", None, vec![quote("a", 200, now, 5), quote("b", 150, now, 5)]),
                outcome("draw", None, vec![quote("a", 260, now, 5), quote("b", 220, now, 5)]),
                outcome("away", None, vec![quote("a", 250, now, 5), quote("b", 170, now, 5)]),
            ],
        )],
    )];

    let out = engine().process_slate_at(&slate, 100.0, now);
    assert_eq!(out.opportunities.len(), 1);
    let Opportunity::Arb3(arb) = &out.opportunities[0] else {
        panic!("expected a three-way arb, got {:?}", out.opportunities[0]);
    };
    let expected_sum = 1.0 / 3.0 + 1.0 / 3.6 + 1.0 / 3.5;
    assert!((arb.implied_sum - expected_sum).abs() < 1e-9);
    let staked: f64 = arb.legs.iter().map(|l| l.stake).sum();
    assert!((staked - 100.0).abs() < 1e-9);
    assert!(arb.legs.iter().all(|l| l.book == "a"));
    assert!((arb.legs[0].payout - arb.legs[2].payout).abs() < 1e-9);
    assert!(!arb.push_risk);
}

#[test]
fn test_push_risk_follows_policy() {
    let now = Utc::now();
    let slate = vec![game(
        "g1",
        now + Duration::hours(1),
        vec![market(
            "spreads",
            vec![
                outcome("home", Some(-3.0), vec![quote("a", 110, now, 5)]),
                outcome("away", Some(3.0), vec![quote("b", 110, now, 5)]),
            ],
        )],
    )];

    let out = engine().process_slate_at(&slate, 100.0, now);
    assert_eq!(out.opportunities.len(), 1);
    let Opportunity::Arb2(arb) = &out.opportunities[0] else {
        panic!("expected an arb, got {:?}", out.opportunities[0]);
    };
    assert!(arb.push_risk);
    assert_eq!(arb.line, Some(-3.0));

    let ignore = EngineConfig {
        push_risk: PushRiskPolicy::Ignore,
        ..EngineConfig::default()
    };
    let out = process_slate(&slate, 100.0, &ignore, now);
    let Opportunity::Arb2(arb) = &out.opportunities[0] else {
        panic!("expected an arb, got {:?}", out.opportunities[0]);
    };
    assert!(!arb.push_risk);
}

#[test]
fn test_malformed_input_is_not_fatal() {
    let now = Utc::now();
    let slate = vec![
        json!(null),
        json!(42),
        json!({ "id": "no-markets" }),
        json!({ "id": "bad-market", "markets": [{ "key": "corners", "outcomes": [] }] }),
        json!({
            "game_id": "aliased",
            "start_time": (now + Duration::hours(1)).to_rfc3339(),
            "markets": [{
                "market": "moneyline",
                "outcomes": [
                    { "name": "home", "quotes": [{ "bookmaker": "x", "odds": 120, "updated_at": now.timestamp_millis() }] },
                    { "name": "away", "quotes": [{ "bookmaker": "y", "odds": 110, "last_updated": now.to_rfc3339() }] }
                ]
            }]
        }),
    ];

    let out = engine().process_slate_at(&slate, 100.0, now);
    assert_eq!(out.games_skipped, 4);
    assert_eq!(out.games_analyzed, 1);
    assert_eq!(out.opportunities.len(), 1);
    assert_eq!(out.opportunities[0].game_id(), "aliased");
    assert_eq!(out.opportunities[0].kind(), OpportunityKind::Arb2);
}

#[test]
fn test_empty_slate() {
    let out = engine().process_slate(&[], 100.0);
    assert!(out.opportunities.is_empty());
    assert_eq!(out.games_analyzed, 0);
    assert_eq!(out.games_skipped, 0);
}

#[test]
fn test_invalid_config_rejected() {
    let bad = EngineConfig {
        min_books: 0,
        ..EngineConfig::default()
    };
    assert!(Engine::new(bad).is_err());
}

#[test]
fn test_opportunity_json_shape() {
    let now = Utc::now();
    let slate = vec![soft_home_game("g1", now, now + Duration::hours(1))];
    let out = engine().process_slate_at(&slate, 100.0, now);

    let value = serde_json::to_value(&out.opportunities[0]).unwrap();
    assert_eq!(value["kind"], "arb2");
    assert_eq!(value["game_id"], "g1");
    assert_eq!(value["market"], "moneyline");
    assert_eq!(value["legs"].as_array().map(|l| l.len()), Some(2));
}

//! Scan → report → disk round trips and stake rounding on real detections.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::path::Path;

use linewatch::config::AppConfig;
use linewatch::engine::Engine;
use linewatch::storage::{self, ScanReport};
use linewatch::types::OpportunityKind;

use crate::fixtures::{game, market, outcome, quote, soft_home_game};

fn temp_path() -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("linewatch_it_report_{}.json", uuid::Uuid::new_v4()));
    p.to_string_lossy().to_string()
}

#[test]
fn test_scan_report_roundtrip() {
    let now = Utc::now();
    let slate = vec![
        soft_home_game("g1", now, now + Duration::hours(1)),
        serde_json::json!({ "id": "broken" }),
    ];
    let engine = Engine::new(Default::default()).unwrap();
    let outcome = engine.process_slate_at(&slate, 100.0, now);
    let report = ScanReport::from_outcome(outcome, 100.0, now);

    let path = temp_path();
    storage::save_report(&report, Some(&path)).unwrap();
    assert!(Path::new(&path).exists());

    let loaded = storage::load_report(Some(&path)).unwrap().unwrap();
    assert_eq!(loaded.run_id, report.run_id);
    assert_eq!(loaded.games_analyzed, 1);
    assert_eq!(loaded.games_skipped, 1);
    assert_eq!(loaded.counts(), report.counts());
    assert_eq!(loaded.counts().arb2, 1);
    assert_eq!(loaded.counts().ev, 1);

    let kinds: Vec<OpportunityKind> = loaded.opportunities.iter().map(|o| o.kind()).collect();
    assert_eq!(kinds, vec![OpportunityKind::Arb2, OpportunityKind::Ev]);

    storage::delete_report(Some(&path)).unwrap();
    assert!(storage::load_report(Some(&path)).unwrap().is_none());
}

#[test]
fn test_rounded_stakes_sum_to_total() {
    let now = Utc::now();
    let slate = vec![game(
        "g1",
        now + Duration::hours(1),
        vec![
            market(
                "totals",
                vec![
                    outcome("over", Some(45.5), vec![quote("a", 105, now, 5)]),
                    outcome("under", Some(45.5), vec![quote("b", 102, now, 5)]),
                ],
            ),
            market(
                "h2h_3way",
                vec![
                    outcome("home", None, vec![quote("a", 200, now, 5)]),
                    outcome("draw", None, vec![quote("b", 260, now, 5)]),
                    outcome("away", None, vec![quote("c", 250, now, 5)]),
                ],
            ),
        ],
    )];

    let engine = Engine::new(Default::default()).unwrap();
    let out = engine.process_slate_at(&slate, 333.33, now);
    let staked: Vec<_> = out.opportunities.iter().filter(|o| !o.legs().is_empty()).collect();
    assert_eq!(staked.len(), 2);

    for opp in staked {
        let rounded = opp.rounded_stakes();
        assert_eq!(rounded.len(), opp.legs().len());
        assert_eq!(rounded.iter().copied().sum::<Decimal>(), Decimal::new(33333, 2));
        assert!(rounded.iter().all(|s| s.scale() <= 2));
    }
}

#[test]
fn test_config_drives_engine() {
    let cfg = AppConfig::parse(
        r#"
        [engine]
        ev_threshold_pct = 20.0

        [scan]
        slate_path = "unused.json"
        "#,
    )
    .unwrap();

    let now = Utc::now();
    let slate = vec![soft_home_game("g1", now, now + Duration::hours(1))];
    let engine = Engine::new(cfg.engine.clone()).unwrap();
    let out = engine.process_slate_at(&slate, cfg.scan.total_stake, now);

    // The 12.5% EV bet falls under a 20% threshold; the arb is unaffected.
    assert_eq!(out.opportunities.len(), 1);
    assert_eq!(out.opportunities[0].kind(), OpportunityKind::Arb2);
}

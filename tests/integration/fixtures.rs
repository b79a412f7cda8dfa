//! Slate builders shared by the integration tests.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

/// A quote updated `age_secs` before `now`.
pub fn quote(book: &str, price: i64, now: DateTime<Utc>, age_secs: i64) -> Value {
    json!({
        "book": book,
        "price": price,
        "last_update": (now - Duration::seconds(age_secs)).to_rfc3339(),
    })
}

pub fn outcome(side: &str, line: Option<f64>, quotes: Vec<Value>) -> Value {
    match line {
        Some(l) => json!({ "side": side, "line": l, "quotes": quotes }),
        None => json!({ "side": side, "quotes": quotes }),
    }
}

pub fn market(key: &str, outcomes: Vec<Value>) -> Value {
    json!({ "key": key, "outcomes": outcomes })
}

pub fn game(id: &str, start: DateTime<Utc>, markets: Vec<Value>) -> Value {
    json!({ "id": id, "commence_time": start.to_rfc3339(), "markets": markets })
}

/// Four books on a moneyline where `soft` hangs a generous home price.
pub fn soft_home_game(id: &str, now: DateTime<Utc>, start: DateTime<Utc>) -> Value {
    game(
        id,
        start,
        vec![market(
            "h2h",
            vec![
                outcome(
                    "home",
                    None,
                    vec![
                        quote("a", -110, now, 10),
                        quote("b", -110, now, 10),
                        quote("c", -110, now, 10),
                        quote("soft", 125, now, 10),
                    ],
                ),
                outcome(
                    "away",
                    None,
                    vec![
                        quote("a", -110, now, 10),
                        quote("b", -110, now, 10),
                        quote("c", -110, now, 10),
                        quote("soft", -160, now, 10),
                    ],
                ),
            ],
        )],
    )
}

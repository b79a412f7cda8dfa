//! LINEWATCH — multi-book odds analytics engine
//!
//! Finds +EV prices, two- and three-way arbitrage and middles across
//! sportsbook quotes. Library crate exposing all modules for use by
//! integration tests and the binary entry point.

pub mod config;
pub mod types;
pub mod odds;
pub mod strategy;
pub mod engine;
pub mod storage;

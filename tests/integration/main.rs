//! End-to-end tests driving the public API with JSON slate fixtures.

mod fixtures;
mod report;
mod slate_pipeline;

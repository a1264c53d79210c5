//! schedbot library
//!
//! Exposes the cache, schedule model, refresh orchestrator and bot handling for
//! the binary and for integration tests.

pub mod bot;
pub mod cache;
pub mod cli;
pub mod refresh;
pub mod schedule;
pub mod source;
pub mod telemetry;

//! Upstream providers of raw schedule records
//!
//! The orchestrator only depends on the [`ScheduleSource`] trait. The HTTP
//! client for the university timetable API is one implementation; tests use
//! in-memory fakes.

mod vlsu;

pub use vlsu::{VlsuClient, DEFAULT_API_URL, DEFAULT_GROUP_ID};

use async_trait::async_trait;
use thiserror::Error;

use crate::schedule::RawDay;

/// Errors that can occur when fetching raw schedule records
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The upstream answered with a non-success status
    #[error("Upstream returned status {status}")]
    UnexpectedStatus { status: u16 },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Any other failure reported by a source implementation
    #[error("{0}")]
    Other(String),
}

/// Something that can produce the raw day records of the current schedule
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Fetches the day records, Monday first
    async fn fetch_raw(&self) -> Result<Vec<RawDay>, SourceError>;
}

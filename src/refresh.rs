//! Fetch-if-absent refresh of the cached schedule
//!
//! Every request first makes sure a fresh schedule blob is cached, then renders
//! from the cache. The upstream is only contacted on a miss, concurrent misses
//! share a single fetch, and an expired blob is served again for a short while
//! when the upstream fails.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheError, ExpiringCache};
use crate::schedule::{decode, Day, DecodeError, RawDay, Schedule, WeekParity};
use crate::source::{ScheduleSource, SourceError};

/// Cache key of the current schedule blob
pub const SCHEDULE_KEY: &str = "schedule";

/// How long a fetched schedule stays fresh
pub const SCHEDULE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// How long a stale schedule is served again after a failed refresh
pub const STALE_RETRY: Duration = Duration::from_secs(5 * 60);

/// Broad classification of refresh failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing is cached for the request
    NotFound,
    /// Upstream data has an unexpected shape
    MalformedInput,
    /// The upstream could not be reached or answered with an error
    SourceUnavailable,
}

/// Errors returned by the refresh orchestrator
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Fetching from the schedule source failed
    #[error("Schedule source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// The fetched or cached records do not form a schedule
    #[error("Malformed schedule data: {0}")]
    MalformedInput(#[from] DecodeError),

    /// Reading or writing the cache failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// No schedule is cached; `ensure_fresh` has not run or failed
    #[error("Schedule is not loaded")]
    NotLoaded,

    /// The requested day does not exist in the week
    #[error("No day with index {0}")]
    DayOutOfRange(usize),
}

impl RefreshError {
    /// Classifies the error for callers deciding between retry and report
    pub fn kind(&self) -> ErrorKind {
        match self {
            RefreshError::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            RefreshError::MalformedInput(_) => ErrorKind::MalformedInput,
            RefreshError::Cache(CacheError::NotFound(_)) => ErrorKind::NotFound,
            RefreshError::Cache(_) => ErrorKind::MalformedInput,
            RefreshError::NotLoaded | RefreshError::DayOutOfRange(_) => ErrorKind::NotFound,
        }
    }
}

/// Where the schedule served by `ensure_fresh` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// A fresh blob was already cached
    Cached,
    /// The blob was fetched from the source just now
    Fetched,
    /// The source failed and an expired blob was re-cached briefly
    Stale,
}

/// Configuration for refresh lifetimes
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Lifetime of a freshly fetched schedule
    pub schedule_ttl: Duration,
    /// Lifetime granted to a stale schedule after a failed refresh
    pub stale_retry: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            schedule_ttl: SCHEDULE_TTL,
            stale_retry: STALE_RETRY,
        }
    }
}

/// Keeps the cached schedule fresh and renders days from it
pub struct ScheduleService {
    cache: ExpiringCache,
    source: Arc<dyn ScheduleSource>,
    config: RefreshConfig,
    /// Held while fetching so that concurrent misses wait for one fetch
    fetch_gate: Mutex<()>,
}

impl ScheduleService {
    /// Creates a service over `cache` that fetches from `source` on a miss
    pub fn new(cache: ExpiringCache, source: Arc<dyn ScheduleSource>, config: RefreshConfig) -> Self {
        Self {
            cache,
            source,
            config,
            fetch_gate: Mutex::new(()),
        }
    }

    /// The cache the schedule is stored in
    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    /// Makes sure a fresh schedule is cached
    ///
    /// # Returns
    /// * `Ok(Freshness::Cached)` without contacting the source when a fresh blob exists
    /// * `Ok(Freshness::Fetched)` after a successful fetch, stored for `schedule_ttl`
    /// * `Ok(Freshness::Stale)` when the fetch failed but an expired blob was still held
    /// * `Err(RefreshError)` when the fetch failed and nothing could be served;
    ///   the cache is left unchanged
    #[instrument(skip(self))]
    pub async fn ensure_fresh(&self) -> Result<Freshness, RefreshError> {
        if self.cache.get(SCHEDULE_KEY).is_some() {
            debug!("Schedule cache hit");
            return Ok(Freshness::Cached);
        }

        let _gate = self.fetch_gate.lock().await;

        // Another request may have filled the cache while we waited
        if self.cache.get(SCHEDULE_KEY).is_some() {
            debug!("Schedule cached by a concurrent request");
            return Ok(Freshness::Cached);
        }

        match self.fetch_validated().await {
            Ok(records) => {
                self.cache
                    .set_encoded(SCHEDULE_KEY, &records, self.config.schedule_ttl)?;
                info!(
                    days = records.len(),
                    ttl = ?self.config.schedule_ttl,
                    "Cached fresh schedule"
                );
                Ok(Freshness::Fetched)
            }
            Err(e) => match self.cache.get_entry(SCHEDULE_KEY) {
                Some(stale) => {
                    warn!(
                        error = %e,
                        retry_in = ?self.config.stale_retry,
                        "Schedule refresh failed, serving stale data"
                    );
                    self.cache
                        .set(SCHEDULE_KEY, stale.data, self.config.stale_retry);
                    Ok(Freshness::Stale)
                }
                None => Err(e),
            },
        }
    }

    /// Fetches records and checks that they decode before they are cached
    async fn fetch_validated(&self) -> Result<Vec<RawDay>, RefreshError> {
        let records = self.source.fetch_raw().await?;
        decode(&records)?;
        Ok(records)
    }

    /// Looks up one day of the cached schedule
    pub fn day(&self, day: usize, parity: WeekParity) -> Result<Day, RefreshError> {
        cached_day(&self.cache, day, parity)
    }

    /// Renders one day of the cached schedule
    pub fn day_schedule(&self, day: usize, parity: WeekParity) -> Result<String, RefreshError> {
        day_schedule(&self.cache, day, parity)
    }
}

/// Decodes the schedule currently held in `cache`
pub fn cached_schedule(cache: &ExpiringCache) -> Result<Schedule, RefreshError> {
    let records: Vec<RawDay> = cache
        .get_decoded(SCHEDULE_KEY)?
        .ok_or(RefreshError::NotLoaded)?;
    Ok(decode(&records)?)
}

/// Decodes the cached schedule once and takes day `day` (0 = Monday) of the
/// given week variant out of it
///
/// Callers are expected to run `ensure_fresh` first; a missing schedule is
/// reported as `RefreshError::NotLoaded`.
pub fn cached_day(cache: &ExpiringCache, day: usize, parity: WeekParity) -> Result<Day, RefreshError> {
    let schedule = cached_schedule(cache)?;
    schedule
        .week(parity)
        .day(day)
        .cloned()
        .ok_or(RefreshError::DayOutOfRange(day))
}

/// Renders day `day` (0 = Monday) of the given week variant from `cache`
pub fn day_schedule(
    cache: &ExpiringCache,
    day: usize,
    parity: WeekParity,
) -> Result<String, RefreshError> {
    Ok(cached_day(cache, day, parity)?.render())
}

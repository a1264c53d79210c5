//! In-memory cache for upstream responses
//!
//! This module provides an expiring key/value store. Every entry carries an
//! absolute deadline; reads treat a passed deadline as a miss, and a background
//! sweeper removes expired entries on a fixed interval. Nothing is persisted, so
//! the cache starts empty on every process start.

mod store;
mod sweeper;

pub use store::{CacheError, CachedData, ExpiringCache};

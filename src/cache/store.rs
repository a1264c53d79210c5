//! Expiring key/value store guarded by a reader/writer lock
//!
//! Provides an `ExpiringCache` that keeps values in a `HashMap` keyed by string,
//! with a per-entry deadline computed at write time. Handles are cheap to clone
//! and share one map.

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::sweeper;

/// Errors returned by cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key is not present in the cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The value could not be serialized for storage
    #[error("Failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored bytes could not be deserialized into the requested type
    #[error("Failed to decode value for key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A stored value together with its bookkeeping timestamps
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    /// `None` means the entry never expires
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    /// The single expiry predicate shared by reads and the sweeper
    fn is_expired_at(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now > deadline)
    }
}

/// Snapshot of an entry, returned even when the entry has expired
///
/// Expired-but-unswept entries are still visible here with `is_expired = true`,
/// which lets callers fall back to stale data when the upstream is unavailable.
#[derive(Debug, Clone)]
pub struct CachedData<V> {
    /// The cached value
    pub data: V,
    /// When the value was written
    pub cached_at: Instant,
    /// Absolute deadline, `None` for entries without expiry
    pub expires_at: Option<Instant>,
    /// Whether the deadline has passed
    pub is_expired: bool,
}

/// State shared between all cache handles and the sweeper task
pub(super) struct Shared<V> {
    items: RwLock<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
    /// Dropped together with the last handle, which stops the sweeper
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl<V> Shared<V> {
    /// Removes every expired entry and returns how many were removed
    ///
    /// Expired keys are collected under the shared lock, then removed in one
    /// exclusive batch. A key that was rewritten in between is left alone.
    pub(super) fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = {
            let items = self.items.read();
            items
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect()
        };

        if expired.is_empty() {
            return 0;
        }

        let mut items = self.items.write();
        let mut removed = 0;
        for key in expired {
            if items.get(&key).is_some_and(|entry| entry.is_expired_at(now)) {
                items.remove(&key);
                removed += 1;
            }
        }
        removed
    }
}

/// Concurrent in-memory cache with per-entry time-to-live
///
/// Reads take a shared lock and never block each other; writes, deletes and
/// sweeps take the exclusive lock. When built with a non-zero sweep interval
/// inside a Tokio runtime, a background task periodically removes expired
/// entries. That task only holds a weak reference, so it ends once the last
/// handle is dropped.
///
/// The value type defaults to raw bytes; `set_encoded` and `get_decoded`
/// layer JSON serialization on top of that representation.
pub struct ExpiringCache<V = Vec<u8>> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for ExpiringCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> std::fmt::Debug for ExpiringCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("len", &self.shared.items.read().len())
            .field("default_ttl", &self.shared.default_ttl)
            .finish()
    }
}

impl<V> ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache
    ///
    /// # Arguments
    /// * `default_ttl` - Lifetime used when `set` is called with a zero TTL.
    ///   A zero default means such entries never expire.
    /// * `sweep_interval` - How often expired entries are physically removed.
    ///   Zero disables the background sweep; reads still honour expiry.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        let (cache, _sweeper) = Self::build(default_ttl, sweep_interval);
        cache
    }

    /// Creates the cache and returns the sweeper task handle, if one was started
    fn build(default_ttl: Duration, sweep_interval: Duration) -> (Self, Option<JoinHandle<()>>) {
        if sweep_interval.is_zero() {
            return (Self::without_sweeper(default_ttl), None);
        }

        if tokio::runtime::Handle::try_current().is_err() {
            warn!(
                ?sweep_interval,
                "No Tokio runtime available, cache sweeping disabled"
            );
            return (Self::without_sweeper(default_ttl), None);
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let shared = Arc::new(Shared {
            items: RwLock::new(HashMap::new()),
            default_ttl,
            shutdown_tx: Some(shutdown_tx),
        });
        let handle = sweeper::spawn(Arc::downgrade(&shared), sweep_interval, shutdown_rx);

        debug!(?default_ttl, ?sweep_interval, "Created cache with sweeper");
        (Self { shared }, Some(handle))
    }

    fn without_sweeper(default_ttl: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                items: RwLock::new(HashMap::new()),
                default_ttl,
                shutdown_tx: None,
            }),
        }
    }

    /// Returns the value for `key` if it is present and has not expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let items = self.shared.items.read();
        let entry = items.get(key)?;
        if entry.is_expired_at(now) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Returns the entry for `key` with its metadata, including expired entries
    /// that the sweeper has not removed yet
    pub fn get_entry(&self, key: &str) -> Option<CachedData<V>> {
        let now = Instant::now();
        let items = self.shared.items.read();
        items.get(key).map(|entry| CachedData {
            data: entry.value.clone(),
            cached_at: entry.created_at,
            expires_at: entry.expires_at,
            is_expired: entry.is_expired_at(now),
        })
    }

    /// Inserts or overwrites `key`
    ///
    /// A zero `ttl` selects the cache's default TTL. The entry's creation time
    /// and deadline are replaced on every write.
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let ttl = if ttl.is_zero() {
            self.shared.default_ttl
        } else {
            ttl
        };

        let now = Instant::now();
        let expires_at = if ttl.is_zero() {
            None
        } else {
            // Deadlines past the clock's range never expire
            now.checked_add(ttl)
        };

        self.insert(key, value, now, expires_at);
    }

    /// Inserts or overwrites `key` with an entry that never expires
    pub fn set_without_expiry(&self, key: &str, value: V) {
        self.insert(key, value, Instant::now(), None);
    }

    fn insert(&self, key: &str, value: V, created_at: Instant, expires_at: Option<Instant>) {
        let mut items = self.shared.items.write();
        items.insert(
            key.to_string(),
            CacheEntry {
                value,
                created_at,
                expires_at,
            },
        );
    }

    /// Removes `key`
    ///
    /// # Returns
    /// * `Ok(())` if the key was present
    /// * `Err(CacheError::NotFound)` otherwise
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut items = self.shared.items.write();
        match items.remove(key) {
            Some(_) => Ok(()),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    /// Removes all expired entries now, returning how many were removed
    pub fn sweep(&self) -> usize {
        self.shared.sweep()
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.shared.items.read().len()
    }

    /// Whether the cache holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.shared.items.read().is_empty()
    }

    /// Asks the background sweeper to stop without dropping the cache
    pub fn shutdown(&self) {
        if let Some(tx) = &self.shared.shutdown_tx {
            let _ = tx.try_send(());
        }
    }
}

impl ExpiringCache<Vec<u8>> {
    /// Serializes `value` as JSON and stores the bytes under `key`
    pub fn set_encoded<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, bytes, ttl);
        Ok(())
    }

    /// Reads `key` and deserializes the stored JSON bytes
    ///
    /// # Returns
    /// * `Ok(Some(T))` for a fresh entry that decodes
    /// * `Ok(None)` when the key is missing or expired
    /// * `Err(CacheError::Decode)` when the stored bytes do not match `T`
    pub fn get_decoded<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(bytes) = self.get(key) else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| CacheError::Decode {
                key: key.to_string(),
                source,
            })
    }
}

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::storage::CodeStorage;
use crate::models::{ReferenceCodeItem, SYSCODE_PARENT_IDS};

/// Storage key holding every cached parent id plus the shared timestamp.
pub const CACHE_KEY: &str = "sysCodeData";

/// Field inside the blob carrying the last write time in epoch milliseconds.
const TIMESTAMP_FIELD: &str = "timestamp";

/// System codes change rarely; one day between refetches.
const CACHE_TTL_HOURS: i64 = 24;

/// Where system codes come from when the cache misses.
pub trait CodeSource: Send + Sync {
    /// Fetch the children of `parent_id`. An `Ok` empty list means the
    /// server really has no entries.
    fn fetch_by_parent(
        &self,
        parent_id: &str,
    ) -> impl Future<Output = Result<Vec<ReferenceCodeItem>>> + Send;
}

impl<T: CodeSource> CodeSource for Arc<T> {
    fn fetch_by_parent(
        &self,
        parent_id: &str,
    ) -> impl Future<Output = Result<Vec<ReferenceCodeItem>>> + Send {
        (**self).fetch_by_parent(parent_id)
    }
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Cache of system code tables in front of a `CodeSource`.
///
/// All parent ids share one timestamp: any write re-stamps the whole blob,
/// which also extends the apparent freshness of every other cached parent.
/// A write that lands after the blob expired starts over and drops the
/// other parents.
///
/// Reads fail open. A broken or missing backend looks like a cache miss.
/// There is no in-flight de-duplication, so overlapping fetches of the same
/// parent each hit the network.
pub struct ReferenceCache<S, F> {
    storage: S,
    source: F,
    ttl: Duration,
    clock: Clock,
}

impl<S: CodeStorage, F: CodeSource> ReferenceCache<S, F> {
    pub fn new(storage: S, source: F) -> Self {
        Self {
            storage,
            source,
            ttl: Duration::hours(CACHE_TTL_HOURS),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the time source. Tests use this to age the blob.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    fn now_ms(&self) -> i64 {
        (self.clock)().timestamp_millis()
    }

    /// An age that does not fit in an `i64` counts as expired.
    fn is_expired(&self, timestamp_ms: i64, now_ms: i64) -> bool {
        now_ms
            .checked_sub(timestamp_ms)
            .map_or(true, |age| age > self.ttl.num_milliseconds())
    }

    /// Load and parse the blob, treating every failure as "nothing cached".
    fn load_blob(&self) -> Option<Map<String, Value>> {
        let raw = match self.storage.get(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "System code storage unavailable");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                debug!("System code cache is not a JSON object");
                None
            }
            Err(e) => {
                debug!(error = %e, "Failed to parse system code cache");
                None
            }
        }
    }

    fn evict(&self) {
        if let Err(e) = self.storage.remove(CACHE_KEY) {
            warn!(error = %e, "Failed to clear expired system code cache");
        }
    }

    /// Cached items for `parent_id`, or `None` on a miss.
    ///
    /// An expired blob is removed from storage before returning `None`.
    /// A blob without a timestamp counts as expired.
    pub fn read_cached(&self, parent_id: &str) -> Option<Vec<ReferenceCodeItem>> {
        let blob = self.load_blob()?;

        let timestamp = blob.get(TIMESTAMP_FIELD).and_then(Value::as_i64);
        match timestamp {
            Some(ts) if !self.is_expired(ts, self.now_ms()) => {}
            _ => {
                debug!(parent_id, "System code cache expired");
                self.evict();
                return None;
            }
        }

        let entry = blob.get(parent_id)?;
        match serde_json::from_value::<Vec<ReferenceCodeItem>>(entry.clone()) {
            Ok(items) => Some(items),
            Err(e) => {
                debug!(parent_id, error = %e, "Malformed system code cache entry");
                None
            }
        }
    }

    /// Store `items` under `parent_id` and re-stamp the blob.
    ///
    /// Merges into the existing blob only while it is still fresh. Storage
    /// failures are logged, never returned.
    pub fn write_cached(&self, parent_id: &str, items: &[ReferenceCodeItem]) {
        let now = self.now_ms();

        let mut blob = self
            .load_blob()
            .filter(|blob| {
                blob.get(TIMESTAMP_FIELD)
                    .and_then(Value::as_i64)
                    .map(|ts| !self.is_expired(ts, now))
                    .unwrap_or(false)
            })
            .unwrap_or_default();

        let items = match serde_json::to_value(items) {
            Ok(v) => v,
            Err(e) => {
                warn!(parent_id, error = %e, "Failed to serialize system codes");
                return;
            }
        };
        blob.insert(TIMESTAMP_FIELD.to_string(), Value::from(now));
        blob.insert(parent_id.to_string(), items);

        let contents = Value::Object(blob).to_string();
        if let Err(e) = self.storage.set(CACHE_KEY, &contents) {
            warn!(parent_id, error = %e, "Failed to write system code cache");
        }
    }

    /// Fetch from the source, caching non-empty results.
    ///
    /// Errors are returned so callers can tell a failed fetch from an empty
    /// table. Nothing is written on failure.
    pub async fn try_fetch(&self, parent_id: &str) -> Result<Vec<ReferenceCodeItem>> {
        let items = self.source.fetch_by_parent(parent_id).await?;
        debug!(parent_id, count = items.len(), "Fetched system codes");
        if !items.is_empty() {
            self.write_cached(parent_id, &items);
        }
        Ok(items)
    }

    /// Like `try_fetch`, but any failure becomes an empty list.
    pub async fn fetch_and_cache(&self, parent_id: &str) -> Vec<ReferenceCodeItem> {
        match self.try_fetch(parent_id).await {
            Ok(items) => items,
            Err(e) => {
                warn!(parent_id, error = %e, "Failed to fetch system codes");
                Vec::new()
            }
        }
    }

    /// Cached items when there are any, otherwise a fetch.
    pub async fn get_with_cache_fallback(&self, parent_id: &str) -> Vec<ReferenceCodeItem> {
        match self.read_cached(parent_id) {
            Some(items) if !items.is_empty() => items,
            _ => self.fetch_and_cache(parent_id).await,
        }
    }

    /// Warm the cache for every id in `parent_ids`, one after another.
    ///
    /// Only the first id is checked: if it has fresh, non-empty entries the
    /// whole list is assumed loaded. Returns how many ids came back non-empty.
    pub async fn ensure_bulk_loaded<P: AsRef<str>>(&self, parent_ids: &[P]) -> usize {
        let Some(first) = parent_ids.first() else {
            return 0;
        };
        if self
            .read_cached(first.as_ref())
            .map(|items| !items.is_empty())
            .unwrap_or(false)
        {
            debug!(parent_id = first.as_ref(), "System codes already cached");
            return 0;
        }

        let mut loaded = 0;
        for parent_id in parent_ids {
            if !self.fetch_and_cache(parent_id.as_ref()).await.is_empty() {
                loaded += 1;
            }
        }
        debug!(loaded, total = parent_ids.len(), "System code bulk load finished");
        loaded
    }

    /// Bulk load the standard parent id list.
    pub async fn init(&self) -> usize {
        self.ensure_bulk_loaded(&SYSCODE_PARENT_IDS).await
    }

    /// Drop everything cached.
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(CACHE_KEY) {
            warn!(error = %e, "Failed to clear system code cache");
        }
    }

    /// Last write time of the shared blob, if there is a readable one.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        let ts = self.load_blob()?.get(TIMESTAMP_FIELD)?.as_i64()?;
        DateTime::from_timestamp_millis(ts)
    }
}

// ============================================================================
// Tests
// ============================================================================

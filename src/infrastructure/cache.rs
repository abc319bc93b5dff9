//! TTL cache for setlist records.
//!
//! An explicit owned store shared with `SetlistClient` by `Arc`; lifecycle
//! belongs to startup in `main`, not to an ambient static. Entries are
//! replaced whole, last writer wins; the lock is never held across a
//! network await.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::domain::types::{CacheKey, SetlistRecord};

struct CacheEntry {
    record: SetlistRecord,
    fetched_at: Instant,
}

pub struct SetlistCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl SetlistCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached record if the entry is still within its TTL.
    /// Stale entries are left in place; `store` overwrites them on refresh.
    pub async fn fresh(&self, key: &CacheKey) -> Option<SetlistRecord> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.record.clone())
    }

    /// Whole-value replace of the entry for `key`.
    pub async fn store(&self, key: CacheKey, record: SetlistRecord) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                record,
                fetched_at: Instant::now(),
            },
        );
    }
}

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Time source for cache freshness checks. Production code uses
/// [`SystemClock`]; tests inject a manually advanced clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone)]
struct Entry<V> {
    payload: V,
    cached_at: DateTime<Utc>,
}

/// Time-bounded memoization layer keyed by request signature.
///
/// Entries older than the TTL behave as absent but are not purged eagerly;
/// the next `put` for the same signature overwrites them.
pub struct ResultCache<V> {
    entries: Cache<String, Entry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send + Sync + 'static> ResultCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Cache::builder().max_capacity(1000).build(),
            ttl,
            clock,
        }
    }

    /// Returns the cached payload while its age is strictly less than the TTL.
    pub fn get(&self, signature: &str) -> Option<V> {
        let entry = self.entries.get(signature)?;
        let age = self
            .clock
            .now()
            .signed_duration_since(entry.cached_at)
            .to_std()
            .ok()?;
        if age < self.ttl {
            Some(entry.payload)
        } else {
            None
        }
    }

    pub fn put(&self, signature: impl Into<String>, payload: V) {
        self.entries.insert(
            signature.into(),
            Entry {
                payload,
                cached_at: self.clock.now(),
            },
        );
    }
}

/// Builds the cache key for an upstream request: endpoint path plus the full
/// parameter set, so two candidate lookups for the same logical city get
/// independent slots.
pub fn signature(endpoint: &str, params: &[(&str, &str)]) -> String {
    let mut key = String::from(endpoint);
    for (name, value) in params {
        key.push_str(if key.contains('?') { "&" } else { "?" });
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

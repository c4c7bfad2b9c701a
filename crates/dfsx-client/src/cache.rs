//! Bounded, TTL'd `dirname -> endpoint` cache.
//!
//! The original source's unbounded `@memoize` decorator (`dfs/utils.py`'s
//! `memoize` class) is a memory-leak hazard across long-running clients; this
//! replaces it with a capacity-bounded cache with a TTL and an explicit
//! [`EndpointCache::invalidate`] hook the session calls on a registry `NotFound`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dfsx_core::Endpoint;

struct Entry {
    endpoint: Endpoint,
    inserted_at: Instant,
}

/// A bounded, TTL'd cache of directory-to-endpoint resolutions.
pub struct EndpointCache {
    entries: Mutex<HashMap<String, Entry>>,
    capacity: usize,
    ttl: Duration,
}

impl EndpointCache {
    /// Creates a cache holding at most `capacity` entries, each valid for `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
            ttl,
        }
    }

    /// Returns the cached endpoint for `dir`, if present and not expired.
    pub fn get(&self, dir: &str) -> Option<Endpoint> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(dir) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => Some(entry.endpoint.clone()),
            Some(_) => {
                entries.remove(dir);
                None
            }
            None => None,
        }
    }

    /// Inserts or refreshes the cached endpoint for `dir`.
    ///
    /// If the cache is at capacity, the single oldest entry is evicted first
    /// (a simple bound, not a full LRU: this cache's hot set is expected to
    /// track the small number of directories a session actively touches).
    pub fn put(&self, dir: &str, endpoint: Endpoint) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity && !entries.contains_key(dir) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            dir.to_string(),
            Entry {
                endpoint,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Evicts the cached entry for `dir`, if any.
    ///
    /// Called on a registry `NotFound` response so a later lookup does not
    /// keep returning a resolution the registry has since retracted.
    pub fn invalidate(&self, dir: &str) {
        self.entries.lock().unwrap().remove(dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(s: &str) -> Endpoint {
        Endpoint::parse(s).unwrap()
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = EndpointCache::new(8, Duration::from_secs(60));
        cache.put("/d", ep("s1:9000"));
        assert_eq!(cache.get("/d"), Some(ep("s1:9000")));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = EndpointCache::new(8, Duration::from_millis(1));
        cache.put("/d", ep("s1:9000"));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("/d"), None);
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = EndpointCache::new(8, Duration::from_secs(60));
        cache.put("/d", ep("s1:9000"));
        cache.invalidate("/d");
        assert_eq!(cache.get("/d"), None);
    }

    #[test]
    fn over_capacity_evicts_something() {
        let cache = EndpointCache::new(2, Duration::from_secs(60));
        cache.put("/a", ep("s1:9000"));
        cache.put("/b", ep("s2:9000"));
        cache.put("/c", ep("s3:9000"));
        let present = ["/a", "/b", "/c"]
            .iter()
            .filter(|d| cache.get(d).is_some())
            .count();
        assert_eq!(present, 2);
    }
}

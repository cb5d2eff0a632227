use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use parking_lot::RwLock;

type Bucket = Governor<NotKeyed, InMemoryState, DefaultClock>;

/// Per-identity token bucket admission for query requests.
///
/// Rate and burst are both the configured `rps`. Buckets are created lazily
/// on first sight of an identity under a read-then-write double-checked
/// lock, and persist for the lifetime of the process - there is no
/// eviction, which is a known limitation carried over from the source
/// design (see the design notes on unbounded username space).
pub struct RateLimiter {
    rps: NonZeroU32,
    buckets: RwLock<HashMap<String, Arc<Bucket>>>,
}

impl RateLimiter {
    pub fn new(rps: u32) -> Self {
        Self {
            rps: NonZeroU32::new(rps.max(1)).expect("rps clamped to at least 1"),
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Returns true iff a token is available for `id` right now.
    pub fn take(&self, id: &str) -> bool {
        self.bucket_for(id).check().is_ok()
    }

    fn bucket_for(&self, id: &str) -> Arc<Bucket> {
        if let Some(bucket) = self.buckets.read().get(id) {
            return bucket.clone();
        }

        let mut buckets = self.buckets.write();
        if let Some(bucket) = buckets.get(id) {
            return bucket.clone();
        }

        let bucket = Arc::new(Governor::direct(Quota::per_second(self.rps).allow_burst(self.rps)));
        buckets.insert(id.to_string(), bucket.clone());
        bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn admits_up_to_burst_then_rejects() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.take("u"));
        assert!(limiter.take("u"));
        assert!(!limiter.take("u"));
    }

    #[test]
    fn refills_after_interval() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.take("u"));
        assert!(limiter.take("u"));
        assert!(!limiter.take("u"));

        sleep(Duration::from_millis(600));
        assert!(limiter.take("u"));
    }

    #[test]
    fn identities_are_independent() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.take("a"));
        assert!(limiter.take("b"));
        assert!(!limiter.take("a"));
        assert!(!limiter.take("b"));
    }
}

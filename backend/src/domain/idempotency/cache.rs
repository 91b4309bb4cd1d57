//! In-process idempotency cache for employee creation.
//!
//! The cache maps an [`IdempotencyKey`] to the first employee record observed
//! for it. Stores are first-write-wins: once a key maps to a record, later
//! stores for that key leave the entry untouched and return the original.
//!
//! Entries optionally expire after a TTL so the map does not grow without
//! bound. Expired entries behave as absent on lookup and are physically
//! removed by [`IdempotencyCache::purge_expired`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::debug;

use super::IdempotencyKey;
use crate::domain::EmployeeRecord;

#[derive(Debug, Clone)]
struct CachedEmployee {
    record: EmployeeRecord,
    stored_at: DateTime<Utc>,
}

/// Concurrent first-write-wins map from idempotency keys to created records.
pub struct IdempotencyCache {
    entries: Mutex<HashMap<IdempotencyKey, CachedEmployee>>,
    clock: Arc<dyn Clock>,
    ttl: Option<Duration>,
}

impl IdempotencyCache {
    /// Build a cache whose entries never expire.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl: None,
        }
    }

    /// Build a cache whose entries expire `ttl` after they were stored.
    ///
    /// A zero TTL disables expiry.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// use employee_gateway::domain::idempotency::IdempotencyCache;
    ///
    /// let cache = IdempotencyCache::with_ttl(Arc::new(mockable::DefaultClock), Duration::from_secs(60));
    /// assert_eq!(cache.ttl(), Some(Duration::from_secs(60)));
    /// assert!(cache.is_empty());
    /// ```
    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            ttl: (!ttl.is_zero()).then_some(ttl),
            ..Self::new(clock)
        }
    }

    /// Configured entry lifetime, if any.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Return the record cached for `key`, unless absent or expired.
    pub fn lookup(&self, key: &IdempotencyKey) -> Option<EmployeeRecord> {
        let now = self.clock.utc();
        self.lock_entries()
            .get(key)
            .filter(|cached| !self.is_expired(cached, now))
            .map(|cached| cached.record.clone())
    }

    /// Cache `record` under `key` unless a live entry already exists.
    ///
    /// Returns the record that is cached once the call completes: `record`
    /// itself for the first writer, or the previously stored record otherwise.
    /// An expired entry is replaced as if it were absent.
    pub fn store(&self, key: &IdempotencyKey, record: EmployeeRecord) -> EmployeeRecord {
        let now = self.clock.utc();
        let mut entries = self.lock_entries();
        match entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if self.is_expired(occupied.get(), now) {
                    occupied.insert(CachedEmployee {
                        record: record.clone(),
                        stored_at: now,
                    });
                    record
                } else {
                    debug!(key = %key, "idempotency entry already present; keeping first write");
                    occupied.get().record.clone()
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CachedEmployee {
                    record: record.clone(),
                    stored_at: now,
                });
                record
            }
        }
    }

    /// Remove expired entries and return how many were dropped.
    pub fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = self.clock.utc();
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, cached| !self.is_expired(cached, now));
        before.saturating_sub(entries.len())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, cached: &CachedEmployee, now: DateTime<Utc>) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        // An unrepresentable TTL or expiry instant is effectively infinite.
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return false;
        };
        cached
            .stored_at
            .checked_add_signed(ttl)
            .is_some_and(|expires_at| now >= expires_at)
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<IdempotencyKey, CachedEmployee>> {
        // Every mutation is a single map operation, so a poisoned guard still
        // holds a consistent map.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::resilience::MutableClock;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn record(id: &str, name: &str) -> EmployeeRecord {
        EmployeeRecord {
            id: id.to_owned(),
            name: name.to_owned(),
            salary: 5000,
            age: 30,
            title: "Engineer".to_owned(),
            email: format!("{id}@company.test"),
        }
    }

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid time");
        Arc::new(MutableClock::new(now))
    }

    #[fixture]
    fn key() -> IdempotencyKey {
        IdempotencyKey::new("create-ada").expect("valid key")
    }

    #[rstest]
    fn lookup_misses_for_unknown_key(clock: Arc<MutableClock>, key: IdempotencyKey) {
        let cache = IdempotencyCache::new(clock);
        assert!(cache.lookup(&key).is_none());
    }

    #[rstest]
    fn first_store_wins(clock: Arc<MutableClock>, key: IdempotencyKey) {
        let cache = IdempotencyCache::new(clock);

        let first = cache.store(&key, record("a", "Ada"));
        let second = cache.store(&key, record("b", "Grace"));

        assert_eq!(first.id, "a");
        assert_eq!(second.id, "a", "second store must return the first record");
        assert_eq!(cache.lookup(&key).map(|r| r.id), Some("a".to_owned()));
        assert_eq!(cache.len(), 1);
    }

    #[rstest]
    fn entries_expire_after_ttl(clock: Arc<MutableClock>, key: IdempotencyKey) {
        let cache = IdempotencyCache::with_ttl(clock.clone(), Duration::from_secs(60));
        cache.store(&key, record("a", "Ada"));

        clock.advance(Duration::from_secs(59));
        assert!(cache.lookup(&key).is_some(), "entry is live before the TTL");

        clock.advance(Duration::from_secs(1));
        assert!(cache.lookup(&key).is_none(), "entry expires at the TTL");

        let replaced = cache.store(&key, record("b", "Grace"));
        assert_eq!(replaced.id, "b", "expired entries can be replaced");
    }

    #[rstest]
    fn purge_removes_only_expired_entries(clock: Arc<MutableClock>) {
        let cache = IdempotencyCache::with_ttl(clock.clone(), Duration::from_secs(60));
        let old = IdempotencyKey::new("old").expect("valid key");
        let fresh = IdempotencyKey::new("fresh").expect("valid key");

        cache.store(&old, record("a", "Ada"));
        clock.advance(Duration::from_secs(45));
        cache.store(&fresh, record("b", "Grace"));
        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&fresh).is_some());
    }

    #[rstest]
    fn zero_ttl_disables_expiry(clock: Arc<MutableClock>, key: IdempotencyKey) {
        let cache = IdempotencyCache::with_ttl(clock.clone(), Duration::ZERO);
        cache.store(&key, record("a", "Ada"));
        clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));

        assert_eq!(cache.ttl(), None);
        assert_eq!(cache.purge_expired(), 0);
        assert!(cache.lookup(&key).is_some());
    }

    #[rstest]
    #[case::beyond_calendar(Duration::from_secs(10_000_000_000_000))]
    #[case::beyond_time_delta(Duration::from_secs(u64::MAX))]
    fn ttl_past_the_representable_range_never_expires(
        clock: Arc<MutableClock>,
        key: IdempotencyKey,
        #[case] ttl: Duration,
    ) {
        let cache = IdempotencyCache::with_ttl(clock.clone(), ttl);
        cache.store(&key, record("a", "Ada"));
        clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));

        assert_eq!(cache.lookup(&key).map(|r| r.id), Some("a".to_owned()));
        assert_eq!(cache.store(&key, record("b", "Grace")).id, "a");
        assert_eq!(cache.purge_expired(), 0);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stores_for_one_key_agree_on_a_single_record(clock: Arc<MutableClock>) {
        let cache = Arc::new(IdempotencyCache::new(clock));
        let key = IdempotencyKey::new("race").expect("valid key");

        let handles = (0..16)
            .map(|index| {
                let cache = Arc::clone(&cache);
                let key = key.clone();
                tokio::spawn(async move { cache.store(&key, record(&index.to_string(), "Racer")) })
            })
            .collect::<Vec<_>>();

        let mut winners = Vec::new();
        for handle in handles {
            winners.push(handle.await.expect("task completes").id);
        }
        winners.dedup();
        assert_eq!(winners.len(), 1, "all callers observe the same cached record");
    }
}

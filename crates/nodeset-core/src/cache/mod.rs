//! Time-bounded, single-flight cache.
//!
//! [`TtlCache::get_or_try_init`] guarantees at most one computation per key
//! in flight at a time: concurrent callers for the same key wait on the same
//! initializer and share its result. A failed or cancelled initializer
//! leaves the slot empty, so the next caller starts over and nothing partial
//! is ever served. Values expire `ttl` after they were stored, and expired
//! slots are swept every [`SWEEP_INTERVAL`] new slots.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

struct Stamped<V> {
    value: V,
    stored_at: Instant,
}

impl<V> Stamped<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }
}

type Slot<V> = Arc<OnceCell<Stamped<V>>>;

/// New slots created between two sweeps of expired ones.
pub const SWEEP_INTERVAL: usize = 256;

/// A keyed cache with per-key single-flight initialization and TTL expiry.
pub struct TtlCache<K, V> {
    ttl: Duration,
    slots: Mutex<HashMap<K, Slot<V>>>,
    created: AtomicUsize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
            created: AtomicUsize::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, stamped: &Stamped<V>) -> bool {
        stamped.stored_at.elapsed() >= self.ttl
    }

    fn sweep(&self, slots: &mut HashMap<K, Slot<V>>) {
        slots.retain(|_, slot| match slot.get() {
            Some(stamped) => !self.is_expired(stamped),
            None => Arc::strong_count(slot) > 1,
        });
    }

    fn insert_slot(&self, slots: &mut HashMap<K, Slot<V>>, key: K, slot: Slot<V>) {
        if self.created.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep(slots);
        }
        slots.insert(key, slot);
    }

    /// Returns the live slot for `key`, replacing an expired one.
    fn slot(&self, key: &K) -> Slot<V> {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(key) {
            match slot.get() {
                Some(stamped) if self.is_expired(stamped) => {}
                _ => return Arc::clone(slot),
            }
        }
        let slot: Slot<V> = Arc::new(OnceCell::new());
        self.insert_slot(&mut slots, key.clone(), Arc::clone(&slot));
        slot
    }

    /// Returns the cached value for `key`, computing it with `init` if absent
    /// or expired.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(&key);
        let stamped = slot
            .get_or_try_init(|| async move { init().await.map(Stamped::new) })
            .await?;
        Ok(stamped.value.clone())
    }

    /// Returns a fresh cached value without computing anything.
    pub fn get(&self, key: &K) -> Option<V> {
        let slots = self.slots.lock();
        let stamped = slots.get(key)?.get()?;
        if self.is_expired(stamped) {
            None
        } else {
            Some(stamped.value.clone())
        }
    }

    /// Stores a value directly, replacing whatever was there.
    pub fn insert(&self, key: K, value: V) {
        let slot = Arc::new(OnceCell::new_with(Some(Stamped::new(value))));
        let mut slots = self.slots.lock();
        self.insert_slot(&mut slots, key, slot);
    }

    /// Drops the entry for `key`.
    pub fn invalidate(&self, key: &K) {
        self.slots.lock().remove(key);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Drops expired values and slots whose initializer never succeeded.
    ///
    /// Slots with an initializer still running are kept.
    pub fn purge(&self) {
        let mut slots = self.slots.lock();
        self.sweep(&mut slots);
    }

    /// Number of fresh values.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.get().is_some_and(|s| !self.is_expired(s)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Message Sequencer
//!
//! Issues a strictly increasing, collision-free timestamp per conversation.
//! Each conversation owns an atomic slot holding the last issued value; callers
//! claim the next value with a compare-and-swap loop, so unrelated
//! conversations never contend. Idle slots are evicted, after which the
//! conversation restarts from wall-clock time.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use crate::domain::ConversationKey;
use crate::shared::clock::now_millis;

pub struct MessageSequencer {
    slots: Cache<ConversationKey, Arc<AtomicI64>>,
}

impl MessageSequencer {
    pub fn new(idle: Duration, max_keys: u64) -> Self {
        Self {
            slots: Cache::builder()
                .max_capacity(max_keys)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Next timestamp for `key`, based on the current wall-clock time.
    pub fn next_timestamp(&self, key: &ConversationKey) -> i64 {
        self.next_timestamp_at(key, now_millis())
    }

    /// Next timestamp for `key` given `now`.
    ///
    /// Returns `now` if it is ahead of the last issued value, otherwise the
    /// last issued value plus one.
    pub fn next_timestamp_at(&self, key: &ConversationKey, now: i64) -> i64 {
        let slot = self
            .slots
            .get_with_by_ref(key, || Arc::new(AtomicI64::new(i64::MIN)));

        let mut last = slot.load(Ordering::Acquire);
        loop {
            let next = if now > last { now } else { last + 1 };
            match slot.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }

    /// Last value issued for `key`, if its slot is still live.
    pub fn last_issued(&self, key: &ConversationKey) -> Option<i64> {
        self.slots
            .get(key)
            .map(|slot| slot.load(Ordering::Acquire))
            .filter(|value| *value != i64::MIN)
    }
}

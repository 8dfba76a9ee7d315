//! Deadline-ordered queues over the shared store.
//!
//! Entries are keyed `prefix | be64(end_time) | NameHash`, so a prefix scan
//! visits them by deadline and then by name hash byte order.

use kvstore::{prefix_end, ReadStorage, Storage};

use crate::keys::{
    queue_key, queue_time_key, split_queue_key, ACTIVE_REGISTRY_QUEUE_PREFIX,
    BID_AUCTION_QUEUE_PREFIX, REVEAL_AUCTION_QUEUE_PREFIX,
};
use crate::{NameHash, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeQueue {
    prefix: u8,
}

/// Auctions in their bid phase, by bid deadline.
pub const BID_QUEUE: TimeQueue = TimeQueue::new(BID_AUCTION_QUEUE_PREFIX);
/// Auctions in their reveal phase, by reveal deadline.
pub const REVEAL_QUEUE: TimeQueue = TimeQueue::new(REVEAL_AUCTION_QUEUE_PREFIX);
/// Registries, by expiry.
pub const ACTIVE_REGISTRY_QUEUE: TimeQueue = TimeQueue::new(ACTIVE_REGISTRY_QUEUE_PREFIX);

impl TimeQueue {
    pub const fn new(prefix: u8) -> Self {
        Self { prefix }
    }

    pub fn insert<S: Storage + ?Sized>(&self, store: &mut S, end_time: u64, name_hash: &NameHash) -> Result<()> {
        store.put(&queue_key(self.prefix, end_time, name_hash), name_hash.as_bytes())?;
        Ok(())
    }

    pub fn remove<S: Storage + ?Sized>(&self, store: &mut S, end_time: u64, name_hash: &NameHash) -> Result<()> {
        store.delete(&queue_key(self.prefix, end_time, name_hash))?;
        Ok(())
    }

    pub fn contains<S: ReadStorage + ?Sized>(&self, store: &S, end_time: u64, name_hash: &NameHash) -> Result<bool> {
        Ok(store.has(&queue_key(self.prefix, end_time, name_hash))?)
    }

    /// Entries with `end_time <= now`, ascending by `(end_time, name_hash)`.
    ///
    /// The result reflects the store at call time; call again after mutating
    /// to see the updated set.
    pub fn due_before<S: ReadStorage + ?Sized>(&self, store: &S, now: u64) -> Result<Vec<(u64, NameHash)>> {
        let end = self.due_end(now);
        store
            .range(&[self.prefix], end.as_deref())?
            .iter()
            .map(|(key, _)| split_queue_key(key))
            .collect()
    }

    /// Earliest due entry. Reads a single entry, however many are due.
    pub fn first_due<S: ReadStorage + ?Sized>(&self, store: &S, now: u64) -> Result<Option<(u64, NameHash)>> {
        self.due_from(store, &[self.prefix], now)
    }

    /// Earliest due entry ordered strictly after `(end_time, name_hash)`.
    pub fn next_due_after<S: ReadStorage + ?Sized>(
        &self,
        store: &S,
        now: u64,
        end_time: u64,
        name_hash: &NameHash,
    ) -> Result<Option<(u64, NameHash)>> {
        let mut start = queue_key(self.prefix, end_time, name_hash);
        start.push(0);
        self.due_from(store, &start, now)
    }

    fn due_from<S: ReadStorage + ?Sized>(&self, store: &S, start: &[u8], now: u64) -> Result<Option<(u64, NameHash)>> {
        let end = self.due_end(now);
        store
            .first_in_range(start, end.as_deref())?
            .map(|(key, _)| split_queue_key(&key))
            .transpose()
    }

    /// Every entry in the queue.
    pub fn entries<S: ReadStorage + ?Sized>(&self, store: &S) -> Result<Vec<(u64, NameHash)>> {
        store
            .prefix(&[self.prefix])?
            .iter()
            .map(|(key, _)| split_queue_key(key))
            .collect()
    }

    fn due_end(&self, now: u64) -> Option<Vec<u8>> {
        prefix_end(&queue_time_key(self.prefix, now))
    }
}

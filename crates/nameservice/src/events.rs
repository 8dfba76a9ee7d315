//! Typed events and the hash-chained log they are appended to.

use kvstore::Hash32;
use serde::{Deserialize, Serialize};

use crate::{Address, Coin, Coins, Name, NameServiceError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    AuctionOpened {
        name: Name,
        organizer: Address,
        end_time: u64,
    },
    BidPlaced {
        name: Name,
        bidder: Address,
        deposit: Coin,
    },
    BidRevealed {
        name: Name,
        bidder: Address,
        amount: Coin,
        top_bid: bool,
    },
    RegistryRenewed {
        name: Name,
        fee: Coins,
        end_time: u64,
    },
    OwnerUpdated {
        name: Name,
        old_owner: Address,
        new_owner: Address,
    },
    SubNameRegistered {
        name: Name,
        address: Address,
    },
    SubNameUnregistered {
        name: Name,
        address: Address,
    },
    RevealStarted {
        name: Name,
        end_time: u64,
    },
    /// Bid phase ended without a single bid.
    AuctionClosed {
        name: Name,
    },
    AuctionSettled {
        name: Name,
        owner: Address,
        amount: Coin,
        end_time: u64,
    },
    /// An unrevealed deposit was burned.
    BidSlashed {
        name: Name,
        bidder: Address,
        deposit: Coin,
    },
    RegistryExpired {
        name: Name,
        owner: Address,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: u64,
    pub event: Event,
    pub prev_event_hash: Hash32,
    pub event_hash: Hash32,
}

fn entry_hash(prev_event_hash: &Hash32, time: u64, event: &Event) -> Result<Hash32> {
    let bytes = bincode::serialize(&(prev_event_hash, time, event)).map_err(NameServiceError::codec)?;
    Ok(blake3::hash(&bytes).into())
}

/// Hash-chained event history. Each entry commits to the previous one, so two
/// logs with the same `latest_hash` hold the same events in the same order.
///
/// Memory holds the chain head and count plus the entries appended since the
/// last [`EventLog::drain`]. Hosts drain once per round and persist or forward
/// the entries themselves.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    head: Hash32,
    // head when the pending entries were last drained
    base: Hash32,
    len: u64,
    pending: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, time: u64, event: Event) -> Result<Hash32> {
        let prev_event_hash = self.head;
        let event_hash = entry_hash(&prev_event_hash, time, &event)?;
        self.pending.push(LogEntry {
            time,
            event,
            prev_event_hash,
            event_hash,
        });
        self.head = event_hash;
        self.len += 1;
        Ok(event_hash)
    }

    /// Entries appended since the last drain.
    pub fn pending(&self) -> &[LogEntry] {
        &self.pending
    }

    /// Hands over the pending entries. The chain head and count are kept, so
    /// the next entry still links onto the last drained one.
    pub fn drain(&mut self) -> Vec<LogEntry> {
        self.base = self.head;
        std::mem::take(&mut self.pending)
    }

    /// Entries appended over the log's lifetime, drained or not.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn latest_hash(&self) -> Hash32 {
        self.head
    }

    /// Checks the pending entries link from the last drained head to the
    /// current one.
    pub fn verify_chain(&self) -> bool {
        verify_entries(&self.base, &self.pending)
            && self.pending.last().map_or(self.base, |e| e.event_hash) == self.head
    }
}

/// Checks that `entries` form a chain starting right after `prev`.
pub fn verify_entries(prev: &Hash32, entries: &[LogEntry]) -> bool {
    let mut prev = *prev;

    for e in entries {
        if e.prev_event_hash != prev {
            return false;
        }
        match entry_hash(&prev, e.time, &e.event) {
            Ok(computed) if computed == e.event_hash => {}
            _ => return false,
        }
        prev = e.event_hash;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HASH_LEN;

    fn closed(name: &str) -> Event {
        Event::AuctionClosed { name: Name::new(name) }
    }

    #[test]
    fn test_chain_links_and_verifies() {
        let mut log = EventLog::new();
        assert_eq!(log.latest_hash(), [0u8; 32]);

        let first = log.append(1, closed("wallet.terra")).unwrap();
        let second = log.append(2, closed("other.terra")).unwrap();

        assert_ne!(first, second);
        assert_eq!(log.pending()[1].prev_event_hash, first);
        assert_eq!(log.latest_hash(), second);
        assert!(log.verify_chain());
    }

    #[test]
    fn test_tampering_breaks_chain() {
        let mut log = EventLog::new();
        log.append(1, closed("wallet.terra")).unwrap();
        log.append(2, Event::SubNameRegistered {
            name: Name::new("pay.wallet.terra"),
            address: Address([1; HASH_LEN]),
        })
        .unwrap();

        let mut tampered = log.clone();
        tampered.pending[0].time = 9;
        assert!(!tampered.verify_chain());
    }

    #[test]
    fn test_drained_segments_link() {
        let mut log = EventLog::new();
        log.append(1, closed("a.terra")).unwrap();
        log.append(1, closed("b.terra")).unwrap();
        let first = log.drain();
        assert!(log.pending().is_empty());
        assert_eq!(log.len(), 2);
        assert!(log.verify_chain());

        log.append(2, closed("c.terra")).unwrap();
        let second = log.drain();
        assert_eq!(second[0].prev_event_hash, first[1].event_hash);
        assert_eq!(log.latest_hash(), second[0].event_hash);

        assert!(verify_entries(&[0u8; 32], &first));
        assert!(verify_entries(&first[1].event_hash, &second));
        assert!(!verify_entries(&[0u8; 32], &second));

        // same history, never drained
        let mut whole = EventLog::new();
        for (time, name) in [(1, "a.terra"), (1, "b.terra"), (2, "c.terra")] {
            whole.append(time, closed(name)).unwrap();
        }
        assert_eq!(whole.latest_hash(), log.latest_hash());
        assert_eq!(whole.pending(), [first, second].concat().as_slice());
    }

    #[test]
    fn test_same_history_same_hash() {
        let mut a = EventLog::new();
        let mut b = EventLog::new();
        for log in [&mut a, &mut b] {
            log.append(5, closed("wallet.terra")).unwrap();
        }
        assert_eq!(a.latest_hash(), b.latest_hash());

        b.append(6, closed("wallet.terra")).unwrap();
        assert_ne!(a.latest_hash(), b.latest_hash());
    }
}

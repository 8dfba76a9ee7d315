use kvstore::{prefix_end, ReadStorage, Storage};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::keys::{
    auction_key, bid_key, bid_prefix, registry_key, resolve_key, resolve_prefix,
    reverse_resolve_key, split_bid_key, split_resolve_key, AUCTION_PREFIX, BID_PREFIX,
    REGISTRY_PREFIX, RESOLVE_PREFIX,
};
use crate::queue::TimeQueue;
use crate::{
    Address, Auction, Bid, ChildNameHash, NameHash, NameServiceError, Registry, Result,
};

/// Typed view of the name service collections inside one ordered store.
///
/// Reads need only [`ReadStorage`]; writes need [`Storage`].
pub struct NameStore<S> {
    store: S,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(NameServiceError::codec)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(NameServiceError::codec)
}

impl<S> NameStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ReadStorage> NameStore<S> {
    fn get_record<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn records<T: DeserializeOwned>(&self, prefix: u8) -> Result<Vec<(NameHash, T)>> {
        self.store
            .prefix(&[prefix])?
            .iter()
            .map(|(key, value)| -> Result<(NameHash, T)> {
                Ok((NameHash::from_slice(&key[1..])?, decode(value)?))
            })
            .collect()
    }

    pub fn auction(&self, name_hash: &NameHash) -> Result<Option<Auction>> {
        self.get_record(&auction_key(name_hash))
    }

    pub fn has_auction(&self, name_hash: &NameHash) -> Result<bool> {
        Ok(self.store.has(&auction_key(name_hash))?)
    }

    /// Every auction in name hash order.
    pub fn auctions(&self) -> Result<Vec<(NameHash, Auction)>> {
        self.records(AUCTION_PREFIX)
    }

    pub fn bid(&self, name_hash: &NameHash, bidder: &Address) -> Result<Option<Bid>> {
        self.get_record(&bid_key(name_hash, bidder))
    }

    /// Bids on one name, ordered by bidder address.
    pub fn bids(&self, name_hash: &NameHash) -> Result<Vec<Bid>> {
        self.store
            .prefix(&bid_prefix(name_hash))?
            .iter()
            .map(|(_, value)| decode(value))
            .collect()
    }

    pub fn has_bids(&self, name_hash: &NameHash) -> Result<bool> {
        let prefix = bid_prefix(name_hash);
        let end = prefix_end(&prefix);
        Ok(self.store.first_in_range(&prefix, end.as_deref())?.is_some())
    }

    pub fn all_bids(&self) -> Result<Vec<(NameHash, Bid)>> {
        self.store
            .prefix(&[BID_PREFIX])?
            .iter()
            .map(|(key, value)| -> Result<(NameHash, Bid)> {
                let (name_hash, _) = split_bid_key(key)?;
                Ok((name_hash, decode(value)?))
            })
            .collect()
    }

    pub fn registry(&self, name_hash: &NameHash) -> Result<Option<Registry>> {
        self.get_record(&registry_key(name_hash))
    }

    pub fn has_registry(&self, name_hash: &NameHash) -> Result<bool> {
        Ok(self.store.has(&registry_key(name_hash))?)
    }

    pub fn registries(&self) -> Result<Vec<(NameHash, Registry)>> {
        self.records(REGISTRY_PREFIX)
    }

    pub fn resolve(&self, name_hash: &NameHash, child: &ChildNameHash) -> Result<Option<Address>> {
        self.store
            .get(&resolve_key(name_hash, child))?
            .map(|bytes| Address::from_slice(&bytes))
            .transpose()
    }

    /// Resolve entries under one second-level name, by child hash.
    pub fn resolves(&self, name_hash: &NameHash) -> Result<Vec<(ChildNameHash, Address)>> {
        self.store
            .prefix(&resolve_prefix(name_hash))?
            .iter()
            .map(|(key, value)| -> Result<(ChildNameHash, Address)> {
                let (_, child) = split_resolve_key(key)?;
                Ok((child, Address::from_slice(value)?))
            })
            .collect()
    }

    pub fn all_resolves(&self) -> Result<Vec<(NameHash, ChildNameHash, Address)>> {
        self.store
            .prefix(&[RESOLVE_PREFIX])?
            .iter()
            .map(|(key, value)| -> Result<(NameHash, ChildNameHash, Address)> {
                let (name_hash, child) = split_resolve_key(key)?;
                Ok((name_hash, child, Address::from_slice(value)?))
            })
            .collect()
    }

    pub fn reverse_resolve(&self, address: &Address) -> Result<Option<NameHash>> {
        self.store
            .get(&reverse_resolve_key(address))?
            .map(|bytes| NameHash::from_slice(&bytes))
            .transpose()
    }

    pub fn queue_entries(&self, queue: TimeQueue) -> Result<Vec<(u64, NameHash)>> {
        queue.entries(&self.store)
    }

    pub fn first_due(&self, queue: TimeQueue, now: u64) -> Result<Option<(u64, NameHash)>> {
        queue.first_due(&self.store, now)
    }

    pub fn next_due_after(
        &self,
        queue: TimeQueue,
        now: u64,
        end_time: u64,
        name_hash: &NameHash,
    ) -> Result<Option<(u64, NameHash)>> {
        queue.next_due_after(&self.store, now, end_time, name_hash)
    }
}

impl<S: Storage> NameStore<S> {
    pub fn set_auction(&mut self, name_hash: &NameHash, auction: &Auction) -> Result<()> {
        self.store.put(&auction_key(name_hash), &encode(auction)?)?;
        Ok(())
    }

    pub fn delete_auction(&mut self, name_hash: &NameHash) -> Result<()> {
        self.store.delete(&auction_key(name_hash))?;
        Ok(())
    }

    pub fn set_bid(&mut self, name_hash: &NameHash, bid: &Bid) -> Result<()> {
        self.store.put(&bid_key(name_hash, &bid.bidder), &encode(bid)?)?;
        Ok(())
    }

    pub fn delete_bid(&mut self, name_hash: &NameHash, bidder: &Address) -> Result<()> {
        self.store.delete(&bid_key(name_hash, bidder))?;
        Ok(())
    }

    pub fn set_registry(&mut self, name_hash: &NameHash, registry: &Registry) -> Result<()> {
        self.store.put(&registry_key(name_hash), &encode(registry)?)?;
        Ok(())
    }

    pub fn delete_registry(&mut self, name_hash: &NameHash) -> Result<()> {
        self.store.delete(&registry_key(name_hash))?;
        Ok(())
    }

    pub fn set_resolve(&mut self, name_hash: &NameHash, child: &ChildNameHash, address: &Address) -> Result<()> {
        self.store.put(&resolve_key(name_hash, child), address.as_bytes())?;
        Ok(())
    }

    pub fn delete_resolve(&mut self, name_hash: &NameHash, child: &ChildNameHash) -> Result<()> {
        self.store.delete(&resolve_key(name_hash, child))?;
        Ok(())
    }

    pub fn set_reverse_resolve(&mut self, address: &Address, name_hash: &NameHash) -> Result<()> {
        self.store.put(&reverse_resolve_key(address), name_hash.as_bytes())?;
        Ok(())
    }

    pub fn delete_reverse_resolve(&mut self, address: &Address) -> Result<()> {
        self.store.delete(&reverse_resolve_key(address))?;
        Ok(())
    }

    pub fn enqueue(&mut self, queue: TimeQueue, end_time: u64, name_hash: &NameHash) -> Result<()> {
        queue.insert(&mut self.store, end_time, name_hash)
    }

    pub fn dequeue(&mut self, queue: TimeQueue, end_time: u64, name_hash: &NameHash) -> Result<()> {
        queue.remove(&mut self.store, end_time, name_hash)
    }
}

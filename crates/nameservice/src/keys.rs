//! Store key layout.
//!
//! ```text
//! 0x01 | NameHash                     -> Registry
//! 0x02 | NameHash | ChildNameHash     -> Address
//! 0x03 | Address                      -> NameHash
//! 0x04 | be64(end_time) | NameHash    -> NameHash   (active registry queue)
//! 0x05 | NameHash                     -> Auction
//! 0x06 | NameHash | Address           -> Bid
//! 0x07 | be64(end_time) | NameHash    -> NameHash   (bid auction queue)
//! 0x08 | be64(end_time) | NameHash    -> NameHash   (reveal auction queue)
//! ```

use crate::{Address, ChildNameHash, NameHash, NameServiceError, Result, HASH_LEN};

pub const REGISTRY_PREFIX: u8 = 0x01;
pub const RESOLVE_PREFIX: u8 = 0x02;
pub const REVERSE_RESOLVE_PREFIX: u8 = 0x03;
pub const ACTIVE_REGISTRY_QUEUE_PREFIX: u8 = 0x04;
pub const AUCTION_PREFIX: u8 = 0x05;
pub const BID_PREFIX: u8 = 0x06;
pub const BID_AUCTION_QUEUE_PREFIX: u8 = 0x07;
pub const REVEAL_AUCTION_QUEUE_PREFIX: u8 = 0x08;

const TIME_LEN: usize = 8;

fn key(prefix: u8, parts: &[&[u8]]) -> Vec<u8> {
    let len = 1 + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.push(prefix);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

fn bad_key(what: &str, key: &[u8]) -> NameServiceError {
    NameServiceError::CorruptState(format!("malformed {what} key {}", hex::encode(key)))
}

pub fn registry_key(name_hash: &NameHash) -> Vec<u8> {
    key(REGISTRY_PREFIX, &[name_hash.as_bytes()])
}

pub fn resolve_key(name_hash: &NameHash, child: &ChildNameHash) -> Vec<u8> {
    key(RESOLVE_PREFIX, &[name_hash.as_bytes(), child.as_bytes()])
}

/// Prefix over every resolve entry of one second-level name.
pub fn resolve_prefix(name_hash: &NameHash) -> Vec<u8> {
    key(RESOLVE_PREFIX, &[name_hash.as_bytes()])
}

pub fn split_resolve_key(key: &[u8]) -> Result<(NameHash, ChildNameHash)> {
    if key.len() != 1 + 2 * HASH_LEN || key[0] != RESOLVE_PREFIX {
        return Err(bad_key("resolve", key));
    }
    Ok((
        NameHash::from_slice(&key[1..1 + HASH_LEN])?,
        ChildNameHash::from_slice(&key[1 + HASH_LEN..])?,
    ))
}

pub fn reverse_resolve_key(address: &Address) -> Vec<u8> {
    key(REVERSE_RESOLVE_PREFIX, &[address.as_bytes()])
}

pub fn auction_key(name_hash: &NameHash) -> Vec<u8> {
    key(AUCTION_PREFIX, &[name_hash.as_bytes()])
}

pub fn bid_key(name_hash: &NameHash, bidder: &Address) -> Vec<u8> {
    key(BID_PREFIX, &[name_hash.as_bytes(), bidder.as_bytes()])
}

/// Prefix over every bid placed on one name, ordered by bidder address.
pub fn bid_prefix(name_hash: &NameHash) -> Vec<u8> {
    key(BID_PREFIX, &[name_hash.as_bytes()])
}

pub fn split_bid_key(key: &[u8]) -> Result<(NameHash, Address)> {
    if key.len() != 1 + 2 * HASH_LEN || key[0] != BID_PREFIX {
        return Err(bad_key("bid", key));
    }
    Ok((
        NameHash::from_slice(&key[1..1 + HASH_LEN])?,
        Address::from_slice(&key[1 + HASH_LEN..])?,
    ))
}

/// `prefix | be64(end_time)`; every entry due at `end_time` starts with it.
pub fn queue_time_key(prefix: u8, end_time: u64) -> Vec<u8> {
    let time = end_time.to_be_bytes();
    key(prefix, &[&time[..]])
}

pub fn queue_key(prefix: u8, end_time: u64, name_hash: &NameHash) -> Vec<u8> {
    let time = end_time.to_be_bytes();
    key(prefix, &[&time[..], name_hash.as_bytes()])
}

pub fn split_queue_key(key: &[u8]) -> Result<(u64, NameHash)> {
    if key.len() != 1 + TIME_LEN + HASH_LEN {
        return Err(bad_key("queue", key));
    }
    let mut time = [0u8; TIME_LEN];
    time.copy_from_slice(&key[1..1 + TIME_LEN]);
    Ok((
        u64::from_be_bytes(time),
        NameHash::from_slice(&key[1 + TIME_LEN..])?,
    ))
}

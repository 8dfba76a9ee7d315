//! Ordered Key-Value Store
//!
//! Byte-keyed storage with ordered range scans, a write-back cache overlay
//! for all-or-nothing invocations, and a deterministic state digest.

mod cache;
mod crypto;
mod storage;

pub use cache::CacheStorage;
pub use crypto::{state_digest, Hash32};
pub use storage::{prefix_end, InMemoryStorage, KvPair, ReadStorage, Storage};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

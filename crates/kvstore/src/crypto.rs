//! Deterministic state digest

use crate::storage::ReadStorage;
use crate::Result;

/// 32-byte hash
pub type Hash32 = [u8; 32];

const DOMAIN_ENTRY: u8 = 0x00;

/// Digest of the whole store: H(0x00 || len(key) || key || len(value) || value ...)
/// over every entry in key order. Equal state gives an equal digest.
pub fn state_digest<S: ReadStorage + ?Sized>(store: &S) -> Result<Hash32> {
    let mut hasher = blake3::Hasher::new();
    for (key, value) in store.range(&[], None)? {
        hasher.update(&[DOMAIN_ENTRY]);
        hasher.update(&(key.len() as u64).to_be_bytes());
        hasher.update(&key);
        hasher.update(&(value.len() as u64).to_be_bytes());
        hasher.update(&value);
    }
    Ok(hasher.finalize().into())
}

//! Fixed-width identifiers: name hashes, bid commitments and addresses.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{Coin, Name, NameServiceError};

/// Width of every truncated digest and address.
pub const HASH_LEN: usize = 20;

/// First 20 bytes of SHA-256(data).
pub fn truncated_digest(data: &[u8]) -> [u8; HASH_LEN] {
    let full = Sha256::digest(data);
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&full[..HASH_LEN]);
    out
}

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len_err:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub [u8; HASH_LEN]);

        impl $name {
            pub fn from_slice(bytes: &[u8]) -> Result<Self, NameServiceError> {
                let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| ($len_err)(bytes.len()))?;
                Ok(Self(arr))
            }

            pub fn from_hex(s: &str) -> Result<Self, NameServiceError> {
                let bytes = hex::decode(s).map_err(|e| NameServiceError::InvalidHex(e.to_string()))?;
                Self::from_slice(&bytes)
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&hex::encode(self.0))
                } else {
                    self.0.serialize(serializer)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    Self::from_hex(&s).map_err(D::Error::custom)
                } else {
                    <[u8; HASH_LEN]>::deserialize(deserializer).map(Self)
                }
            }
        }
    };
}

fixed_bytes!(
    /// Truncated digest of a second-level name (`parent.root`); the primary
    /// key of auctions, bids and registries.
    NameHash,
    NameServiceError::InvalidHashLength
);

fixed_bytes!(
    /// Hiding commitment to a bid amount: digest of `salt:name:amount:bidder`.
    BidHash,
    NameServiceError::InvalidHashLength
);

fixed_bytes!(
    /// Account address.
    Address,
    |len: usize| NameServiceError::InvalidAddress(format!("expected {HASH_LEN} bytes, got {len}"))
);

/// Truncated digest of the child label (digest of "" for two-level names).
pub type ChildNameHash = NameHash;

impl NameHash {
    pub fn digest(data: &str) -> Self {
        Self(truncated_digest(data.as_bytes()))
    }
}

impl BidHash {
    /// Commitment a bidder submits at bid time and opens at reveal time.
    pub fn commit(salt: &str, name: &Name, amount: &Coin, bidder: &Address) -> Self {
        let preimage = format!("{salt}:{name}:{amount}:{bidder}");
        Self(truncated_digest(preimage.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip_and_length_check() {
        let hash = NameHash::digest("wallet.terra");
        assert_eq!(NameHash::from_hex(&hash.to_string()).unwrap(), hash);

        assert_eq!(
            BidHash::from_hex("7b").unwrap_err(),
            NameServiceError::InvalidHashLength(1)
        );
        assert!(matches!(
            Address::from_slice(&[1u8; 32]),
            Err(NameServiceError::InvalidAddress(_))
        ));
        assert!(matches!(
            NameHash::from_hex("zz"),
            Err(NameServiceError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_json_uses_hex() {
        let addr = Address([0xab; HASH_LEN]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(HASH_LEN)));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), addr);
    }

    #[test]
    fn test_bincode_uses_raw_bytes() {
        let hash = NameHash::digest("wallet.terra");
        let bytes = bincode::serialize(&hash).unwrap();
        assert_eq!(bytes.len(), HASH_LEN);
        assert_eq!(bincode::deserialize::<NameHash>(&bytes).unwrap(), hash);
    }

    #[test]
    fn test_commitment_binds_every_field() {
        let name = Name::new("wallet.terra");
        let amount = Coin::new("uluna", 900);
        let bidder = Address([1; HASH_LEN]);
        let base = BidHash::commit("salt", &name, &amount, &bidder);

        assert_eq!(base, BidHash::commit("salt", &name, &amount, &bidder));
        assert_ne!(base, BidHash::commit("salu", &name, &amount, &bidder));
        assert_ne!(base, BidHash::commit("salt", &Name::new("walley.terra"), &amount, &bidder));
        assert_ne!(base, BidHash::commit("salt", &name, &Coin::new("uluna", 901), &bidder));
        assert_ne!(base, BidHash::commit("salt", &name, &amount, &Address([2; HASH_LEN])));
    }
}

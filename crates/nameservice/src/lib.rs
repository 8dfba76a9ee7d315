//! Sealed-bid name auctions and a time-bounded name registry.
//!
//! Names are auctioned through a commit-reveal protocol, settled into
//! registries that expire unless renewed, and may carry sub-name
//! resolutions. All state lives in prefix-namespaced regions of one
//! ordered key-value store; a per-round sweep advances every deadline.

mod coins;
mod engine;
mod error;
mod escrow;
mod events;
mod handlers;
mod msgs;
mod name;
mod params;
mod price;
mod schema;
mod sweep;
mod types;

pub mod genesis;
pub mod keys;
pub mod query;
pub mod queue;
pub mod renewal;
pub mod store;

pub use coins::{validate_denom, Coin, Coins};
pub use engine::NameService;
pub use error::{NameServiceError, Result};
pub use escrow::{Escrow, EscrowError, InMemoryBank, PendingEscrow};
pub use events::{verify_entries, Event, EventLog, LogEntry};
pub use genesis::{BidEntry, GenesisState, ResolveEntry};
pub use msgs::{Msg, MAX_SALT_LEN};
pub use name::{Name, MAX_LABEL_LEN, MAX_NAME_LEN};
pub use params::{Params, RenewalFee, RenewalFees, DAY, MINUTE, MIN_PERIOD};
pub use price::{ExchangeRates, PriceError, PriceOracle};
pub use query::{AuctionFilter, Query, QueryResponse};
pub use schema::{Auction, AuctionStatus, Bid, Registry, TopBid};
pub use types::{truncated_digest, Address, BidHash, ChildNameHash, NameHash, HASH_LEN};

//! Name service error types.

use kvstore::StoreError;
use thiserror::Error;

use crate::escrow::EscrowError;
use crate::price::PriceError;
use crate::{Address, AuctionStatus, BidHash, Coin};

/// Errors returned by the name service.
///
/// Validation, state-conflict and verification errors are pure functions of
/// state and input. `CorruptState` means a queue entry lost its record and is
/// fatal for the round that hit it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameServiceError {
    #[error("Failed to validate name {name}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Salt length should be 1~4, but given {0}")]
    InvalidSaltLength(usize),

    #[error("The hash bytes length should equal 20 but given {0}")]
    InvalidHashLength(usize),

    #[error("Name length should be bigger than or equal to {min}, but given {got}")]
    InvalidNameLength { min: usize, got: usize },

    #[error("Retrieved hash [{got}] differs from bid hash [{expected}]")]
    VerificationFailed { expected: BidHash, got: BidHash },

    #[error("There is no auction for the given name")]
    AuctionNotExists,

    #[error("There is no bid for the given name and address")]
    BidNotExists,

    #[error("There is no registry for the given name")]
    RegistryNotExists,

    #[error("There is no resolve entry for the given name")]
    ResolveNotExists,

    #[error("There is no reverse resolve entry for {0}")]
    ReverseResolveNotExists(Address),

    #[error("The root name should be {expected} not {got}")]
    InvalidRootName { expected: String, got: String },

    #[error("The name already taken")]
    NameAlreadyTaken,

    #[error("The name auction exists")]
    AuctionExists,

    #[error("The auction is not bid status, but {0} status")]
    AuctionNotBidStatus(AuctionStatus),

    #[error("Bid is already exists")]
    BidAlreadyExists,

    #[error("The auction is not reveal status, but {0} status")]
    AuctionNotRevealStatus(AuctionStatus),

    #[error("Address is already registered")]
    AddressAlreadyRegistered,

    #[error("Bid amount must be smaller than or equal to deposit {0}")]
    DepositSmallerThanBidAmount(Coin),

    #[error("Deposit can not be smaller than {0}")]
    LowDeposit(Coin),

    #[error("Unauthorized: registered owner is {owner}")]
    Unauthorized { owner: Address },

    #[error("Invalid coins: {0}")]
    InvalidCoins(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(&'static str),

    #[error(transparent)]
    Escrow(#[from] EscrowError),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Corrupt state: {0}")]
    CorruptState(String),
}

impl NameServiceError {
    /// Stable numeric code for front-ends.
    pub fn code(&self) -> u32 {
        use NameServiceError::*;
        match self {
            InvalidName { .. } => 1,
            InvalidSaltLength(_) => 2,
            InvalidHashLength(_) => 3,
            InvalidNameLength { .. } => 4,
            VerificationFailed { .. } => 5,
            AuctionNotExists => 6,
            BidNotExists => 7,
            RegistryNotExists => 9,
            ResolveNotExists => 10,
            ReverseResolveNotExists(_) => 11,
            InvalidRootName { .. } => 12,
            NameAlreadyTaken => 13,
            AuctionExists => 14,
            AuctionNotBidStatus(_) => 15,
            BidAlreadyExists => 16,
            AuctionNotRevealStatus(_) => 17,
            AddressAlreadyRegistered => 19,
            DepositSmallerThanBidAmount(_) => 20,
            LowDeposit(_) => 21,
            Unauthorized { .. } => 101,
            InvalidCoins(_) => 102,
            InvalidHex(_) => 103,
            InvalidAddress(_) => 104,
            InvalidParams(_) => 105,
            InvalidGenesis(_) => 106,
            Overflow(_) => 107,
            Escrow(_) => 110,
            Price(_) => 111,
            Store(_) => 120,
            Codec(_) => 121,
            CorruptState(_) => 122,
        }
    }

    pub(crate) fn codec(err: impl std::fmt::Display) -> Self {
        NameServiceError::Codec(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NameServiceError>;

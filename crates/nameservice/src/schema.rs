use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Address, BidHash, Coin, Name};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionStatus {
    Bid,
    Reveal,
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionStatus::Bid => f.write_str("bid"),
            AuctionStatus::Reveal => f.write_str("reveal"),
        }
    }
}

/// Highest honest reveal so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopBid {
    pub bidder: Address,
    pub amount: Coin,
}

/// An in-flight auction. Absent once settled or closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub name: Name,
    pub status: AuctionStatus,
    pub end_time: u64,
    pub top_bid: Option<TopBid>,
}

impl Auction {
    pub fn new(name: Name, end_time: u64) -> Self {
        Self {
            name,
            status: AuctionStatus::Bid,
            end_time,
            top_bid: None,
        }
    }

    pub fn top_bidder(&self) -> Option<&Address> {
        self.top_bid.as_ref().map(|t| &t.bidder)
    }

    pub fn top_bid_amount(&self) -> Option<&Coin> {
        self.top_bid.as_ref().map(|t| &t.amount)
    }
}

/// A sealed bid: the commitment plus the public deposit held in escrow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub hash: BidHash,
    pub deposit: Coin,
    pub bidder: Address,
}

/// Ownership of a second-level name until `end_time`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub name: Name,
    pub owner: Address,
    pub end_time: u64,
}

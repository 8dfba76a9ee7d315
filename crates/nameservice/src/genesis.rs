//! Genesis import/export.
//!
//! Queues and the reverse-resolve index are not part of the genesis state;
//! they are rebuilt from record end times and resolve entries on import.

use std::collections::BTreeSet;

use kvstore::{ReadStorage, Storage};
use serde::{Deserialize, Serialize};

use crate::queue::{ACTIVE_REGISTRY_QUEUE, BID_QUEUE, REVEAL_QUEUE};
use crate::store::NameStore;
use crate::{
    Address, Auction, AuctionStatus, Bid, ChildNameHash, Name, NameHash, NameServiceError,
    Params, Registry, Result,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidEntry {
    pub name_hash: NameHash,
    pub bid: Bid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveEntry {
    pub name_hash: NameHash,
    pub child_hash: ChildNameHash,
    pub address: Address,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub auctions: Vec<Auction>,
    pub bids: Vec<BidEntry>,
    pub registries: Vec<Registry>,
    pub resolves: Vec<ResolveEntry>,
}

fn invalid(msg: String) -> NameServiceError {
    NameServiceError::InvalidGenesis(msg)
}

/// Hash of a second level name under `root`.
fn second_level_hash(name: &Name, root: &str) -> Result<NameHash> {
    name.validate().map_err(|e| invalid(e.to_string()))?;
    if name.levels() != 2 {
        return Err(invalid(format!("{name} is not a second level name")));
    }
    if name.split().0 != root {
        return Err(invalid(format!("{name} is not under .{root}")));
    }
    Ok(name.hash().0)
}

impl GenesisState {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Checks the cross-collection invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;

        let root = self.params.root_name.as_str();
        let bid_names: BTreeSet<NameHash> = self.bids.iter().map(|e| e.name_hash).collect();

        let mut auctions = BTreeSet::new();
        for auction in &self.auctions {
            let name_hash = second_level_hash(&auction.name, root)?;
            if !auctions.insert(name_hash) {
                return Err(invalid(format!("duplicate auction for {}", auction.name)));
            }
            match auction.status {
                AuctionStatus::Bid if auction.top_bid.is_some() => {
                    return Err(invalid(format!("auction {} has a top bid in bid phase", auction.name)));
                }
                // the bid phase only hands over auctions that received a bid
                AuctionStatus::Reveal if auction.top_bid.is_none() && !bid_names.contains(&name_hash) => {
                    return Err(invalid(format!("auction {} is in reveal phase without bids", auction.name)));
                }
                _ => {}
            }
        }

        let mut registries = BTreeSet::new();
        for registry in &self.registries {
            let name_hash = second_level_hash(&registry.name, root)?;
            if auctions.contains(&name_hash) {
                return Err(invalid(format!("{} has both an auction and a registry", registry.name)));
            }
            if !registries.insert(name_hash) {
                return Err(invalid(format!("duplicate registry for {}", registry.name)));
            }
        }

        let mut bids = BTreeSet::new();
        for entry in &self.bids {
            if !auctions.contains(&entry.name_hash) {
                return Err(invalid(format!("bid on {} without an auction", entry.name_hash)));
            }
            if !bids.insert((entry.name_hash, entry.bid.bidder)) {
                return Err(invalid(format!(
                    "duplicate bid by {} on {}",
                    entry.bid.bidder, entry.name_hash
                )));
            }
        }

        let mut resolves = BTreeSet::new();
        let mut addresses = BTreeSet::new();
        for entry in &self.resolves {
            if !registries.contains(&entry.name_hash) {
                return Err(invalid(format!("resolve under {} without a registry", entry.name_hash)));
            }
            if !resolves.insert((entry.name_hash, entry.child_hash)) {
                return Err(invalid(format!("duplicate resolve under {}", entry.name_hash)));
            }
            if !addresses.insert(entry.address) {
                return Err(invalid(format!("address {} resolved twice", entry.address)));
            }
        }

        Ok(())
    }
}

/// Writes every record and rebuilds the queues and reverse index.
pub fn init_genesis<S: Storage>(store: &mut NameStore<S>, genesis: &GenesisState) -> Result<()> {
    genesis.validate()?;

    for auction in &genesis.auctions {
        let (name_hash, _) = auction.name.hash();
        store.set_auction(&name_hash, auction)?;
        let queue = match auction.status {
            AuctionStatus::Bid => BID_QUEUE,
            AuctionStatus::Reveal => REVEAL_QUEUE,
        };
        store.enqueue(queue, auction.end_time, &name_hash)?;
    }

    for entry in &genesis.bids {
        store.set_bid(&entry.name_hash, &entry.bid)?;
    }

    for registry in &genesis.registries {
        let (name_hash, _) = registry.name.hash();
        store.set_registry(&name_hash, registry)?;
        store.enqueue(ACTIVE_REGISTRY_QUEUE, registry.end_time, &name_hash)?;
    }

    for entry in &genesis.resolves {
        store.set_resolve(&entry.name_hash, &entry.child_hash, &entry.address)?;
        store.set_reverse_resolve(&entry.address, &entry.name_hash)?;
    }

    Ok(())
}

/// Reads every record back in key order.
pub fn export_genesis<S: ReadStorage>(store: &NameStore<S>, params: &Params) -> Result<GenesisState> {
    Ok(GenesisState {
        params: params.clone(),
        auctions: store.auctions()?.into_iter().map(|(_, a)| a).collect(),
        bids: store
            .all_bids()?
            .into_iter()
            .map(|(name_hash, bid)| BidEntry { name_hash, bid })
            .collect(),
        registries: store.registries()?.into_iter().map(|(_, r)| r).collect(),
        resolves: store
            .all_resolves()?
            .into_iter()
            .map(|(name_hash, child_hash, address)| ResolveEntry {
                name_hash,
                child_hash,
                address,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BidHash, Coin, TopBid, HASH_LEN};

    fn addr(b: u8) -> Address {
        Address([b; HASH_LEN])
    }

    fn sample() -> GenesisState {
        let wallet = Name::new("wallet.terra");
        let (wallet_hash, _) = wallet.hash();
        let (pay_parent, pay_child) = Name::new("pay.owned.terra").hash();

        GenesisState {
            params: Params::default(),
            auctions: vec![Auction {
                name: wallet,
                status: AuctionStatus::Reveal,
                end_time: 500,
                top_bid: Some(TopBid { bidder: addr(1), amount: Coin::new("uluna", 900) }),
            }],
            bids: vec![BidEntry {
                name_hash: wallet_hash,
                bid: Bid { hash: BidHash([7; HASH_LEN]), deposit: Coin::new("uluna", 1000), bidder: addr(2) },
            }],
            registries: vec![Registry { name: Name::new("owned.terra"), owner: addr(3), end_time: 900 }],
            resolves: vec![ResolveEntry { name_hash: pay_parent, child_hash: pay_child, address: addr(4) }],
        }
    }

    #[test]
    fn test_sample_is_valid() {
        sample().validate().unwrap();
        GenesisState::default().validate().unwrap();
    }

    #[test]
    fn test_orphans_and_conflicts_are_rejected() {
        let mut g = sample();
        g.bids[0].name_hash = NameHash::digest("nobody.terra");
        assert_eq!(g.validate().unwrap_err().code(), 106);

        let mut g = sample();
        g.registries.push(Registry { name: Name::new("wallet.terra"), owner: addr(3), end_time: 1 });
        assert!(g.validate().is_err());

        let mut g = sample();
        g.resolves.push(ResolveEntry {
            name_hash: g.resolves[0].name_hash,
            child_hash: ChildNameHash::digest("other"),
            address: addr(4),
        });
        assert!(g.validate().is_err());

        let mut g = sample();
        g.auctions[0].name = Name::new("a.wallet.terra");
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_foreign_roots_and_bidless_reveals_are_rejected() {
        let mut g = sample();
        g.auctions[0].name = Name::new("wallet.luna");
        g.bids[0].name_hash = g.auctions[0].name.hash().0;
        let err = g.validate().unwrap_err();
        assert_eq!(err.code(), 106);
        assert!(err.to_string().contains("not under .terra"), "{err}");

        let mut g = sample();
        g.registries[0].name = Name::new("owned.luna");
        g.resolves.clear();
        assert_eq!(g.validate().unwrap_err().code(), 106);

        // a reveal phase auction needs a top bid or an unrevealed bid
        let mut g = sample();
        g.bids.clear();
        g.validate().unwrap();
        g.auctions[0].top_bid = None;
        let err = g.validate().unwrap_err();
        assert!(err.to_string().contains("without bids"), "{err}");

        let mut g = sample();
        g.auctions[0].top_bid = None;
        g.validate().unwrap();

        // a custom root moves the whole namespace
        let mut g = sample();
        g.params.root_name = "luna".to_string();
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let g = sample();
        let json = serde_json::to_string_pretty(&g).unwrap();
        assert_eq!(serde_json::from_str::<GenesisState>(&json).unwrap(), g);
    }
}

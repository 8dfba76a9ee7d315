//! Read-only queries.

use kvstore::ReadStorage;
use serde::{Deserialize, Serialize};

use crate::store::NameStore;
use crate::{
    Address, Auction, AuctionStatus, Bid, Name, NameHash, NameServiceError, Params, Registry,
    Result,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionFilter {
    #[default]
    All,
    Name(Name),
    Status(AuctionStatus),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Auctions { filter: AuctionFilter },
    Bids { name: Name, bidder: Option<Address> },
    Registry { name: Name },
    Resolve { name: Name },
    ReverseResolve { address: Address },
    Params,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryResponse {
    Auctions(Vec<Auction>),
    Bids(Vec<Bid>),
    Registry(Registry),
    Resolve(Address),
    ReverseResolve(Registry),
    Params(Params),
}

fn checked_hash(name: &Name, levels: &[usize]) -> Result<NameHash> {
    name.validate()?;
    if !levels.contains(&name.levels()) {
        return Err(NameServiceError::InvalidName {
            name: name.to_string(),
            reason: format!("expected {levels:?} levels"),
        });
    }
    Ok(name.hash().0)
}

pub fn auctions<S: ReadStorage>(store: &NameStore<S>, filter: &AuctionFilter) -> Result<Vec<Auction>> {
    match filter {
        AuctionFilter::Name(name) => {
            let name_hash = checked_hash(name, &[2])?;
            Ok(store.auction(&name_hash)?.into_iter().collect())
        }
        AuctionFilter::Status(status) => Ok(store
            .auctions()?
            .into_iter()
            .map(|(_, auction)| auction)
            .filter(|auction| auction.status == *status)
            .collect()),
        AuctionFilter::All => Ok(store.auctions()?.into_iter().map(|(_, a)| a).collect()),
    }
}

/// All bids on `name`, or just `bidder`'s (empty when it has none).
pub fn bids<S: ReadStorage>(store: &NameStore<S>, name: &Name, bidder: Option<&Address>) -> Result<Vec<Bid>> {
    let name_hash = checked_hash(name, &[2])?;
    match bidder {
        Some(bidder) => Ok(store.bid(&name_hash, bidder)?.into_iter().collect()),
        None => store.bids(&name_hash),
    }
}

pub fn registry<S: ReadStorage>(store: &NameStore<S>, name: &Name) -> Result<Registry> {
    let name_hash = checked_hash(name, &[2])?;
    store
        .registry(&name_hash)?
        .ok_or(NameServiceError::RegistryNotExists)
}

/// Address a two- or three-level name points at.
pub fn resolve<S: ReadStorage>(store: &NameStore<S>, name: &Name) -> Result<Address> {
    checked_hash(name, &[2, 3])?;
    let (name_hash, child_hash) = name.hash();
    store
        .resolve(&name_hash, &child_hash)?
        .ok_or(NameServiceError::ResolveNotExists)
}

/// Registry of the name `address` is registered under.
pub fn reverse_resolve<S: ReadStorage>(store: &NameStore<S>, address: &Address) -> Result<Registry> {
    let name_hash = store
        .reverse_resolve(address)?
        .ok_or(NameServiceError::ReverseResolveNotExists(*address))?;
    store
        .registry(&name_hash)?
        .ok_or(NameServiceError::RegistryNotExists)
}

pub fn query<S: ReadStorage>(store: &NameStore<S>, params: &Params, query: &Query) -> Result<QueryResponse> {
    Ok(match query {
        Query::Auctions { filter } => QueryResponse::Auctions(auctions(store, filter)?),
        Query::Bids { name, bidder } => QueryResponse::Bids(bids(store, name, bidder.as_ref())?),
        Query::Registry { name } => QueryResponse::Registry(registry(store, name)?),
        Query::Resolve { name } => QueryResponse::Resolve(resolve(store, name)?),
        Query::ReverseResolve { address } => {
            QueryResponse::ReverseResolve(reverse_resolve(store, address)?)
        }
        Query::Params => QueryResponse::Params(params.clone()),
    })
}

//! The auction and registry engine.

use kvstore::{state_digest, CacheStorage, Hash32, Storage};
use tracing::{debug, info, warn};

use crate::genesis::{export_genesis, init_genesis, GenesisState};
use crate::handlers::Context;
use crate::query::{self, AuctionFilter, Query, QueryResponse};
use crate::store::NameStore;
use crate::{
    Address, Auction, Bid, BidHash, Coin, Coins, Escrow, Event, EventLog, LogEntry, Msg, Name, Params,
    PendingEscrow, PriceOracle, Registry, Result,
};

enum Step<'m> {
    Deliver(&'m Msg),
    Sweep,
}

/// Runs messages and per-round sweeps against one store, one escrow and one
/// price oracle.
///
/// Every call is all-or-nothing: store writes and escrow moves are staged
/// and applied only when the call succeeds.
pub struct NameService<S, E, P> {
    store: S,
    escrow: E,
    oracle: P,
    params: Params,
    events: EventLog,
}

impl<S: Storage, E: Escrow, P: PriceOracle> NameService<S, E, P> {
    pub fn new(store: S, escrow: E, oracle: P, params: Params) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            store,
            escrow,
            oracle,
            params,
            events: EventLog::new(),
        })
    }

    /// Builds an engine over an empty store seeded from `genesis`.
    pub fn from_genesis(mut store: S, escrow: E, oracle: P, genesis: &GenesisState) -> Result<Self> {
        {
            let mut staged = NameStore::new(CacheStorage::new(&mut store));
            init_genesis(&mut staged, genesis)?;
            staged.into_inner().commit()?;
        }
        info!(
            auctions = genesis.auctions.len(),
            registries = genesis.registries.len(),
            "genesis loaded"
        );
        Self::new(store, escrow, oracle, genesis.params.clone())
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn set_params(&mut self, params: Params) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn escrow(&self) -> &E {
        &self.escrow
    }

    pub fn escrow_mut(&mut self) -> &mut E {
        &mut self.escrow
    }

    pub fn oracle_mut(&mut self) -> &mut P {
        &mut self.oracle
    }

    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    /// Takes the log entries appended since the last call. Hosts call this
    /// once per round; the chain head carries over.
    pub fn drain_events(&mut self) -> Vec<LogEntry> {
        self.events.drain()
    }

    /// Digest of the whole store; equal on replicas with equal state.
    pub fn state_digest(&self) -> Result<Hash32> {
        Ok(state_digest(&self.store)?)
    }

    /// Runs one step against staged copies of the store and escrow, then
    /// applies both. The store is flushed first so a failed flush leaves
    /// the escrow untouched. The escrow replay is assumed infallible: every
    /// move in it was checked against the staged balances.
    fn run(&mut self, now: u64, step: Step<'_>) -> Result<Vec<Event>> {
        let mut ctx = Context {
            now,
            params: &self.params,
            oracle: &self.oracle,
            store: NameStore::new(CacheStorage::new(&mut self.store)),
            escrow: PendingEscrow::new(&mut self.escrow),
            events: Vec::new(),
        };

        match step {
            Step::Deliver(msg) => ctx.handle(msg)?,
            Step::Sweep => ctx.sweep()?,
        }

        let Context { store, escrow, events, .. } = ctx;
        store.into_inner().commit()?;
        escrow.commit()?;

        for event in &events {
            self.events.append(now, event.clone())?;
        }
        Ok(events)
    }

    /// Validates and applies one message at time `now`. On error nothing
    /// changes.
    pub fn deliver(&mut self, now: u64, msg: &Msg) -> Result<Vec<Event>> {
        let result = msg
            .validate_basic()
            .and_then(|()| self.run(now, Step::Deliver(msg)));

        match &result {
            Ok(_) => debug!(kind = msg.kind(), name = %msg.name(), signer = %msg.signer(), "message delivered"),
            Err(err) => warn!(kind = msg.kind(), name = %msg.name(), code = err.code(), %err, "message rejected"),
        }
        result
    }

    /// Advances every queue entry due at or before `now`. A broken queue
    /// invariant aborts the whole round with `CorruptState`.
    pub fn end_block(&mut self, now: u64) -> Result<Vec<Event>> {
        let events = self.run(now, Step::Sweep)?;
        if !events.is_empty() {
            info!(now, events = events.len(), "round swept");
        }
        Ok(events)
    }

    pub fn open_auction(&mut self, now: u64, name: &Name, organizer: &Address) -> Result<Vec<Event>> {
        self.deliver(now, &Msg::OpenAuction {
            name: name.clone(),
            organizer: *organizer,
        })
    }

    pub fn bid_auction(
        &mut self,
        now: u64,
        name: &Name,
        hash: &BidHash,
        deposit: &Coin,
        bidder: &Address,
    ) -> Result<Vec<Event>> {
        self.deliver(now, &Msg::BidAuction {
            name: name.clone(),
            hash: hash.to_string(),
            deposit: deposit.clone(),
            bidder: *bidder,
        })
    }

    pub fn reveal_bid(
        &mut self,
        now: u64,
        name: &Name,
        salt: &str,
        amount: &Coin,
        bidder: &Address,
    ) -> Result<Vec<Event>> {
        self.deliver(now, &Msg::RevealBid {
            name: name.clone(),
            salt: salt.to_string(),
            amount: amount.clone(),
            bidder: *bidder,
        })
    }

    pub fn renew_registry(&mut self, now: u64, name: &Name, fee: &Coins, owner: &Address) -> Result<Vec<Event>> {
        self.deliver(now, &Msg::RenewRegistry {
            name: name.clone(),
            fee: fee.clone(),
            owner: *owner,
        })
    }

    pub fn update_owner(&mut self, now: u64, name: &Name, new_owner: &Address, owner: &Address) -> Result<Vec<Event>> {
        self.deliver(now, &Msg::UpdateOwner {
            name: name.clone(),
            new_owner: *new_owner,
            owner: *owner,
        })
    }

    pub fn register_sub_name(&mut self, now: u64, name: &Name, address: &Address, owner: &Address) -> Result<Vec<Event>> {
        self.deliver(now, &Msg::RegisterSubName {
            name: name.clone(),
            address: *address,
            owner: *owner,
        })
    }

    pub fn unregister_sub_name(&mut self, now: u64, name: &Name, owner: &Address) -> Result<Vec<Event>> {
        self.deliver(now, &Msg::UnregisterSubName {
            name: name.clone(),
            owner: *owner,
        })
    }

    fn reader(&self) -> NameStore<&S> {
        NameStore::new(&self.store)
    }

    pub fn query(&self, q: &Query) -> Result<QueryResponse> {
        query::query(&self.reader(), &self.params, q)
    }

    pub fn auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>> {
        query::auctions(&self.reader(), filter)
    }

    /// The open auction for `name`, if any.
    pub fn auction(&self, name: &Name) -> Result<Option<Auction>> {
        Ok(self.auctions(&AuctionFilter::Name(name.clone()))?.pop())
    }

    pub fn bids(&self, name: &Name, bidder: Option<&Address>) -> Result<Vec<Bid>> {
        query::bids(&self.reader(), name, bidder)
    }

    pub fn registry(&self, name: &Name) -> Result<Registry> {
        query::registry(&self.reader(), name)
    }

    pub fn resolve(&self, name: &Name) -> Result<Address> {
        query::resolve(&self.reader(), name)
    }

    pub fn reverse_resolve(&self, address: &Address) -> Result<Registry> {
        query::reverse_resolve(&self.reader(), address)
    }

    pub fn export_genesis(&self) -> Result<GenesisState> {
        export_genesis(&self.reader(), &self.params)
    }
}

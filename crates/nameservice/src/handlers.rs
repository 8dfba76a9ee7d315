//! Transaction handlers. Each runs against a staged store and staged escrow
//! owned by [`Context`]; the engine commits both only when the handler
//! returns `Ok`.

use kvstore::Storage;
use tracing::debug;

use crate::queue::{ACTIVE_REGISTRY_QUEUE, BID_QUEUE};
use crate::renewal::renewal_extension;
use crate::store::NameStore;
use crate::{
    Address, Auction, AuctionStatus, Bid, BidHash, Coin, Coins, Escrow, Event, Msg, Name,
    NameHash, NameServiceError, Params, PriceOracle, Registry, Result, TopBid,
};

pub(crate) struct Context<'a, S, E, P: ?Sized> {
    pub now: u64,
    pub params: &'a Params,
    pub oracle: &'a P,
    pub store: NameStore<S>,
    pub escrow: E,
    pub events: Vec<Event>,
}

pub(crate) fn add_time(time: u64, period: u64) -> Result<u64> {
    time.checked_add(period)
        .ok_or(NameServiceError::Overflow("timestamp"))
}

impl<S: Storage, E: Escrow, P: PriceOracle + ?Sized> Context<'_, S, E, P> {
    pub fn handle(&mut self, msg: &Msg) -> Result<()> {
        match msg {
            Msg::OpenAuction { name, organizer } => self.open_auction(name, organizer),
            Msg::BidAuction { name, hash, deposit, bidder } => {
                self.bid_auction(name, hash, deposit, bidder)
            }
            Msg::RevealBid { name, salt, amount, bidder } => {
                self.reveal_bid(name, salt, amount, bidder)
            }
            Msg::RenewRegistry { name, fee, owner } => self.renew_registry(name, fee, owner),
            Msg::UpdateOwner { name, new_owner, owner } => {
                self.update_owner(name, new_owner, owner)
            }
            Msg::RegisterSubName { name, address, owner } => {
                self.register_sub_name(name, address, owner)
            }
            Msg::UnregisterSubName { name, owner } => self.unregister_sub_name(name, owner),
        }
    }

    fn open_auction(&mut self, name: &Name, organizer: &Address) -> Result<()> {
        let (root, parent, _) = name.split();
        if root != self.params.root_name {
            return Err(NameServiceError::InvalidRootName {
                expected: self.params.root_name.clone(),
                got: root.to_string(),
            });
        }
        if parent.len() < self.params.min_name_length {
            return Err(NameServiceError::InvalidNameLength {
                min: self.params.min_name_length,
                got: parent.len(),
            });
        }

        let (name_hash, _) = name.hash();
        if self.store.has_registry(&name_hash)? {
            return Err(NameServiceError::NameAlreadyTaken);
        }
        if self.store.has_auction(&name_hash)? {
            return Err(NameServiceError::AuctionExists);
        }

        let end_time = add_time(self.now, self.params.bid_period)?;
        self.store.set_auction(&name_hash, &Auction::new(name.clone(), end_time))?;
        self.store.enqueue(BID_QUEUE, end_time, &name_hash)?;

        debug!(%name, %organizer, end_time, "auction opened");
        self.events.push(Event::AuctionOpened {
            name: name.clone(),
            organizer: *organizer,
            end_time,
        });
        Ok(())
    }

    fn bid_auction(&mut self, name: &Name, hash: &str, deposit: &Coin, bidder: &Address) -> Result<()> {
        let (name_hash, _) = name.hash();
        let auction = self
            .store
            .auction(&name_hash)?
            .ok_or(NameServiceError::AuctionNotExists)?;
        if auction.status != AuctionStatus::Bid {
            return Err(NameServiceError::AuctionNotBidStatus(auction.status));
        }
        if self.store.bid(&name_hash, bidder)?.is_some() {
            return Err(NameServiceError::BidAlreadyExists);
        }
        if !deposit.is_gte(&self.params.min_deposit) {
            return Err(NameServiceError::LowDeposit(self.params.min_deposit.clone()));
        }
        let hash = BidHash::from_hex(hash)?;

        self.escrow
            .transfer_to_escrow(bidder, &Coins::from(deposit.clone()))?;

        let bid = Bid {
            hash,
            deposit: deposit.clone(),
            bidder: *bidder,
        };
        self.store.set_bid(&name_hash, &bid)?;

        debug!(%name, %bidder, %deposit, "bid placed");
        self.events.push(Event::BidPlaced {
            name: name.clone(),
            bidder: *bidder,
            deposit: deposit.clone(),
        });
        Ok(())
    }

    fn reveal_bid(&mut self, name: &Name, salt: &str, amount: &Coin, bidder: &Address) -> Result<()> {
        let (name_hash, _) = name.hash();
        let mut auction = self
            .store
            .auction(&name_hash)?
            .ok_or(NameServiceError::AuctionNotExists)?;
        if auction.status != AuctionStatus::Reveal {
            return Err(NameServiceError::AuctionNotRevealStatus(auction.status));
        }
        let bid = self
            .store
            .bid(&name_hash, bidder)?
            .ok_or(NameServiceError::BidNotExists)?;

        let computed = BidHash::commit(salt, name, amount, bidder);
        if computed != bid.hash {
            return Err(NameServiceError::VerificationFailed {
                expected: bid.hash,
                got: computed,
            });
        }
        if !bid.deposit.is_gte(amount) {
            return Err(NameServiceError::DepositSmallerThanBidAmount(bid.deposit));
        }

        // strictly greater displaces the incumbent; ties keep it
        let is_top = match &auction.top_bid {
            None => true,
            Some(top) => amount.amount > top.amount.amount,
        };

        if is_top {
            if let Some(previous) = auction.top_bid.take() {
                self.escrow
                    .transfer_from_escrow(&previous.bidder, &Coins::from(previous.amount))?;
            }
            let surplus = Coin::new(amount.denom.clone(), bid.deposit.amount - amount.amount);
            self.escrow.transfer_from_escrow(bidder, &Coins::from(surplus))?;
            auction.top_bid = Some(TopBid {
                bidder: *bidder,
                amount: amount.clone(),
            });
        } else {
            self.escrow
                .transfer_from_escrow(bidder, &Coins::from(bid.deposit.clone()))?;
        }

        self.store.delete_bid(&name_hash, bidder)?;
        self.store.set_auction(&name_hash, &auction)?;

        debug!(%name, %bidder, %amount, is_top, "bid revealed");
        self.events.push(Event::BidRevealed {
            name: name.clone(),
            bidder: *bidder,
            amount: amount.clone(),
            top_bid: is_top,
        });
        Ok(())
    }

    fn owned_registry(&self, name_hash: &NameHash, owner: &Address) -> Result<Registry> {
        let registry = self
            .store
            .registry(name_hash)?
            .ok_or(NameServiceError::RegistryNotExists)?;
        if registry.owner != *owner {
            return Err(NameServiceError::Unauthorized {
                owner: registry.owner,
            });
        }
        Ok(registry)
    }

    fn renew_registry(&mut self, name: &Name, fee: &Coins, owner: &Address) -> Result<()> {
        let (name_hash, _) = name.hash();
        let mut registry = self.owned_registry(&name_hash, owner)?;

        let (_, parent, _) = name.split();
        let extension = renewal_extension(fee, parent.len(), self.params, self.oracle)?;
        let end_time = add_time(registry.end_time, extension)?;

        self.escrow.transfer_to_escrow(owner, fee)?;
        self.escrow.burn_from_escrow(fee)?;

        self.store
            .dequeue(ACTIVE_REGISTRY_QUEUE, registry.end_time, &name_hash)?;
        registry.end_time = end_time;
        self.store.set_registry(&name_hash, &registry)?;
        self.store.enqueue(ACTIVE_REGISTRY_QUEUE, end_time, &name_hash)?;

        debug!(%name, %fee, extension, end_time, "registry renewed");
        self.events.push(Event::RegistryRenewed {
            name: name.clone(),
            fee: fee.clone(),
            end_time,
        });
        Ok(())
    }

    fn update_owner(&mut self, name: &Name, new_owner: &Address, owner: &Address) -> Result<()> {
        let (name_hash, _) = name.hash();
        let mut registry = self.owned_registry(&name_hash, owner)?;

        registry.owner = *new_owner;
        self.store.set_registry(&name_hash, &registry)?;

        debug!(%name, %owner, %new_owner, "owner updated");
        self.events.push(Event::OwnerUpdated {
            name: name.clone(),
            old_owner: *owner,
            new_owner: *new_owner,
        });
        Ok(())
    }

    fn register_sub_name(&mut self, name: &Name, address: &Address, owner: &Address) -> Result<()> {
        let (name_hash, child_hash) = name.hash();
        self.owned_registry(&name_hash, owner)?;

        if self.store.reverse_resolve(address)?.is_some() {
            return Err(NameServiceError::AddressAlreadyRegistered);
        }
        if self.store.resolve(&name_hash, &child_hash)?.is_some() {
            return Err(NameServiceError::NameAlreadyTaken);
        }

        self.store.set_resolve(&name_hash, &child_hash, address)?;
        self.store.set_reverse_resolve(address, &name_hash)?;

        debug!(%name, %address, "sub name registered");
        self.events.push(Event::SubNameRegistered {
            name: name.clone(),
            address: *address,
        });
        Ok(())
    }

    fn unregister_sub_name(&mut self, name: &Name, owner: &Address) -> Result<()> {
        let (name_hash, child_hash) = name.hash();
        self.owned_registry(&name_hash, owner)?;

        let address = self
            .store
            .resolve(&name_hash, &child_hash)?
            .ok_or(NameServiceError::ResolveNotExists)?;

        self.store.delete_resolve(&name_hash, &child_hash)?;
        self.store.delete_reverse_resolve(&address)?;

        debug!(%name, %address, "sub name unregistered");
        self.events.push(Event::SubNameUnregistered {
            name: name.clone(),
            address,
        });
        Ok(())
    }
}

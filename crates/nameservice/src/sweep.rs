//! Per-round sweep: advances every queue entry whose deadline has passed.
//!
//! Each loop removes the entry it handles and then reads the next due entry
//! strictly after it, so entries are handled in `(end_time, name_hash)` order,
//! nothing is visited twice, and every step reads one entry. Handlers only
//! enqueue into later queues or at deadlines past `now`, so the cursor never
//! skips a due entry.

use kvstore::Storage;
use tracing::info;

use crate::handlers::{add_time, Context};
use crate::queue::{TimeQueue, ACTIVE_REGISTRY_QUEUE, BID_QUEUE, REVEAL_QUEUE};
use crate::{
    AuctionStatus, Coins, Escrow, Event, NameHash, NameServiceError, PriceOracle, Registry, Result,
};

fn corrupt(queue: &str, end_time: u64, name_hash: &NameHash, what: &str) -> NameServiceError {
    NameServiceError::CorruptState(format!(
        "{queue} queue entry ({end_time}, {name_hash}) {what}"
    ))
}

impl<S: Storage, E: Escrow, P: PriceOracle + ?Sized> Context<'_, S, E, P> {
    pub fn sweep(&mut self) -> Result<()> {
        self.sweep_bid_queue()?;
        self.sweep_reveal_queue()?;
        self.sweep_active_registry_queue()
    }

    fn next_due(&mut self, queue: TimeQueue, cursor: &mut Option<(u64, NameHash)>) -> Result<Option<(u64, NameHash)>> {
        let due = match cursor {
            Some((end_time, name_hash)) => self.store.next_due_after(queue, self.now, *end_time, name_hash)?,
            None => self.store.first_due(queue, self.now)?,
        };
        if let Some((end_time, name_hash)) = &due {
            self.store.dequeue(queue, *end_time, name_hash)?;
        }
        *cursor = due;
        Ok(due)
    }

    fn sweep_bid_queue(&mut self) -> Result<()> {
        let mut cursor = None;
        while let Some((end_time, name_hash)) = self.next_due(BID_QUEUE, &mut cursor)? {
            let mut auction = self
                .store
                .auction(&name_hash)?
                .ok_or_else(|| corrupt("bid", end_time, &name_hash, "has no auction"))?;
            if auction.status != AuctionStatus::Bid || auction.end_time != end_time {
                return Err(corrupt("bid", end_time, &name_hash, "disagrees with its auction"));
            }

            if self.store.has_bids(&name_hash)? {
                auction.status = AuctionStatus::Reveal;
                auction.end_time = add_time(self.now, self.params.reveal_period)?;
                self.store.set_auction(&name_hash, &auction)?;
                self.store.enqueue(REVEAL_QUEUE, auction.end_time, &name_hash)?;

                info!(name = %auction.name, end_time = auction.end_time, "reveal period started");
                self.events.push(Event::RevealStarted {
                    name: auction.name,
                    end_time: auction.end_time,
                });
            } else {
                self.store.delete_auction(&name_hash)?;

                info!(name = %auction.name, "auction closed without bids");
                self.events.push(Event::AuctionClosed { name: auction.name });
            }
        }
        Ok(())
    }

    fn sweep_reveal_queue(&mut self) -> Result<()> {
        let mut cursor = None;
        while let Some((end_time, name_hash)) = self.next_due(REVEAL_QUEUE, &mut cursor)? {
            let auction = self
                .store
                .auction(&name_hash)?
                .ok_or_else(|| corrupt("reveal", end_time, &name_hash, "has no auction"))?;
            if auction.status != AuctionStatus::Reveal || auction.end_time != end_time {
                return Err(corrupt("reveal", end_time, &name_hash, "disagrees with its auction"));
            }
            self.store.delete_auction(&name_hash)?;

            match &auction.top_bid {
                Some(top) => {
                    self.escrow.burn_from_escrow(&Coins::from(top.amount.clone()))?;

                    let registry = Registry {
                        name: auction.name.clone(),
                        owner: top.bidder,
                        end_time: add_time(self.now, self.params.renewal_interval)?,
                    };
                    self.store.set_registry(&name_hash, &registry)?;
                    self.store
                        .enqueue(ACTIVE_REGISTRY_QUEUE, registry.end_time, &name_hash)?;

                    info!(
                        name = %auction.name,
                        owner = %top.bidder,
                        amount = %top.amount,
                        end_time = registry.end_time,
                        "auction settled"
                    );
                    self.events.push(Event::AuctionSettled {
                        name: auction.name.clone(),
                        owner: top.bidder,
                        amount: top.amount.clone(),
                        end_time: registry.end_time,
                    });
                }
                None => {
                    info!(name = %auction.name, "auction closed without reveals");
                    self.events.push(Event::AuctionClosed {
                        name: auction.name.clone(),
                    });
                }
            }

            // whoever never revealed forfeits the deposit
            for bid in self.store.bids(&name_hash)? {
                self.escrow.burn_from_escrow(&Coins::from(bid.deposit.clone()))?;
                self.store.delete_bid(&name_hash, &bid.bidder)?;

                info!(name = %auction.name, bidder = %bid.bidder, deposit = %bid.deposit, "bid slashed");
                self.events.push(Event::BidSlashed {
                    name: auction.name.clone(),
                    bidder: bid.bidder,
                    deposit: bid.deposit,
                });
            }
        }
        Ok(())
    }

    fn sweep_active_registry_queue(&mut self) -> Result<()> {
        let mut cursor = None;
        while let Some((end_time, name_hash)) = self.next_due(ACTIVE_REGISTRY_QUEUE, &mut cursor)? {
            let registry = self
                .store
                .registry(&name_hash)?
                .ok_or_else(|| corrupt("active registry", end_time, &name_hash, "has no registry"))?;
            if registry.end_time != end_time {
                return Err(corrupt("active registry", end_time, &name_hash, "disagrees with its registry"));
            }
            self.store.delete_registry(&name_hash)?;

            for (child_hash, address) in self.store.resolves(&name_hash)? {
                self.store.delete_resolve(&name_hash, &child_hash)?;
                self.store.delete_reverse_resolve(&address)?;
            }

            info!(name = %registry.name, owner = %registry.owner, "registry expired");
            self.events.push(Event::RegistryExpired {
                name: registry.name,
                owner: registry.owner,
            });
        }
        Ok(())
    }
}

mod common;

use common::*;
use kvstore::Storage;
use nameservice::keys::auction_key;
use nameservice::{
    Auction, AuctionFilter, AuctionStatus, Bid, BidEntry, Coins, Escrow, Event, GenesisState, InMemoryBank,
    NameServiceError, Registry, ResolveEntry, TopBid,
};

fn auction(n: &str, status: AuctionStatus, end_time: u64, top_bid: Option<TopBid>) -> Auction {
    Auction { name: name(n), status, end_time, top_bid }
}

fn sealed(n: &str, bidder: u8, deposit: u128) -> BidEntry {
    let bidder = addr(bidder);
    BidEntry {
        name_hash: name(n).hash().0,
        bid: Bid {
            hash: commitment("salt", &name(n), &luna(deposit), &bidder),
            deposit: luna(deposit),
            bidder,
        },
    }
}

fn resolve(n: &str, b: u8) -> ResolveEntry {
    let (name_hash, child_hash) = name(n).hash();
    ResolveEntry { name_hash, child_hash, address: addr(b) }
}

/// Bank with `held` uluna already sitting in escrow.
fn bank_holding(held: u128) -> InMemoryBank {
    let mut bank = InMemoryBank::new();
    let coins = Coins::from(luna(held));
    bank.mint(&addr(20), &coins).unwrap();
    bank.transfer_to_escrow(&addr(20), &coins).unwrap();
    bank
}

#[test]
fn test_bid_queue_transitions() {
    let mut genesis = GenesisState::new(params());
    genesis.auctions = vec![
        auction("expired.terra", AuctionStatus::Bid, T0, None),
        auction("closed.terra", AuctionStatus::Bid, T0 - 1, None),
        auction("future.terra", AuctionStatus::Bid, T0 + 1, None),
    ];
    genesis.bids = vec![sealed("expired.terra", 1, 1000), sealed("future.terra", 2, 1000)];
    let mut engine = engine_from(&genesis, bank_holding(2000));

    let events = engine.end_block(T0).unwrap();
    let reveal_end = T0 + engine.params().reveal_period;
    assert_eq!(
        events,
        vec![
            Event::AuctionClosed { name: name("closed.terra") },
            Event::RevealStarted { name: name("expired.terra"), end_time: reveal_end },
        ]
    );

    assert_eq!(engine.auction(&name("closed.terra")).unwrap(), None);
    assert_eq!(
        engine.auction(&name("expired.terra")).unwrap(),
        Some(auction("expired.terra", AuctionStatus::Reveal, reveal_end, None))
    );
    assert_eq!(
        engine.auction(&name("future.terra")).unwrap(),
        Some(auction("future.terra", AuctionStatus::Bid, T0 + 1, None))
    );
    // bids survive the phase change
    assert_eq!(engine.bids(&name("expired.terra"), None).unwrap().len(), 1);
}

#[test]
fn test_reveal_queue_settles_and_slashes() {
    let top = TopBid { bidder: addr(1), amount: luna(900) };
    let mut genesis = GenesisState::new(params());
    genesis.auctions = vec![
        auction("settle.terra", AuctionStatus::Reveal, T0, Some(top)),
        auction("empty.terra", AuctionStatus::Reveal, T0, None),
        auction("later.terra", AuctionStatus::Reveal, T0 + 1, None),
    ];
    genesis.bids = vec![
        sealed("settle.terra", 2, 1000),
        sealed("empty.terra", 3, 1000),
        sealed("later.terra", 4, 1000),
    ];
    let mut engine = engine_from(&genesis, bank_holding(3900));

    let events = engine.end_block(T0).unwrap();
    let registry_end = T0 + engine.params().renewal_interval;
    assert!(events.contains(&Event::AuctionSettled {
        name: name("settle.terra"),
        owner: addr(1),
        amount: luna(900),
        end_time: registry_end,
    }));
    assert!(events.contains(&Event::AuctionClosed { name: name("empty.terra") }));
    assert_eq!(
        events.iter().filter(|e| matches!(e, Event::BidSlashed { .. })).count(),
        2
    );

    assert_eq!(
        engine.registry(&name("settle.terra")).unwrap(),
        Registry { name: name("settle.terra"), owner: addr(1), end_time: registry_end }
    );
    assert_eq!(engine.registry(&name("empty.terra")).unwrap_err().code(), 9);
    assert_eq!(engine.auction(&name("settle.terra")).unwrap(), None);
    assert_eq!(engine.auction(&name("empty.terra")).unwrap(), None);
    assert!(engine.bids(&name("settle.terra"), None).unwrap().is_empty());

    assert_eq!(burned_luna(&engine), 900 + 1000 + 1000);
    assert_eq!(escrowed_luna(&engine), 1000);
    assert_eq!(engine.bids(&name("later.terra"), None).unwrap().len(), 1);
}

#[test]
fn test_active_registry_expiry_clears_resolves() {
    let mut genesis = GenesisState::new(params());
    genesis.registries = vec![
        Registry { name: name("old.terra"), owner: addr(1), end_time: T0 },
        Registry { name: name("fresh.terra"), owner: addr(2), end_time: T0 + 1 },
    ];
    genesis.resolves = vec![
        resolve("old.terra", 5),
        resolve("pay.old.terra", 6),
        resolve("pay.fresh.terra", 7),
    ];
    let mut engine = engine_from(&genesis, InMemoryBank::new());
    assert_eq!(engine.reverse_resolve(&addr(6)).unwrap().name, name("old.terra"));

    let events = engine.end_block(T0).unwrap();
    assert_eq!(events, vec![Event::RegistryExpired { name: name("old.terra"), owner: addr(1) }]);

    assert_eq!(engine.registry(&name("old.terra")).unwrap_err().code(), 9);
    for (n, b) in [("old.terra", 5), ("pay.old.terra", 6)] {
        assert_eq!(engine.resolve(&name(n)).unwrap_err().code(), 10);
        assert_eq!(engine.reverse_resolve(&addr(b)).unwrap_err().code(), 11);
    }

    assert_eq!(engine.resolve(&name("pay.fresh.terra")).unwrap(), addr(7));
    assert_eq!(engine.reverse_resolve(&addr(7)).unwrap().owner, addr(2));

    // the name is free for a new auction
    engine.open_auction(T0 + 1, &name("old.terra"), &addr(3)).unwrap();
}

#[test]
fn test_one_round_sweeps_thousands_of_auctions() {
    const N: usize = 3000;
    let names: Vec<String> = (0..N).map(|i| format!("name{i}.terra")).collect();

    let mut genesis = GenesisState::new(params());
    genesis.auctions = names
        .iter()
        .map(|n| auction(n, AuctionStatus::Bid, T0 - (n.len() as u64), None))
        .collect();
    genesis.auctions.push(auction("later.terra", AuctionStatus::Bid, T0 + 1, None));
    genesis.bids = names.iter().map(|n| sealed(n, 1, 1000)).collect();
    let mut engine = engine_from(&genesis, bank_holding(N as u128 * 1000));

    let events = engine.end_block(T0).unwrap();
    assert_eq!(events.len(), N);
    assert!(events.iter().all(|e| matches!(e, Event::RevealStarted { .. })));
    assert_eq!(engine.auctions(&AuctionFilter::Status(AuctionStatus::Reveal)).unwrap().len(), N);
    assert_eq!(
        engine.auction(&name("later.terra")).unwrap().map(|a| a.status),
        Some(AuctionStatus::Bid)
    );

    // nobody reveals, so every deposit is slashed in the next round
    let events = engine.end_block(T0 + engine.params().reveal_period).unwrap();
    assert_eq!(events.len(), 2 * N + 1);
    assert_eq!(
        events.iter().filter(|e| matches!(e, Event::BidSlashed { .. })).count(),
        N
    );
    assert_eq!(engine.auctions(&AuctionFilter::All).unwrap().len(), 0);
    assert_eq!(escrowed_luna(&engine), 0);
    assert_eq!(burned_luna(&engine), N as u128 * 1000);
}

#[test]
fn test_due_entries_run_in_deadline_then_hash_order() {
    let mut engine = engine();
    engine.open_auction(T0, &name("ccc.terra"), &addr(1)).unwrap();
    engine.open_auction(T0 + 5, &name("aaa.terra"), &addr(1)).unwrap();
    engine.open_auction(T0 + 5, &name("bbb.terra"), &addr(1)).unwrap();

    let mut same_deadline = vec![name("aaa.terra"), name("bbb.terra")];
    same_deadline.sort_by_key(|n| n.hash().0);

    let events = engine
        .end_block(T0 + engine.params().bid_period + 10)
        .unwrap();
    let closed: Vec<_> = events
        .into_iter()
        .map(|e| match e {
            Event::AuctionClosed { name } => name,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(closed, vec![name("ccc.terra"), same_deadline[0].clone(), same_deadline[1].clone()]);
}

#[test]
fn test_late_sweep_counts_reveal_from_sweep_time() {
    let mut engine = engine();
    let wallet = name("wallet.terra");
    open_with_bids(&mut engine, &wallet, &[(addr(1), "s", 1000, 1000)]);

    // both the bid and the would-be reveal deadline have passed
    let late = T0 + engine.params().bid_period + engine.params().reveal_period + 1;
    engine.end_block(late).unwrap();

    let auction = engine.auction(&wallet).unwrap().unwrap();
    assert_eq!(auction.status, AuctionStatus::Reveal);
    assert_eq!(auction.end_time, late + engine.params().reveal_period);
    engine.reveal_bid(late + 1, &wallet, "s", &luna(1000), &addr(1)).unwrap();
}

#[test]
fn test_missing_record_aborts_round() {
    let mut genesis = GenesisState::new(params());
    genesis.auctions = vec![
        auction("first.terra", AuctionStatus::Bid, T0 - 10, None),
        auction("broken.terra", AuctionStatus::Bid, T0, None),
    ];
    let mut engine = engine_from(&genesis, InMemoryBank::new());

    // drop the record behind the engine's back, leaving its queue entry
    let mut raw = engine.store().clone();
    raw.delete(&auction_key(&name("broken.terra").hash().0)).unwrap();
    let digest = engine.state_digest().unwrap();

    let err = engine.end_block(T0).unwrap_err();
    assert!(matches!(err, NameServiceError::CorruptState(_)), "{err}");
    assert_eq!(err.code(), 122);

    // the earlier, healthy entry was rolled back with the round
    assert_eq!(engine.state_digest().unwrap(), digest);
    assert!(engine.auction(&name("first.terra")).unwrap().is_some());
    assert!(engine.event_log().is_empty());
}

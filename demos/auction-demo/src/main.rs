mod config;

use anyhow::{Context, Result};
use kvstore::InMemoryStorage;
use nameservice::{
    Address, BidHash, Coin, Coins, Escrow, Event, ExchangeRates, InMemoryBank, Name, NameService,
    HASH_LEN,
};
use tracing::info;

use crate::config::DemoConfig;

const ALICE: Address = Address([0xa1; HASH_LEN]);
const BOB: Address = Address([0xb0; HASH_LEN]);
const CAROL: Address = Address([0xc0; HASH_LEN]);
const SHOP: Address = Address([0x5a; HASH_LEN]);

fn print_events(events: &[Event]) {
    for event in events {
        println!("  {event:?}");
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = DemoConfig::from_env()?;
    let params = cfg.params.clone();
    let min = params.min_deposit.clone();
    let coin = |amount: u128| Coin::new(min.denom.clone(), amount);

    // every bidder can cover a few deposits and every renewal row
    let mut bank = InMemoryBank::new();
    let mut initial = vec![coin(min.amount * 10)];
    for row in &params.renewal_fees.0 {
        if row.amount.denom != min.denom {
            initial.push(Coin::new(row.amount.denom.clone(), row.amount.amount * 4));
        }
    }
    let initial = Coins::new(initial).context("Failed to build initial balances")?;
    for who in [ALICE, BOB, CAROL] {
        bank.mint(&who, &initial)?;
    }

    let rates = ExchangeRates::new(min.denom.clone());
    let mut engine = NameService::new(InMemoryStorage::new(), bank, rates, params.clone())
        .context("Failed to start the name service")?;
    info!(name = %cfg.name, start = cfg.start_time, "demo starting");

    let name = Name::new(cfg.name.as_str());
    let t0 = cfg.start_time;

    println!("=== Sealed-bid auction for {name} ===\n");

    // 1. Bid phase
    println!("--- Bid phase ---");
    print_events(&engine.open_auction(t0, &name, &ALICE).context("open auction")?);

    let bids = [
        (ALICE, "a1", coin(min.amount), coin(min.amount * 2)),
        (BOB, "b0b", coin(min.amount * 3 / 2), coin(min.amount * 2)),
        (CAROL, "c", coin(min.amount * 5), coin(min.amount * 5)),
    ];
    for (bidder, salt, amount, deposit) in &bids {
        let hash = BidHash::commit(salt, &name, amount, bidder);
        println!("  {bidder} commits {hash}");
        print_events(&engine.bid_auction(t0 + 1, &name, &hash, deposit, bidder)?);
    }
    println!("Escrowed: {}", engine.escrow().escrow_balance());

    // 2. Reveal phase; carol never reveals
    println!("\n--- Reveal phase ---");
    let bid_end = t0 + params.bid_period;
    print_events(&engine.end_block(bid_end)?);
    for (bidder, salt, amount, _) in bids.iter().take(2) {
        print_events(&engine.reveal_bid(bid_end + 1, &name, salt, amount, bidder)?);
    }

    // 3. Settlement
    println!("\n--- Settlement ---");
    let reveal_end = bid_end + params.reveal_period;
    print_events(&engine.end_block(reveal_end)?);
    let registry = engine.registry(&name).context("auction did not settle")?;
    println!("Owner:   {}", registry.owner);
    println!("Expires: {}", registry.end_time);
    println!("Burned:  {}", engine.escrow().burned());

    // 4. Sub names and renewal
    println!("\n--- Registry ---");
    let shop = Name::new(format!("shop.{name}"));
    print_events(&engine.register_sub_name(reveal_end + 1, &shop, &SHOP, &registry.owner)?);
    println!("{shop} -> {}", engine.resolve(&shop)?);
    println!("{SHOP} <- {}", engine.reverse_resolve(&SHOP)?.name);

    let (_, label, _) = name.split();
    match params.renewal_fees.fee_for_length(label.len()) {
        Some(row) => {
            let fee = Coins::from(row.amount.clone());
            print_events(&engine.renew_registry(reveal_end + 2, &name, &fee, &registry.owner)?);
            println!("Renewed until {}", engine.registry(&name)?.end_time);
        }
        None => println!("No renewal fee row for {label}, skipping renewal"),
    }

    // 5. Audit
    println!("\n--- Audit ---");
    let log = engine.event_log();
    println!("Events:       {}", log.len());
    println!("Log head:     {}", hex::encode(log.latest_hash()));
    println!("Chain valid:  {}", log.verify_chain());
    println!("State digest: {}", hex::encode(engine.state_digest()?));
    let drained = engine.drain_events();
    println!("Drained:      {} entries", drained.len());

    if let Some(path) = &cfg.genesis_out {
        let genesis = engine.export_genesis()?;
        let json = serde_json::to_string_pretty(&genesis)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write genesis to {}", path.display()))?;
        println!("Genesis written to {}", path.display());
    }

    Ok(())
}

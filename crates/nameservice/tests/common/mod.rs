#![allow(dead_code)]

use kvstore::InMemoryStorage;
use nameservice::{
    Address, BidHash, Coin, Coins, ExchangeRates, GenesisState, InMemoryBank, Name, NameService,
    Params, HASH_LEN,
};

pub type Engine = NameService<InMemoryStorage, InMemoryBank, ExchangeRates>;

pub const T0: u64 = 1_600_000_000;
pub const INIT_LUNA: u128 = 1_000_000;
pub const INIT_SDR: u128 = 1_000_000_000;

pub fn addr(b: u8) -> Address {
    Address([b; HASH_LEN])
}

pub fn luna(amount: u128) -> Coin {
    Coin::new("uluna", amount)
}

pub fn name(s: &str) -> Name {
    Name::new(s)
}

/// Default periods with a deposit floor small enough for hand-sized amounts.
pub fn params() -> Params {
    Params {
        min_deposit: luna(1000),
        ..Params::default()
    }
}

/// 1 uluna = 2 usdr
pub fn rates() -> ExchangeRates {
    ExchangeRates::new("uluna").with_rate("usdr", 2, 1)
}

/// Accounts 1..=9 each hold `INIT_LUNA` uluna and `INIT_SDR` usdr.
pub fn funded_bank() -> InMemoryBank {
    let mut bank = InMemoryBank::new();
    let initial = Coins::new(vec![luna(INIT_LUNA), Coin::new("usdr", INIT_SDR)]).unwrap();
    for b in 1..=9 {
        bank.mint(&addr(b), &initial).unwrap();
    }
    bank
}

pub fn engine() -> Engine {
    NameService::new(InMemoryStorage::new(), funded_bank(), rates(), params()).unwrap()
}

pub fn engine_from(genesis: &GenesisState, bank: InMemoryBank) -> Engine {
    NameService::from_genesis(InMemoryStorage::new(), bank, rates(), genesis).unwrap()
}

pub fn commitment(salt: &str, name: &Name, amount: &Coin, bidder: &Address) -> BidHash {
    BidHash::commit(salt, name, amount, bidder)
}

/// Opens `name` at `T0` and places one sealed bid per `(bidder, salt, amount, deposit)`.
pub fn open_with_bids(engine: &mut Engine, name: &Name, bids: &[(Address, &str, u128, u128)]) {
    engine.open_auction(T0, name, &addr(9)).unwrap();
    for (bidder, salt, amount, deposit) in bids {
        let hash = commitment(salt, name, &luna(*amount), bidder);
        engine
            .bid_auction(T0 + 1, name, &hash, &luna(*deposit), bidder)
            .unwrap();
    }
}

pub fn luna_of(engine: &Engine, address: &Address) -> u128 {
    use nameservice::Escrow;
    engine.escrow().balance(address).amount_of("uluna")
}

pub fn escrowed_luna(engine: &Engine) -> u128 {
    use nameservice::Escrow;
    engine.escrow().escrow_balance().amount_of("uluna")
}

pub fn burned_luna(engine: &Engine) -> u128 {
    engine.escrow().burned().amount_of("uluna")
}

/// Runs auction `name` to a registry owned by `owner`; returns the settle time.
pub fn win(engine: &mut Engine, name: &Name, owner: &Address) -> u64 {
    open_with_bids(engine, name, &[(*owner, "salt", 1000, 1000)]);
    let bid_end = T0 + engine.params().bid_period;
    engine.end_block(bid_end).unwrap();
    engine
        .reveal_bid(bid_end + 1, name, "salt", &luna(1000), owner)
        .unwrap();
    let reveal_end = bid_end + engine.params().reveal_period;
    engine.end_block(reveal_end).unwrap();
    reveal_end
}

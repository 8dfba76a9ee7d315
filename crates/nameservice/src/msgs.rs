//! State-changing operations and their stateless checks.

use serde::{Deserialize, Serialize};

use crate::{Address, BidHash, Coin, Coins, Name, NameServiceError, Result};

pub const MAX_SALT_LEN: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Msg {
    OpenAuction {
        name: Name,
        organizer: Address,
    },
    /// `hash` is the hex commitment `BidHash::commit(salt, name, amount, bidder)`.
    BidAuction {
        name: Name,
        hash: String,
        deposit: Coin,
        bidder: Address,
    },
    RevealBid {
        name: Name,
        salt: String,
        amount: Coin,
        bidder: Address,
    },
    RenewRegistry {
        name: Name,
        fee: Coins,
        owner: Address,
    },
    UpdateOwner {
        name: Name,
        new_owner: Address,
        owner: Address,
    },
    RegisterSubName {
        name: Name,
        address: Address,
        owner: Address,
    },
    UnregisterSubName {
        name: Name,
        owner: Address,
    },
}

fn invalid_name(name: &Name, reason: &str) -> NameServiceError {
    NameServiceError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn check_name(name: &Name, levels: &[usize], reason: &str) -> Result<()> {
    name.validate()?;
    if !levels.contains(&name.levels()) {
        return Err(invalid_name(name, reason));
    }
    Ok(())
}

fn check_address(address: &Address) -> Result<()> {
    if *address == Address::default() {
        return Err(NameServiceError::InvalidAddress("empty address".to_string()));
    }
    Ok(())
}

fn check_coin(coin: &Coin) -> Result<()> {
    coin.validate()?;
    if !coin.is_positive() {
        return Err(NameServiceError::InvalidCoins(coin.to_string()));
    }
    Ok(())
}

const AUCTION_LEVELS: &[usize] = &[2];
const SUB_NAME_LEVELS: &[usize] = &[2, 3];

impl Msg {
    pub fn name(&self) -> &Name {
        match self {
            Msg::OpenAuction { name, .. }
            | Msg::BidAuction { name, .. }
            | Msg::RevealBid { name, .. }
            | Msg::RenewRegistry { name, .. }
            | Msg::UpdateOwner { name, .. }
            | Msg::RegisterSubName { name, .. }
            | Msg::UnregisterSubName { name, .. } => name,
        }
    }

    /// Account that authorizes the operation.
    pub fn signer(&self) -> &Address {
        match self {
            Msg::OpenAuction { organizer, .. } => organizer,
            Msg::BidAuction { bidder, .. } | Msg::RevealBid { bidder, .. } => bidder,
            Msg::RenewRegistry { owner, .. }
            | Msg::UpdateOwner { owner, .. }
            | Msg::RegisterSubName { owner, .. }
            | Msg::UnregisterSubName { owner, .. } => owner,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Msg::OpenAuction { .. } => "open_auction",
            Msg::BidAuction { .. } => "bid_auction",
            Msg::RevealBid { .. } => "reveal_bid",
            Msg::RenewRegistry { .. } => "renew_registry",
            Msg::UpdateOwner { .. } => "update_owner",
            Msg::RegisterSubName { .. } => "register_sub_name",
            Msg::UnregisterSubName { .. } => "unregister_sub_name",
        }
    }

    /// Checks that need no state. Runs before any store access.
    pub fn validate_basic(&self) -> Result<()> {
        match self {
            Msg::OpenAuction { name, organizer } => {
                check_name(name, AUCTION_LEVELS, "only second level name is accepted for auction")?;
                check_address(organizer)
            }
            Msg::BidAuction { name, hash, deposit, bidder } => {
                check_name(name, AUCTION_LEVELS, "only second level name is accepted for auction")?;
                BidHash::from_hex(hash)?;
                check_address(bidder)?;
                check_coin(deposit)
            }
            Msg::RevealBid { name, salt, amount, bidder } => {
                check_name(name, AUCTION_LEVELS, "only second level name is accepted for auction")?;
                if salt.is_empty() || salt.len() > MAX_SALT_LEN {
                    return Err(NameServiceError::InvalidSaltLength(salt.len()));
                }
                check_address(bidder)?;
                amount.validate()
            }
            Msg::RenewRegistry { name, fee, owner } => {
                check_name(name, AUCTION_LEVELS, "only second level name is accepted for registry")?;
                if fee.is_empty() {
                    return Err(NameServiceError::InvalidCoins("empty renewal fee".to_string()));
                }
                check_address(owner)
            }
            Msg::UpdateOwner { name, new_owner, owner } => {
                check_name(name, AUCTION_LEVELS, "only second level name is accepted for registry")?;
                check_address(owner)?;
                check_address(new_owner)
            }
            Msg::RegisterSubName { name, address, owner } => {
                check_name(name, SUB_NAME_LEVELS, "only the second or third level name is accepted for register")?;
                check_address(address)?;
                check_address(owner)
            }
            Msg::UnregisterSubName { name, owner } => {
                check_name(name, SUB_NAME_LEVELS, "only the second or third level name is accepted for unregister")?;
                check_address(owner)
            }
        }
    }
}

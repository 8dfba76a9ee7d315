//! Engine parameters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Coin, Name, NameServiceError, Result};

pub const MINUTE: u64 = 60;
pub const DAY: u64 = 24 * 60 * MINUTE;

/// Shortest period any of the three durations may be set to.
pub const MIN_PERIOD: u64 = 10 * MINUTE;

/// Renewal price for names whose parent label is at least `length` long.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalFee {
    pub length: usize,
    pub amount: Coin,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenewalFees(pub Vec<RenewalFee>);

impl RenewalFees {
    /// Row with the largest `length` not exceeding `name_len`.
    pub fn fee_for_length(&self, name_len: usize) -> Option<&RenewalFee> {
        self.0
            .iter()
            .filter(|fee| fee.length <= name_len)
            .max_by_key(|fee| fee.length)
    }
}

/// Durations are in seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub bid_period: u64,
    pub reveal_period: u64,
    pub renewal_interval: u64,
    pub min_deposit: Coin,
    pub root_name: String,
    pub min_name_length: usize,
    pub renewal_fees: RenewalFees,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            bid_period: 2 * DAY,
            reveal_period: 3 * DAY,
            renewal_interval: 365 * DAY,
            min_deposit: Coin::new("uluna", 512_000_000),
            root_name: "terra".to_string(),
            min_name_length: 3,
            renewal_fees: RenewalFees(vec![
                RenewalFee { length: 3, amount: Coin::new("usdr", 400_000_000) },
                RenewalFee { length: 4, amount: Coin::new("usdr", 100_000_000) },
                RenewalFee { length: 5, amount: Coin::new("usdr", 5_000_000) },
            ]),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(NameServiceError::InvalidParams(msg));

        for (field, value) in [
            ("bid_period", self.bid_period),
            ("reveal_period", self.reveal_period),
            ("renewal_interval", self.renewal_interval),
        ] {
            if value < MIN_PERIOD {
                return invalid(format!("{field} must be at least 10 minutes, got {value}s"));
            }
        }

        if let Err(err) = self.min_deposit.validate() {
            return invalid(format!("min_deposit: {err}"));
        }

        let root = Name::new(self.root_name.as_str());
        if let Err(err) = root.validate() {
            return invalid(format!("root_name: {err}"));
        }
        if root.levels() != 1 {
            return invalid(format!("root_name {} must be a single label", self.root_name));
        }

        if self.min_name_length == 0 {
            return invalid("min_name_length must be bigger than 0".to_string());
        }

        let mut lengths = BTreeSet::new();
        for fee in &self.renewal_fees.0 {
            if !lengths.insert(fee.length) {
                return invalid(format!("renewal_fees has duplicated length {}", fee.length));
            }
            if fee.amount.validate().is_err() || !fee.amount.is_positive() {
                return invalid(format!("renewal_fees contains invalid coin {}", fee.amount));
            }
        }

        Ok(())
    }

    /// Parses JSON and validates the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(json)
            .map_err(|e| NameServiceError::InvalidParams(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }
}

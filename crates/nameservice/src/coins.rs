//! Integer coin amounts and sorted multi-denomination bundles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NameServiceError, Result};

/// A single-denomination amount. Displays as `<amount><denom>`, e.g. `900uluna`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Checks the denomination; a zero amount is still a valid coin.
    pub fn validate(&self) -> Result<()> {
        validate_denom(&self.denom)
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Same denomination and at least `other.amount`.
    pub fn is_gte(&self, other: &Coin) -> bool {
        self.denom == other.denom && self.amount >= other.amount
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl fmt::Debug for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coin({self})")
    }
}

/// Denominations are `[a-z][a-z0-9]{2,15}`.
pub fn validate_denom(denom: &str) -> Result<()> {
    let bytes = denom.as_bytes();
    let ok = (3..=16).contains(&bytes.len())
        && bytes[0].is_ascii_lowercase()
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());

    if ok {
        Ok(())
    } else {
        Err(NameServiceError::InvalidCoins(format!(
            "invalid denom: {denom:?}"
        )))
    }
}

/// Coin bundle kept sorted by denom with no duplicates and no zero entries.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a bundle, rejecting duplicate denominations, zero amounts and
    /// malformed denoms.
    pub fn new(mut coins: Vec<Coin>) -> Result<Self> {
        for coin in &coins {
            coin.validate()?;
            if !coin.is_positive() {
                return Err(NameServiceError::InvalidCoins(format!(
                    "zero amount for {}",
                    coin.denom
                )));
            }
        }
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        if let Some(pair) = coins.windows(2).find(|w| w[0].denom == w[1].denom) {
            return Err(NameServiceError::InvalidCoins(format!(
                "duplicate denom {}",
                pair[0].denom
            )));
        }
        Ok(Self(coins))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .binary_search_by(|c| c.denom.as_str().cmp(denom))
            .map(|i| self.0[i].amount)
            .unwrap_or(0)
    }

    pub fn add(&self, other: &Coins) -> Result<Coins> {
        let mut out = self.clone();
        for coin in other.iter() {
            out.add_coin(coin)?;
        }
        Ok(out)
    }

    fn add_coin(&mut self, coin: &Coin) -> Result<()> {
        if coin.amount == 0 {
            return Ok(());
        }
        match self.0.binary_search_by(|c| c.denom.cmp(&coin.denom)) {
            Ok(i) => {
                self.0[i].amount = self.0[i]
                    .amount
                    .checked_add(coin.amount)
                    .ok_or(NameServiceError::Overflow("coin addition"))?;
            }
            Err(i) => self.0.insert(i, coin.clone()),
        }
        Ok(())
    }

    /// `None` when any denomination would go negative.
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.0.clone();
        for coin in other.iter() {
            let i = out.binary_search_by(|c| c.denom.cmp(&coin.denom)).ok()?;
            out[i].amount = out[i].amount.checked_sub(coin.amount)?;
        }
        out.retain(Coin::is_positive);
        Some(Coins(out))
    }

    /// Every denomination in `other` is covered by at least as much here.
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other.iter().all(|c| self.amount_of(&c.denom) >= c.amount)
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        if coin.is_positive() {
            Self(vec![coin])
        } else {
            Self::default()
        }
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = NameServiceError;

    fn try_from(coins: Vec<Coin>) -> Result<Self> {
        Self::new(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Coin::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

impl fmt::Debug for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coins({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins(pairs: &[(&str, u128)]) -> Coins {
        Coins::new(pairs.iter().map(|(d, a)| Coin::new(*d, *a)).collect()).unwrap()
    }

    #[test]
    fn test_display() {
        assert_eq!(Coin::new("uluna", 900).to_string(), "900uluna");
        assert_eq!(coins(&[("usdr", 5), ("uluna", 1)]).to_string(), "1uluna,5usdr");
    }

    #[test]
    fn test_denom_rules() {
        assert!(validate_denom("uluna").is_ok());
        assert!(validate_denom("u2d").is_ok());
        assert!(validate_denom("ab").is_err());
        assert!(validate_denom("Uluna").is_err());
        assert!(validate_denom("1abc").is_err());
        assert!(validate_denom("abcdefghijklmnopq").is_err());
    }

    #[test]
    fn test_new_rejects_duplicates_and_zero() {
        assert!(Coins::new(vec![Coin::new("uluna", 1), Coin::new("uluna", 2)]).is_err());
        assert!(Coins::new(vec![Coin::new("uluna", 0)]).is_err());
        assert!(Coins::from(Coin::new("uluna", 0)).is_empty());
    }

    #[test]
    fn test_arithmetic() {
        let a = coins(&[("uluna", 10), ("usdr", 3)]);
        let b = coins(&[("uluna", 4)]);

        let sum = a.add(&b).unwrap();
        assert_eq!(sum.amount_of("uluna"), 14);
        assert_eq!(sum.amount_of("usdr"), 3);

        let diff = a.checked_sub(&b).unwrap();
        assert_eq!(diff, coins(&[("uluna", 6), ("usdr", 3)]));
        assert!(b.checked_sub(&a).is_none());
        assert!(a.checked_sub(&coins(&[("ukrw", 1)])).is_none());

        // exhausting a denom drops it
        assert_eq!(b.checked_sub(&b).unwrap(), Coins::empty());

        assert!(a.is_all_gte(&b));
        assert!(!b.is_all_gte(&a));
        assert!(a.is_all_gte(&Coins::empty()));

        let max = coins(&[("uluna", u128::MAX)]);
        assert_eq!(max.add(&b).unwrap_err().code(), 107);
    }

    #[test]
    fn test_json_validates_on_decode() {
        let bad = r#"[{"denom":"uluna","amount":1},{"denom":"uluna","amount":2}]"#;
        assert!(serde_json::from_str::<Coins>(bad).is_err());

        let good = coins(&[("uluna", 1)]);
        let json = serde_json::to_string(&good).unwrap();
        assert_eq!(serde_json::from_str::<Coins>(&json).unwrap(), good);
    }
}

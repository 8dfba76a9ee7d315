//! Price conversion collaborator used by renewal fee accounting.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::Coin;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("no effective price for {0}")]
    NoEffectivePrice(String),

    #[error("price conversion overflow converting {0}")]
    Overflow(String),
}

pub trait PriceOracle {
    /// Value of `coin` expressed in `target_denom`, truncated toward zero.
    fn convert(&self, coin: &Coin, target_denom: &str) -> Result<Coin, PriceError>;
}

impl<P: PriceOracle + ?Sized> PriceOracle for &P {
    fn convert(&self, coin: &Coin, target_denom: &str) -> Result<Coin, PriceError> {
        (**self).convert(coin, target_denom)
    }
}

/// Exact rational rates quoted against one reference denom.
///
/// A rate `num / den` for `denom` means one unit of the reference denom is
/// worth `num / den` units of `denom`.
#[derive(Clone, Debug)]
pub struct ExchangeRates {
    reference: String,
    rates: BTreeMap<String, (u128, u128)>,
}

impl ExchangeRates {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            rates: BTreeMap::new(),
        }
    }

    /// Sets the rate for `denom`. A zero numerator or denominator clears it.
    pub fn set_rate(&mut self, denom: impl Into<String>, num: u128, den: u128) {
        let denom = denom.into();
        if num == 0 || den == 0 {
            self.rates.remove(&denom);
        } else {
            self.rates.insert(denom, (num, den));
        }
    }

    pub fn with_rate(mut self, denom: impl Into<String>, num: u128, den: u128) -> Self {
        self.set_rate(denom, num, den);
        self
    }

    fn rate(&self, denom: &str) -> Result<(u128, u128), PriceError> {
        if denom == self.reference {
            return Ok((1, 1));
        }
        self.rates
            .get(denom)
            .copied()
            .ok_or_else(|| PriceError::NoEffectivePrice(denom.to_string()))
    }
}

impl PriceOracle for ExchangeRates {
    fn convert(&self, coin: &Coin, target_denom: &str) -> Result<Coin, PriceError> {
        if coin.denom == target_denom {
            return Ok(coin.clone());
        }

        let (from_num, from_den) = self.rate(&coin.denom)?;
        let (to_num, to_den) = self.rate(target_denom)?;

        // amount * (to_num / to_den) / (from_num / from_den)
        let overflow = || PriceError::Overflow(coin.to_string());
        let numerator = coin
            .amount
            .checked_mul(to_num)
            .and_then(|v| v.checked_mul(from_den))
            .ok_or_else(overflow)?;
        let denominator = to_den.checked_mul(from_num).ok_or_else(overflow)?;

        Ok(Coin::new(target_denom, numerator / denominator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> ExchangeRates {
        // 1 uluna = 2 usdr = 3/2 uusd
        ExchangeRates::new("uluna")
            .with_rate("usdr", 2, 1)
            .with_rate("uusd", 3, 2)
    }

    #[test]
    fn test_same_denom_passes_through() {
        let coin = Coin::new("ukrw", 5);
        assert_eq!(rates().convert(&coin, "ukrw").unwrap(), coin);
    }

    #[test]
    fn test_cross_rates() {
        let rates = rates();
        assert_eq!(rates.convert(&Coin::new("uluna", 10), "usdr").unwrap(), Coin::new("usdr", 20));
        assert_eq!(rates.convert(&Coin::new("usdr", 20), "uluna").unwrap(), Coin::new("uluna", 10));
        // 4 uusd = 8/3 uluna = 16/3 usdr, truncated
        assert_eq!(rates.convert(&Coin::new("uusd", 4), "usdr").unwrap(), Coin::new("usdr", 5));
    }

    #[test]
    fn test_missing_rate() {
        assert_eq!(
            rates().convert(&Coin::new("ukrw", 1), "usdr").unwrap_err(),
            PriceError::NoEffectivePrice("ukrw".to_string())
        );

        let mut rates = rates();
        rates.set_rate("usdr", 0, 1);
        assert!(rates.convert(&Coin::new("uluna", 1), "usdr").is_err());
    }

    #[test]
    fn test_overflow_is_reported() {
        let rates = ExchangeRates::new("uluna").with_rate("usdr", u128::MAX, 1);
        assert!(matches!(
            rates.convert(&Coin::new("uluna", 2), "usdr"),
            Err(PriceError::Overflow(_))
        ));
    }
}

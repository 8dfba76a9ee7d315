//! Converts a renewal payment into extra registry lifetime.

use crate::{Coins, NameServiceError, Params, PriceOracle, Result};

/// Seconds of extension bought by `fee` for a name whose parent label is
/// `name_len` bytes long.
///
/// The fee row is the one with the largest length not exceeding `name_len`.
/// Every coin of `fee` is valued in that row's denom through `oracle`; paying
/// exactly the row amount buys one `renewal_interval`, and other amounts
/// scale linearly (truncated to whole seconds).
pub fn renewal_extension<P: PriceOracle + ?Sized>(
    fee: &Coins,
    name_len: usize,
    params: &Params,
    oracle: &P,
) -> Result<u64> {
    let row = params.renewal_fees.fee_for_length(name_len).ok_or_else(|| {
        let min = params
            .renewal_fees
            .0
            .iter()
            .map(|fee| fee.length)
            .min()
            .unwrap_or(usize::MAX);
        NameServiceError::InvalidNameLength { min, got: name_len }
    })?;

    let mut paid: u128 = 0;
    for coin in fee.iter() {
        let converted = oracle.convert(coin, &row.amount.denom)?;
        paid = paid
            .checked_add(converted.amount)
            .ok_or(NameServiceError::Overflow("renewal fee total"))?;
    }

    let extension = u128::from(params.renewal_interval)
        .checked_mul(paid)
        .ok_or(NameServiceError::Overflow("renewal extension"))?
        / row.amount.amount;

    u64::try_from(extension).map_err(|_| NameServiceError::Overflow("renewal extension"))
}

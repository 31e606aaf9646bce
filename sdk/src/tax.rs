//! Tax split arithmetic for Alpha transfers.
//!
//! All amounts are in the mint's smallest unit and all math is checked
//! integer arithmetic. The split is exact: `tax + net == amount` for every
//! valid input, because `net` is produced by subtraction rather than a
//! second rounding step.

use thiserror::Error;

use crate::constants::BPS_DENOMINATOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TaxError {
    #[error("tax rate {0} bps is outside 0..=10000")]
    InvalidRate(u16),
    #[error("amount {0} overflows the tax accounting width")]
    InvalidAmount(u64),
}

/// Exact accounting of one taxed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxSplit {
    /// Portion credited to the tax wallet.
    pub tax: u64,
    /// Portion credited to the recipient.
    pub net: u64,
}

/// Compute `tax = floor(amount * rate_bps / 10000)` and `net = amount - tax`.
///
/// Pure and deterministic: the verifier replays it freely against sampled
/// ledger state.
pub fn split(amount: u64, rate_bps: u16) -> Result<TaxSplit, TaxError> {
    if rate_bps > BPS_DENOMINATOR {
        return Err(TaxError::InvalidRate(rate_bps));
    }
    let tax = amount
        .checked_mul(rate_bps as u64)
        .ok_or(TaxError::InvalidAmount(amount))?
        / BPS_DENOMINATOR as u64;
    // tax <= amount whenever rate_bps <= BPS_DENOMINATOR, so this cannot
    // underflow; checked anyway to keep the invariant visible.
    let net = amount
        .checked_sub(tax)
        .ok_or(TaxError::InvalidAmount(amount))?;
    Ok(TaxSplit { tax, net })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_percent_of_1000() {
        let s = split(1000, 500).unwrap();
        assert_eq!(s.tax, 50);
        assert_eq!(s.net, 950);
    }

    #[test]
    fn conservation_holds_across_rates_and_amounts() {
        let amounts = [0u64, 1, 7, 99, 1000, 123_456_789, u64::MAX / 10_001];
        let rates = [0u16, 1, 499, 500, 3333, 9999, 10_000];
        for &amount in &amounts {
            for &rate in &rates {
                let s = split(amount, rate).unwrap();
                assert_eq!(s.tax + s.net, amount, "amount={amount} rate={rate}");
                assert_eq!(
                    s.tax,
                    (amount as u128 * rate as u128 / 10_000) as u64,
                    "floor formula, amount={amount} rate={rate}"
                );
            }
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(split(987_654_321, 777), split(987_654_321, 777));
    }

    #[test]
    fn zero_rate_taxes_nothing() {
        let s = split(1_000_000, 0).unwrap();
        assert_eq!(s.tax, 0);
        assert_eq!(s.net, 1_000_000);
    }

    #[test]
    fn full_rate_taxes_everything() {
        let s = split(1_000_000, 10_000).unwrap();
        assert_eq!(s.tax, 1_000_000);
        assert_eq!(s.net, 0);
    }

    #[test]
    fn rate_above_denominator_rejected() {
        assert_eq!(split(1000, 10_001), Err(TaxError::InvalidRate(10_001)));
    }

    #[test]
    fn overflowing_amount_rejected() {
        // u64::MAX * 500 does not fit the accounting width.
        assert_eq!(
            split(u64::MAX, 500),
            Err(TaxError::InvalidAmount(u64::MAX))
        );
        // ...but a zero rate never multiplies out of range.
        assert_eq!(
            split(u64::MAX, 0),
            Ok(TaxSplit {
                tax: 0,
                net: u64::MAX
            })
        );
    }

    #[test]
    fn rounding_always_floors_toward_the_recipient() {
        // 1 bps of 9999 is 0.9999, floored to 0.
        let s = split(9999, 1).unwrap();
        assert_eq!(s.tax, 0);
        assert_eq!(s.net, 9999);
    }
}

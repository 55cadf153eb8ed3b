//! Donation percentage as stored on-chain: a numerator/denominator pair.

use alloy_primitives::U256;
use num_bigint::BigUint;
use num_integer::Integer;
use num_rational::Ratio;
use num_traits::Zero;
use thiserror::Error;

/// Fractional digits kept when the percentage does not terminate.
pub const MAX_FRACTION_DIGITS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("donation ratio has a zero denominator")]
pub struct ZeroDenominator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentRatio {
    ratio: Ratio<BigUint>,
}

fn to_big(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

impl PercentRatio {
    pub fn new(numerator: U256, denominator: U256) -> Result<Self, ZeroDenominator> {
        if denominator.is_zero() {
            return Err(ZeroDenominator);
        }
        Ok(Self {
            ratio: Ratio::new(to_big(numerator), to_big(denominator)),
        })
    }

    /// `100 * numerator / denominator` as a decimal string.
    ///
    /// Exact when the expansion terminates, otherwise truncated to
    /// [`MAX_FRACTION_DIGITS`]. Trailing zeros are dropped, so 7/100 gives "7".
    pub fn to_percent_string(&self) -> String {
        let percent = &self.ratio * Ratio::from_integer(BigUint::from(100u32));
        let (whole, mut rem) = percent.numer().div_rem(percent.denom());
        let denom = percent.denom();

        let limit = terminating_digits(denom).unwrap_or(MAX_FRACTION_DIGITS);
        let ten = BigUint::from(10u32);
        let mut fraction = String::new();
        while !rem.is_zero() && fraction.len() < limit {
            rem *= &ten;
            let (digit, next) = rem.div_rem(denom);
            fraction.push_str(&digit.to_string());
            rem = next;
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, fraction)
        }
    }
}

/// Number of fractional digits of `1/denom` when it terminates, i.e. when the
/// reduced denominator has no prime factors other than 2 and 5.
fn terminating_digits(denom: &BigUint) -> Option<usize> {
    let two = BigUint::from(2u32);
    let five = BigUint::from(5u32);
    let mut d = denom.clone();
    let (mut twos, mut fives) = (0usize, 0usize);
    while d.is_even() && !d.is_zero() {
        d /= &two;
        twos += 1;
    }
    while (&d % &five).is_zero() && !d.is_zero() {
        d /= &five;
        fives += 1;
    }
    if d == BigUint::from(1u32) {
        Some(twos.max(fives))
    } else {
        None
    }
}

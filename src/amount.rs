//! Ether amounts entered by the user.

use alloy_primitives::U256;
use thiserror::Error;

/// Wei per ether is 10^18, so an amount has at most 18 fractional digits.
pub const ETHER_DECIMALS: usize = 18;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount `{0}` is not a plain decimal number")]
    Malformed(String),
    #[error("amount `{0}` has more than 18 decimal places")]
    TooPrecise(String),
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount `{0}` does not fit in 256 bits of wei")]
    Overflow(String),
}

/// A strictly positive amount, held in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EtherAmount(U256);

impl EtherAmount {
    /// Parse a decimal ether string such as `"0.25"` into wei.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole, fraction) = match input.split_once('.') {
            Some((w, f)) => (w, f),
            None => (input, ""),
        };
        let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty())
            || !digits_only(whole)
            || !digits_only(fraction)
        {
            return Err(AmountError::Malformed(input.to_string()));
        }
        if fraction.len() > ETHER_DECIMALS {
            return Err(AmountError::TooPrecise(input.to_string()));
        }

        let mut wei_digits = String::with_capacity(whole.len() + ETHER_DECIMALS);
        wei_digits.push_str(whole);
        wei_digits.push_str(fraction);
        wei_digits.extend(std::iter::repeat('0').take(ETHER_DECIMALS - fraction.len()));

        let wei = U256::from_str_radix(&wei_digits, 10)
            .map_err(|_| AmountError::Overflow(input.to_string()))?;
        if wei.is_zero() {
            return Err(AmountError::NotPositive);
        }
        Ok(Self(wei))
    }

    pub fn wei(&self) -> U256 {
        self.0
    }
}

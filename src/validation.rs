//! Input validation for the GUI. Results are the symbolic [`Validity`], not a bool.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::amount::EtherAmount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    Valid,
    Invalid,
}

impl Validity {
    pub fn is_valid(self) -> bool {
        self == Validity::Valid
    }
}

impl From<bool> for Validity {
    fn from(ok: bool) -> Self {
        if ok {
            Validity::Valid
        } else {
            Validity::Invalid
        }
    }
}

/// Parse an address the way wallets accept it: 40 hex digits with an optional
/// `0x` (or `0X`), either single-case or carrying a correct EIP-55 checksum.
pub fn parse_address(input: &str) -> Option<Address> {
    let hex_part = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let bytes = hex::decode(hex_part).ok()?;
    let address = Address::from_slice(&bytes);

    let has_lower = hex_part.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex_part.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        let checksummed = address.to_checksum(None);
        if checksummed[2..] != *hex_part {
            return None;
        }
    }
    Some(address)
}

/// A donee must be a well-formed address other than the payee.
pub fn donee_validity(payee: Address, input: &str) -> Validity {
    parse_address(input)
        .map_or(false, |donee| donee != payee)
        .into()
}

pub fn amount_validity(input: &str) -> Validity {
    EtherAmount::parse(input).is_ok().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYEE: &str = "0x15be789665c03105c81130d884d5fa223d6f1260";
    // EIP-55 test vector
    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn payee() -> Address {
        parse_address(PAYEE).unwrap()
    }

    #[test]
    fn test_checksum_rules() {
        assert!(parse_address(CHECKSUMMED).is_some());
        assert!(parse_address(&CHECKSUMMED.to_lowercase()).is_some());
        assert!(parse_address(&format!("0x{}", CHECKSUMMED[2..].to_uppercase())).is_some());
        assert!(parse_address(&CHECKSUMMED[2..]).is_some());
        // flip the case of one letter
        let broken = CHECKSUMMED.replacen("aA", "Aa", 1);
        assert!(parse_address(&broken).is_none());
    }

    #[test]
    fn test_malformed_addresses_invalid() {
        for bad in [
            "",
            "0x",
            "0x123",
            "hello",
            "0x15be789665c03105c81130d884d5fa223d6f126",
            "0x15be789665c03105c81130d884d5fa223d6f12600",
            "0x15be789665c03105c81130d884d5fa223d6f126g",
            "0x0x15be789665c03105c81130d884d5fa223d6f12",
        ] {
            assert_eq!(donee_validity(payee(), bad), Validity::Invalid, "{bad}");
        }
    }

    #[test]
    fn test_uppercase_prefix_accepted() {
        let upper_prefix = format!("0X{}", &CHECKSUMMED[2..]);
        assert_eq!(parse_address(&upper_prefix), parse_address(CHECKSUMMED));
        assert_eq!(donee_validity(payee(), &upper_prefix), Validity::Valid);
        assert_eq!(
            donee_validity(payee(), "0X15be789665c03105c81130d884d5fa223d6f1260"),
            Validity::Invalid
        );
    }

    #[test]
    fn test_payee_is_never_a_valid_donee() {
        assert_eq!(donee_validity(payee(), PAYEE), Validity::Invalid);
        assert_eq!(donee_validity(payee(), &PAYEE.to_uppercase().replacen("0X", "0x", 1)), Validity::Invalid);
        assert_eq!(donee_validity(payee(), &payee().to_checksum(None)), Validity::Invalid);
    }

    #[test]
    fn test_other_address_valid_and_idempotent() {
        let first = donee_validity(payee(), CHECKSUMMED);
        assert_eq!(first, Validity::Valid);
        for _ in 0..5 {
            assert_eq!(donee_validity(payee(), CHECKSUMMED), first);
        }
    }

    #[test]
    fn test_amount_validity() {
        assert_eq!(amount_validity("0.1"), Validity::Valid);
        assert_eq!(amount_validity("0"), Validity::Invalid);
        assert_eq!(amount_validity("0.1234567890123456789"), Validity::Invalid);
    }

    #[test]
    fn test_validity_serializes_symbolically() {
        assert_eq!(serde_json::to_string(&Validity::Valid).unwrap(), "\"valid\"");
        assert_eq!(serde_json::to_string(&Validity::Invalid).unwrap(), "\"invalid\"");
    }
}

// Payment attestations: the message a payer signs after paying, and the
// secp256k1 recovery that lets the payee check who signed it.

use alloy_primitives::{keccak256, Address, B256};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttestationError {
    #[error("signature must be 65 bytes, got {0}")]
    Length(usize),
    #[error("invalid recovery byte {0}")]
    RecoveryId(u8),
    #[error("signature does not recover to a public key: {0}")]
    Recover(String),
}

/// Reduce a page origin to `scheme://host[:port]`; unparsable input is kept
/// as given so the payer still sees what they are attesting to.
pub fn normalize_origin(origin: &str) -> String {
    match url::Url::parse(origin) {
        Ok(url) => url.origin().ascii_serialization(),
        Err(_) => origin.trim().to_string(),
    }
}

/// Text the payer signs once the payment is mined.
pub fn attestation_message(origin: Option<&str>) -> String {
    let payee = match origin {
        Some(origin) if !origin.trim().is_empty() => format!("the payee ({})", normalize_origin(origin)),
        _ => "the payee".to_string(),
    };
    format!(
        "Signing this message will mean you can prove to {} that you're the owner of the paying account without revealing your private key to them.",
        payee
    )
}

/// EIP-191 digest used by `personal_sign`.
pub fn personal_message_hash(message: &[u8]) -> B256 {
    let mut prefixed = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    prefixed.extend_from_slice(message);
    keccak256(&prefixed)
}

/// Recover the account that produced a `personal_sign` signature over `message`.
pub fn recover_signer(message: &str, signature: &[u8]) -> Result<Address, AttestationError> {
    if signature.len() != 65 {
        return Err(AttestationError::Length(signature.len()));
    }
    let v = signature[64];
    let rec = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return Err(AttestationError::RecoveryId(v)),
    };
    let rec_id =
        RecoveryId::from_i32(rec as i32).map_err(|_| AttestationError::RecoveryId(v))?;
    let sig = RecoverableSignature::from_compact(&signature[..64], rec_id)
        .map_err(|e| AttestationError::Recover(e.to_string()))?;

    let digest = personal_message_hash(message.as_bytes());
    let msg = Message::from_slice(digest.as_slice())
        .map_err(|e| AttestationError::Recover(e.to_string()))?;

    let secp = Secp256k1::verification_only();
    let pubkey = secp
        .recover_ecdsa(&msg, &sig)
        .map_err(|e| AttestationError::Recover(e.to_string()))?;

    let uncompressed = pubkey.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Ok(Address::from_slice(&hash[12..]))
}

/// True when `signature` over `message` was made by `claimed`.
pub fn verify(message: &str, signature: &[u8], claimed: Address) -> bool {
    match recover_signer(message, signature) {
        Ok(signer) => signer == claimed,
        Err(e) => {
            tracing::debug!(error = %e, "attestation signature rejected");
            false
        }
    }
}

//! Ed25519 signing and verification of announced encryption keys.
//!
//! A key announcement may carry an Ed25519 signature over the raw 32-byte
//! X25519 public key (no prehash, no extra domain separation). The verifying
//! key is the Ed25519 key underlying the announcer's Algorand address, which
//! ties the encryption key to the account and blocks key substitution.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::error::{AlgoChatError, Result};
use crate::types::{PUBLIC_KEY_SIZE, SIGNATURE_SIZE};

/// Sign an X25519 encryption public key with an account's Ed25519 key.
pub fn sign_encryption_key(
    encryption_public_key: &[u8],
    signing_key: &SigningKey,
) -> Result<[u8; 64]> {
    if encryption_public_key.len() != PUBLIC_KEY_SIZE {
        return Err(AlgoChatError::InvalidKey(format!(
            "encryption public key must be 32 bytes, got {}",
            encryption_public_key.len()
        )));
    }

    Ok(signing_key.sign(encryption_public_key).to_bytes())
}

/// Verify a signature over an X25519 encryption public key.
///
/// Returns `Ok(false)` for a well-formed signature that does not validate;
/// errors are reserved for malformed inputs.
pub fn verify_encryption_key(
    encryption_public_key: &[u8],
    verifying_key: &VerifyingKey,
    signature: &[u8],
) -> Result<bool> {
    if encryption_public_key.len() != PUBLIC_KEY_SIZE {
        return Err(AlgoChatError::InvalidKey(format!(
            "encryption public key must be 32 bytes, got {}",
            encryption_public_key.len()
        )));
    }

    let signature_bytes: [u8; 64] = signature.try_into().map_err(|_| {
        AlgoChatError::InvalidKey(format!(
            "signature must be {} bytes, got {}",
            SIGNATURE_SIZE,
            signature.len()
        ))
    })?;
    let signature = Signature::from_bytes(&signature_bytes);

    Ok(verifying_key
        .verify(encryption_public_key, &signature)
        .is_ok())
}

/// Verify using raw Ed25519 public key bytes (e.g. decoded address bytes).
pub fn verify_encryption_key_bytes(
    encryption_public_key: &[u8],
    ed25519_public_key: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let key_bytes: [u8; 32] = ed25519_public_key.try_into().map_err(|_| {
        AlgoChatError::InvalidKey(format!(
            "Ed25519 public key must be 32 bytes, got {}",
            ed25519_public_key.len()
        ))
    })?;

    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| AlgoChatError::InvalidKey(format!("invalid Ed25519 public key: {e}")))?;

    verify_encryption_key(encryption_public_key, &verifying_key, signature)
}

/// Human-readable fingerprint of an encryption public key.
///
/// Truncated SHA-256, grouped for visual comparison: "A7B3 C9D1 E5F2 8A4B".
pub fn fingerprint(public_key: &[u8]) -> String {
    let hash = Sha256::digest(public_key);

    hash.iter()
        .take(8)
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|chunk| chunk.join(""))
        .collect::<Vec<_>>()
        .join(" ")
}

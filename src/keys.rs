//! Identity and ephemeral key handling.
//!
//! An identity is a long-lived X25519 pair derived deterministically from the
//! 32-byte Algorand account seed. Ephemeral pairs are generated fresh for
//! every sealed envelope and their private scalar is dropped as soon as the
//! envelope exists.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{AlgoChatError, Result};
use crate::types::{KEY_DERIVATION_INFO, KEY_DERIVATION_SALT};

/// Derive the long-lived X25519 identity pair from a 32-byte account seed.
///
/// HKDF-SHA256 with salt `"AlgoChat-v1-encryption"` and info `"x25519-key"`;
/// the 32-byte output is used directly as the X25519 scalar. Deterministic:
/// the same seed always yields the same pair.
pub fn derive_keys_from_seed(seed: &[u8]) -> Result<(StaticSecret, PublicKey)> {
    if seed.len() != 32 {
        return Err(AlgoChatError::InvalidKey(format!(
            "seed must be 32 bytes, got {}",
            seed.len()
        )));
    }

    let hkdf = Hkdf::<Sha256>::new(Some(KEY_DERIVATION_SALT), seed);
    let mut scalar = [0u8; 32];
    hkdf.expand(KEY_DERIVATION_INFO, &mut scalar)
        .map_err(|e| AlgoChatError::InvalidKey(format!("HKDF expand failed: {e}")))?;

    let private_key = StaticSecret::from(scalar);
    let public_key = PublicKey::from(&private_key);

    Ok((private_key, public_key))
}

/// Generate a fresh random X25519 pair for a single envelope.
///
/// Every call draws independent randomness; two sealed envelopes never share
/// an ephemeral key.
pub fn generate_ephemeral_keypair() -> (StaticSecret, PublicKey) {
    let private_key = StaticSecret::random_from_rng(rand::thread_rng());
    let public_key = PublicKey::from(&private_key);
    (private_key, public_key)
}

/// X25519 scalar multiplication; returns the raw 32-byte shared secret.
pub fn x25519_ecdh(private_key: &StaticSecret, public_key: &PublicKey) -> [u8; 32] {
    private_key.diffie_hellman(public_key).to_bytes()
}

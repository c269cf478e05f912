//! Password-sealed private key blobs.
//!
//! Reference at-rest format for [`crate::storage::EncryptionKeyStorage`]
//! implementations that keep keys on disk: the key is encrypted under a
//! password with PBKDF2-SHA256 and AES-256-GCM. Blob layout:
//!
//! `salt (32) ‖ nonce (12) ‖ ciphertext + tag (48)`
//!
//! Every seal draws a fresh salt and nonce, so sealing the same key twice
//! yields unrelated blobs.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{AlgoChatError, Result};

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 32;

/// AES-GCM nonce length in bytes.
const KEYSTORE_NONCE_SIZE: usize = 12;

/// Sealed blob length: salt + nonce + 32-byte key + 16-byte tag.
pub const SEALED_KEY_SIZE: usize = SALT_SIZE + KEYSTORE_NONCE_SIZE + 32 + 16;

fn derive_file_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, key.as_mut());
    key
}

/// Seal a private key under a password.
pub fn seal_private_key(private_key: &[u8; 32], password: &str) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; KEYSTORE_NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let file_key = derive_file_key(password, &salt);
    let cipher = Aes256Gcm::new_from_slice(file_key.as_ref())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), private_key.as_slice())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;

    let mut blob = Vec::with_capacity(SEALED_KEY_SIZE);
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Open a sealed private key blob.
///
/// A malformed blob is [`AlgoChatError::InvalidKey`]; a wrong password or
/// tampered ciphertext is [`AlgoChatError::DecryptionFailed`].
pub fn open_private_key(blob: &[u8], password: &str) -> Result<Zeroizing<[u8; 32]>> {
    if blob.len() != SEALED_KEY_SIZE {
        return Err(AlgoChatError::InvalidKey(format!(
            "sealed key blob must be {} bytes, got {}",
            SEALED_KEY_SIZE,
            blob.len()
        )));
    }

    let salt = &blob[..SALT_SIZE];
    let nonce = &blob[SALT_SIZE..SALT_SIZE + KEYSTORE_NONCE_SIZE];
    let ciphertext = &blob[SALT_SIZE + KEYSTORE_NONCE_SIZE..];

    let file_key = derive_file_key(password, salt);
    let cipher = Aes256Gcm::new_from_slice(file_key.as_ref())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| AlgoChatError::DecryptionFailed)?;

    let mut private_key = Zeroizing::new([0u8; 32]);
    private_key.copy_from_slice(&plaintext);
    Ok(private_key)
}

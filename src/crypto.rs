//! Seal and open for the v1 Standard protocol.
//!
//! A single envelope is decryptable by both ends without broadcasting two
//! ciphertexts: the message key is additionally wrapped under a key only the
//! sender can rebuild from her identity secret and the same ephemeral. The
//! two HKDF info strings differ so a key derived on the wrong path never
//! authenticates.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::envelope::ChatEnvelope;
use crate::error::{AlgoChatError, Result};
use crate::keys::{generate_ephemeral_keypair, x25519_ecdh};
use crate::payload::parse_payload;
use crate::types::{
    DecryptedContent, ENCRYPTION_INFO_PREFIX, MAX_PAYLOAD_SIZE, NONCE_SIZE,
    SENDER_KEY_INFO_PREFIX,
};

/// Derive the message key: HKDF(salt = ephemeral, ikm = ECDH output,
/// info = "AlgoChatV1" ‖ sender ‖ recipient). The ordering inside info is
/// semantic (sender first), not sorted.
fn derive_message_key(
    shared_secret: &[u8],
    ephemeral_public_key: &[u8],
    sender_public_key: &[u8],
    recipient_public_key: &[u8],
) -> Result<Zeroizing<[u8; 32]>> {
    let mut info = Vec::with_capacity(ENCRYPTION_INFO_PREFIX.len() + 64);
    info.extend_from_slice(ENCRYPTION_INFO_PREFIX);
    info.extend_from_slice(sender_public_key);
    info.extend_from_slice(recipient_public_key);

    let hkdf = Hkdf::<Sha256>::new(Some(ephemeral_public_key), shared_secret);
    let mut key = Zeroizing::new([0u8; 32]);
    hkdf.expand(&info, key.as_mut())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;
    Ok(key)
}

/// Derive the sender key: HKDF(salt = ephemeral, ikm = ECDH with the
/// sender's own identity, info = "AlgoChatV1-SenderKey" ‖ sender).
fn derive_sender_key(
    sender_shared_secret: &[u8],
    ephemeral_public_key: &[u8],
    sender_public_key: &[u8],
) -> Result<Zeroizing<[u8; 32]>> {
    let mut info = Vec::with_capacity(SENDER_KEY_INFO_PREFIX.len() + 32);
    info.extend_from_slice(SENDER_KEY_INFO_PREFIX);
    info.extend_from_slice(sender_public_key);

    let hkdf = Hkdf::<Sha256>::new(Some(ephemeral_public_key), sender_shared_secret);
    let mut key = Zeroizing::new([0u8; 32]);
    hkdf.expand(&info, key.as_mut())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;
    Ok(key)
}

/// Encrypt a message into a standard envelope.
///
/// The size check runs before any randomness is drawn. The ephemeral private
/// scalar lives only for the duration of this call.
///
/// # Arguments
/// * `plaintext` - Message to encrypt (at most 882 UTF-8 bytes)
/// * `sender_public_key` - Sender's X25519 identity public key
/// * `recipient_public_key` - Recipient's X25519 identity public key
///
/// # Returns
/// A [`ChatEnvelope`] ready for encoding into a note
pub fn encrypt_message(
    plaintext: &str,
    sender_public_key: &PublicKey,
    recipient_public_key: &PublicKey,
) -> Result<ChatEnvelope> {
    let message_bytes = plaintext.as_bytes();

    if message_bytes.len() > MAX_PAYLOAD_SIZE {
        return Err(AlgoChatError::MessageTooLarge {
            actual: message_bytes.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let (ephemeral_private, ephemeral_public) = generate_ephemeral_keypair();

    let sender_pub_bytes = sender_public_key.as_bytes();
    let recipient_pub_bytes = recipient_public_key.as_bytes();
    let ephemeral_pub_bytes = ephemeral_public.as_bytes();

    let recipient_secret = Zeroizing::new(x25519_ecdh(&ephemeral_private, recipient_public_key));
    let symmetric_key = derive_message_key(
        recipient_secret.as_ref(),
        ephemeral_pub_bytes,
        sender_pub_bytes,
        recipient_pub_bytes,
    )?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = ChaCha20Poly1305::new_from_slice(symmetric_key.as_ref())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;
    let ciphertext = cipher
        .encrypt(nonce, message_bytes)
        .map_err(|_| AlgoChatError::DecryptionFailed)?;

    // Wrap the message key for the sender path.
    let sender_secret = Zeroizing::new(x25519_ecdh(&ephemeral_private, sender_public_key));
    let sender_key = derive_sender_key(
        sender_secret.as_ref(),
        ephemeral_pub_bytes,
        sender_pub_bytes,
    )?;

    let sender_cipher = ChaCha20Poly1305::new_from_slice(sender_key.as_ref())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;
    let encrypted_sender_key = sender_cipher
        .encrypt(nonce, symmetric_key.as_slice())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;

    Ok(ChatEnvelope {
        sender_public_key: *sender_pub_bytes,
        ephemeral_public_key: *ephemeral_pub_bytes,
        nonce: nonce_bytes,
        encrypted_sender_key,
        ciphertext,
    })
}

/// Decrypt an envelope, classifying the payload.
///
/// Dispatches on a constant-time comparison of our public key with the
/// envelope's sender key: a match takes the sender path through the wrapped
/// message key, otherwise the recipient path derives the message key
/// directly.
///
/// # Arguments
/// * `envelope` - The envelope to open
/// * `my_private_key` - Our X25519 private key
/// * `my_public_key` - Our X25519 public key
///
/// # Returns
/// The classified content, or `None` for a key-publish marker
pub fn decrypt_message(
    envelope: &ChatEnvelope,
    my_private_key: &StaticSecret,
    my_public_key: &PublicKey,
) -> Result<Option<DecryptedContent>> {
    let my_pub_bytes = my_public_key.as_bytes();
    let we_are_sender: bool = my_pub_bytes.ct_eq(&envelope.sender_public_key).into();

    let plaintext = if we_are_sender {
        decrypt_as_sender(envelope, my_private_key, my_pub_bytes)?
    } else {
        decrypt_as_recipient(envelope, my_private_key, my_pub_bytes)?
    };

    parse_payload(&plaintext)
}

fn decrypt_as_recipient(
    envelope: &ChatEnvelope,
    recipient_private_key: &StaticSecret,
    recipient_pub_bytes: &[u8; 32],
) -> Result<Zeroizing<Vec<u8>>> {
    let ephemeral_public = PublicKey::from(envelope.ephemeral_public_key);
    let shared_secret = Zeroizing::new(x25519_ecdh(recipient_private_key, &ephemeral_public));

    let symmetric_key = derive_message_key(
        shared_secret.as_ref(),
        &envelope.ephemeral_public_key,
        &envelope.sender_public_key,
        recipient_pub_bytes,
    )?;

    let cipher = ChaCha20Poly1305::new_from_slice(symmetric_key.as_ref())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;
    let nonce = Nonce::from_slice(&envelope.nonce);

    cipher
        .decrypt(nonce, envelope.ciphertext.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| AlgoChatError::DecryptionFailed)
}

fn decrypt_as_sender(
    envelope: &ChatEnvelope,
    sender_private_key: &StaticSecret,
    sender_pub_bytes: &[u8; 32],
) -> Result<Zeroizing<Vec<u8>>> {
    let ephemeral_public = PublicKey::from(envelope.ephemeral_public_key);
    let shared_secret = Zeroizing::new(x25519_ecdh(sender_private_key, &ephemeral_public));

    let sender_key = derive_sender_key(
        shared_secret.as_ref(),
        &envelope.ephemeral_public_key,
        sender_pub_bytes,
    )?;

    let sender_cipher = ChaCha20Poly1305::new_from_slice(sender_key.as_ref())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;
    let nonce = Nonce::from_slice(&envelope.nonce);

    // Unwrap the message key, then the message.
    let symmetric_key = sender_cipher
        .decrypt(nonce, envelope.encrypted_sender_key.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| AlgoChatError::DecryptionFailed)?;

    let cipher = ChaCha20Poly1305::new_from_slice(symmetric_key.as_ref())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;

    cipher
        .decrypt(nonce, envelope.ciphertext.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| AlgoChatError::DecryptionFailed)
}

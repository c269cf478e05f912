//! Seal and open for the v1.1 PSK protocol.
//!
//! Same envelope flow as the standard protocol with hybrid keying: the HKDF
//! IKM is the 64-byte `ECDH output ‖ ratcheted PSK`, so recovering a
//! plaintext requires both the right identity secret and the right PSK. The
//! counter that derived the per-message PSK travels in the header and is
//! re-derived on decrypt.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{AlgoChatError, Result};
use crate::keys::{generate_ephemeral_keypair, x25519_ecdh};
use crate::payload::parse_payload;
use crate::psk_ratchet::{
    derive_hybrid_sender_key, derive_hybrid_symmetric_key, derive_psk_at_counter,
};
use crate::psk_types::{PSKEnvelope, PSK_MAX_PAYLOAD_SIZE};
use crate::types::{DecryptedContent, NONCE_SIZE};

/// Encrypt a message into a PSK envelope.
///
/// The per-message PSK is ratcheted from `initial_psk` at `ratchet_counter`;
/// the counter is recorded in the envelope so the peer can re-derive it.
/// The size check runs before any randomness is drawn.
///
/// # Arguments
/// * `plaintext` - Message to encrypt (at most 878 UTF-8 bytes)
/// * `sender_public_key` - Sender's X25519 identity public key
/// * `recipient_public_key` - Recipient's X25519 identity public key
/// * `initial_psk` - The 32-byte initial pre-shared key
/// * `ratchet_counter` - Counter assigned to this message
pub fn encrypt_psk_message(
    plaintext: &str,
    sender_public_key: &PublicKey,
    recipient_public_key: &PublicKey,
    initial_psk: &[u8],
    ratchet_counter: u32,
) -> Result<PSKEnvelope> {
    let message_bytes = plaintext.as_bytes();

    if message_bytes.len() > PSK_MAX_PAYLOAD_SIZE {
        return Err(AlgoChatError::MessageTooLarge {
            actual: message_bytes.len(),
            max: PSK_MAX_PAYLOAD_SIZE,
        });
    }

    let current_psk = derive_psk_at_counter(initial_psk, ratchet_counter)?;

    let (ephemeral_private, ephemeral_public) = generate_ephemeral_keypair();

    let sender_pub_bytes = sender_public_key.as_bytes();
    let recipient_pub_bytes = recipient_public_key.as_bytes();
    let ephemeral_pub_bytes = ephemeral_public.as_bytes();

    let recipient_secret = Zeroizing::new(x25519_ecdh(&ephemeral_private, recipient_public_key));
    let symmetric_key = derive_hybrid_symmetric_key(
        recipient_secret.as_ref(),
        current_psk.as_ref(),
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
    let sender_key = derive_hybrid_sender_key(
        sender_secret.as_ref(),
        current_psk.as_ref(),
        ephemeral_pub_bytes,
        sender_pub_bytes,
    )?;

    let sender_cipher = ChaCha20Poly1305::new_from_slice(sender_key.as_ref())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;
    let encrypted_sender_key = sender_cipher
        .encrypt(nonce, symmetric_key.as_slice())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;

    Ok(PSKEnvelope {
        ratchet_counter,
        sender_public_key: *sender_pub_bytes,
        ephemeral_public_key: *ephemeral_pub_bytes,
        nonce: nonce_bytes,
        encrypted_sender_key,
        ciphertext,
    })
}

/// Decrypt a PSK envelope, classifying the payload.
///
/// Re-derives the per-message PSK from the envelope's counter, then
/// dispatches on a constant-time compare exactly like the standard path.
///
/// # Arguments
/// * `envelope` - The PSK envelope to open
/// * `my_private_key` - Our X25519 private key
/// * `my_public_key` - Our X25519 public key
/// * `initial_psk` - The 32-byte initial pre-shared key
///
/// # Returns
/// The classified content, or `None` for a key-publish marker
pub fn decrypt_psk_message(
    envelope: &PSKEnvelope,
    my_private_key: &StaticSecret,
    my_public_key: &PublicKey,
    initial_psk: &[u8],
) -> Result<Option<DecryptedContent>> {
    let my_pub_bytes = my_public_key.as_bytes();
    let we_are_sender: bool = my_pub_bytes.ct_eq(&envelope.sender_public_key).into();

    let current_psk = derive_psk_at_counter(initial_psk, envelope.ratchet_counter)?;

    let plaintext = if we_are_sender {
        decrypt_psk_as_sender(envelope, my_private_key, my_pub_bytes, current_psk.as_ref())?
    } else {
        decrypt_psk_as_recipient(envelope, my_private_key, my_pub_bytes, current_psk.as_ref())?
    };

    parse_payload(&plaintext)
}

fn decrypt_psk_as_recipient(
    envelope: &PSKEnvelope,
    recipient_private_key: &StaticSecret,
    recipient_pub_bytes: &[u8; 32],
    current_psk: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let ephemeral_public = PublicKey::from(envelope.ephemeral_public_key);
    let shared_secret = Zeroizing::new(x25519_ecdh(recipient_private_key, &ephemeral_public));

    let symmetric_key = derive_hybrid_symmetric_key(
        shared_secret.as_ref(),
        current_psk,
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

fn decrypt_psk_as_sender(
    envelope: &PSKEnvelope,
    sender_private_key: &StaticSecret,
    sender_pub_bytes: &[u8; 32],
    current_psk: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let ephemeral_public = PublicKey::from(envelope.ephemeral_public_key);
    let shared_secret = Zeroizing::new(x25519_ecdh(sender_private_key, &ephemeral_public));

    let sender_key = derive_hybrid_sender_key(
        shared_secret.as_ref(),
        current_psk,
        &envelope.ephemeral_public_key,
        sender_pub_bytes,
    )?;

    let sender_cipher = ChaCha20Poly1305::new_from_slice(sender_key.as_ref())
        .map_err(|_| AlgoChatError::DecryptionFailed)?;
    let nonce = Nonce::from_slice(&envelope.nonce);

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

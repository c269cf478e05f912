//! Two-level HKDF ratchet and hybrid key derivation for the PSK protocol.
//!
//! Counters map onto a session/position hierarchy: every block of
//! [`PSK_SESSION_SIZE`] consecutive counters shares one intermediate session
//! PSK, and each position inside the block derives its own per-message PSK
//! from it.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{AlgoChatError, Result};
use crate::psk_types::{PSK_SESSION_SIZE, PSK_SIZE};

/// HKDF salt for session-level derivation.
const SESSION_SALT: &[u8] = b"AlgoChat-PSK-Session";

/// HKDF salt for position-level derivation.
const POSITION_SALT: &[u8] = b"AlgoChat-PSK-Position";

/// HKDF info prefix for the hybrid message key.
const HYBRID_KEY_INFO_PREFIX: &[u8] = b"AlgoChatV1-PSK";

/// HKDF info prefix for the hybrid sender key.
const HYBRID_SENDER_KEY_INFO_PREFIX: &[u8] = b"AlgoChatV1-PSK-SenderKey";

fn check_psk_length(psk: &[u8]) -> Result<()> {
    if psk.len() != PSK_SIZE {
        return Err(AlgoChatError::PskInvalidLength(psk.len()));
    }
    Ok(())
}

/// Derive the session PSK for a session index.
///
/// HKDF(salt = "AlgoChat-PSK-Session", ikm = initial PSK,
/// info = BE32(session index)).
pub fn derive_session_psk(initial_psk: &[u8], session_index: u32) -> Result<Zeroizing<[u8; 32]>> {
    check_psk_length(initial_psk)?;

    let hkdf = Hkdf::<Sha256>::new(Some(SESSION_SALT), initial_psk);
    let mut session_psk = Zeroizing::new([0u8; 32]);
    hkdf.expand(&session_index.to_be_bytes(), session_psk.as_mut())
        .map_err(|e| AlgoChatError::InvalidKey(format!("session PSK derivation failed: {e}")))?;
    Ok(session_psk)
}

/// Derive the per-message PSK for a position within a session.
///
/// HKDF(salt = "AlgoChat-PSK-Position", ikm = session PSK,
/// info = BE32(position)).
pub fn derive_position_psk(session_psk: &[u8], position: u32) -> Result<Zeroizing<[u8; 32]>> {
    check_psk_length(session_psk)?;

    let hkdf = Hkdf::<Sha256>::new(Some(POSITION_SALT), session_psk);
    let mut position_psk = Zeroizing::new([0u8; 32]);
    hkdf.expand(&position.to_be_bytes(), position_psk.as_mut())
        .map_err(|e| AlgoChatError::InvalidKey(format!("position PSK derivation failed: {e}")))?;
    Ok(position_psk)
}

/// Derive the per-message PSK at a ratchet counter.
///
/// `counter / PSK_SESSION_SIZE` selects the session, `counter %
/// PSK_SESSION_SIZE` the position within it. Deterministic: counter 100
/// equals position 0 of session 1.
pub fn derive_psk_at_counter(initial_psk: &[u8], counter: u32) -> Result<Zeroizing<[u8; 32]>> {
    let session_index = counter / PSK_SESSION_SIZE;
    let position = counter % PSK_SESSION_SIZE;

    let session_psk = derive_session_psk(initial_psk, session_index)?;
    derive_position_psk(session_psk.as_ref(), position)
}

/// Derive the hybrid message key from the ECDH output and the current PSK.
///
/// IKM is the 64-byte concatenation `shared_secret ‖ current_psk`; the two
/// inputs are only ever mixed inside HKDF. Info is
/// "AlgoChatV1-PSK" ‖ sender ‖ recipient, salt is the ephemeral public key.
pub fn derive_hybrid_symmetric_key(
    shared_secret: &[u8],
    current_psk: &[u8],
    ephemeral_public_key: &[u8],
    sender_public_key: &[u8],
    recipient_public_key: &[u8],
) -> Result<Zeroizing<[u8; 32]>> {
    check_psk_length(current_psk)?;

    let mut ikm = Zeroizing::new(Vec::with_capacity(shared_secret.len() + current_psk.len()));
    ikm.extend_from_slice(shared_secret);
    ikm.extend_from_slice(current_psk);

    let mut info = Vec::with_capacity(HYBRID_KEY_INFO_PREFIX.len() + 64);
    info.extend_from_slice(HYBRID_KEY_INFO_PREFIX);
    info.extend_from_slice(sender_public_key);
    info.extend_from_slice(recipient_public_key);

    let hkdf = Hkdf::<Sha256>::new(Some(ephemeral_public_key), &ikm);
    let mut symmetric_key = Zeroizing::new([0u8; 32]);
    hkdf.expand(&info, symmetric_key.as_mut())
        .map_err(|e| AlgoChatError::InvalidKey(format!("hybrid key derivation failed: {e}")))?;

    Ok(symmetric_key)
}

/// Derive the hybrid sender key used to wrap the message key.
///
/// Same construction as the message key with info
/// "AlgoChatV1-PSK-SenderKey" ‖ sender.
pub fn derive_hybrid_sender_key(
    sender_shared_secret: &[u8],
    current_psk: &[u8],
    ephemeral_public_key: &[u8],
    sender_public_key: &[u8],
) -> Result<Zeroizing<[u8; 32]>> {
    check_psk_length(current_psk)?;

    let mut ikm = Zeroizing::new(Vec::with_capacity(
        sender_shared_secret.len() + current_psk.len(),
    ));
    ikm.extend_from_slice(sender_shared_secret);
    ikm.extend_from_slice(current_psk);

    let mut info = Vec::with_capacity(HYBRID_SENDER_KEY_INFO_PREFIX.len() + 32);
    info.extend_from_slice(HYBRID_SENDER_KEY_INFO_PREFIX);
    info.extend_from_slice(sender_public_key);

    let hkdf = Hkdf::<Sha256>::new(Some(ephemeral_public_key), &ikm);
    let mut sender_key = Zeroizing::new([0u8; 32]);
    hkdf.expand(&info, sender_key.as_mut())
        .map_err(|e| AlgoChatError::InvalidKey(format!("sender key derivation failed: {e}")))?;

    Ok(sender_key)
}

//! Constants and envelope type for the v1.1 PSK protocol.
//!
//! v1.1 layers a pre-shared-key ratchet over the ECDH flow: both the ECDH
//! agreement and the ratcheted PSK must be correct to derive a message key.

use crate::types::{HEADER_SIZE, MAX_NOTE_SIZE, TAG_SIZE};

/// Protocol ID byte for v1.1 (0x02 distinguishes it from standard 0x01).
pub const PSK_PROTOCOL_ID: u8 = 0x02;

/// Size of the PSK envelope header in bytes.
///
/// The standard header plus the 4-byte ratchet counter at offset 2; every
/// subsequent field shifts by 4.
pub const PSK_HEADER_SIZE: usize = HEADER_SIZE + 4;

/// Maximum plaintext size for PSK messages (the counter eats 4 bytes of
/// note budget).
pub const PSK_MAX_PAYLOAD_SIZE: usize = MAX_NOTE_SIZE - PSK_HEADER_SIZE - TAG_SIZE;

/// Required length of a pre-shared key in bytes.
pub const PSK_SIZE: usize = 32;

/// Number of counter positions sharing one session PSK.
pub const PSK_SESSION_SIZE: u32 = 100;

/// Replay-protection window around the peer's last seen counter.
pub const PSK_COUNTER_WINDOW: u32 = 200;

/// A v1.1 PSK message envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PSKEnvelope {
    /// Ratchet counter that derived the per-message PSK.
    pub ratchet_counter: u32,
    /// Sender's X25519 identity public key.
    pub sender_public_key: [u8; 32],
    /// Per-message ephemeral X25519 public key.
    pub ephemeral_public_key: [u8; 32],
    /// AEAD nonce, fresh per envelope.
    pub nonce: [u8; 12],
    /// Message key wrapped for the sender (48 bytes: key + tag).
    pub encrypted_sender_key: Vec<u8>,
    /// Message ciphertext including the trailing tag.
    pub ciphertext: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psk_budget_fits_note_cap() {
        assert_eq!(PSK_HEADER_SIZE, 130);
        assert_eq!(PSK_MAX_PAYLOAD_SIZE, 878);
        assert_eq!(PSK_HEADER_SIZE + PSK_MAX_PAYLOAD_SIZE + TAG_SIZE, MAX_NOTE_SIZE);
    }
}

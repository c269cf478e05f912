//! Wire codec for the v1 Standard envelope.
//!
//! Format (126-byte header + ciphertext):
//! - \[0\]        version (0x01)
//! - \[1\]        protocolId (0x01)
//! - \[2..34\]    senderPublicKey (32 bytes)
//! - \[34..66\]   ephemeralPublicKey (32 bytes)
//! - \[66..78\]   nonce (12 bytes)
//! - \[78..126\]  encryptedSenderKey (48 bytes)
//! - \[126..\]    ciphertext + 16-byte authentication tag

use crate::error::{AlgoChatError, Result};
use crate::types::{
    ENCRYPTED_SENDER_KEY_SIZE, HEADER_SIZE, NONCE_SIZE, PROTOCOL_ID, PROTOCOL_VERSION,
    PUBLIC_KEY_SIZE, TAG_SIZE,
};

/// A v1 Standard message envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEnvelope {
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

impl ChatEnvelope {
    /// Serialize the envelope in table order.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        data.push(PROTOCOL_VERSION);
        data.push(PROTOCOL_ID);
        data.extend_from_slice(&self.sender_public_key);
        data.extend_from_slice(&self.ephemeral_public_key);
        data.extend_from_slice(&self.nonce);
        data.extend_from_slice(&self.encrypted_sender_key);
        data.extend_from_slice(&self.ciphertext);
        data
    }

    /// Parse envelope bytes.
    ///
    /// Rejects anything shorter than two bytes, a wrong version or protocol
    /// ID, and any buffer too short to hold the header plus an authentication
    /// tag. An empty plaintext still carries a 16-byte tag, so the minimum
    /// valid length is `HEADER_SIZE + TAG_SIZE`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(AlgoChatError::InvalidEnvelope(format!(
                "data too short for a header: {} bytes",
                data.len()
            )));
        }

        if data[0] != PROTOCOL_VERSION {
            return Err(AlgoChatError::InvalidEnvelope(format!(
                "unknown version byte 0x{:02x}",
                data[0]
            )));
        }

        if data[1] != PROTOCOL_ID {
            return Err(AlgoChatError::InvalidEnvelope(format!(
                "unknown protocol ID 0x{:02x}",
                data[1]
            )));
        }

        if data.len() < HEADER_SIZE + TAG_SIZE {
            return Err(AlgoChatError::InvalidEnvelope(format!(
                "data too short: {} bytes (minimum {})",
                data.len(),
                HEADER_SIZE + TAG_SIZE
            )));
        }

        let mut offset = 2;

        let mut sender_public_key = [0u8; 32];
        sender_public_key.copy_from_slice(&data[offset..offset + PUBLIC_KEY_SIZE]);
        offset += PUBLIC_KEY_SIZE;

        let mut ephemeral_public_key = [0u8; 32];
        ephemeral_public_key.copy_from_slice(&data[offset..offset + PUBLIC_KEY_SIZE]);
        offset += PUBLIC_KEY_SIZE;

        let mut nonce = [0u8; 12];
        nonce.copy_from_slice(&data[offset..offset + NONCE_SIZE]);
        offset += NONCE_SIZE;

        let encrypted_sender_key = data[offset..offset + ENCRYPTED_SENDER_KEY_SIZE].to_vec();
        offset += ENCRYPTED_SENDER_KEY_SIZE;

        let ciphertext = data[offset..].to_vec();

        Ok(Self {
            sender_public_key,
            ephemeral_public_key,
            nonce,
            encrypted_sender_key,
            ciphertext,
        })
    }
}

/// Whether the leading bytes identify a v1 Standard envelope.
///
/// Only inspects the two discriminator bytes; full validation happens in
/// [`ChatEnvelope::decode`].
pub fn is_chat_message(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == PROTOCOL_VERSION && data[1] == PROTOCOL_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_envelope() -> ChatEnvelope {
        ChatEnvelope {
            sender_public_key: [1u8; 32],
            ephemeral_public_key: [2u8; 32],
            nonce: [3u8; 12],
            encrypted_sender_key: vec![4u8; 48],
            ciphertext: vec![5u8; 32],
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let envelope = sample_envelope();

        let encoded = envelope.encode();
        assert_eq!(encoded.len(), HEADER_SIZE + 32);
        assert_eq!(encoded[0], PROTOCOL_VERSION);
        assert_eq!(encoded[1], PROTOCOL_ID);

        let decoded = ChatEnvelope::decode(&encoded).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_field_offsets() {
        let encoded = sample_envelope().encode();
        assert_eq!(&encoded[2..34], &[1u8; 32]);
        assert_eq!(&encoded[34..66], &[2u8; 32]);
        assert_eq!(&encoded[66..78], &[3u8; 12]);
        assert_eq!(&encoded[78..126], &[4u8; 48]);
        assert_eq!(&encoded[126..], &[5u8; 32]);
    }

    #[test]
    fn test_is_chat_message() {
        assert!(is_chat_message(&[0x01, 0x01]));
        assert!(is_chat_message(&sample_envelope().encode()));
        assert!(!is_chat_message(&[0x00, 0x01]));
        assert!(!is_chat_message(&[0x01, 0x02]));
        assert!(!is_chat_message(&[0x01]));
        assert!(!is_chat_message(&[]));
    }

    #[test]
    fn test_decode_too_short() {
        let result = ChatEnvelope::decode(&[0x01]);
        assert!(matches!(result, Err(AlgoChatError::InvalidEnvelope(_))));

        // Header alone is not enough: the tag is mandatory.
        let mut data = vec![0u8; HEADER_SIZE];
        data[0] = PROTOCOL_VERSION;
        data[1] = PROTOCOL_ID;
        let result = ChatEnvelope::decode(&data);
        assert!(matches!(result, Err(AlgoChatError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_decode_minimum_length() {
        let mut data = vec![0u8; HEADER_SIZE + TAG_SIZE];
        data[0] = PROTOCOL_VERSION;
        data[1] = PROTOCOL_ID;
        let decoded = ChatEnvelope::decode(&data).unwrap();
        assert_eq!(decoded.ciphertext.len(), TAG_SIZE);
    }

    #[test]
    fn test_decode_wrong_version() {
        let mut data = vec![0u8; HEADER_SIZE + TAG_SIZE];
        data[0] = 0x02;
        data[1] = PROTOCOL_ID;
        let result = ChatEnvelope::decode(&data);
        assert!(matches!(result, Err(AlgoChatError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_decode_wrong_protocol_id() {
        let mut data = vec![0u8; HEADER_SIZE + TAG_SIZE];
        data[0] = PROTOCOL_VERSION;
        data[1] = 0x03;
        let result = ChatEnvelope::decode(&data);
        assert!(matches!(result, Err(AlgoChatError::InvalidEnvelope(_))));
    }
}

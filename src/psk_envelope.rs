//! Wire codec for the v1.1 PSK envelope.
//!
//! Format (130-byte header + ciphertext):
//! - \[0\]        version (0x01)
//! - \[1\]        protocolId (0x02)
//! - \[2..6\]     ratchetCounter (big-endian u32)
//! - \[6..38\]    senderPublicKey (32 bytes)
//! - \[38..70\]   ephemeralPublicKey (32 bytes)
//! - \[70..82\]   nonce (12 bytes)
//! - \[82..130\]  encryptedSenderKey (48 bytes)
//! - \[130..\]    ciphertext + 16-byte authentication tag

use crate::error::{AlgoChatError, Result};
use crate::psk_types::{PSKEnvelope, PSK_HEADER_SIZE, PSK_PROTOCOL_ID};
use crate::types::{
    ENCRYPTED_SENDER_KEY_SIZE, NONCE_SIZE, PROTOCOL_VERSION, PUBLIC_KEY_SIZE, TAG_SIZE,
};

/// Serialize a PSK envelope in table order.
pub fn encode_psk_envelope(envelope: &PSKEnvelope) -> Vec<u8> {
    let mut data = Vec::with_capacity(PSK_HEADER_SIZE + envelope.ciphertext.len());
    data.push(PROTOCOL_VERSION);
    data.push(PSK_PROTOCOL_ID);
    data.extend_from_slice(&envelope.ratchet_counter.to_be_bytes());
    data.extend_from_slice(&envelope.sender_public_key);
    data.extend_from_slice(&envelope.ephemeral_public_key);
    data.extend_from_slice(&envelope.nonce);
    data.extend_from_slice(&envelope.encrypted_sender_key);
    data.extend_from_slice(&envelope.ciphertext);
    data
}

/// Parse PSK envelope bytes.
///
/// Same validation as the standard codec with the 4-byte counter accounted
/// for: minimum length is `PSK_HEADER_SIZE + TAG_SIZE`.
pub fn decode_psk_envelope(data: &[u8]) -> Result<PSKEnvelope> {
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

    if data[1] != PSK_PROTOCOL_ID {
        return Err(AlgoChatError::InvalidEnvelope(format!(
            "unknown protocol ID 0x{:02x}",
            data[1]
        )));
    }

    if data.len() < PSK_HEADER_SIZE + TAG_SIZE {
        return Err(AlgoChatError::InvalidEnvelope(format!(
            "PSK data too short: {} bytes (minimum {})",
            data.len(),
            PSK_HEADER_SIZE + TAG_SIZE
        )));
    }

    let mut offset = 2;

    let ratchet_counter = u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]);
    offset += 4;

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

    Ok(PSKEnvelope {
        ratchet_counter,
        sender_public_key,
        ephemeral_public_key,
        nonce,
        encrypted_sender_key,
        ciphertext,
    })
}

/// Whether the leading bytes identify a v1.1 PSK envelope.
///
/// Disjoint from [`crate::envelope::is_chat_message`]: the protocol ID byte
/// differs, so no byte string satisfies both.
pub fn is_psk_message(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == PROTOCOL_VERSION && data[1] == PSK_PROTOCOL_ID
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::is_chat_message;

    fn sample_envelope() -> PSKEnvelope {
        PSKEnvelope {
            ratchet_counter: 42,
            sender_public_key: [1u8; 32],
            ephemeral_public_key: [2u8; 32],
            nonce: [3u8; 12],
            encrypted_sender_key: vec![4u8; 48],
            ciphertext: vec![5u8; 64],
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let envelope = sample_envelope();

        let encoded = encode_psk_envelope(&envelope);
        assert_eq!(encoded.len(), PSK_HEADER_SIZE + 64);

        let decoded = decode_psk_envelope(&encoded).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_ratchet_counter_big_endian() {
        let mut envelope = sample_envelope();
        envelope.ratchet_counter = 0x01020304;

        let encoded = encode_psk_envelope(&envelope);
        assert_eq!(&encoded[2..6], &[0x01, 0x02, 0x03, 0x04]);

        let decoded = decode_psk_envelope(&encoded).unwrap();
        assert_eq!(decoded.ratchet_counter, 0x01020304);
    }

    #[test]
    fn test_counter_extremes() {
        for counter in [0u32, 1, u32::MAX] {
            let mut envelope = sample_envelope();
            envelope.ratchet_counter = counter;
            let decoded = decode_psk_envelope(&encode_psk_envelope(&envelope)).unwrap();
            assert_eq!(decoded.ratchet_counter, counter);
        }
    }

    #[test]
    fn test_is_psk_message() {
        assert!(is_psk_message(&[0x01, 0x02]));
        assert!(is_psk_message(&encode_psk_envelope(&sample_envelope())));
        assert!(!is_psk_message(&[0x01, 0x01]));
        assert!(!is_psk_message(&[0x02, 0x02]));
        assert!(!is_psk_message(&[0x01]));
        assert!(!is_psk_message(&[]));
    }

    #[test]
    fn test_discriminators_are_disjoint() {
        let psk = encode_psk_envelope(&sample_envelope());
        assert!(!is_chat_message(&psk));

        for a in [0x00u8, 0x01, 0x02] {
            for b in [0x00u8, 0x01, 0x02] {
                let data = [a, b];
                assert!(!(is_chat_message(&data) && is_psk_message(&data)));
            }
        }
    }

    #[test]
    fn test_decode_too_short() {
        let result = decode_psk_envelope(&[0x01]);
        assert!(matches!(result, Err(AlgoChatError::InvalidEnvelope(_))));

        let mut header_only = vec![0u8; PSK_HEADER_SIZE];
        header_only[0] = PROTOCOL_VERSION;
        header_only[1] = PSK_PROTOCOL_ID;
        let result = decode_psk_envelope(&header_only);
        assert!(matches!(result, Err(AlgoChatError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_decode_wrong_version() {
        let mut data = vec![0u8; PSK_HEADER_SIZE + TAG_SIZE];
        data[0] = 0x02;
        data[1] = PSK_PROTOCOL_ID;
        let result = decode_psk_envelope(&data);
        assert!(matches!(result, Err(AlgoChatError::InvalidEnvelope(_))));
    }

    #[test]
    fn test_decode_standard_protocol_id_rejected() {
        let mut data = vec![0u8; PSK_HEADER_SIZE + TAG_SIZE];
        data[0] = PROTOCOL_VERSION;
        data[1] = 0x01;
        let result = decode_psk_envelope(&data);
        assert!(matches!(result, Err(AlgoChatError::InvalidEnvelope(_))));
    }
}

//! Protocol constants and shared types for the v1 Standard protocol.

/// Protocol version byte, shared by both wire protocols.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Protocol ID byte for the v1 Standard ("ECDH-only") protocol.
pub const PROTOCOL_ID: u8 = 0x01;

/// Size of the standard envelope header in bytes.
pub const HEADER_SIZE: usize = 126;

/// Size of the ChaCha20-Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Size of the encrypted sender key (32-byte key + 16-byte tag).
pub const ENCRYPTED_SENDER_KEY_SIZE: usize = 48;

/// Ledger note cap in bytes; an encoded envelope must never exceed this.
pub const MAX_NOTE_SIZE: usize = 1024;

/// Maximum plaintext size for the standard protocol
/// (note cap minus header and tag).
pub const MAX_PAYLOAD_SIZE: usize = MAX_NOTE_SIZE - HEADER_SIZE - TAG_SIZE;

/// Size of the AEAD nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of an X25519 or Ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// HKDF salt for identity key derivation.
pub const KEY_DERIVATION_SALT: &[u8] = b"AlgoChat-v1-encryption";

/// HKDF info for identity key derivation.
pub const KEY_DERIVATION_INFO: &[u8] = b"x25519-key";

/// HKDF info prefix for the message key.
pub const ENCRYPTION_INFO_PREFIX: &[u8] = b"AlgoChatV1";

/// HKDF info prefix for the sender key (bidirectional decryption).
pub const SENDER_KEY_INFO_PREFIX: &[u8] = b"AlgoChatV1-SenderKey";

/// A decrypted, classified message payload.
///
/// Key-publish payloads never become a `DecryptedContent`; they collapse to
/// the no-message sentinel (`None`) at the decryption layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedContent {
    /// The message text.
    pub text: String,
    /// Transaction ID of the message this one replies to, if any.
    pub reply_to_id: Option<String>,
    /// Sender-truncated preview of the replied-to message, if any.
    pub reply_to_preview: Option<String>,
}

impl DecryptedContent {
    /// A plain text payload with no reply context.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_to_id: None,
            reply_to_preview: None,
        }
    }
}

//! AlgoChat - end-to-end encrypted messaging carried in Algorand notes.
//!
//! Protocol engine for the AlgoChat v1 Standard (X25519 + ChaCha20-Poly1305)
//! and v1.1 PSK (hybrid ECDH + pre-shared-key ratchet) wire protocols. Every
//! message is a self-contained envelope in a payment transaction's note
//! field; both the sender and the recipient can decrypt the same envelope.
//!
//! The engine does no I/O. Ledger access and durable storage are injected
//! through the traits in [`chain`] and [`storage`].

mod announce;
mod chain;
mod client;
mod crypto;
mod envelope;
mod error;
mod keys;
mod keystore;
mod models;
mod payload;
mod psk_crypto;
mod psk_envelope;
mod psk_exchange;
mod psk_ratchet;
mod psk_state;
mod psk_types;
mod signature;
mod storage;
mod types;

pub use announce::{
    discover_encryption_key, discover_encryption_key_from_messages, discover_key_in_announcements,
    discover_key_in_messages, parse_key_announcement, DEFAULT_ANNOUNCEMENT_SEARCH_DEPTH,
    DEFAULT_ENVELOPE_SEARCH_DEPTH,
};
pub use chain::{
    decode_algorand_address, encode_algorand_address, AccountInfo, AlgodClient, AlgorandConfig,
    IndexerClient, NoteTransaction, SuggestedParams, TransactionInfo, MIN_PAYMENT_MICROALGOS,
};
pub use client::{AlgoChat, AlgoChatConfig};
pub use crypto::{decrypt_message, encrypt_message};
pub use envelope::{is_chat_message, ChatEnvelope};
pub use error::{AlgoChatError, Result};
pub use keys::{derive_keys_from_seed, generate_ephemeral_keypair, x25519_ecdh};
pub use keystore::{
    open_private_key, seal_private_key, PBKDF2_ITERATIONS, SALT_SIZE, SEALED_KEY_SIZE,
};
pub use models::{
    ChatAccount, Conversation, DiscoveredKey, Message, MessageDirection, PendingMessage,
    PendingStatus, ReplyContext, SendOptions, SendResult,
};
pub use payload::{
    build_payload, is_key_publish, parse_payload, truncate_preview, KEY_PUBLISH_PAYLOAD,
    REPLY_PREVIEW_MAX_BYTES,
};
pub use psk_crypto::{decrypt_psk_message, encrypt_psk_message};
pub use psk_envelope::{decode_psk_envelope, encode_psk_envelope, is_psk_message};
pub use psk_exchange::PSKExchangeURI;
pub use psk_ratchet::{
    derive_hybrid_sender_key, derive_hybrid_symmetric_key, derive_position_psk,
    derive_psk_at_counter, derive_session_psk,
};
pub use psk_state::PSKState;
pub use psk_types::{
    PSKEnvelope, PSK_COUNTER_WINDOW, PSK_HEADER_SIZE, PSK_MAX_PAYLOAD_SIZE, PSK_PROTOCOL_ID,
    PSK_SESSION_SIZE, PSK_SIZE,
};
pub use signature::{
    fingerprint, sign_encryption_key, verify_encryption_key, verify_encryption_key_bytes,
};
pub use storage::{
    EncryptionKeyStorage, InMemoryKeyStorage, InMemoryMessageCache, InMemorySendQueueStorage,
    MessageCache, PublicKeyCache, SendQueueStorage,
};
pub use types::{
    DecryptedContent, ENCRYPTED_SENDER_KEY_SIZE, HEADER_SIZE, MAX_NOTE_SIZE, MAX_PAYLOAD_SIZE,
    NONCE_SIZE, PROTOCOL_ID, PROTOCOL_VERSION, PUBLIC_KEY_SIZE, SIGNATURE_SIZE, TAG_SIZE,
};

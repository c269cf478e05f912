//! Error types for AlgoChat operations.
//!
//! Cryptographic and envelope failures are terminal: they mean a corrupt
//! message, a wrong key, or a protocol mismatch, and retrying cannot fix
//! them. Network-facing failures from the chain collaborators are marked
//! retryable so callers can schedule another attempt.

use thiserror::Error;

/// Errors that can occur during AlgoChat operations.
#[derive(Error, Debug)]
pub enum AlgoChatError {
    /// A key or seed had the wrong length or was otherwise unusable.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Envelope bytes with a bad header, version, protocol ID, or length.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Authenticated decryption failed.
    ///
    /// Deliberately carries no detail: whether the message AEAD or the
    /// sender-key AEAD rejected must not be observable.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Plaintext exceeds the note budget for the protocol in use.
    #[error("Message too large: {actual} bytes (max {max})")]
    MessageTooLarge { actual: usize, max: usize },

    /// No published encryption key was found for the address.
    #[error("No encryption key found for {address} in the last {search_depth} transactions")]
    PublicKeyNotFound { address: String, search_depth: u32 },

    /// A pre-shared key was not exactly 32 bytes.
    #[error("Invalid PSK length: expected 32 bytes, got {0}")]
    PskInvalidLength(usize),

    /// A ratchet counter was replayed or fell outside the replay window.
    #[error("Invalid ratchet counter {counter}: {reason}")]
    PskInvalidCounter { counter: u32, reason: String },

    /// A PSK exchange URI failed to parse.
    #[error("Invalid PSK exchange URI: {0}")]
    PskExchangeUriInvalid(String),

    /// An Algorand address failed base32/checksum validation.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A network request to algod failed.
    #[error("Network error: {0}")]
    Network(String),

    /// A request timed out.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// An indexer query failed.
    #[error("Indexer error: {0}")]
    Indexer(String),

    /// A transaction was not confirmed within the allotted rounds.
    #[error("Transaction {txid} not confirmed within {rounds} rounds")]
    ConfirmationTimeout { txid: String, rounds: u64 },

    /// A storage collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AlgoChatError {
    /// Whether the operation may be retried.
    ///
    /// Cryptographic and envelope errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Timeout(_)
                | Self::Indexer(_)
                | Self::ConfirmationTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AlgoChatError>;

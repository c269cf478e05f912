//! Domain models: messages, conversations, accounts, discovery results.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use zeroize::Zeroizing;

use crate::payload::truncate_preview;

/// Context linking a reply to the message it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyContext {
    /// Transaction ID of the original message.
    pub message_id: String,
    /// Truncated preview of the original message.
    pub preview: String,
}

impl ReplyContext {
    /// Create a reply context from raw parts.
    pub fn new(message_id: impl Into<String>, preview: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            preview: preview.into(),
        }
    }

    /// Build a reply context for a message, truncating the preview to the
    /// wire budget.
    pub fn from_message(message: &Message) -> Self {
        Self {
            message_id: message.id.clone(),
            preview: truncate_preview(&message.content),
        }
    }
}

/// Direction of a message relative to the local account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageDirection {
    /// Sent by the local account.
    Sent,
    /// Received by the local account.
    Received,
}

/// A decrypted chat message anchored to its on-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Transaction ID.
    pub id: String,
    /// Sender's Algorand address.
    pub sender: String,
    /// Recipient's Algorand address.
    pub recipient: String,
    /// Decrypted content.
    pub content: String,
    /// Block timestamp.
    pub timestamp: SystemTime,
    /// Confirmation round.
    pub confirmed_round: u64,
    /// Direction relative to the local account.
    pub direction: MessageDirection,
    /// Reply context, when this message answers another.
    pub reply_context: Option<ReplyContext>,
}

impl Message {
    /// Create a message.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        content: impl Into<String>,
        timestamp: SystemTime,
        confirmed_round: u64,
        direction: MessageDirection,
        reply_context: Option<ReplyContext>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            content: content.into(),
            timestamp,
            confirmed_round,
            direction,
            reply_context,
        }
    }

    /// Whether this message replies to another.
    pub fn is_reply(&self) -> bool {
        self.reply_context.is_some()
    }

    /// Unix timestamp in seconds.
    pub fn unix_timestamp(&self) -> u64 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

impl std::hash::Hash for Message {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A two-party conversation, ordered by ledger time.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// The other party's Algorand address.
    pub participant: String,
    /// Cached encryption key for the participant.
    pub participant_encryption_key: Option<[u8; 32]>,
    messages: Vec<Message>,
    /// Round of the newest fetched message, for incremental sync.
    pub last_fetched_round: Option<u64>,
}

impl Conversation {
    /// Start an empty conversation.
    pub fn new(participant: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            participant_encryption_key: None,
            messages: Vec::new(),
            last_fetched_round: None,
        }
    }

    /// Start a conversation with a known encryption key.
    pub fn with_key(participant: impl Into<String>, encryption_key: [u8; 32]) -> Self {
        Self {
            participant_encryption_key: Some(encryption_key),
            ..Self::new(participant)
        }
    }

    /// All messages, chronological.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has any messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Insert a message, ignoring duplicates by transaction ID and keeping
    /// ledger order by (round, timestamp).
    pub fn append(&mut self, message: Message) {
        if self.messages.iter().any(|m| m.id == message.id) {
            return;
        }
        self.messages.push(message);
        self.messages
            .sort_by_key(|m| (m.confirmed_round, m.timestamp));
    }

    /// Merge a batch of messages.
    pub fn merge(&mut self, new_messages: impl IntoIterator<Item = Message>) {
        for message in new_messages {
            self.append(message);
        }
    }
}

/// Result of discovering an account's encryption key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredKey {
    /// The X25519 public key.
    pub public_key: [u8; 32],
    /// True only when an Ed25519 signature over the key validated against
    /// the account's address key.
    pub is_verified: bool,
    /// Transaction the key was found in, when known.
    pub source_txid: Option<String>,
    /// Round of that transaction, when known.
    pub source_round: Option<u64>,
}

impl DiscoveredKey {
    /// A discovery result with no provenance.
    pub fn new(public_key: [u8; 32], is_verified: bool) -> Self {
        Self {
            public_key,
            is_verified,
            source_txid: None,
            source_round: None,
        }
    }

    /// Attach the transaction the key came from.
    pub fn with_provenance(mut self, txid: &str, round: u64) -> Self {
        self.source_txid = Some(txid.to_string());
        self.source_round = Some(round);
        self
    }
}

/// Options for sending a message.
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Wait for algod confirmation before returning.
    pub wait_for_confirmation: bool,
    /// Maximum rounds to wait for confirmation.
    pub timeout_rounds: u64,
    /// Wait until the indexer sees the transaction.
    pub wait_for_indexer: bool,
    /// Maximum seconds to wait for the indexer.
    pub indexer_timeout_secs: u64,
    /// Reply context, when replying.
    pub reply_context: Option<ReplyContext>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            wait_for_confirmation: false,
            timeout_rounds: 10,
            wait_for_indexer: false,
            indexer_timeout_secs: 30,
            reply_context: None,
        }
    }
}

impl SendOptions {
    /// Fire-and-forget.
    pub fn fire_and_forget() -> Self {
        Self::default()
    }

    /// Wait for algod confirmation only.
    pub fn confirmed() -> Self {
        Self {
            wait_for_confirmation: true,
            ..Default::default()
        }
    }

    /// Wait for both algod and the indexer.
    pub fn indexed() -> Self {
        Self {
            wait_for_confirmation: true,
            wait_for_indexer: true,
            ..Default::default()
        }
    }

    /// Reply to a message.
    pub fn replying_to(message: &Message) -> Self {
        Self {
            reply_context: Some(ReplyContext::from_message(message)),
            ..Default::default()
        }
    }
}

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendResult {
    /// Transaction ID.
    pub txid: String,
    /// The sent message, for optimistic display.
    pub message: Message,
}

/// Status of a queued outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    /// Waiting to be sent.
    Pending,
    /// Currently being sent.
    Sending,
    /// Last attempt failed.
    Failed,
    /// Successfully sent.
    Sent,
}

/// An outgoing message awaiting submission.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    /// Queue-local identifier.
    pub id: String,
    /// Recipient address.
    pub recipient: String,
    /// Message content.
    pub content: String,
    /// Reply context, when replying.
    pub reply_context: Option<ReplyContext>,
    /// Creation time.
    pub created_at: SystemTime,
    /// Attempts so far.
    pub retry_count: u32,
    /// Current status.
    pub status: PendingStatus,
    /// Last failure, if any.
    pub last_error: Option<String>,
}

impl PendingMessage {
    /// Queue a new message.
    pub fn new(
        recipient: impl Into<String>,
        content: impl Into<String>,
        reply_context: Option<ReplyContext>,
    ) -> Self {
        Self {
            id: random_id(),
            recipient: recipient.into(),
            content: content.into(),
            reply_context,
            created_at: SystemTime::now(),
            retry_count: 0,
            status: PendingStatus::Pending,
            last_error: None,
        }
    }
}

/// A chat-enabled Algorand account.
///
/// Wraps the account address and Ed25519 public key with the X25519 identity
/// pair derived from the account seed.
#[derive(Clone)]
pub struct ChatAccount {
    /// The Algorand address (58 characters).
    pub address: String,
    /// The account's Ed25519 public key.
    pub ed25519_public_key: [u8; 32],
    encryption_private_key: x25519_dalek::StaticSecret,
    encryption_public_key: x25519_dalek::PublicKey,
}

impl ChatAccount {
    /// Derive a chat account from a 32-byte seed.
    pub fn from_seed(
        address: impl Into<String>,
        seed: &[u8; 32],
        ed25519_public_key: [u8; 32],
    ) -> crate::error::Result<Self> {
        let (private_key, public_key) = crate::keys::derive_keys_from_seed(seed)?;
        Ok(Self {
            address: address.into(),
            ed25519_public_key,
            encryption_private_key: private_key,
            encryption_public_key: public_key,
        })
    }

    /// Derive a chat account from a 64-byte Algorand secret key
    /// (seed ‖ Ed25519 public key).
    pub fn from_algorand_account(
        address: impl Into<String>,
        secret_key: &[u8; 64],
    ) -> crate::error::Result<Self> {
        let seed: [u8; 32] = secret_key[..32]
            .try_into()
            .expect("slice of a 64-byte array");
        let ed25519_public_key: [u8; 32] = secret_key[32..]
            .try_into()
            .expect("slice of a 64-byte array");

        Self::from_seed(address, &seed, ed25519_public_key)
    }

    /// Rebuild a chat account from stored raw keys.
    pub fn from_raw_keys(
        address: impl Into<String>,
        ed25519_public_key: [u8; 32],
        encryption_private_key: [u8; 32],
    ) -> Self {
        let private_key = x25519_dalek::StaticSecret::from(encryption_private_key);
        let public_key = x25519_dalek::PublicKey::from(&private_key);

        Self {
            address: address.into(),
            ed25519_public_key,
            encryption_private_key: private_key,
            encryption_public_key: public_key,
        }
    }

    /// The encryption public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        *self.encryption_public_key.as_bytes()
    }

    /// The encryption private key bytes, for secure storage only.
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.encryption_private_key.to_bytes())
    }

    /// The X25519 private key.
    pub fn encryption_private_key(&self) -> &x25519_dalek::StaticSecret {
        &self.encryption_private_key
    }

    /// The X25519 public key.
    pub fn encryption_public_key(&self) -> &x25519_dalek::PublicKey {
        &self.encryption_public_key
    }
}

impl std::fmt::Debug for ChatAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatAccount")
            .field("address", &self.address)
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish()
    }
}

impl std::fmt::Display for ChatAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChatAccount({})", self.address)
    }
}

/// Random identifier for queued messages (UUID v4 format).
fn random_id() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::thread_rng().gen();

    format!(
        "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u16::from_be_bytes([bytes[4], bytes[5]]),
        (u16::from_be_bytes([bytes[6], bytes[7]]) & 0x0fff) | 0x4000,
        (u16::from_be_bytes([bytes[8], bytes[9]]) & 0x3fff) | 0x8000,
        u64::from_be_bytes([
            0, 0, bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
        ])
    )
}

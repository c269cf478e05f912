//! Storage collaborator interfaces and in-memory implementations.
//!
//! Durable persistence lives outside the engine. These traits define the
//! contracts; the in-memory implementations back the test suite and small
//! tools. All contracts take the participant address as the first parameter
//! and key insertion idempotently by transaction ID.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::{AlgoChatError, Result};
use crate::models::{Message, PendingMessage};

// ============================================================================
// Message cache
// ============================================================================

/// Cache of decrypted messages and per-conversation sync positions.
#[async_trait::async_trait]
pub trait MessageCache: Send + Sync {
    /// Insert messages for a conversation. Idempotent by transaction ID.
    async fn insert(&self, participant: &str, messages: &[Message]) -> Result<()>;

    /// Cached messages for a conversation, optionally only after a round.
    async fn messages(&self, participant: &str, after_round: Option<u64>) -> Result<Vec<Message>>;

    /// The last synced round for a conversation.
    async fn last_sync_round(&self, participant: &str) -> Result<Option<u64>>;

    /// Record the last synced round for a conversation.
    async fn set_last_sync_round(&self, participant: &str, round: u64) -> Result<()>;

    /// All cached conversation participants.
    async fn participants(&self) -> Result<Vec<String>>;

    /// Drop everything.
    async fn clear(&self) -> Result<()>;

    /// Drop one conversation.
    async fn clear_participant(&self, participant: &str) -> Result<()>;
}

/// In-memory [`MessageCache`].
#[derive(Default)]
pub struct InMemoryMessageCache {
    messages: Arc<RwLock<HashMap<String, Vec<Message>>>>,
    sync_rounds: Arc<RwLock<HashMap<String, u64>>>,
}

impl InMemoryMessageCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MessageCache for InMemoryMessageCache {
    async fn insert(&self, participant: &str, messages: &[Message]) -> Result<()> {
        let mut cache = self.messages.write().await;
        let entry = cache.entry(participant.to_string()).or_default();

        for message in messages {
            if !entry.iter().any(|m| m.id == message.id) {
                entry.push(message.clone());
            }
        }

        entry.sort_by_key(|m| (m.confirmed_round, m.timestamp));
        Ok(())
    }

    async fn messages(&self, participant: &str, after_round: Option<u64>) -> Result<Vec<Message>> {
        let cache = self.messages.read().await;
        let messages = cache.get(participant).cloned().unwrap_or_default();

        Ok(match after_round {
            Some(round) => messages
                .into_iter()
                .filter(|m| m.confirmed_round > round)
                .collect(),
            None => messages,
        })
    }

    async fn last_sync_round(&self, participant: &str) -> Result<Option<u64>> {
        let rounds = self.sync_rounds.read().await;
        Ok(rounds.get(participant).copied())
    }

    async fn set_last_sync_round(&self, participant: &str, round: u64) -> Result<()> {
        let mut rounds = self.sync_rounds.write().await;
        rounds.insert(participant.to_string(), round);
        Ok(())
    }

    async fn participants(&self) -> Result<Vec<String>> {
        let cache = self.messages.read().await;
        Ok(cache.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.messages.write().await.clear();
        self.sync_rounds.write().await.clear();
        Ok(())
    }

    async fn clear_participant(&self, participant: &str) -> Result<()> {
        self.messages.write().await.remove(participant);
        self.sync_rounds.write().await.remove(participant);
        Ok(())
    }
}

// ============================================================================
// Encryption key storage
// ============================================================================

/// Storage for encryption private keys, keyed by address.
#[async_trait::async_trait]
pub trait EncryptionKeyStorage: Send + Sync {
    /// Store a private key.
    async fn store(&self, address: &str, private_key: &[u8; 32]) -> Result<()>;

    /// Retrieve a private key.
    async fn retrieve(&self, address: &str) -> Result<[u8; 32]>;

    /// Whether a key exists.
    async fn has_key(&self, address: &str) -> bool;

    /// Delete a key.
    async fn delete(&self, address: &str) -> Result<()>;

    /// All addresses with stored keys.
    async fn list_addresses(&self) -> Result<Vec<String>>;
}

/// In-memory [`EncryptionKeyStorage`] for tests.
///
/// Keys are held unencrypted and vanish with the process; not for
/// production use.
#[derive(Default)]
pub struct InMemoryKeyStorage {
    keys: Arc<RwLock<HashMap<String, [u8; 32]>>>,
}

impl InMemoryKeyStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EncryptionKeyStorage for InMemoryKeyStorage {
    async fn store(&self, address: &str, private_key: &[u8; 32]) -> Result<()> {
        let mut keys = self.keys.write().await;
        keys.insert(address.to_string(), *private_key);
        Ok(())
    }

    async fn retrieve(&self, address: &str) -> Result<[u8; 32]> {
        let keys = self.keys.read().await;
        keys.get(address)
            .copied()
            .ok_or_else(|| AlgoChatError::Storage(format!("no key stored for {address}")))
    }

    async fn has_key(&self, address: &str) -> bool {
        let keys = self.keys.read().await;
        keys.contains_key(address)
    }

    async fn delete(&self, address: &str) -> Result<()> {
        let mut keys = self.keys.write().await;
        keys.remove(address);
        Ok(())
    }

    async fn list_addresses(&self) -> Result<Vec<String>> {
        let keys = self.keys.read().await;
        Ok(keys.keys().cloned().collect())
    }
}

// ============================================================================
// Send queue storage
// ============================================================================

/// Persistence for the ordered list of pending outgoing messages.
#[async_trait::async_trait]
pub trait SendQueueStorage: Send + Sync {
    /// Load the queue.
    async fn load(&self) -> Result<Vec<PendingMessage>>;

    /// Replace the stored queue.
    async fn save(&self, queue: &[PendingMessage]) -> Result<()>;

    /// Drop the stored queue.
    async fn clear(&self) -> Result<()>;
}

/// In-memory [`SendQueueStorage`] for tests.
#[derive(Default)]
pub struct InMemorySendQueueStorage {
    queue: Arc<RwLock<Vec<PendingMessage>>>,
}

impl InMemorySendQueueStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SendQueueStorage for InMemorySendQueueStorage {
    async fn load(&self) -> Result<Vec<PendingMessage>> {
        Ok(self.queue.read().await.clone())
    }

    async fn save(&self, queue: &[PendingMessage]) -> Result<()> {
        *self.queue.write().await = queue.to_vec();
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.queue.write().await.clear();
        Ok(())
    }
}

// ============================================================================
// Public key cache
// ============================================================================

struct CacheEntry {
    key: [u8; 32],
    verified: bool,
    expires_at: Instant,
}

/// In-memory TTL cache for discovered public keys.
pub struct PublicKeyCache {
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl PublicKeyCache {
    /// Cache with the given entry lifetime.
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Cache with the default 24-hour lifetime.
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(86400))
    }

    /// Store a key for an address.
    pub async fn store(&self, address: &str, key: [u8; 32], verified: bool) {
        let mut cache = self.cache.write().await;
        cache.insert(
            address.to_string(),
            CacheEntry {
                key,
                verified,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Retrieve an unexpired key and its verification flag.
    pub async fn retrieve(&self, address: &str) -> Option<([u8; 32], bool)> {
        let cache = self.cache.read().await;
        cache.get(address).and_then(|entry| {
            (entry.expires_at > Instant::now()).then_some((entry.key, entry.verified))
        })
    }

    /// Drop the entry for an address.
    pub async fn invalidate(&self, address: &str) {
        self.cache.write().await.remove(address);
    }

    /// Drop everything.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    /// Drop expired entries.
    pub async fn prune_expired(&self) {
        let mut cache = self.cache.write().await;
        let now = Instant::now();
        cache.retain(|_, entry| entry.expires_at > now);
    }
}

impl Default for PublicKeyCache {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

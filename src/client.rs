//! High-level AlgoChat client.
//!
//! Orchestrates the protocol engine over injected chain and storage
//! collaborators: builds and opens note bytes, discovers peer keys, tracks
//! per-peer PSK replay state, and folds inbound transactions into
//! conversations. It never signs or submits transactions itself.

use std::collections::HashMap;
use std::sync::Arc;

use ed25519_dalek::SigningKey;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::announce::{discover_encryption_key, discover_encryption_key_from_messages};
use crate::chain::{AlgorandConfig, AlgodClient, IndexerClient, NoteTransaction};
use crate::crypto::{decrypt_message, encrypt_message};
use crate::envelope::{is_chat_message, ChatEnvelope};
use crate::error::{AlgoChatError, Result};
use crate::keys::derive_keys_from_seed;
use crate::models::{Conversation, DiscoveredKey, Message, MessageDirection, ReplyContext};
use crate::payload::{build_payload, KEY_PUBLISH_PAYLOAD};
use crate::psk_crypto::{decrypt_psk_message, encrypt_psk_message};
use crate::psk_envelope::{decode_psk_envelope, encode_psk_envelope, is_psk_message};
use crate::psk_state::PSKState;
use crate::signature::sign_encryption_key;
use crate::storage::{EncryptionKeyStorage, MessageCache, PublicKeyCache};
use crate::types::DecryptedContent;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct AlgoChatConfig {
    /// Network endpoints.
    pub network: AlgorandConfig,
    /// Fall back to envelope-embedded keys when no announcement exists.
    pub discover_keys_from_messages: bool,
    /// Cache discovered public keys.
    pub cache_public_keys: bool,
    /// Cache decrypted messages.
    pub cache_messages: bool,
}

impl AlgoChatConfig {
    /// Configuration for the given network.
    pub fn new(network: AlgorandConfig) -> Self {
        Self {
            network,
            discover_keys_from_messages: true,
            cache_public_keys: true,
            cache_messages: true,
        }
    }

    /// LocalNet configuration.
    pub fn localnet() -> Self {
        Self::new(AlgorandConfig::localnet())
    }

    /// TestNet configuration.
    pub fn testnet() -> Self {
        Self::new(AlgorandConfig::testnet())
    }

    /// MainNet configuration.
    pub fn mainnet() -> Self {
        Self::new(AlgorandConfig::mainnet())
    }
}

/// The AlgoChat client, generic over its collaborators.
pub struct AlgoChat<A, I, S, M>
where
    A: AlgodClient,
    I: IndexerClient,
    S: EncryptionKeyStorage,
    M: MessageCache,
{
    address: String,
    signing_key: SigningKey,
    encryption_private_key: StaticSecret,
    encryption_public_key: PublicKey,
    config: AlgoChatConfig,
    #[allow(dead_code)]
    algod: A,
    indexer: I,
    key_storage: S,
    message_cache: M,
    public_key_cache: PublicKeyCache,
    psk_states: RwLock<HashMap<String, PSKState>>,
    conversations: Arc<RwLock<Vec<Conversation>>>,
}

impl<A, I, S, M> AlgoChat<A, I, S, M>
where
    A: AlgodClient,
    I: IndexerClient,
    S: EncryptionKeyStorage,
    M: MessageCache,
{
    /// Create a client from an Algorand account seed.
    ///
    /// Derives the X25519 identity from the seed, stores it in the key
    /// storage, and keeps the Ed25519 signing key for announcements.
    pub async fn from_seed(
        seed: &[u8; 32],
        address: &str,
        config: AlgoChatConfig,
        algod: A,
        indexer: I,
        key_storage: S,
        message_cache: M,
    ) -> Result<Self> {
        let (encryption_private_key, encryption_public_key) = derive_keys_from_seed(seed)?;

        key_storage
            .store(address, &encryption_private_key.to_bytes())
            .await?;

        let signing_key = SigningKey::from_bytes(seed);

        Ok(Self {
            address: address.to_string(),
            signing_key,
            encryption_private_key,
            encryption_public_key,
            config,
            algod,
            indexer,
            key_storage,
            message_cache,
            public_key_cache: PublicKeyCache::default(),
            psk_states: RwLock::new(HashMap::new()),
            conversations: Arc::new(RwLock::new(Vec::new())),
        })
    }

    /// The account address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The account's Ed25519 public key.
    pub fn ed25519_public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The encryption public key bytes.
    pub fn encryption_public_key(&self) -> [u8; 32] {
        *self.encryption_public_key.as_bytes()
    }

    // ------------------------------------------------------------------
    // Key publication
    // ------------------------------------------------------------------

    /// Note bytes for a signed key announcement (key ‖ Ed25519 signature).
    ///
    /// Carried in a zero-amount self-payment so peers can discover and
    /// verify the encryption key.
    pub fn key_announcement_note(&self) -> Result<Vec<u8>> {
        let public_key = self.encryption_public_key();
        let signature = sign_encryption_key(&public_key, &self.signing_key)?;

        let mut note = Vec::with_capacity(96);
        note.extend_from_slice(&public_key);
        note.extend_from_slice(&signature);
        Ok(note)
    }

    /// Note bytes for a self-encrypted key-publish marker.
    ///
    /// Decrypts to the no-message sentinel on every client.
    pub fn key_publish_note(&self) -> Result<Vec<u8>> {
        let envelope = encrypt_message(
            KEY_PUBLISH_PAYLOAD,
            &self.encryption_public_key,
            &self.encryption_public_key,
        )?;
        Ok(envelope.encode())
    }

    // ------------------------------------------------------------------
    // Standard protocol
    // ------------------------------------------------------------------

    /// Encrypt a message into standard note bytes.
    pub fn encrypt(
        &self,
        message: &str,
        recipient_public_key: &[u8; 32],
        reply_context: Option<&ReplyContext>,
    ) -> Result<Vec<u8>> {
        let payload = build_payload(
            message,
            reply_context.map(|ctx| (ctx.message_id.as_str(), ctx.preview.as_str())),
        );
        let recipient_key = PublicKey::from(*recipient_public_key);

        let envelope = encrypt_message(&payload, &self.encryption_public_key, &recipient_key)?;
        Ok(envelope.encode())
    }

    /// Decrypt standard note bytes.
    ///
    /// Works for messages we sent as well as messages we received; returns
    /// `None` for a key-publish marker.
    pub fn decrypt(&self, note: &[u8]) -> Result<Option<DecryptedContent>> {
        if !is_chat_message(note) {
            return Err(AlgoChatError::InvalidEnvelope(
                "not an AlgoChat message".to_string(),
            ));
        }

        let envelope = ChatEnvelope::decode(note)?;
        decrypt_message(
            &envelope,
            &self.encryption_private_key,
            &self.encryption_public_key,
        )
    }

    // ------------------------------------------------------------------
    // PSK protocol
    // ------------------------------------------------------------------

    /// Encrypt a message into PSK note bytes for a peer.
    ///
    /// Assigns the peer's next send counter; the assignment and the
    /// increment happen under the per-peer state lock.
    pub async fn encrypt_psk(
        &self,
        message: &str,
        peer: &str,
        recipient_public_key: &[u8; 32],
        initial_psk: &[u8],
        reply_context: Option<&ReplyContext>,
    ) -> Result<Vec<u8>> {
        let payload = build_payload(
            message,
            reply_context.map(|ctx| (ctx.message_id.as_str(), ctx.preview.as_str())),
        );
        let recipient_key = PublicKey::from(*recipient_public_key);

        let mut states = self.psk_states.write().await;
        let state = states.entry(peer.to_string()).or_default();
        let counter = state.advance_send_counter();
        drop(states);

        trace!(peer, counter, "sealing PSK message");
        let envelope = encrypt_psk_message(
            &payload,
            &self.encryption_public_key,
            &recipient_key,
            initial_psk,
            counter,
        )?;
        Ok(encode_psk_envelope(&envelope))
    }

    /// Decrypt PSK note bytes from a peer, enforcing the replay window.
    ///
    /// The counter is validated before decryption and recorded only after
    /// the envelope authenticates.
    pub async fn decrypt_psk(
        &self,
        note: &[u8],
        peer: &str,
        initial_psk: &[u8],
    ) -> Result<Option<DecryptedContent>> {
        if !is_psk_message(note) {
            return Err(AlgoChatError::InvalidEnvelope(
                "not an AlgoChat PSK message".to_string(),
            ));
        }

        let envelope = decode_psk_envelope(note)?;

        let mut states = self.psk_states.write().await;
        let state = states.entry(peer.to_string()).or_default();
        state.validate_counter(envelope.ratchet_counter)?;

        let content = decrypt_psk_message(
            &envelope,
            &self.encryption_private_key,
            &self.encryption_public_key,
            initial_psk,
        )?;

        state.record_receive(envelope.ratchet_counter);
        Ok(content)
    }

    /// Snapshot of the replay state for a peer.
    pub async fn psk_state(&self, peer: &str) -> Option<PSKState> {
        self.psk_states.read().await.get(peer).cloned()
    }

    // ------------------------------------------------------------------
    // Discovery and sync
    // ------------------------------------------------------------------

    /// Discover the encryption key for an address.
    ///
    /// Checks the TTL cache, then self-announcements, then (if configured)
    /// keys embedded in the target's sent envelopes.
    pub async fn discover_key(&self, address: &str) -> Result<DiscoveredKey> {
        if self.config.cache_public_keys {
            if let Some((key, verified)) = self.public_key_cache.retrieve(address).await {
                trace!(address, "public key cache hit");
                return Ok(DiscoveredKey::new(key, verified));
            }
        }

        let discovered = match discover_encryption_key(&self.indexer, address).await {
            Ok(key) => key,
            Err(AlgoChatError::PublicKeyNotFound { .. })
                if self.config.discover_keys_from_messages =>
            {
                debug!(address, "no announcement found, scanning sent envelopes");
                discover_encryption_key_from_messages(&self.indexer, address).await?
            }
            Err(e) => return Err(e),
        };

        if self.config.cache_public_keys {
            self.public_key_cache
                .store(address, discovered.public_key, discovered.is_verified)
                .await;
        }

        Ok(discovered)
    }

    /// Fold a chain transaction into the conversation state.
    ///
    /// Returns the decrypted message for standard chat notes addressed to or
    /// sent by this account. Key-publish markers, announcements, PSK notes
    /// (which need a caller-supplied PSK, see [`Self::decrypt_psk`]) and
    /// unrelated transactions yield `None`.
    pub async fn process_transaction(&self, tx: &NoteTransaction) -> Result<Option<Message>> {
        if !is_chat_message(&tx.note) {
            if is_psk_message(&tx.note) {
                trace!(txid = %tx.txid, "skipping PSK note in standard sync");
            }
            return Ok(None);
        }

        let direction = if tx.sender == self.address {
            MessageDirection::Sent
        } else if tx.receiver == self.address {
            MessageDirection::Received
        } else {
            return Ok(None);
        };

        let content = match self.decrypt(&tx.note) {
            Ok(Some(content)) => content,
            Ok(None) => {
                trace!(txid = %tx.txid, "key-publish marker, no message");
                return Ok(None);
            }
            Err(e) => {
                warn!(txid = %tx.txid, error = %e, "failed to decrypt chat note");
                return Err(e);
            }
        };

        let participant = match direction {
            MessageDirection::Sent => tx.receiver.clone(),
            MessageDirection::Received => tx.sender.clone(),
        };

        let reply_context = content
            .reply_to_id
            .map(|id| ReplyContext::new(id, content.reply_to_preview.unwrap_or_default()));

        let timestamp = std::time::UNIX_EPOCH + std::time::Duration::from_secs(tx.round_time);
        let message = Message::new(
            tx.txid.clone(),
            tx.sender.clone(),
            tx.receiver.clone(),
            content.text,
            timestamp,
            tx.confirmed_round,
            direction,
            reply_context,
        );

        let mut conversations = self.conversations.write().await;
        if let Some(conv) = conversations
            .iter_mut()
            .find(|c| c.participant == participant)
        {
            conv.append(message.clone());
        } else {
            let mut conv = Conversation::new(participant.clone());
            conv.append(message.clone());
            conversations.push(conv);
        }
        drop(conversations);

        if self.config.cache_messages {
            self.message_cache
                .insert(&participant, std::slice::from_ref(&message))
                .await?;
        }

        Ok(Some(message))
    }

    /// Fetch and process new transactions since the last sync.
    pub async fn sync(&self) -> Result<Vec<Message>> {
        let after_round = self.message_cache.last_sync_round(&self.address).await?;

        let transactions = self
            .indexer
            .search_transactions(&self.address, after_round, None)
            .await?;
        debug!(
            count = transactions.len(),
            after_round, "processing transactions from indexer"
        );

        let mut messages = Vec::new();
        let mut highest_round = after_round.unwrap_or(0);

        for tx in &transactions {
            highest_round = highest_round.max(tx.confirmed_round);
            match self.process_transaction(tx).await {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => {}
                // A single undecryptable note must not wedge the sync.
                Err(AlgoChatError::DecryptionFailed | AlgoChatError::InvalidEnvelope(_)) => {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        if highest_round > after_round.unwrap_or(0) {
            self.message_cache
                .set_last_sync_round(&self.address, highest_round)
                .await?;
        }

        Ok(messages)
    }

    /// Get or create the conversation with a participant.
    pub async fn conversation(&self, participant: &str) -> Conversation {
        let mut conversations = self.conversations.write().await;

        if let Some(conv) = conversations.iter().find(|c| c.participant == participant) {
            return conv.clone();
        }

        let conv = Conversation::new(participant.to_string());
        conversations.push(conv.clone());
        conv
    }

    /// All known conversations.
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.conversations.read().await.clone()
    }

    /// The key storage collaborator.
    pub fn key_storage(&self) -> &S {
        &self.key_storage
    }

    /// The message cache collaborator.
    pub fn message_cache(&self) -> &M {
        &self.message_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{
        encode_algorand_address, AccountInfo, SuggestedParams, TransactionInfo,
    };
    use crate::storage::{InMemoryKeyStorage, InMemoryMessageCache};

    struct StubAlgod;

    #[async_trait::async_trait]
    impl AlgodClient for StubAlgod {
        async fn suggested_params(&self) -> Result<SuggestedParams> {
            Ok(SuggestedParams {
                fee: 0,
                min_fee: 1000,
                first_valid: 1,
                last_valid: 1000,
                genesis_id: "stubnet-v1".to_string(),
                genesis_hash: [0u8; 32],
            })
        }

        async fn account_info(&self, address: &str) -> Result<AccountInfo> {
            Ok(AccountInfo {
                address: address.to_string(),
                amount: 10_000_000,
                min_balance: 100_000,
            })
        }

        async fn submit_transaction(&self, _signed_txn: &[u8]) -> Result<String> {
            Ok("STUBTX".to_string())
        }

        async fn wait_for_confirmation(&self, txid: &str, _rounds: u64) -> Result<TransactionInfo> {
            Ok(TransactionInfo {
                txid: txid.to_string(),
                confirmed_round: Some(1),
            })
        }

        async fn current_round(&self) -> Result<u64> {
            Ok(1)
        }
    }

    #[derive(Default)]
    struct StubIndexer {
        transactions: Vec<NoteTransaction>,
    }

    #[async_trait::async_trait]
    impl IndexerClient for StubIndexer {
        async fn search_transactions(
            &self,
            address: &str,
            after_round: Option<u64>,
            _limit: Option<u32>,
        ) -> Result<Vec<NoteTransaction>> {
            Ok(self
                .transactions
                .iter()
                .filter(|tx| tx.sender == address || tx.receiver == address)
                .filter(|tx| after_round.map_or(true, |r| tx.confirmed_round > r))
                .cloned()
                .collect())
        }

        async fn search_transactions_between(
            &self,
            address_a: &str,
            address_b: &str,
            _after_round: Option<u64>,
            _limit: Option<u32>,
        ) -> Result<Vec<NoteTransaction>> {
            Ok(self
                .transactions
                .iter()
                .filter(|tx| {
                    (tx.sender == address_a && tx.receiver == address_b)
                        || (tx.sender == address_b && tx.receiver == address_a)
                })
                .cloned()
                .collect())
        }

        async fn lookup_transaction(&self, txid: &str) -> Result<NoteTransaction> {
            self.transactions
                .iter()
                .find(|tx| tx.txid == txid)
                .cloned()
                .ok_or_else(|| AlgoChatError::Indexer(format!("unknown txid {txid}")))
        }

        async fn wait_for_indexer(&self, txid: &str, _timeout_secs: u32) -> Result<NoteTransaction> {
            self.lookup_transaction(txid).await
        }
    }

    async fn test_client(
        seed: &[u8; 32],
        indexer: StubIndexer,
    ) -> (AlgoChat<StubAlgod, StubIndexer, InMemoryKeyStorage, InMemoryMessageCache>, String) {
        let signing_key = SigningKey::from_bytes(seed);
        let address = encode_algorand_address(&signing_key.verifying_key().to_bytes());

        let client = AlgoChat::from_seed(
            seed,
            &address,
            AlgoChatConfig::localnet(),
            StubAlgod,
            indexer,
            InMemoryKeyStorage::new(),
            InMemoryMessageCache::new(),
        )
        .await
        .unwrap();

        (client, address)
    }

    #[tokio::test]
    async fn test_from_seed_stores_private_key() {
        let (client, address) = test_client(&[1u8; 32], StubIndexer::default()).await;
        assert!(client.key_storage().has_key(&address).await);
    }

    #[tokio::test]
    async fn test_encrypt_decrypt_between_clients() {
        let (alice, _) = test_client(&[1u8; 32], StubIndexer::default()).await;
        let (bob, _) = test_client(&[2u8; 32], StubIndexer::default()).await;

        let note = alice
            .encrypt("hello bob", &bob.encryption_public_key(), None)
            .unwrap();

        let received = bob.decrypt(&note).unwrap().unwrap();
        assert_eq!(received.text, "hello bob");

        // Sender-side decryption of the same note.
        let own = alice.decrypt(&note).unwrap().unwrap();
        assert_eq!(own.text, "hello bob");
    }

    #[tokio::test]
    async fn test_reply_context_travels() {
        let (alice, _) = test_client(&[1u8; 32], StubIndexer::default()).await;
        let (bob, _) = test_client(&[2u8; 32], StubIndexer::default()).await;

        let ctx = ReplyContext::new("TXORIG", "the original");
        let note = alice
            .encrypt("replying", &bob.encryption_public_key(), Some(&ctx))
            .unwrap();

        let received = bob.decrypt(&note).unwrap().unwrap();
        assert_eq!(received.text, "replying");
        assert_eq!(received.reply_to_id.as_deref(), Some("TXORIG"));
        assert_eq!(received.reply_to_preview.as_deref(), Some("the original"));
    }

    #[tokio::test]
    async fn test_psk_roundtrip_with_replay_protection() {
        let (alice, alice_addr) = test_client(&[1u8; 32], StubIndexer::default()).await;
        let (bob, bob_addr) = test_client(&[2u8; 32], StubIndexer::default()).await;
        let psk = [0xAA; 32];

        let note = alice
            .encrypt_psk("psk hello", &bob_addr, &bob.encryption_public_key(), &psk, None)
            .await
            .unwrap();

        let received = bob.decrypt_psk(&note, &alice_addr, &psk).await.unwrap().unwrap();
        assert_eq!(received.text, "psk hello");

        // Replay of the same counter is rejected.
        let replay = bob.decrypt_psk(&note, &alice_addr, &psk).await;
        assert!(matches!(
            replay,
            Err(AlgoChatError::PskInvalidCounter { counter: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_psk_send_counters_advance_per_peer() {
        let (alice, _) = test_client(&[1u8; 32], StubIndexer::default()).await;
        let (bob, bob_addr) = test_client(&[2u8; 32], StubIndexer::default()).await;
        let psk = [0xAA; 32];

        for _ in 0..3 {
            alice
                .encrypt_psk("m", &bob_addr, &bob.encryption_public_key(), &psk, None)
                .await
                .unwrap();
        }

        let state = alice.psk_state(&bob_addr).await.unwrap();
        assert_eq!(state.send_counter, 3);
    }

    #[tokio::test]
    async fn test_key_announcement_note_verifies() {
        let (alice, addr) = test_client(&[1u8; 32], StubIndexer::default()).await;

        let note = alice.key_announcement_note().unwrap();
        assert_eq!(note.len(), 96);

        let key = crate::announce::parse_key_announcement(
            &note,
            Some(&crate::chain::decode_algorand_address(&addr).unwrap()),
        )
        .unwrap();
        assert_eq!(key.public_key, alice.encryption_public_key());
        assert!(key.is_verified);
    }

    #[tokio::test]
    async fn test_key_publish_note_is_no_message() {
        let (alice, _) = test_client(&[1u8; 32], StubIndexer::default()).await;

        let note = alice.key_publish_note().unwrap();
        let result = alice.decrypt(&note).unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_discover_key_via_announcement() {
        let (alice, alice_addr) = test_client(&[1u8; 32], StubIndexer::default()).await;
        let announcement = alice.key_announcement_note().unwrap();

        let indexer = StubIndexer {
            transactions: vec![NoteTransaction {
                txid: "ANNOUNCE".to_string(),
                sender: alice_addr.clone(),
                receiver: alice_addr.clone(),
                note: announcement,
                confirmed_round: 10,
                round_time: 1_700_000_000,
            }],
        };
        let (bob, _) = test_client(&[2u8; 32], indexer).await;

        let discovered = bob.discover_key(&alice_addr).await.unwrap();
        assert_eq!(discovered.public_key, alice.encryption_public_key());
        assert!(discovered.is_verified);

        // Second lookup hits the cache.
        let cached = bob.discover_key(&alice_addr).await.unwrap();
        assert_eq!(cached.public_key, discovered.public_key);
    }

    #[tokio::test]
    async fn test_discover_key_falls_back_to_messages() {
        let (alice, alice_addr) = test_client(&[1u8; 32], StubIndexer::default()).await;
        let (bob, _) = test_client(&[2u8; 32], StubIndexer::default()).await;

        let chat_note = alice
            .encrypt("hi", &bob.encryption_public_key(), None)
            .unwrap();
        let indexer = StubIndexer {
            transactions: vec![NoteTransaction {
                txid: "CHAT".to_string(),
                sender: alice_addr.clone(),
                receiver: "BOB".to_string(),
                note: chat_note,
                confirmed_round: 10,
                round_time: 1_700_000_000,
            }],
        };
        let (carol, _) = test_client(&[3u8; 32], indexer).await;

        let discovered = carol.discover_key(&alice_addr).await.unwrap();
        assert_eq!(discovered.public_key, alice.encryption_public_key());
        assert!(!discovered.is_verified);
    }

    #[tokio::test]
    async fn test_discover_key_not_found() {
        let (bob, _) = test_client(&[2u8; 32], StubIndexer::default()).await;

        let result = bob.discover_key("MISSING").await;
        assert!(matches!(
            result,
            Err(AlgoChatError::PublicKeyNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_sync_builds_conversations() {
        let alice_seed = [1u8; 32];
        let bob_seed = [2u8; 32];

        let (alice, alice_addr) = test_client(&alice_seed, StubIndexer::default()).await;
        let (bob_probe, bob_addr) = test_client(&bob_seed, StubIndexer::default()).await;

        let note = alice
            .encrypt("hello bob", &bob_probe.encryption_public_key(), None)
            .unwrap();

        let indexer = StubIndexer {
            transactions: vec![
                NoteTransaction {
                    txid: "TX1".to_string(),
                    sender: alice_addr.clone(),
                    receiver: bob_addr.clone(),
                    note,
                    confirmed_round: 42,
                    round_time: 1_700_000_000,
                },
                // A note that is no chat message at all.
                NoteTransaction {
                    txid: "TX2".to_string(),
                    sender: bob_addr.clone(),
                    receiver: bob_addr.clone(),
                    note: b"just bytes".to_vec(),
                    confirmed_round: 43,
                    round_time: 1_700_000_100,
                },
            ],
        };
        let (bob, _) = test_client(&bob_seed, indexer).await;

        let messages = bob.sync().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello bob");
        assert_eq!(messages[0].direction, MessageDirection::Received);

        let conv = bob.conversation(&alice_addr).await;
        assert_eq!(conv.message_count(), 1);

        // Sync position advanced past the processed rounds.
        assert_eq!(
            bob.message_cache().last_sync_round(&bob_addr).await.unwrap(),
            Some(43)
        );
    }
}

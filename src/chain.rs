//! Chain collaborator interfaces.
//!
//! The engine never talks to Algorand itself: it produces and consumes note
//! bytes and receives already-decoded transaction records. These traits are
//! the seam an application fills with its SDK of choice.

use sha2::{Digest, Sha512_256};

use crate::error::{AlgoChatError, Result};

/// Minimum payment carried by a chat message, in microAlgos.
///
/// A zero-amount self-payment is reserved for key publication.
pub const MIN_PAYMENT_MICROALGOS: u64 = 1000;

/// Network endpoints for algod and the indexer.
#[derive(Debug, Clone)]
pub struct AlgorandConfig {
    /// Algod node URL.
    pub algod_url: String,
    /// Algod API token.
    pub algod_token: String,
    /// Indexer URL (optional).
    pub indexer_url: Option<String>,
    /// Indexer API token (optional).
    pub indexer_token: Option<String>,
}

impl AlgorandConfig {
    /// Connection to an algod node, without an indexer.
    pub fn new(algod_url: &str, algod_token: &str) -> Self {
        Self {
            algod_url: algod_url.to_string(),
            algod_token: algod_token.to_string(),
            indexer_url: None,
            indexer_token: None,
        }
    }

    /// Add an indexer endpoint.
    pub fn with_indexer(mut self, url: &str, token: &str) -> Self {
        self.indexer_url = Some(url.to_string());
        self.indexer_token = Some(token.to_string());
        self
    }

    /// LocalNet (Algokit sandbox) defaults.
    pub fn localnet() -> Self {
        Self {
            algod_url: "http://localhost:4001".to_string(),
            algod_token: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
                .to_string(),
            indexer_url: Some("http://localhost:8980".to_string()),
            indexer_token: Some(
                "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            ),
        }
    }

    /// TestNet via Nodely.
    pub fn testnet() -> Self {
        Self {
            algod_url: "https://testnet-api.4160.nodely.dev".to_string(),
            algod_token: String::new(),
            indexer_url: Some("https://testnet-idx.4160.nodely.dev".to_string()),
            indexer_token: Some(String::new()),
        }
    }

    /// MainNet via Nodely.
    pub fn mainnet() -> Self {
        Self {
            algod_url: "https://mainnet-api.4160.nodely.dev".to_string(),
            algod_token: String::new(),
            indexer_url: Some("https://mainnet-idx.4160.nodely.dev".to_string()),
            indexer_token: Some(String::new()),
        }
    }
}

/// A note-carrying payment transaction, already decoded by the indexer side.
#[derive(Debug, Clone)]
pub struct NoteTransaction {
    /// Transaction ID.
    pub txid: String,
    /// Sender address.
    pub sender: String,
    /// Receiver address.
    pub receiver: String,
    /// Raw note field contents.
    pub note: Vec<u8>,
    /// Round in which the transaction was confirmed.
    pub confirmed_round: u64,
    /// Block timestamp (Unix seconds).
    pub round_time: u64,
}

/// Submission status for a transaction.
#[derive(Debug, Clone)]
pub struct TransactionInfo {
    /// Transaction ID.
    pub txid: String,
    /// Confirmation round, once confirmed.
    pub confirmed_round: Option<u64>,
}

/// Suggested transaction parameters from algod.
#[derive(Debug, Clone)]
pub struct SuggestedParams {
    /// Fee per byte in microAlgos.
    pub fee: u64,
    /// Minimum flat fee in microAlgos.
    pub min_fee: u64,
    /// First valid round.
    pub first_valid: u64,
    /// Last valid round.
    pub last_valid: u64,
    /// Genesis ID.
    pub genesis_id: String,
    /// Genesis hash.
    pub genesis_hash: [u8; 32],
}

/// Account balance information.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    /// Account address.
    pub address: String,
    /// Balance in microAlgos.
    pub amount: u64,
    /// Minimum balance requirement.
    pub min_balance: u64,
}

/// Access to an Algorand node (algod).
#[async_trait::async_trait]
pub trait AlgodClient: Send + Sync {
    /// Current network parameters for building a transaction.
    async fn suggested_params(&self) -> Result<SuggestedParams>;

    /// Account balance lookup.
    async fn account_info(&self, address: &str) -> Result<AccountInfo>;

    /// Submit a signed transaction, returning its ID.
    async fn submit_transaction(&self, signed_txn: &[u8]) -> Result<String>;

    /// Block until a transaction confirms or `rounds` elapse.
    async fn wait_for_confirmation(&self, txid: &str, rounds: u64) -> Result<TransactionInfo>;

    /// The current round.
    async fn current_round(&self) -> Result<u64>;
}

/// Access to an Algorand indexer.
#[async_trait::async_trait]
pub trait IndexerClient: Send + Sync {
    /// Note-carrying transactions touching an address.
    async fn search_transactions(
        &self,
        address: &str,
        after_round: Option<u64>,
        limit: Option<u32>,
    ) -> Result<Vec<NoteTransaction>>;

    /// Note-carrying transactions between two addresses.
    async fn search_transactions_between(
        &self,
        address_a: &str,
        address_b: &str,
        after_round: Option<u64>,
        limit: Option<u32>,
    ) -> Result<Vec<NoteTransaction>>;

    /// Look up a single transaction by ID.
    async fn lookup_transaction(&self, txid: &str) -> Result<NoteTransaction>;

    /// Block until the indexer has the transaction or the timeout elapses.
    async fn wait_for_indexer(&self, txid: &str, timeout_secs: u32) -> Result<NoteTransaction>;
}

/// Decode an Algorand address to its underlying Ed25519 public key.
///
/// Addresses are 58-character base32 (no padding) over 36 bytes: the 32-byte
/// public key followed by a 4-byte checksum, the trailing bytes of
/// SHA-512/256 over the key.
pub fn decode_algorand_address(address: &str) -> Result<[u8; 32]> {
    let decoded = data_encoding::BASE32_NOPAD
        .decode(address.as_bytes())
        .map_err(|_| AlgoChatError::InvalidAddress(address.to_string()))?;

    if decoded.len() != 36 {
        return Err(AlgoChatError::InvalidAddress(address.to_string()));
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&decoded[..32]);

    let digest = Sha512_256::digest(public_key);
    if digest[28..32] != decoded[32..36] {
        return Err(AlgoChatError::InvalidAddress(address.to_string()));
    }

    Ok(public_key)
}

/// Encode an Ed25519 public key as an Algorand address.
pub fn encode_algorand_address(public_key: &[u8; 32]) -> String {
    let digest = Sha512_256::digest(public_key);
    let mut bytes = [0u8; 36];
    bytes[..32].copy_from_slice(public_key);
    bytes[32..].copy_from_slice(&digest[28..32]);
    data_encoding::BASE32_NOPAD.encode(&bytes)
}

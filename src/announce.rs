//! Key announcement parsing and encryption-key discovery.
//!
//! An account publishes its encryption key in the note of a self-addressed
//! payment: either the bare 32-byte X25519 key, or the key followed by a
//! 64-byte Ed25519 signature over it. Discovery scans transaction history
//! for such announcements, or falls back to the sender key embedded in any
//! chat envelope the account has sent. An embedded key is asserted rather
//! than signed, so it can never be verified.

use tracing::{debug, trace};

use crate::chain::{decode_algorand_address, IndexerClient, NoteTransaction};
use crate::envelope::{is_chat_message, ChatEnvelope};
use crate::error::{AlgoChatError, Result};
use crate::models::DiscoveredKey;
use crate::signature::verify_encryption_key_bytes;
use crate::types::{PUBLIC_KEY_SIZE, SIGNATURE_SIZE};

/// How many transactions the self-announcement scan fetches by default.
pub const DEFAULT_ANNOUNCEMENT_SEARCH_DEPTH: u32 = 100;

/// How many transactions the envelope-embedded scan fetches by default.
///
/// Deeper than the announcement scan: a chat envelope from the target can be
/// much older than its latest announcement.
pub const DEFAULT_ENVELOPE_SEARCH_DEPTH: u32 = 200;

/// Parse a note as a key announcement.
///
/// - shorter than 32 bytes: not an announcement;
/// - at least 96 bytes with an Ed25519 key supplied: the first 32 bytes are
///   the X25519 key and the next 64 a signature over it; any verification
///   failure collapses to `is_verified = false`;
/// - otherwise: the first 32 bytes, unverified.
pub fn parse_key_announcement(
    note: &[u8],
    ed25519_public_key: Option<&[u8; 32]>,
) -> Option<DiscoveredKey> {
    if note.len() < PUBLIC_KEY_SIZE {
        return None;
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&note[..PUBLIC_KEY_SIZE]);

    let is_verified = match (note.len() >= PUBLIC_KEY_SIZE + SIGNATURE_SIZE, ed25519_public_key) {
        (true, Some(ed25519_key)) => {
            let signature = &note[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + SIGNATURE_SIZE];
            verify_encryption_key_bytes(&public_key, ed25519_key, signature).unwrap_or(false)
        }
        _ => false,
    };

    Some(DiscoveredKey::new(public_key, is_verified))
}

/// Find a key in self-announcement transactions.
///
/// Considers only payments the target sent to itself; the first note that
/// parses as an announcement wins. Transactions that fail to parse are
/// skipped.
pub fn discover_key_in_announcements(
    transactions: &[NoteTransaction],
    address: &str,
) -> Option<DiscoveredKey> {
    let ed25519_key = decode_algorand_address(address).ok();

    for tx in transactions {
        if tx.sender != address || tx.receiver != address {
            continue;
        }

        trace!(txid = %tx.txid, "checking self-payment for key announcement");
        if let Some(key) = parse_key_announcement(&tx.note, ed25519_key.as_ref()) {
            debug!(
                txid = %tx.txid,
                verified = key.is_verified,
                "found announced encryption key"
            );
            return Some(key.with_provenance(&tx.txid, tx.confirmed_round));
        }
    }

    None
}

/// Find a key embedded in chat envelopes the target has sent.
///
/// The envelope's sender key is asserted by the sender, not signed by the
/// account, so the result is always unverified.
pub fn discover_key_in_messages(
    transactions: &[NoteTransaction],
    address: &str,
) -> Option<DiscoveredKey> {
    for tx in transactions {
        if tx.sender != address || !is_chat_message(&tx.note) {
            continue;
        }

        let Ok(envelope) = ChatEnvelope::decode(&tx.note) else {
            continue;
        };

        debug!(txid = %tx.txid, "using sender key embedded in chat envelope");
        return Some(
            DiscoveredKey::new(envelope.sender_public_key, false)
                .with_provenance(&tx.txid, tx.confirmed_round),
        );
    }

    None
}

/// Scan the indexer for a self-announced encryption key.
pub async fn discover_encryption_key(
    indexer: &dyn IndexerClient,
    address: &str,
) -> Result<DiscoveredKey> {
    let transactions = indexer
        .search_transactions(address, None, Some(DEFAULT_ANNOUNCEMENT_SEARCH_DEPTH))
        .await?;

    discover_key_in_announcements(&transactions, address).ok_or_else(|| {
        AlgoChatError::PublicKeyNotFound {
            address: address.to_string(),
            search_depth: DEFAULT_ANNOUNCEMENT_SEARCH_DEPTH,
        }
    })
}

/// Scan the indexer for a key embedded in the target's sent messages.
pub async fn discover_encryption_key_from_messages(
    indexer: &dyn IndexerClient,
    address: &str,
) -> Result<DiscoveredKey> {
    let transactions = indexer
        .search_transactions(address, None, Some(DEFAULT_ENVELOPE_SEARCH_DEPTH))
        .await?;

    discover_key_in_messages(&transactions, address).ok_or_else(|| {
        AlgoChatError::PublicKeyNotFound {
            address: address.to_string(),
            search_depth: DEFAULT_ENVELOPE_SEARCH_DEPTH,
        }
    })
}

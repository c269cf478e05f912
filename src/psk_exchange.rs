//! PSK exchange URI codec.
//!
//! Wire form: `algochat-psk://v1?addr=<address>&psk=<base64url>&label=<label>`.
//! The URI is the out-of-band carrier for a conversation's initial PSK,
//! small enough to live in a QR code. `addr` and `label` are
//! percent-encoded, `psk` is unpadded base64url and must decode to exactly
//! 32 bytes. Unknown query parameters are ignored.

use std::collections::HashMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::{AlgoChatError, Result};
use crate::psk_types::PSK_SIZE;

const URI_PREFIX: &str = "algochat-psk://v1?";

/// A parsed PSK exchange URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PSKExchangeURI {
    /// Algorand address of the peer.
    pub address: String,
    /// The 32-byte pre-shared key.
    pub psk: [u8; 32],
    /// Optional human-readable conversation label.
    pub label: Option<String>,
}

impl PSKExchangeURI {
    /// Create a URI value.
    pub fn new(address: impl Into<String>, psk: [u8; 32], label: Option<String>) -> Self {
        Self {
            address: address.into(),
            psk,
            label,
        }
    }

    /// Encode to the textual wire form.
    pub fn encode(&self) -> String {
        let mut uri = format!(
            "{URI_PREFIX}addr={}&psk={}",
            percent_encode(&self.address),
            URL_SAFE_NO_PAD.encode(self.psk),
        );
        if let Some(ref label) = self.label {
            uri.push_str("&label=");
            uri.push_str(&percent_encode(label));
        }
        uri
    }

    /// Parse the textual wire form.
    pub fn parse(uri: &str) -> Result<Self> {
        let Some(query) = uri.strip_prefix(URI_PREFIX) else {
            return Err(AlgoChatError::PskExchangeUriInvalid(
                "missing algochat-psk://v1 scheme".to_string(),
            ));
        };

        let params: HashMap<&str, &str> = query
            .split('&')
            .filter_map(|pair| {
                let mut parts = pair.splitn(2, '=');
                Some((parts.next()?, parts.next()?))
            })
            .collect();

        let address = percent_decode(params.get("addr").ok_or_else(|| {
            AlgoChatError::PskExchangeUriInvalid("missing 'addr' parameter".to_string())
        })?)?;

        let psk_encoded = params.get("psk").ok_or_else(|| {
            AlgoChatError::PskExchangeUriInvalid("missing 'psk' parameter".to_string())
        })?;

        let psk_bytes = URL_SAFE_NO_PAD.decode(psk_encoded).map_err(|e| {
            AlgoChatError::PskExchangeUriInvalid(format!("psk is not base64url: {e}"))
        })?;

        if psk_bytes.len() != PSK_SIZE {
            return Err(AlgoChatError::PskInvalidLength(psk_bytes.len()));
        }
        let mut psk = [0u8; 32];
        psk.copy_from_slice(&psk_bytes);

        let label = params.get("label").map(|l| percent_decode(l)).transpose()?;

        Ok(Self {
            address,
            psk,
            label,
        })
    }
}

/// Percent-encode everything outside the URI unreserved set.
fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.as_bytes() {
        match *byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(*byte as char);
            }
            _ => result.push_str(&format!("%{byte:02X}")),
        }
    }
    result
}

/// Decode percent-encoding, tolerating `+` as a space.
fn percent_decode(s: &str) -> Result<String> {
    let mut bytes = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => {
                let hex: String = chars.by_ref().take(2).collect();
                let byte = u8::from_str_radix(&hex, 16).map_err(|_| {
                    AlgoChatError::PskExchangeUriInvalid(format!(
                        "bad percent-encoding '%{hex}'"
                    ))
                })?;
                bytes.push(byte);
            }
            '+' => bytes.push(b' '),
            _ => bytes.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes()),
        }
    }
    String::from_utf8(bytes).map_err(|_| {
        AlgoChatError::PskExchangeUriInvalid("percent-decoded value is not UTF-8".to_string())
    })
}

//! Export hex envelope fixtures for cross-implementation checks.
//!
//! Seals every fixture message from Alice (seed ending 0x01) to Bob (seed
//! ending 0x02) and writes the encoded envelope as one `.hex` file per
//! message, for each wire protocol:
//!
//! - `standard/<name>.hex`: v1 envelopes
//! - `psk/<name>_c<counter>.hex`: v1.1 envelopes under the `0xAA` test
//!   PSK, with counters spaced to cross a ratchet session boundary
//!
//! A decoder in another language should recover every plaintext with Bob's
//! identity (and the test PSK for the v1.1 set).

use algochat_core::{
    derive_keys_from_seed, encode_psk_envelope, encrypt_message, encrypt_psk_message,
    MAX_PAYLOAD_SIZE, PSK_MAX_PAYLOAD_SIZE,
};
use std::fs;
use std::path::Path;

const TEST_PSK: [u8; 32] = [0xAA; 32];

/// Counter step between PSK fixtures; large enough that the set walks
/// through more than one 100-position session.
const PSK_COUNTER_STEP: u32 = 60;

fn seed(last_byte: u8) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[31] = last_byte;
    seed
}

fn fixtures() -> Vec<(&'static str, String)> {
    vec![
        ("empty", String::new()),
        ("ascii", "fixture: plain ascii text".to_string()),
        ("multiline", "first line\nsecond line\n\tindented".to_string()),
        ("unicode", "héllo wörld こんにちは 🔑".to_string()),
        (
            "reply_json",
            r#"{"text":"on my way","replyTo":{"txid":"TXFIXTURE","preview":"see you at noon?"}}"#
                .to_string(),
        ),
        ("key_publish", r#"{"type":"key-publish"}"#.to_string()),
        ("max_standard", "A".repeat(MAX_PAYLOAD_SIZE)),
        ("max_psk", "B".repeat(PSK_MAX_PAYLOAD_SIZE)),
    ]
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let output_root = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("fixture-envelopes");

    let (_, alice_public) = derive_keys_from_seed(&seed(0x01)).unwrap();
    let (_, bob_public) = derive_keys_from_seed(&seed(0x02)).unwrap();

    let standard_dir = Path::new(output_root).join("standard");
    let psk_dir = Path::new(output_root).join("psk");
    fs::create_dir_all(&standard_dir).unwrap();
    fs::create_dir_all(&psk_dir).unwrap();

    let mut written = 0;

    for (name, message) in fixtures() {
        // The max-size fixtures each probe one protocol's payload limit.
        if name != "max_psk" {
            let envelope = encrypt_message(&message, &alice_public, &bob_public).unwrap();
            let path = standard_dir.join(format!("{name}.hex"));
            fs::write(&path, hex::encode(envelope.encode())).unwrap();
            written += 1;
        }

        if name != "max_standard" {
            let counter = written * PSK_COUNTER_STEP;
            let envelope =
                encrypt_psk_message(&message, &alice_public, &bob_public, &TEST_PSK, counter)
                    .unwrap();
            let path = psk_dir.join(format!("{name}_c{counter}.hex"));
            fs::write(&path, hex::encode(encode_psk_envelope(&envelope))).unwrap();
            written += 1;
        }
    }

    println!("exported {written} fixture envelopes to {output_root}/");
}

//! Protocol conformance tests.
//!
//! Exercises the documented protocol scenarios end to end: identity
//! derivation, envelope round-trips through encoded bytes in both
//! directions, the key-publish sentinel, ratchet vectors, replay windows,
//! and the exchange URI.

use algochat_core::{
    decode_psk_envelope, decrypt_message, decrypt_psk_message, derive_keys_from_seed,
    derive_position_psk, derive_psk_at_counter, derive_session_psk, encode_psk_envelope,
    encrypt_message, encrypt_psk_message, is_chat_message, is_psk_message, AlgoChatError,
    ChatEnvelope, PSKExchangeURI, PSKState, KEY_PUBLISH_PAYLOAD, PSK_COUNTER_WINDOW,
};

const INITIAL_PSK: [u8; 32] = [0xAA; 32];

fn alice() -> (x25519_dalek::StaticSecret, x25519_dalek::PublicKey) {
    derive_keys_from_seed(&[0x01; 32]).unwrap()
}

fn bob() -> (x25519_dalek::StaticSecret, x25519_dalek::PublicKey) {
    derive_keys_from_seed(&[0x02; 32]).unwrap()
}

#[test]
fn end_to_end_standard_roundtrip() {
    let (alice_private, alice_public) = alice();
    let (bob_private, bob_public) = bob();

    let plaintext = "Hello, AlgoChat!";

    let envelope = encrypt_message(plaintext, &alice_public, &bob_public).unwrap();
    let wire = envelope.encode();

    assert!(is_chat_message(&wire));
    assert!(!is_psk_message(&wire));

    let decoded = ChatEnvelope::decode(&wire).unwrap();
    assert_eq!(decoded, envelope);

    // Recipient opens it.
    let for_bob = decrypt_message(&decoded, &bob_private, &bob_public)
        .unwrap()
        .unwrap();
    assert_eq!(for_bob.text, plaintext);

    // Sender opens the very same envelope.
    let for_alice = decrypt_message(&decoded, &alice_private, &alice_public)
        .unwrap()
        .unwrap();
    assert_eq!(for_alice.text, plaintext);
}

#[test]
fn end_to_end_psk_roundtrip() {
    let (alice_private, alice_public) = alice();
    let (bob_private, bob_public) = bob();

    let plaintext = "Hello, AlgoChat!";

    let envelope =
        encrypt_psk_message(plaintext, &alice_public, &bob_public, &INITIAL_PSK, 17).unwrap();
    let wire = encode_psk_envelope(&envelope);

    assert!(is_psk_message(&wire));
    assert!(!is_chat_message(&wire));

    let decoded = decode_psk_envelope(&wire).unwrap();
    assert_eq!(decoded.ratchet_counter, 17);

    let for_bob = decrypt_psk_message(&decoded, &bob_private, &bob_public, &INITIAL_PSK)
        .unwrap()
        .unwrap();
    assert_eq!(for_bob.text, plaintext);

    let for_alice = decrypt_psk_message(&decoded, &alice_private, &alice_public, &INITIAL_PSK)
        .unwrap()
        .unwrap();
    assert_eq!(for_alice.text, plaintext);
}

#[test]
fn key_publish_self_seal_yields_no_message() {
    let (alice_private, alice_public) = alice();

    let envelope =
        encrypt_message(KEY_PUBLISH_PAYLOAD, &alice_public, &alice_public).unwrap();
    let decoded = ChatEnvelope::decode(&envelope.encode()).unwrap();

    let result = decrypt_message(&decoded, &alice_private, &alice_public).unwrap();
    assert!(result.is_none());
}

#[test]
fn cross_key_rejection() {
    let (_, alice_public) = alice();
    let (_, bob_public) = bob();
    let (eve_private, eve_public) = derive_keys_from_seed(&[0x03; 32]).unwrap();

    let envelope = encrypt_message("for bob only", &alice_public, &bob_public).unwrap();

    let result = decrypt_message(&envelope, &eve_private, &eve_public);
    assert!(matches!(result, Err(AlgoChatError::DecryptionFailed)));
}

#[test]
fn session_psk_reference_vectors() {
    assert_eq!(
        hex::encode(derive_session_psk(&INITIAL_PSK, 0).unwrap().as_ref()),
        "a031707ea9e9e50bd8ea4eb9a2bd368465ea1aff14caab293d38954b4717e888"
    );
    assert_eq!(
        hex::encode(derive_session_psk(&INITIAL_PSK, 1).unwrap().as_ref()),
        "994cffbb4f84fa5410d44574bb9fa7408a8c2f1ed2b3a00f5168fc74c71f7cea"
    );
}

#[test]
fn counter_psk_reference_vectors() {
    let expectations = [
        (0u32, "2918fd486b9bd024d712f6234b813c0f4167237d60c2c1fca37326b20497c165"),
        (99, "5b48a50a25261f6b63fe9c867b46be46de4d747c3477db6290045ba519a4d38b"),
        (100, "7a15d3add6a28858e6a1f1ea0d22bdb29b7e129a1330c4908d9b46a460992694"),
    ];

    for (counter, expected) in expectations {
        assert_eq!(
            hex::encode(derive_psk_at_counter(&INITIAL_PSK, counter).unwrap().as_ref()),
            expected,
            "counter {counter}"
        );
    }
}

#[test]
fn counter_100_is_position_0_of_session_1() {
    let session1 = derive_session_psk(&INITIAL_PSK, 1).unwrap();
    let direct = derive_position_psk(session1.as_ref(), 0).unwrap();
    let via_counter = derive_psk_at_counter(&INITIAL_PSK, 100).unwrap();
    assert_eq!(direct.as_ref(), via_counter.as_ref());
}

#[test]
fn replay_window_full_lifecycle() {
    let mut state = PSKState::new();

    // Fresh state accepts the first counters in any order within the window.
    state.validate_counter(2).unwrap();
    state.record_receive(2);
    state.validate_counter(0).unwrap();
    state.record_receive(0);

    // Replays are rejected.
    assert!(state.validate_counter(2).is_err());

    // A forward jump inside the window moves the floor.
    let jump = 2 + PSK_COUNTER_WINDOW;
    state.validate_counter(jump).unwrap();
    state.record_receive(jump);
    assert_eq!(state.peer_last_counter, jump);

    // Counters that fell behind the window are dead.
    assert!(state.validate_counter(1).is_err());

    // Send counters never consulted receive state.
    assert_eq!(state.advance_send_counter(), 0);
    assert_eq!(state.advance_send_counter(), 1);
}

#[test]
fn exchange_uri_roundtrip() {
    let uri = PSKExchangeURI::new(
        "MFRGGZDFMY2TQMRSGQ4TONZXHA2DOMJX",
        INITIAL_PSK,
        Some("Work chat".to_string()),
    );

    let encoded = uri.encode();
    let parsed = PSKExchangeURI::parse(&encoded).unwrap();
    assert_eq!(parsed, uri);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn standard_envelope_codec_roundtrip(
            sender in prop::array::uniform32(any::<u8>()),
            ephemeral in prop::array::uniform32(any::<u8>()),
            nonce in prop::array::uniform12(any::<u8>()),
            sender_key in prop::collection::vec(any::<u8>(), 48),
            ciphertext in prop::collection::vec(any::<u8>(), 16..256),
        ) {
            let envelope = ChatEnvelope {
                sender_public_key: sender,
                ephemeral_public_key: ephemeral,
                nonce,
                encrypted_sender_key: sender_key,
                ciphertext,
            };
            let decoded = ChatEnvelope::decode(&envelope.encode()).unwrap();
            prop_assert_eq!(decoded, envelope);
        }

        #[test]
        fn psk_envelope_codec_roundtrip(
            counter in any::<u32>(),
            sender in prop::array::uniform32(any::<u8>()),
            ephemeral in prop::array::uniform32(any::<u8>()),
            nonce in prop::array::uniform12(any::<u8>()),
            sender_key in prop::collection::vec(any::<u8>(), 48),
            ciphertext in prop::collection::vec(any::<u8>(), 16..256),
        ) {
            let envelope = algochat_core::PSKEnvelope {
                ratchet_counter: counter,
                sender_public_key: sender,
                ephemeral_public_key: ephemeral,
                nonce,
                encrypted_sender_key: sender_key,
                ciphertext,
            };
            let decoded = decode_psk_envelope(&encode_psk_envelope(&envelope)).unwrap();
            prop_assert_eq!(decoded, envelope);
        }

        #[test]
        fn discriminators_never_overlap(data in prop::collection::vec(any::<u8>(), 0..300)) {
            prop_assert!(!(is_chat_message(&data) && is_psk_message(&data)));
        }

        #[test]
        fn exchange_uri_roundtrips(
            addr in "[A-Z2-7]{10,58}",
            psk in prop::array::uniform32(any::<u8>()),
            label in prop::option::of(".{0,40}"),
        ) {
            let uri = PSKExchangeURI::new(addr, psk, label);
            let parsed = PSKExchangeURI::parse(&uri.encode()).unwrap();
            prop_assert_eq!(parsed, uri);
        }
    }
}

#![no_main]

//! Fuzz target for the ABI decoders
//!
//! Whatever decodes must re-encode to the same bytes it came from.
//!
//! Run with: cargo +nightly fuzz run fuzz_payload

use libfuzzer_sys::fuzz_target;
use passkey_core::{LoginServicePayload, WebAuthnSignaturePayload};

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = WebAuthnSignaturePayload::decode(data) {
        let again = WebAuthnSignaturePayload::decode(payload.encode().as_bytes())
            .expect("re-encoded payload must decode");
        assert_eq!(again, payload);
    }
    if let Ok(blob) = LoginServicePayload::decode(data) {
        let _ = blob.claim().eth_signed_message_hash();
    }
});

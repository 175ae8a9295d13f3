#![no_main]

//! Fuzz target for DerSignature::decode()
//!
//! Run with: cargo +nightly fuzz run fuzz_der_signature

use libfuzzer_sys::fuzz_target;
use passkey_core::DerSignature;

fuzz_target!(|data: &[u8]| {
    if let Ok(signature) = DerSignature::decode(data) {
        // A decoded integer is never empty and never keeps a sign-padding byte
        assert!(!signature.r.is_empty() && !signature.s.is_empty());
        for value in [&signature.r, &signature.s] {
            assert!(!(value.len() > 1 && value[0] == 0 && value[1] & 0x80 != 0));
        }
    }
});

#![no_main]

//! Fuzz target for AuthenticatorData::parse()
//!
//! Declared lengths come straight from the input, so this is where
//! out-of-bounds slicing would show up. Both key type policies are run.
//!
//! Run with: cargo +nightly fuzz run fuzz_authenticator_data

use libfuzzer_sys::fuzz_target;
use passkey_core::{AttestationObject, AuthenticatorData, KeyTypePolicy};

fuzz_target!(|data: &[u8]| {
    let _ = AuthenticatorData::parse(data, KeyTypePolicy::Lenient);
    let _ = AuthenticatorData::parse(data, KeyTypePolicy::Strict);
    let _ = AttestationObject::from_cbor(data);
});

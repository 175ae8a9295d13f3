//! Passkey Core - from WebAuthn ceremony responses to on-chain signature payloads
//!
//! This crate decodes the binary structures a browser hands back after a
//! passkey ceremony and re-encodes the extracted fields into the exact byte
//! layout a smart-contract wallet's P-256 verifier checks.
//!
//! # Pipeline
//!
//! - Authenticator data, COSE public keys and attestation statements
//! - DER-encoded ECDSA signatures, canonicalized to unsigned big-endian `(r, s)`
//! - Verification input: message hash, `(r, s)` and `(x, y)` for the verifier
//! - Signature payloads tagged by [`SignatureVariant`], ABI-encoded for the wallet
//!
//! Decoding and encoding are pure and synchronous. The optional `runtime`
//! feature adds a bounded, cancellable poller for waiting on inclusion.
//!
//! # Example
//!
//! ```no_run
//! use passkey_core::{
//!     decode_authentication_credential, encode_authentication_signature,
//!     AuthenticationResponseJson, KeyTypePolicy,
//! };
//!
//! # fn example(json: &str, user_op_hash: [u8; 32], credential_id: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let credential: AuthenticationResponseJson = serde_json::from_str(json)?;
//! let decoded = decode_authentication_credential(&credential, KeyTypePolicy::Lenient)?;
//!
//! let signature = encode_authentication_signature(&decoded, &user_op_hash, credential_id)?;
//! println!("userOp.signature = {}", signature.to_hex());
//! # Ok(())
//! # }
//! ```

pub mod attestation;
pub mod authenticator_data;
pub mod base64url;
pub mod client_data;
pub mod config;
pub mod cose;
pub mod credential;
pub mod cursor;
pub mod der;
pub mod error;
pub mod hex_prefixed;
pub mod login_service;
pub mod payload;
#[cfg(feature = "runtime")]
pub mod poll;
pub mod session;
pub mod verification;

// Re-export main types for convenience
pub use attestation::{AttestationFormat, AttestationObject, AttestationStatement, CertificateInfo};
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags};
pub use client_data::ClientData;
pub use config::{KeyTypePolicy, PipelineConfig, PollPolicy};
pub use cose::CoseKey;
pub use credential::{
    decode_authentication_credential, decode_registration_credential, AuthenticationResponseJson,
    DecodedAuthentication, DecodedRegistration, RegistrationResponseJson,
};
pub use cursor::ByteCursor;
pub use der::DerSignature;
pub use error::{PasskeyError, Result};
pub use login_service::{LoginServiceClaim, LoginServicePayload, LoginServiceRequest};
pub use payload::{
    challenge_prefix_len, encode_authentication_signature, encode_registration_signature,
    EncodedSignature, RegistrationSignature, SignatureVariant, WebAuthnSignaturePayload,
};
pub use session::{MemoryStorage, SessionStorage, WalletSession};
pub use verification::VerificationInput;

// Async exports (not available in Wasm)
#[cfg(feature = "runtime")]
pub use poll::{poll_bounded, Delay, Probe, TokioDelay};

/// Crate version, reported by the CLI and the Wasm bindings.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

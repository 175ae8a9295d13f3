use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasskeyError {
    #[error("Buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun { needed: usize, remaining: usize },

    #[error("Invalid base64url encoding: {0}")]
    InvalidEncoding(String),

    #[error("Malformed authenticator data: {0}")]
    MalformedAuthenticatorData(String),

    #[error("Malformed attestation object: {0}")]
    MalformedAttestationObject(String),

    #[error("Malformed attestation statement field `{field}`: {reason}")]
    MalformedAttestationStatement { field: &'static str, reason: String },

    #[error("Malformed client data: {0}")]
    MalformedClientData(String),

    #[error("Malformed DER signature: {0}")]
    MalformedSignature(String),

    #[error("Missing field `{field}` in {stage}")]
    MissingField {
        stage: &'static str,
        field: &'static str,
    },

    #[error("Challenge `{challenge}` not found in client data")]
    ChallengeNotFound { challenge: String },

    #[error("Unsupported COSE key type: {0}")]
    UnsupportedKeyType(i128),

    #[error("Malformed login service payload: {0}")]
    MalformedLoginServicePayload(String),

    #[error("Malformed signature payload: {0}")]
    MalformedPayload(String),

    #[error("Polling gave up after {attempts} attempts")]
    PollExhausted { attempts: u32 },

    #[error("Polling was cancelled")]
    PollCancelled,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl PasskeyError {
    /// Whether the error comes from malformed ceremony input rather than
    /// from the caller or an external collaborator.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::BufferUnderrun { .. }
                | Self::InvalidEncoding(_)
                | Self::MalformedAuthenticatorData(_)
                | Self::MalformedAttestationObject(_)
                | Self::MalformedAttestationStatement { .. }
                | Self::MalformedClientData(_)
                | Self::MalformedSignature(_)
                | Self::MissingField { .. }
                | Self::ChallengeNotFound { .. }
                | Self::UnsupportedKeyType(_)
                | Self::MalformedLoginServicePayload(_)
                | Self::MalformedPayload(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PasskeyError>;

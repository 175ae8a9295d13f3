//! `clientDataJSON` as collected by the browser.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::base64url;
use crate::error::{PasskeyError, Result};

const STAGE: &str = "client data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `present`, `supported` or `not-supported`
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    #[serde(rename = "type")]
    pub ceremony_type: String,
    /// Base64url text, exactly as the relying party sent it
    pub challenge: String,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_binding: Option<TokenBinding>,
}

impl ClientData {
    /// Decode the base64url `clientDataJSON` field of a credential response.
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = base64url::decode(encoded)
            .map_err(|e| PasskeyError::MalformedClientData(e.to_string()))?;
        Self::from_json_bytes(&bytes)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| PasskeyError::MalformedClientData(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| PasskeyError::MalformedClientData("not a JSON object".into()))?;
        for field in ["type", "challenge", "origin"] {
            if !object.contains_key(field) {
                return Err(PasskeyError::MissingField {
                    stage: STAGE,
                    field,
                });
            }
        }

        serde_json::from_value(value).map_err(|e| PasskeyError::MalformedClientData(e.to_string()))
    }

    /// The raw challenge bytes.
    pub fn challenge_bytes(&self) -> Result<Vec<u8>> {
        base64url::decode(&self.challenge)
    }
}

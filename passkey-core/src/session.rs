//! Wallet session state.
//!
//! The session is a plain value owned by the caller. Updates return a new
//! session; persistence goes through an injected [`SessionStorage`].

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base64url;
use crate::credential::DecodedRegistration;
use crate::error::{PasskeyError, Result};
use crate::hex_prefixed;

pub const PASSKEY_ID_KEY: &str = "passkeyId";
pub const COORDINATES_KEY: &str = "pkCoordinates";

/// Key-value persistence capability (browser local storage, a file, ...).
pub trait SessionStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn store(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory storage, for tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    /// `0x`-prefixed credential id of the wallet's passkey
    pub passkey_id: Option<String>,
    /// Base64url `x` and `y` of the passkey's public key
    pub passkey_coordinates: Option<[String; 2]>,
    /// Counterfactual wallet address; derived, never persisted
    pub wallet_address: Option<String>,
}

impl WalletSession {
    /// Restore the persisted part of a session. A coordinates entry that is
    /// not a two-element JSON array is ignored.
    pub fn load(storage: &dyn SessionStorage) -> Result<Self> {
        let passkey_id = storage.load(PASSKEY_ID_KEY)?.filter(|id| !id.is_empty());

        let passkey_coordinates = storage
            .load(COORDINATES_KEY)?
            .and_then(|raw| match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(coordinates) => <[String; 2]>::try_from(coordinates).ok(),
                Err(e) => {
                    debug!(error = %e, "Ignoring unreadable stored coordinates");
                    None
                }
            });

        Ok(Self {
            passkey_id,
            passkey_coordinates,
            wallet_address: None,
        })
    }

    pub fn persist(&self, storage: &dyn SessionStorage) -> Result<()> {
        if let Some(passkey_id) = &self.passkey_id {
            storage.store(PASSKEY_ID_KEY, passkey_id)?;
        }
        if let Some(coordinates) = &self.passkey_coordinates {
            let json = serde_json::to_string(coordinates)
                .map_err(|e| PasskeyError::Storage(e.to_string()))?;
            storage.store(COORDINATES_KEY, &json)?;
        }
        Ok(())
    }

    pub fn with_passkey_id(self, passkey_id: impl Into<String>) -> Self {
        Self {
            passkey_id: Some(passkey_id.into()),
            ..self
        }
    }

    pub fn with_coordinates(self, coordinates: [String; 2]) -> Self {
        Self {
            passkey_coordinates: Some(coordinates),
            ..self
        }
    }

    pub fn with_wallet_address(self, wallet_address: impl Into<String>) -> Self {
        Self {
            wallet_address: Some(wallet_address.into()),
            ..self
        }
    }

    /// Adopt a freshly registered passkey: its id and, when the attested
    /// key decoded, its coordinates. A new passkey means a new wallet, so
    /// the address is cleared.
    pub fn with_registration(self, registration: &DecodedRegistration) -> Self {
        let passkey_coordinates = registration
            .authenticator_data
            .credential_public_key()
            .map(|key| {
                let (x, y) = key.coordinates();
                [base64url::encode(x), base64url::encode(y)]
            })
            .or(self.passkey_coordinates);

        Self {
            passkey_id: Some(hex_prefixed::encode(&registration.raw_id)),
            passkey_coordinates,
            wallet_address: None,
        }
    }
}

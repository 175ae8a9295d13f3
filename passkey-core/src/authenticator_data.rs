//! Authenticator data (WebAuthn §6.1).
//!
//! ```text
//! rpIdHash[32] | flags[1] | counter[4] | (aaguid[16] | credIdLen[2] | credId | cosePublicKey)?
//! ```

use serde::{Serialize, Serializer};
use tracing::debug;
use uuid::Uuid;

use crate::config::KeyTypePolicy;
use crate::cose::CoseKey;
use crate::cursor::ByteCursor;
use crate::error::{PasskeyError, Result};

/// Length of the fixed prefix: RP ID hash, flags and counter.
pub const AUTH_DATA_PREFIX_LEN: usize = 37;

const FLAG_USER_PRESENT: u8 = 1 << 0;
const FLAG_USER_VERIFIED: u8 = 1 << 2;
const FLAG_BACKUP_ELIGIBLE: u8 = 1 << 3;
const FLAG_BACKUP_STATUS: u8 = 1 << 4;
const FLAG_ATTESTED_DATA: u8 = 1 << 6;
const FLAG_EXTENSION_DATA: u8 = 1 << 7;

/// Decoded view of the flags byte. Bits 1 and 5 are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorFlags {
    pub user_present: bool,
    pub user_verified: bool,
    pub backup_eligible: bool,
    pub backup_status: bool,
    pub attested_data_present: bool,
    pub extension_data_present: bool,
}

impl AuthenticatorFlags {
    pub const fn from_byte(flags: u8) -> Self {
        Self {
            user_present: flags & FLAG_USER_PRESENT != 0,
            user_verified: flags & FLAG_USER_VERIFIED != 0,
            backup_eligible: flags & FLAG_BACKUP_ELIGIBLE != 0,
            backup_status: flags & FLAG_BACKUP_STATUS != 0,
            attested_data_present: flags & FLAG_ATTESTED_DATA != 0,
            extension_data_present: flags & FLAG_EXTENSION_DATA != 0,
        }
    }
}

/// Attested credential data, present only during registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestedCredentialData {
    #[serde(serialize_with = "serialize_aaguid")]
    pub aaguid: [u8; 16],
    #[serde(rename = "credentialID", serialize_with = "crate::base64url::serialize")]
    pub credential_id: Vec<u8>,
    /// Raw COSE bytes: everything after the credential id
    #[serde(serialize_with = "crate::base64url::serialize")]
    pub credential_public_key: Vec<u8>,
    pub parsed_credential_public_key: CoseKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorData {
    #[serde(serialize_with = "crate::base64url::serialize")]
    pub rp_id_hash: [u8; 32],
    pub flags: AuthenticatorFlags,
    /// The flags byte verbatim; the verifier contract takes the raw byte.
    #[serde(serialize_with = "serialize_flags_mask")]
    pub flags_mask: u8,
    pub counter: u32,
    #[serde(flatten)]
    pub attested_credential: Option<AttestedCredentialData>,
}

impl AuthenticatorData {
    /// Parse a complete authenticator data buffer.
    pub fn parse(bytes: &[u8], policy: KeyTypePolicy) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);
        Self::read(&mut cursor, policy)
    }

    /// Parse from a cursor. Without the attested-data flag only the fixed
    /// prefix is consumed; with it the rest of the cursor is taken as the
    /// COSE public key.
    pub fn read(cursor: &mut ByteCursor<'_>, policy: KeyTypePolicy) -> Result<Self> {
        let rp_id_hash = field(cursor.take_array::<32>(), "rpIdHash")?;
        let flags_mask = field(cursor.read_u8(), "flags")?;
        let counter = field(cursor.read_u32_be(), "counter")?;
        let flags = AuthenticatorFlags::from_byte(flags_mask);

        let attested_credential = if flags.attested_data_present {
            let aaguid = field(cursor.take_array::<16>(), "aaguid")?;
            let credential_id = field(cursor.take_u16_prefixed(), "credentialId")?.to_vec();
            let credential_public_key = cursor.rest().to_vec();
            if credential_public_key.is_empty() {
                return Err(PasskeyError::MalformedAuthenticatorData(
                    "attested data flag set but credential public key is missing".into(),
                ));
            }
            let parsed_credential_public_key = CoseKey::from_cbor(&credential_public_key, policy)?;

            Some(AttestedCredentialData {
                aaguid,
                credential_id,
                credential_public_key,
                parsed_credential_public_key,
            })
        } else {
            None
        };

        debug!(
            flags = format_args!("{flags_mask:#04x}"),
            counter,
            attested = attested_credential.is_some(),
            "Parsed authenticator data"
        );

        Ok(Self {
            rp_id_hash,
            flags,
            flags_mask,
            counter,
            attested_credential,
        })
    }

    pub fn aaguid(&self) -> Option<&[u8; 16]> {
        self.attested_credential.as_ref().map(|a| &a.aaguid)
    }

    pub fn credential_id(&self) -> Option<&[u8]> {
        self.attested_credential
            .as_ref()
            .map(|a| a.credential_id.as_slice())
    }

    pub fn credential_public_key(&self) -> Option<&CoseKey> {
        self.attested_credential
            .as_ref()
            .map(|a| &a.parsed_credential_public_key)
    }
}

/// Name the field whose read ran past the end of the buffer.
fn field<T>(read: Result<T>, name: &str) -> Result<T> {
    read.map_err(|e| PasskeyError::MalformedAuthenticatorData(format!("{name}: {e}")))
}

fn serialize_flags_mask<S: Serializer>(mask: &u8, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{mask:#04x}"))
}

fn serialize_aaguid<S: Serializer>(
    aaguid: &[u8; 16],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&Uuid::from_bytes(*aaguid).hyphenated().to_string())
}

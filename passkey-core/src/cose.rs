//! COSE public keys (RFC 9052 / RFC 9053) as found in attested credential data.

use ciborium::value::Value;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::KeyTypePolicy;
use crate::error::{PasskeyError, Result};

// COSE_Key map labels. RSA reuses -1/-2 for modulus and exponent.
const LABEL_KTY: i128 = 1;
const LABEL_ALG: i128 = 3;
const LABEL_CRV: i128 = -1;
const LABEL_X: i128 = -2;
const LABEL_Y: i128 = -3;
const LABEL_RSA_N: i128 = -1;
const LABEL_RSA_E: i128 = -2;

const KTY_OKP: i128 = 1;
const KTY_EC2: i128 = 2;
const KTY_RSA: i128 = 3;

const STAGE: &str = "COSE key";

/// Human-readable name of a COSE algorithm identifier.
pub fn cose_algorithm_name(alg: i64) -> Option<&'static str> {
    Some(match alg {
        -7 => "ES256",
        -8 => "EdDSA",
        -35 => "ES384",
        -36 => "ES512",
        -37 => "PS256",
        -38 => "PS384",
        -39 => "PS512",
        -47 => "ES256K",
        -257 => "RS256",
        -258 => "RS384",
        -259 => "RS512",
        -65535 => "RS1",
        _ => return None,
    })
}

pub fn cose_key_type_name(kty: i128) -> Option<&'static str> {
    match kty {
        KTY_OKP => Some("OKP"),
        KTY_EC2 => Some("EC2"),
        KTY_RSA => Some("RSA"),
        _ => None,
    }
}

pub fn cose_curve_name(crv: i64) -> Option<&'static str> {
    Some(match crv {
        1 => "P-256",
        2 => "P-384",
        3 => "P-521",
        4 => "X25519",
        5 => "X448",
        6 => "Ed25519",
        7 => "Ed448",
        8 => "secp256k1",
        _ => return None,
    })
}

/// A credential public key, resolved to a variant by its `kty` label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "keyType")]
pub enum CoseKey {
    #[serde(rename = "EC2")]
    Ec2 {
        algorithm: Option<i64>,
        curve: Option<i64>,
        #[serde(serialize_with = "crate::base64url::serialize")]
        x: Vec<u8>,
        #[serde(serialize_with = "crate::base64url::serialize_opt")]
        y: Option<Vec<u8>>,
    },
    #[serde(rename = "OKP")]
    Okp {
        algorithm: Option<i64>,
        curve: Option<i64>,
        #[serde(serialize_with = "crate::base64url::serialize")]
        x: Vec<u8>,
    },
    #[serde(rename = "RSA")]
    Rsa {
        algorithm: Option<i64>,
        #[serde(serialize_with = "crate::base64url::serialize")]
        modulus: Vec<u8>,
        exponent: u64,
    },
    /// Key type this decoder does not understand; nothing else was read.
    #[serde(rename = "unknown")]
    Unknown { kty: i128 },
}

impl CoseKey {
    /// Decode the first CBOR item of `bytes` as a COSE key. Trailing bytes
    /// (extension data) are ignored.
    pub fn from_cbor(bytes: &[u8], policy: KeyTypePolicy) -> Result<Self> {
        let value: Value = ciborium::from_reader(bytes).map_err(|e| {
            PasskeyError::MalformedAuthenticatorData(format!("COSE key is not valid CBOR: {e}"))
        })?;
        Self::from_value(&value, policy)
    }

    pub fn from_value(value: &Value, policy: KeyTypePolicy) -> Result<Self> {
        let map = value.as_map().ok_or_else(|| {
            PasskeyError::MalformedAuthenticatorData("COSE key is not a CBOR map".into())
        })?;

        let kty = integer_label(map, LABEL_KTY, "kty")?.ok_or(PasskeyError::MissingField {
            stage: STAGE,
            field: "kty",
        })?;
        let algorithm = small_integer_label(map, LABEL_ALG, "alg")?;

        let key = match kty {
            KTY_EC2 => Self::Ec2 {
                algorithm,
                curve: small_integer_label(map, LABEL_CRV, "crv")?,
                x: required_bytes_label(map, LABEL_X, "x")?,
                y: bytes_label(map, LABEL_Y, "y")?,
            },
            KTY_OKP => Self::Okp {
                algorithm,
                curve: small_integer_label(map, LABEL_CRV, "crv")?,
                x: required_bytes_label(map, LABEL_X, "x")?,
            },
            KTY_RSA => {
                let exponent = required_bytes_label(map, LABEL_RSA_E, "e")?;
                Self::Rsa {
                    algorithm,
                    modulus: required_bytes_label(map, LABEL_RSA_N, "n")?,
                    exponent: be_unsigned(&exponent)?,
                }
            }
            other => {
                if policy == KeyTypePolicy::Strict {
                    return Err(PasskeyError::UnsupportedKeyType(other));
                }
                warn!(kty = %other, "Unknown COSE key type, key fields left undecoded");
                Self::Unknown { kty: other }
            }
        };

        debug!(key_type = key.key_type_name().unwrap_or("unknown"), "Decoded COSE key");
        Ok(key)
    }

    pub fn key_type_code(&self) -> i128 {
        match self {
            Self::Ec2 { .. } => KTY_EC2,
            Self::Okp { .. } => KTY_OKP,
            Self::Rsa { .. } => KTY_RSA,
            Self::Unknown { kty } => *kty,
        }
    }

    pub fn key_type_name(&self) -> Option<&'static str> {
        cose_key_type_name(self.key_type_code())
    }

    pub fn algorithm(&self) -> Option<i64> {
        match self {
            Self::Ec2 { algorithm, .. } | Self::Okp { algorithm, .. } | Self::Rsa { algorithm, .. } => {
                *algorithm
            }
            Self::Unknown { .. } => None,
        }
    }

    pub fn algorithm_name(&self) -> Option<&'static str> {
        self.algorithm().and_then(cose_algorithm_name)
    }

    /// The `(x, y)` coordinates an on-chain EC verifier takes. Absent values
    /// (OKP has no `y`, RSA and unknown keys have neither) are empty.
    pub fn coordinates(&self) -> (&[u8], &[u8]) {
        const EMPTY: &[u8] = &[];
        match self {
            Self::Ec2 { x, y, .. } => (x.as_slice(), y.as_deref().unwrap_or(EMPTY)),
            Self::Okp { x, .. } => (x.as_slice(), EMPTY),
            Self::Rsa { .. } | Self::Unknown { .. } => (EMPTY, EMPTY),
        }
    }

    /// Reject a key whose type could not be decoded.
    pub fn ensure_supported(&self) -> Result<&Self> {
        match self {
            Self::Unknown { kty } => Err(PasskeyError::UnsupportedKeyType(*kty)),
            _ => Ok(self),
        }
    }
}

fn lookup(map: &[(Value, Value)], label: i128) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| k.as_integer().map(i128::from) == Some(label))
        .map(|(_, v)| v)
}

fn integer_label(map: &[(Value, Value)], label: i128, name: &'static str) -> Result<Option<i128>> {
    match lookup(map, label) {
        None => Ok(None),
        Some(value) => value.as_integer().map(|i| Some(i128::from(i))).ok_or_else(|| {
            PasskeyError::MalformedAuthenticatorData(format!("COSE key field {name} is not an integer"))
        }),
    }
}

fn small_integer_label(
    map: &[(Value, Value)],
    label: i128,
    name: &'static str,
) -> Result<Option<i64>> {
    integer_label(map, label, name)?
        .map(|i| {
            i64::try_from(i).map_err(|_| {
                PasskeyError::MalformedAuthenticatorData(format!("COSE key field {name} is out of range"))
            })
        })
        .transpose()
}

fn bytes_label(map: &[(Value, Value)], label: i128, name: &'static str) -> Result<Option<Vec<u8>>> {
    match lookup(map, label) {
        None => Ok(None),
        Some(value) => value.as_bytes().map(|b| Some(b.clone())).ok_or_else(|| {
            PasskeyError::MalformedAuthenticatorData(format!(
                "COSE key field {name} is not a byte string"
            ))
        }),
    }
}

fn required_bytes_label(map: &[(Value, Value)], label: i128, name: &'static str) -> Result<Vec<u8>> {
    bytes_label(map, label, name)?.ok_or(PasskeyError::MissingField {
        stage: STAGE,
        field: name,
    })
}

/// Interpret raw bytes as a big-endian unsigned integer.
fn be_unsigned(bytes: &[u8]) -> Result<u64> {
    let significant = bytes
        .iter()
        .position(|&b| b != 0)
        .map_or(&[][..], |start| &bytes[start..]);
    if significant.len() > 8 {
        return Err(PasskeyError::MalformedAuthenticatorData(
            "RSA exponent does not fit in 64 bits".into(),
        ));
    }
    Ok(significant
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

//! Attestation object and attestation statement decoding.
//!
//! The statement is decoded by the keys it actually carries rather than by
//! its declared format: authenticators in the wild do not always agree with
//! their own `fmt`, and every field present is worth reporting.

use chrono::{DateTime, SecondsFormat, Utc};
use ciborium::value::Value;
use serde::{Serialize, Serializer};
use tracing::debug;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::base64url;
use crate::cose::cose_algorithm_name;
use crate::error::{PasskeyError, Result};

/// Attestation statement format identifier (`fmt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationFormat {
    Packed,
    Tpm,
    AndroidKey,
    AndroidSafetyNet,
    FidoU2f,
    None,
    Other(String),
}

impl AttestationFormat {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Packed => "packed",
            Self::Tpm => "tpm",
            Self::AndroidKey => "android-key",
            Self::AndroidSafetyNet => "android-safetynet",
            Self::FidoU2f => "fido-u2f",
            Self::None => "none",
            Self::Other(fmt) => fmt,
        }
    }
}

impl From<&str> for AttestationFormat {
    fn from(fmt: &str) -> Self {
        match fmt {
            "packed" => Self::Packed,
            "tpm" => Self::Tpm,
            "android-key" => Self::AndroidKey,
            "android-safetynet" => Self::AndroidSafetyNet,
            "fido-u2f" => Self::FidoU2f,
            "none" => Self::None,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for AttestationFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Human-readable summary of an X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    pub version: u32,
    pub serial_number: String,
    pub subject: String,
    pub issuer: String,
    pub not_before: String,
    pub not_after: String,
    pub signature_algorithm: String,
}

impl CertificateInfo {
    pub fn from_der(der: &[u8], field: &'static str) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der).map_err(|e| {
            PasskeyError::MalformedAttestationStatement {
                field,
                reason: format!("invalid certificate: {e}"),
            }
        })?;

        let validity = cert.validity();
        Ok(Self {
            version: cert.version().0 + 1,
            serial_number: cert.raw_serial_as_string(),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before: rfc3339(validity.not_before.timestamp()),
            not_after: rfc3339(validity.not_after.timestamp()),
            signature_algorithm: cert.signature_algorithm.algorithm.to_id_string(),
        })
    }
}

fn rfc3339(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| timestamp.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyNetHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    pub x5c: Vec<CertificateInfo>,
}

/// The compact JWS carried by `android-safetynet` statements. The signature
/// part is kept as text; nothing here verifies it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyNetResponse {
    pub header: SafetyNetHeader,
    pub payload: serde_json::Value,
    pub signature: String,
}

impl SafetyNetResponse {
    pub fn parse(jws: &[u8]) -> Result<Self> {
        let malformed = |reason: String| PasskeyError::MalformedAttestationStatement {
            field: "response",
            reason,
        };

        let text = std::str::from_utf8(jws).map_err(|e| malformed(e.to_string()))?;
        let parts: Vec<&str> = text.split('.').collect();
        let [header, payload, signature] = parts.as_slice() else {
            return Err(malformed(format!(
                "expected 3 dot-separated parts, found {}",
                parts.len()
            )));
        };

        let header: serde_json::Value = decode_json_part(header).map_err(|e| malformed(format!("header: {e}")))?;
        let payload: serde_json::Value = decode_json_part(payload).map_err(|e| malformed(format!("payload: {e}")))?;

        let alg = header.get("alg").and_then(|v| v.as_str()).map(str::to_string);
        let x5c = match header.get("x5c") {
            Some(serde_json::Value::Array(certs)) => certs
                .iter()
                .map(|cert| {
                    let text = cert
                        .as_str()
                        .ok_or_else(|| malformed("header x5c entry is not a string".into()))?;
                    let der = base64url::decode_standard(text).map_err(|e| malformed(e.to_string()))?;
                    CertificateInfo::from_der(&der, "response")
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(malformed("header x5c is not an array".into())),
            None => Vec::new(),
        };

        Ok(Self {
            header: SafetyNetHeader { alg, x5c },
            payload,
            signature: signature.to_string(),
        })
    }
}

fn decode_json_part(part: &str) -> std::result::Result<serde_json::Value, String> {
    let bytes = base64url::decode(part).map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}

/// Decoded `attStmt`. Only the fields present in the statement are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationStatement {
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_alg")]
    pub alg: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "base64url::serialize_opt")]
    pub sig: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<CertificateInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<SafetyNetResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    // TPM structures are passed through undecoded
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "base64url::serialize_opt")]
    pub cert_info: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "base64url::serialize_opt")]
    pub pub_area: Option<Vec<u8>>,
}

impl AttestationStatement {
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_map()
            .ok_or_else(|| PasskeyError::MalformedAttestationObject("attStmt is not a map".into()))?;

        let mut statement = Self::default();

        if let Some(alg) = entry(map, "alg") {
            let alg = alg
                .as_integer()
                .and_then(|i| i64::try_from(i).ok())
                .ok_or_else(|| type_error("alg", "integer"))?;
            statement.alg = Some(alg);
        }

        if let Some(sig) = entry(map, "sig") {
            statement.sig = Some(bytes_of(sig, "sig")?);
        }

        if let Some(x5c) = entry(map, "x5c") {
            let certs = x5c.as_array().ok_or_else(|| type_error("x5c", "array"))?;
            statement.x5c = Some(
                certs
                    .iter()
                    .map(|cert| CertificateInfo::from_der(&bytes_of(cert, "x5c")?, "x5c"))
                    .collect::<Result<Vec<_>>>()?,
            );
        }

        if let Some(response) = entry(map, "response") {
            statement.response = Some(SafetyNetResponse::parse(&bytes_of(response, "response")?)?);
        }

        if let Some(ver) = entry(map, "ver") {
            let ver = ver.as_text().ok_or_else(|| type_error("ver", "text"))?;
            statement.ver = Some(ver.to_string());
        }

        if let Some(cert_info) = entry(map, "certInfo") {
            statement.cert_info = Some(bytes_of(cert_info, "certInfo")?);
        }

        if let Some(pub_area) = entry(map, "pubArea") {
            statement.pub_area = Some(bytes_of(pub_area, "pubArea")?);
        }

        Ok(statement)
    }

    pub fn alg_name(&self) -> Option<&'static str> {
        self.alg.and_then(cose_algorithm_name)
    }

    /// Whether the authenticator signed the registration itself.
    pub fn has_direct_signature(&self) -> bool {
        self.sig.is_some()
    }
}

fn serialize_alg<S: Serializer>(
    alg: &Option<i64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match alg {
        Some(alg) => match cose_algorithm_name(*alg) {
            Some(name) => serializer.serialize_some(name),
            None => serializer.serialize_some(&format!("unknown ({alg})")),
        },
        None => serializer.serialize_none(),
    }
}

fn entry<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}

fn bytes_of(value: &Value, field: &'static str) -> Result<Vec<u8>> {
    value
        .as_bytes()
        .cloned()
        .ok_or_else(|| type_error(field, "byte string"))
}

fn type_error(field: &'static str, expected: &str) -> PasskeyError {
    PasskeyError::MalformedAttestationStatement {
        field,
        reason: format!("expected {expected}"),
    }
}

/// The CBOR `attestationObject` of a registration response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationObject {
    #[serde(rename = "fmt")]
    pub format: AttestationFormat,
    pub att_stmt: AttestationStatement,
    #[serde(serialize_with = "base64url::serialize")]
    pub auth_data: Vec<u8>,
}

impl AttestationObject {
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let value: Value = ciborium::from_reader(bytes)
            .map_err(|e| PasskeyError::MalformedAttestationObject(format!("invalid CBOR: {e}")))?;
        let map = value
            .as_map()
            .ok_or_else(|| PasskeyError::MalformedAttestationObject("not a CBOR map".into()))?;

        let format = entry(map, "fmt")
            .ok_or_else(|| PasskeyError::MalformedAttestationObject("missing fmt".into()))?
            .as_text()
            .map(AttestationFormat::from)
            .ok_or_else(|| PasskeyError::MalformedAttestationObject("fmt is not text".into()))?;

        let att_stmt = entry(map, "attStmt")
            .ok_or_else(|| PasskeyError::MalformedAttestationObject("missing attStmt".into()))
            .and_then(AttestationStatement::from_value)?;

        let auth_data = entry(map, "authData")
            .ok_or_else(|| PasskeyError::MalformedAttestationObject("missing authData".into()))?
            .as_bytes()
            .cloned()
            .ok_or_else(|| PasskeyError::MalformedAttestationObject("authData is not bytes".into()))?;

        debug!(
            fmt = format.as_str(),
            direct_signature = att_stmt.has_direct_signature(),
            certificates = att_stmt.x5c.as_ref().map_or(0, Vec::len),
            "Decoded attestation object"
        );

        Ok(Self {
            format,
            att_stmt,
            auth_data,
        })
    }
}

//! DER-encoded ECDSA signatures.
//!
//! ```text
//! 0x30 len 0x02 rLen r 0x02 sLen s
//! ```
//!
//! ASN.1 INTEGERs are signed, so a value whose top bit is set carries a
//! leading `0x00`. The verifier contract wants plain unsigned big-endian
//! values and that padding byte is removed.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::{PasskeyError, Result};

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerSignature {
    #[serde(serialize_with = "crate::hex_prefixed::serialize")]
    pub r: Vec<u8>,
    #[serde(serialize_with = "crate::hex_prefixed::serialize")]
    pub s: Vec<u8>,
}

impl DerSignature {
    pub fn decode(der: &[u8]) -> Result<Self> {
        let mut outer = ByteCursor::new(der);

        expect_tag(&mut outer, TAG_SEQUENCE, "SEQUENCE")?;
        let body_len = read_length(&mut outer)?;
        if body_len != outer.remaining() {
            return Err(PasskeyError::MalformedSignature(format!(
                "SEQUENCE declares {body_len} bytes but {} follow",
                outer.remaining()
            )));
        }

        let mut body = ByteCursor::new(outer.rest());
        let r = read_integer(&mut body, "r")?;
        let s = read_integer(&mut body, "s")?;
        if !body.is_empty() {
            return Err(PasskeyError::MalformedSignature(format!(
                "{} trailing bytes after s",
                body.remaining()
            )));
        }

        Ok(Self {
            r: strip_sign_padding(r).to_vec(),
            s: strip_sign_padding(s).to_vec(),
        })
    }
}

/// Drop the leading zero only when it is there to keep the INTEGER positive.
pub fn strip_sign_padding(value: &[u8]) -> &[u8] {
    match value {
        [0x00, next, ..] if next & 0x80 != 0 => &value[1..],
        _ => value,
    }
}

fn expect_tag(cursor: &mut ByteCursor<'_>, tag: u8, name: &str) -> Result<()> {
    let found = cursor
        .read_u8()
        .map_err(|_| PasskeyError::MalformedSignature(format!("missing {name} tag")))?;
    if found != tag {
        return Err(PasskeyError::MalformedSignature(format!(
            "expected {name} tag {tag:#04x}, found {found:#04x}"
        )));
    }
    Ok(())
}

/// Short form, or long form with one or two length octets.
fn read_length(cursor: &mut ByteCursor<'_>) -> Result<usize> {
    let malformed = |e: PasskeyError| PasskeyError::MalformedSignature(format!("length: {e}"));

    let first = cursor.read_u8().map_err(malformed)?;
    if first & 0x80 == 0 {
        return Ok(usize::from(first));
    }

    match first & 0x7F {
        1 => cursor.read_u8().map(usize::from).map_err(malformed),
        2 => cursor.read_u16_be().map(usize::from).map_err(malformed),
        n => Err(PasskeyError::MalformedSignature(format!(
            "unsupported length form with {n} octets"
        ))),
    }
}

fn read_integer<'a>(cursor: &mut ByteCursor<'a>, name: &str) -> Result<&'a [u8]> {
    expect_tag(cursor, TAG_INTEGER, &format!("INTEGER {name}"))?;
    let len = read_length(cursor)?;
    if len == 0 {
        return Err(PasskeyError::MalformedSignature(format!("INTEGER {name} is empty")));
    }
    cursor
        .take(len)
        .map_err(|e| PasskeyError::MalformedSignature(format!("INTEGER {name}: {e}")))
}

//! Minimal DER Codec
//!
//! Only the productions an EC key needs: SEQUENCE, INTEGER, OCTET STRING,
//! OBJECT IDENTIFIER, BIT STRING and the `[n]` context-specific
//! constructed tags. Every `remove_*` function returns the parsed value
//! together with the bytes that follow it so callers can insist on an
//! exact fit.

use num_bigint::{BigInt, Sign};
use num_traits::One;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::curves::Curve;
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::error::SignerResult;

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_BIT_STRING: u8 = 0x03;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_OBJECT: u8 = 0x06;
pub const TAG_SEQUENCE: u8 = 0x30;
const TAG_CONSTRUCTED: u8 = 0xa0;

/// id-ecPublicKey, 1.2.840.10045.2.1
pub const EC_PUBLIC_KEY_OID: &[u64] = &[1, 2, 840, 10045, 2, 1];

/// ECPrivateKey version field
const EC_PRIVATE_KEY_VERSION: u8 = 1;

/// DER decoding failures, named after the production that broke
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerError {
    #[error("{production}: expected tag 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedTag {
        production: &'static str,
        expected: u8,
        found: u8,
    },

    #[error("{0}: input truncated")]
    Truncated(&'static str),

    #[error("invalid DER length encoding")]
    InvalidLength,

    #[error("{production}: {count} trailing bytes")]
    TrailingBytes {
        production: &'static str,
        count: usize,
    },

    #[error("unsupported ECPrivateKey version {0}")]
    UnexpectedVersion(BigInt),

    #[error("expected context tag [{expected}], found [{found}]")]
    UnexpectedContextTag { expected: u8, found: u8 },

    #[error("unknown curve OID {0}")]
    UnknownCurve(String),

    #[error("malformed OBJECT IDENTIFIER")]
    InvalidOid,

    #[error("negative INTEGER where a non-negative value is required")]
    NegativeInteger,

    #[error("malformed BIT STRING")]
    InvalidBitString,

    #[error("secret is {len} bytes, curve width is {width}")]
    OversizedSecret { len: usize, width: usize },

    #[error("embedded public key does not match the private key")]
    PublicKeyMismatch,
}

// MARK: - Encoding

pub fn encode_length(length: usize) -> Vec<u8> {
    if length < 0x80 {
        return vec![length as u8];
    }
    let bytes: Vec<u8> = length
        .to_be_bytes()
        .iter()
        .copied()
        .skip_while(|b| *b == 0)
        .collect();
    let mut out = Vec::with_capacity(bytes.len() + 1);
    out.push(0x80 | bytes.len() as u8);
    out.extend(bytes);
    out
}

fn encode_tlv(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend(encode_length(body.len()));
    out.extend_from_slice(body);
    out
}

pub fn encode_sequence(parts: &[&[u8]]) -> Vec<u8> {
    encode_tlv(TAG_SEQUENCE, &parts.concat())
}

/// Non-negative INTEGER, with a leading zero when the high bit is set
pub fn encode_integer(value: &BigInt) -> Vec<u8> {
    let (_, mut bytes) = value.to_bytes_be();
    if bytes.is_empty() {
        bytes.push(0);
    }
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    encode_tlv(TAG_INTEGER, &bytes)
}

pub fn encode_octet_string(bytes: &[u8]) -> Vec<u8> {
    encode_tlv(TAG_OCTET_STRING, bytes)
}

pub fn encode_oid(oid: &[u64]) -> Vec<u8> {
    let mut body = Vec::new();
    if oid.len() >= 2 {
        encode_base128(oid[0] * 40 + oid[1], &mut body);
        for arc in &oid[2..] {
            encode_base128(*arc, &mut body);
        }
    }
    encode_tlv(TAG_OBJECT, &body)
}

fn encode_base128(mut value: u64, out: &mut Vec<u8>) {
    let mut groups = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value > 0 {
        groups.push(0x80 | (value & 0x7f) as u8);
        value >>= 7;
    }
    groups.reverse();
    out.extend(groups);
}

/// BIT STRING of whole bytes (zero unused bits)
pub fn encode_bit_string(bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 1);
    body.push(0x00);
    body.extend_from_slice(bytes);
    encode_tlv(TAG_BIT_STRING, &body)
}

/// Context-specific constructed `[tag]`
pub fn encode_constructed(tag: u8, body: &[u8]) -> Vec<u8> {
    encode_tlv(TAG_CONSTRUCTED | tag, body)
}

// MARK: - Decoding

/// Parse a length field, returning the length and the bytes it occupied
fn read_length(bytes: &[u8]) -> Result<(usize, usize), DerError> {
    let first = *bytes.first().ok_or(DerError::Truncated("length"))?;
    if first < 0x80 {
        return Ok((first as usize, 1));
    }
    let count = (first & 0x7f) as usize;
    if count == 0 || count > std::mem::size_of::<u32>() {
        return Err(DerError::InvalidLength);
    }
    let encoded = bytes.get(1..=count).ok_or(DerError::Truncated("length"))?;
    if encoded[0] == 0 {
        return Err(DerError::InvalidLength);
    }
    let length = encoded.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);
    if length < 0x80 {
        return Err(DerError::InvalidLength);
    }
    Ok((length, 1 + count))
}

/// Split one element off the front: `(tag, body, rest)`
fn split_tlv<'a>(
    bytes: &'a [u8],
    production: &'static str,
) -> Result<(u8, &'a [u8], &'a [u8]), DerError> {
    let tag = *bytes.first().ok_or(DerError::Truncated(production))?;
    let (length, consumed) = read_length(&bytes[1..])?;
    let start = 1 + consumed;
    let end = start.checked_add(length).ok_or(DerError::InvalidLength)?;
    let body = bytes.get(start..end).ok_or(DerError::Truncated(production))?;
    Ok((tag, body, &bytes[end..]))
}

fn remove_tlv<'a>(
    bytes: &'a [u8],
    expected: u8,
    production: &'static str,
) -> Result<(&'a [u8], &'a [u8]), DerError> {
    let (found, body, rest) = split_tlv(bytes, production)?;
    if found != expected {
        return Err(DerError::UnexpectedTag {
            production,
            expected,
            found,
        });
    }
    Ok((body, rest))
}

/// Fail unless `rest` is empty
pub fn expect_end(rest: &[u8], production: &'static str) -> Result<(), DerError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(DerError::TrailingBytes {
            production,
            count: rest.len(),
        })
    }
}

pub fn remove_sequence(bytes: &[u8]) -> Result<(&[u8], &[u8]), DerError> {
    remove_tlv(bytes, TAG_SEQUENCE, "SEQUENCE")
}

pub fn remove_integer(bytes: &[u8]) -> Result<(BigInt, &[u8]), DerError> {
    let (body, rest) = remove_tlv(bytes, TAG_INTEGER, "INTEGER")?;
    if body.is_empty() {
        return Err(DerError::Truncated("INTEGER"));
    }
    if body[0] & 0x80 != 0 {
        return Err(DerError::NegativeInteger);
    }
    Ok((BigInt::from_bytes_be(Sign::Plus, body), rest))
}

pub fn remove_octet_string(bytes: &[u8]) -> Result<(&[u8], &[u8]), DerError> {
    remove_tlv(bytes, TAG_OCTET_STRING, "OCTET STRING")
}

pub fn remove_object(bytes: &[u8]) -> Result<(Vec<u64>, &[u8]), DerError> {
    let (body, rest) = remove_tlv(bytes, TAG_OBJECT, "OBJECT IDENTIFIER")?;
    if body.is_empty() {
        return Err(DerError::InvalidOid);
    }

    let mut arcs = Vec::new();
    let mut value: u64 = 0;
    for (i, byte) in body.iter().enumerate() {
        if value > u64::MAX >> 7 {
            return Err(DerError::InvalidOid);
        }
        value = (value << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 != 0 {
            if i == body.len() - 1 {
                return Err(DerError::InvalidOid);
            }
            continue;
        }
        if arcs.is_empty() {
            let first = (value / 40).min(2);
            arcs.push(first);
            arcs.push(value - first * 40);
        } else {
            arcs.push(value);
        }
        value = 0;
    }
    Ok((arcs, rest))
}

/// BIT STRING with zero unused bits, returning the payload bytes
pub fn remove_bit_string(bytes: &[u8]) -> Result<(&[u8], &[u8]), DerError> {
    let (body, rest) = remove_tlv(bytes, TAG_BIT_STRING, "BIT STRING")?;
    match body.split_first() {
        Some((0, payload)) => Ok((payload, rest)),
        _ => Err(DerError::InvalidBitString),
    }
}

/// Context-specific constructed element: `(tag number, body, rest)`
pub fn remove_constructed(bytes: &[u8]) -> Result<(u8, &[u8], &[u8]), DerError> {
    let (tag, body, rest) = split_tlv(bytes, "context-specific")?;
    if tag & 0xe0 != TAG_CONSTRUCTED {
        return Err(DerError::UnexpectedTag {
            production: "context-specific",
            expected: TAG_CONSTRUCTED,
            found: tag,
        });
    }
    Ok((tag & 0x1f, body, rest))
}

pub fn oid_to_string(oid: &[u64]) -> String {
    oid.iter()
        .map(|arc| arc.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn curve_for_oid(oid: &[u64]) -> Result<&'static Curve, DerError> {
    Curve::by_oid(oid).ok_or_else(|| DerError::UnknownCurve(oid_to_string(oid)))
}

// MARK: - EC productions

/// `ECPrivateKey ::= SEQUENCE { 1, secret, [0] curve OID, [1] public key }`
pub fn encode_private_key(key: &PrivateKey) -> SignerResult<Zeroizing<Vec<u8>>> {
    let curve = key.curve();
    let version = encode_integer(&BigInt::from(EC_PRIVATE_KEY_VERSION));
    let secret = Zeroizing::new(encode_octet_string(&key.to_bytes()));
    let parameters = encode_constructed(0, &encode_oid(curve.oid));
    let public_key = encode_constructed(
        1,
        &encode_bit_string(&key.public_key()?.to_bytes(true)),
    );

    let body = Zeroizing::new(
        [
            version.as_slice(),
            secret.as_slice(),
            parameters.as_slice(),
            public_key.as_slice(),
        ]
        .concat(),
    );
    Ok(Zeroizing::new(encode_tlv(TAG_SEQUENCE, &body)))
}

/// Strict inverse of [`encode_private_key`]. Short secrets are left-padded;
/// an embedded public key, when present, must match the secret.
pub fn decode_private_key(bytes: &[u8]) -> SignerResult<PrivateKey> {
    let (body, rest) = remove_sequence(bytes)?;
    expect_end(rest, "ECPrivateKey")?;

    let (version, rest) = remove_integer(body)?;
    if version != BigInt::one() {
        return Err(DerError::UnexpectedVersion(version).into());
    }

    let (secret, rest) = remove_octet_string(rest)?;

    let (tag, parameters, rest) = remove_constructed(rest)?;
    if tag != 0 {
        return Err(DerError::UnexpectedContextTag {
            expected: 0,
            found: tag,
        }
        .into());
    }
    let (oid, trailing) = remove_object(parameters)?;
    expect_end(trailing, "curve parameters")?;
    let curve = curve_for_oid(&oid)?;

    if secret.len() > curve.length() {
        return Err(DerError::OversizedSecret {
            len: secret.len(),
            width: curve.length(),
        }
        .into());
    }
    let key = PrivateKey::from_bytes(secret, curve)?;

    if !rest.is_empty() {
        let (tag, embedded, trailing) = remove_constructed(rest)?;
        if tag != 1 {
            return Err(DerError::UnexpectedContextTag {
                expected: 1,
                found: tag,
            }
            .into());
        }
        expect_end(trailing, "ECPrivateKey")?;
        let (point, trailing) = remove_bit_string(embedded)?;
        expect_end(trailing, "public key")?;
        if PublicKey::from_bytes(point, curve)? != key.public_key()? {
            return Err(DerError::PublicKeyMismatch.into());
        }
    }

    Ok(key)
}

/// `SubjectPublicKeyInfo` with `id-ecPublicKey` and an uncompressed point
pub fn encode_public_key(key: &PublicKey) -> Vec<u8> {
    let algorithm = encode_sequence(&[
        &encode_oid(EC_PUBLIC_KEY_OID),
        &encode_oid(key.curve().oid),
    ]);
    encode_sequence(&[&algorithm, &encode_bit_string(&key.to_bytes(false))])
}

pub fn decode_public_key(bytes: &[u8]) -> SignerResult<PublicKey> {
    let (body, rest) = remove_sequence(bytes)?;
    expect_end(rest, "SubjectPublicKeyInfo")?;

    let (algorithm, rest) = remove_sequence(body)?;
    let (point, trailing) = remove_bit_string(rest)?;
    expect_end(trailing, "SubjectPublicKeyInfo")?;

    let (algorithm_oid, parameters) = remove_object(algorithm)?;
    if algorithm_oid != EC_PUBLIC_KEY_OID {
        return Err(DerError::UnknownCurve(oid_to_string(&algorithm_oid)).into());
    }
    let (curve_oid, trailing) = remove_object(parameters)?;
    expect_end(trailing, "AlgorithmIdentifier")?;
    let curve = curve_for_oid(&curve_oid)?;

    PublicKey::from_bytes(point, curve)
}

/// `SEQUENCE { r INTEGER, s INTEGER }`
pub fn encode_signature(r: &BigInt, s: &BigInt) -> Vec<u8> {
    encode_sequence(&[&encode_integer(r), &encode_integer(s)])
}

pub fn decode_signature(bytes: &[u8]) -> Result<(BigInt, BigInt), DerError> {
    let (body, rest) = remove_sequence(bytes)?;
    expect_end(rest, "ECDSA-Sig-Value")?;
    let (r, rest) = remove_integer(body)?;
    let (s, rest) = remove_integer(rest)?;
    expect_end(rest, "ECDSA-Sig-Value")?;
    Ok((r, s))
}

//! Compact (recoverable) signatures
//!
//! Layout: `header ∥ r ∥ s`, with r and s fixed-width big-endian. The
//! header is `27 + recovery_id`, plus 4 when the signer's address uses a
//! compressed public key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};

use crate::crypto::curves::Curve;
use crate::crypto::ecdsa::Signature;
use crate::crypto::keys::to_fixed_width;
use crate::error::{SignerError, SignerResult};

/// Header of an uncompressed-key signature with recovery id 0
pub const HEADER_BASE: u8 = 27;
/// Added to the header when the address uses a compressed key
pub const COMPRESSED_OFFSET: u8 = 4;
/// First header value past the valid range
pub const HEADER_END: u8 = HEADER_BASE + 2 * COMPRESSED_OFFSET;
/// Recovery ids run over `0..MAX_RECOVERY_ID`
pub const MAX_RECOVERY_ID: u8 = 4;

/// Parsed header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub recovery_id: u8,
    pub compressed: bool,
}

impl Header {
    pub fn new(recovery_id: u8, compressed: bool) -> SignerResult<Self> {
        if recovery_id >= MAX_RECOVERY_ID {
            return Err(SignerError::range(format!(
                "recovery id {} out of range 0..{}",
                recovery_id, MAX_RECOVERY_ID
            )));
        }
        Ok(Self {
            recovery_id,
            compressed,
        })
    }

    pub fn to_byte(self) -> u8 {
        let offset = if self.compressed { COMPRESSED_OFFSET } else { 0 };
        HEADER_BASE + offset + self.recovery_id
    }

    /// Decode a header byte; valid values are `27..35`
    pub fn from_byte(byte: u8) -> SignerResult<Self> {
        if !(HEADER_BASE..HEADER_END).contains(&byte) {
            return Err(SignerError::range(format!(
                "header byte {} outside [{}, {})",
                byte, HEADER_BASE, HEADER_END
            )));
        }
        let compressed = byte >= HEADER_BASE + COMPRESSED_OFFSET;
        let offset = if compressed { COMPRESSED_OFFSET } else { 0 };
        Ok(Self {
            recovery_id: byte - HEADER_BASE - offset,
            compressed,
        })
    }
}

/// A signature with the header needed to recover its public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactSignature {
    pub header: Header,
    pub signature: Signature,
}

impl CompactSignature {
    pub fn new(signature: Signature, header: Header) -> Self {
        Self { header, signature }
    }

    /// Encoded length for `curve`: one header byte plus two scalars
    pub fn encoded_len(curve: &Curve) -> usize {
        1 + 2 * curve.length()
    }

    pub fn to_bytes(&self, curve: &Curve) -> Vec<u8> {
        let width = curve.length();
        let mut out = Vec::with_capacity(Self::encoded_len(curve));
        out.push(self.header.to_byte());
        out.extend(to_fixed_width(&self.signature.r, width));
        out.extend(to_fixed_width(&self.signature.s, width));
        out
    }

    /// Parse `header ∥ r ∥ s`
    ///
    /// A wrong length is a `FormatError`; a header outside `[27, 35)` is a
    /// `RangeError`. Range checks on r and s are left to verification.
    pub fn from_bytes(bytes: &[u8], curve: &Curve) -> SignerResult<Self> {
        let expected = Self::encoded_len(curve);
        if bytes.len() != expected {
            return Err(SignerError::format(format!(
                "compact signature is {} bytes, expected {}",
                bytes.len(),
                expected
            )));
        }
        let header = Header::from_byte(bytes[0])?;
        let width = curve.length();
        let r = BigInt::from_bytes_be(Sign::Plus, &bytes[1..=width]);
        let s = BigInt::from_bytes_be(Sign::Plus, &bytes[width + 1..]);
        Ok(Self {
            header,
            signature: Signature::new(r, s),
        })
    }

    pub fn to_base64(&self, curve: &Curve) -> String {
        STANDARD.encode(self.to_bytes(curve))
    }

    pub fn from_base64(text: &str, curve: &Curve) -> SignerResult<Self> {
        let bytes = STANDARD.decode(text.trim())?;
        Self::from_bytes(&bytes, curve)
    }
}

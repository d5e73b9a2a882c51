//! Base58Check: WIF private keys and P2PKH addresses
//!
//! Payload layout is `version ∥ data ∥ checksum` where the checksum is the
//! first four bytes of double SHA-256 over `version ∥ data`.

use zeroize::Zeroizing;

use crate::crypto::curves::Curve;
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::error::{SignerError, SignerResult};
use crate::log_debug;
use crate::utils::{checksum, checksums_match, hash160};

const MODULE: &str = "base58check";

/// Mainnet WIF version byte
pub const WIF_VERSION: u8 = 0x80;
/// Mainnet P2PKH version byte
pub const P2PKH_VERSION: u8 = 0x00;
/// Trailing WIF byte marking a compressed public key
pub const COMPRESSION_MARKER: u8 = 0x01;

const CHECKSUM_LEN: usize = 4;
const SECRET_LEN: usize = 32;
/// version + secret + checksum
const WIF_UNCOMPRESSED_LEN: usize = 1 + SECRET_LEN + CHECKSUM_LEN;
const WIF_COMPRESSED_LEN: usize = WIF_UNCOMPRESSED_LEN + 1;
const ADDRESS_LEN: usize = 1 + 20 + CHECKSUM_LEN;

/// A decoded WIF key and the compression flag it was exported with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifKey {
    pub key: PrivateKey,
    pub compressed: bool,
}

impl WifKey {
    /// The P2PKH address this WIF key controls
    pub fn address(&self) -> SignerResult<String> {
        Ok(self.key.public_key()?.address(self.compressed))
    }
}

/// Append the checksum and Base58-encode
pub fn encode_check(payload: &[u8]) -> String {
    let mut data = Zeroizing::new(Vec::with_capacity(payload.len() + CHECKSUM_LEN));
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum(payload));
    bs58::encode(data.as_slice()).into_string()
}

/// Base58-decode and verify the checksum, returning the payload
pub fn decode_check(encoded: &str) -> SignerResult<Zeroizing<Vec<u8>>> {
    let raw = Zeroizing::new(bs58::decode(encoded).into_vec()?);
    if raw.len() <= CHECKSUM_LEN {
        return Err(SignerError::format(format!(
            "Base58Check string decodes to {} bytes",
            raw.len()
        )));
    }
    let (payload, actual) = raw.split_at(raw.len() - CHECKSUM_LEN);
    let expected = checksum(payload);
    if !checksums_match(&expected, actual) {
        return Err(SignerError::checksum("Base58Check checksum mismatch").with_details(
            format!("expected {}, got {}", hex::encode(expected), hex::encode(actual)),
        ));
    }
    Ok(Zeroizing::new(payload.to_vec()))
}

/// `0x80 ∥ secret [∥ 0x01]`, Base58Check encoded
pub fn encode_wif(key: &PrivateKey, compressed: bool) -> Zeroizing<String> {
    let mut payload = Zeroizing::new(Vec::with_capacity(WIF_COMPRESSED_LEN));
    payload.push(WIF_VERSION);
    payload.extend_from_slice(&key.to_bytes());
    if compressed {
        payload.push(COMPRESSION_MARKER);
    }
    Zeroizing::new(encode_check(&payload))
}

/// Decode a mainnet WIF key. The leading character selects the layout:
/// `5` for uncompressed, `K`/`L` for compressed. The byte following a
/// compressed key's secret is not required to be `0x01`.
pub fn decode_wif(wif: &str) -> SignerResult<WifKey> {
    let wif = wif.trim();
    let (expected_len, compressed) = match wif.chars().next() {
        Some('5') => (WIF_UNCOMPRESSED_LEN, false),
        Some('K') | Some('L') => (WIF_COMPRESSED_LEN, true),
        _ => {
            return Err(SignerError::format(
                "WIF key must start with 5, K or L",
            ))
        }
    };

    let raw = Zeroizing::new(bs58::decode(wif).into_vec()?);
    if raw.len() != expected_len {
        return Err(SignerError::format(format!(
            "WIF key decodes to {} bytes, expected {}",
            raw.len(),
            expected_len
        )));
    }

    let payload = decode_check(wif)?;
    if payload[0] != WIF_VERSION {
        return Err(SignerError::format(format!(
            "unexpected WIF version byte 0x{:02x}",
            payload[0]
        )));
    }
    // K/L keys carry one byte after the secret; only its presence matters
    if compressed && payload[1 + SECRET_LEN] != COMPRESSION_MARKER {
        log_debug!(
            MODULE,
            "Non-standard WIF compression byte",
            marker = format!("0x{:02x}", payload[1 + SECRET_LEN])
        );
    }

    let key = PrivateKey::from_bytes(&payload[1..=SECRET_LEN], Curve::secp256k1())?;
    Ok(WifKey { key, compressed })
}

/// P2PKH address: `0x00 ∥ HASH160(SEC1 public key)`, Base58Check encoded
pub fn address_from_public_key(key: &PublicKey, compressed: bool) -> String {
    let mut payload = Vec::with_capacity(ADDRESS_LEN - CHECKSUM_LEN);
    payload.push(P2PKH_VERSION);
    payload.extend_from_slice(&hash160(&key.to_bytes(compressed)));
    encode_check(&payload)
}

/// Decode a P2PKH address into its 20-byte public key hash
pub fn decode_address(address: &str) -> SignerResult<[u8; 20]> {
    let payload = decode_check(address.trim())?;
    if payload.len() != ADDRESS_LEN - CHECKSUM_LEN {
        return Err(SignerError::format(format!(
            "address payload is {} bytes, expected {}",
            payload.len(),
            ADDRESS_LEN - CHECKSUM_LEN
        )));
    }
    if payload[0] != P2PKH_VERSION {
        return Err(SignerError::format(format!(
            "unsupported address version 0x{:02x}",
            payload[0]
        )));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok(hash)
}

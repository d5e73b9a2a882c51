//! ECDSA over a `Curve`
//!
//! Textbook signing and verification on integer digests. The digest is the
//! caller's business (the signed-message layer feeds double SHA-256);
//! `hash_to_int` truncates oversized digests to the order's bit length.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use num_bigint::{BigInt, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use super::curves::{math, Curve, Point};
use super::keys::{PrivateKey, PublicKey};
use crate::codec::der;
use crate::error::SignerResult;

/// An `(r, s)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub r: BigInt,
    pub s: BigInt,
}

impl Signature {
    pub fn new(r: BigInt, s: BigInt) -> Self {
        Self { r, s }
    }

    /// Both components in `[1, N-1]`
    pub fn is_in_range(&self, curve: &Curve) -> bool {
        curve.is_valid_scalar(&self.r) && curve.is_valid_scalar(&self.s)
    }

    /// `SEQUENCE { r INTEGER, s INTEGER }`
    pub fn to_der(&self) -> Vec<u8> {
        der::encode_signature(&self.r, &self.s)
    }

    pub fn from_der(bytes: &[u8]) -> SignerResult<Self> {
        let (r, s) = der::decode_signature(bytes)?;
        Ok(Self { r, s })
    }

    /// Base64 of the DER encoding
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_der())
    }

    pub fn from_base64(text: &str) -> SignerResult<Self> {
        Self::from_der(&STANDARD.decode(text.trim())?)
    }
}

/// Leftmost `bits(N)` bits of `digest` as an integer
pub fn hash_to_int(digest: &[u8], curve: &Curve) -> BigInt {
    let e = BigInt::from_bytes_be(Sign::Plus, digest);
    let excess = (digest.len() as u64 * 8).saturating_sub(curve.n.bits());
    e >> excess
}

/// Sign `hash` with a fresh nonce from `rng`, redrawing on `r = 0` or `s = 0`
pub fn sign<R: RngCore + CryptoRng>(
    hash: &BigInt,
    key: &PrivateKey,
    rng: &mut R,
) -> SignerResult<Signature> {
    let curve = key.curve();
    loop {
        let nonce = rng.gen_bigint_range(&BigInt::one(), &curve.n);
        if let Some(signature) = sign_with_nonce(hash, key, &nonce)? {
            return Ok(signature);
        }
    }
}

/// One signing attempt with a fixed nonce; `None` when the nonce is
/// degenerate for this hash and key
pub(crate) fn sign_with_nonce(
    hash: &BigInt,
    key: &PrivateKey,
    nonce: &BigInt,
) -> SignerResult<Option<Signature>> {
    let curve = key.curve();
    let point = math::multiply(&curve.g, nonce, curve)?;
    let r = match point.x() {
        Some(x) => x.mod_floor(&curve.n),
        None => return Ok(None),
    };
    if r.is_zero() {
        return Ok(None);
    }

    let k_inv = math::mod_inverse(nonce, &curve.n)?;
    let s = (k_inv * (hash + &r * key.secret())).mod_floor(&curve.n);
    if s.is_zero() {
        return Ok(None);
    }
    Ok(Some(Signature { r, s }))
}

/// Check `signature` over `hash` against `public_key`
///
/// Out-of-range components are a plain `false`, not an error.
pub fn verify(hash: &BigInt, signature: &Signature, public_key: &PublicKey) -> SignerResult<bool> {
    let curve = public_key.curve();
    if !signature.is_in_range(curve) {
        return Ok(false);
    }

    let w = math::mod_inverse(&signature.s, &curve.n)?;
    let u1 = (hash * &w).mod_floor(&curve.n);
    let u2 = (&signature.r * &w).mod_floor(&curve.n);
    let point = math::multiply_add(&curve.g, &u1, &public_key.point(), &u2, curve)?;

    Ok(match point {
        Point::Infinity => false,
        Point::Affine { x, .. } => x.mod_floor(&curve.n) == signature.r,
    })
}

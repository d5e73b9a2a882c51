//! Private and Public Keys
//!
//! Immutable value types over a `Curve`. A private key is a scalar in
//! `[1, N-1]`; its public key is `secret · G`. Public keys are only built
//! from points that satisfy the curve equation.

use num_bigint::{BigInt, RandBigInt, Sign};
use num_traits::One;
use rand::{CryptoRng, RngCore};
use std::fmt;
use zeroize::Zeroizing;

use super::curves::{math, Curve, Point};
use crate::codec::{base58check, der, pem};
use crate::error::{SignerError, SignerResult};

/// PEM label of an EC private key
pub const PRIVATE_KEY_PEM_LABEL: &str = "EC PRIVATE KEY";
/// PEM label of a SubjectPublicKeyInfo
pub const PUBLIC_KEY_PEM_LABEL: &str = "PUBLIC KEY";

/// Private key: a secret scalar on a curve
///
/// Encodings come back as `Zeroizing` buffers; the scalar itself lives in a
/// plain `BigInt` and is not wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    secret: BigInt,
    curve: &'static Curve,
}

impl PrivateKey {
    /// Wrap a secret scalar, rejecting values outside `[1, N-1]`
    pub fn new(secret: BigInt, curve: &'static Curve) -> SignerResult<Self> {
        if !curve.is_valid_scalar(&secret) {
            return Err(SignerError::range(format!(
                "private key secret must be in [1, N-1] for {}",
                curve.name
            )));
        }
        Ok(Self { secret, curve })
    }

    /// Draw a secret uniformly from `[1, N-1]`
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, curve: &'static Curve) -> Self {
        let secret = rng.gen_bigint_range(&BigInt::one(), &curve.n);
        Self { secret, curve }
    }

    /// Big-endian secret bytes of any length up to the curve width
    pub fn from_bytes(bytes: &[u8], curve: &'static Curve) -> SignerResult<Self> {
        if bytes.len() > curve.length() {
            return Err(SignerError::format(format!(
                "private key is {} bytes, expected at most {}",
                bytes.len(),
                curve.length()
            )));
        }
        Self::new(BigInt::from_bytes_be(Sign::Plus, bytes), curve)
    }

    pub fn from_hex(hex_secret: &str, curve: &'static Curve) -> SignerResult<Self> {
        let bytes = Zeroizing::new(hex::decode(hex_secret.trim())?);
        Self::from_bytes(&bytes, curve)
    }

    /// Fixed-width big-endian secret
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(to_fixed_width(&self.secret, self.curve.length()))
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.to_bytes().as_slice()))
    }

    pub fn secret(&self) -> &BigInt {
        &self.secret
    }

    pub fn curve(&self) -> &'static Curve {
        self.curve
    }

    /// `secret · G`
    pub fn public_key(&self) -> SignerResult<PublicKey> {
        let point = math::multiply(&self.curve.g, &self.secret, self.curve)?;
        PublicKey::from_point(point, self.curve)
    }

    /// WIF export, with the compression marker when `compressed` is set
    pub fn to_wif(&self, compressed: bool) -> Zeroizing<String> {
        base58check::encode_wif(self, compressed)
    }

    /// DER `ECPrivateKey` carrying the curve OID and compressed public key
    pub fn to_der(&self) -> SignerResult<Zeroizing<Vec<u8>>> {
        der::encode_private_key(self)
    }

    pub fn from_der(bytes: &[u8]) -> SignerResult<Self> {
        der::decode_private_key(bytes)
    }

    pub fn to_pem(&self) -> SignerResult<Zeroizing<String>> {
        let der = self.to_der()?;
        Ok(Zeroizing::new(pem::to_pem(&der, PRIVATE_KEY_PEM_LABEL)))
    }

    /// Parse the `EC PRIVATE KEY` block, skipping anything before it
    pub fn from_pem(text: &str) -> SignerResult<Self> {
        let der = Zeroizing::new(pem::from_pem(text, PRIVATE_KEY_PEM_LABEL)?);
        Self::from_der(&der)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("secret", &"[REDACTED]")
            .field("curve", &self.curve.name)
            .finish()
    }
}

/// Public key: a finite point on a curve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    x: BigInt,
    y: BigInt,
    curve: &'static Curve,
}

impl PublicKey {
    /// Accept `point` only if it is finite and on `curve`
    pub fn from_point(point: Point, curve: &'static Curve) -> SignerResult<Self> {
        if !curve.contains(&point) {
            return Err(SignerError::range(format!(
                "point is not a valid {} public key",
                curve.name
            )));
        }
        match point {
            Point::Affine { x, y } => Ok(Self { x, y, curve }),
            Point::Infinity => Err(SignerError::range("public key cannot be the point at infinity")),
        }
    }

    /// Parse SEC1 compressed (33 bytes), uncompressed (65 bytes) or raw
    /// `x ∥ y` (64 bytes) encodings
    pub fn from_bytes(bytes: &[u8], curve: &'static Curve) -> SignerResult<Self> {
        let len = curve.length();
        let coord = |slice: &[u8]| BigInt::from_bytes_be(Sign::Plus, slice);

        let point = match (bytes.len(), bytes.first()) {
            (l, Some(0x02 | 0x03)) if l == len + 1 => {
                let x = coord(&bytes[1..]);
                let y = decompress_y(&x, bytes[0] == 0x03, curve)?;
                Point::affine(x, y)
            }
            (l, Some(0x04)) if l == 2 * len + 1 => {
                Point::affine(coord(&bytes[1..=len]), coord(&bytes[len + 1..]))
            }
            (l, _) if l == 2 * len => Point::affine(coord(&bytes[..len]), coord(&bytes[len..])),
            (l, _) => {
                return Err(SignerError::format(format!(
                    "unsupported public key encoding of {} bytes",
                    l
                )))
            }
        };
        Self::from_point(point, curve)
    }

    /// SEC1 encoding: `02/03 ∥ x` when compressed, else `04 ∥ x ∥ y`
    pub fn to_bytes(&self, compressed: bool) -> Vec<u8> {
        let len = self.curve.length();
        let mut out = Vec::with_capacity(2 * len + 1);
        if compressed {
            out.push(if math::is_odd(&self.y) { 0x03 } else { 0x02 });
            out.extend(to_fixed_width(&self.x, len));
        } else {
            out.push(0x04);
            out.extend(to_fixed_width(&self.x, len));
            out.extend(to_fixed_width(&self.y, len));
        }
        out
    }

    pub fn x(&self) -> &BigInt {
        &self.x
    }

    pub fn y(&self) -> &BigInt {
        &self.y
    }

    pub fn point(&self) -> Point {
        Point::affine(self.x.clone(), self.y.clone())
    }

    pub fn curve(&self) -> &'static Curve {
        self.curve
    }

    /// Base58Check P2PKH address of this key
    pub fn address(&self, compressed: bool) -> String {
        base58check::address_from_public_key(self, compressed)
    }

    /// DER SubjectPublicKeyInfo
    pub fn to_der(&self) -> Vec<u8> {
        der::encode_public_key(self)
    }

    pub fn from_der(bytes: &[u8]) -> SignerResult<Self> {
        der::decode_public_key(bytes)
    }

    pub fn to_pem(&self) -> String {
        pem::to_pem(&self.to_der(), PUBLIC_KEY_PEM_LABEL)
    }

    pub fn from_pem(text: &str) -> SignerResult<Self> {
        Self::from_der(&pem::from_pem(text, PUBLIC_KEY_PEM_LABEL)?)
    }
}

/// Recover y from x and the requested parity
fn decompress_y(x: &BigInt, odd: bool, curve: &Curve) -> SignerResult<BigInt> {
    if x >= &curve.p {
        return Err(SignerError::range("x coordinate is not a field element"));
    }
    let alpha = curve.curve_rhs(x);
    let beta = math::modular_sqrt(&alpha, &curve.p);
    if (&beta * &beta) % &curve.p != alpha {
        return Err(SignerError::range("x coordinate is not on the curve"));
    }
    if math::is_odd(&beta) == odd {
        Ok(beta)
    } else {
        Ok(&curve.p - &beta)
    }
}

/// Left-zero-padded big-endian bytes of a non-negative integer
pub fn to_fixed_width(value: &BigInt, width: usize) -> Vec<u8> {
    let (_, bytes) = value.to_bytes_be();
    if bytes.len() >= width {
        return bytes[bytes.len() - width..].to_vec();
    }
    let mut out = vec![0u8; width - bytes.len()];
    out.extend_from_slice(&bytes);
    out
}

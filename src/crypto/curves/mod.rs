//! Curve Parameters
//!
//! Short Weierstrass curves `y² = x³ + A·x + B (mod P)` with a base point
//! `G` of prime order `N`. Only secp256k1 is registered; the parameter set
//! is an immutable value passed to every operation that needs it.
//!
//! # Example
//!
//! ```rust,ignore
//! use btc_message_signer::crypto::curves::{math, SECP256K1};
//!
//! let curve = &*SECP256K1;
//! let two_g = math::multiply(&curve.g, &2.into(), curve)?;
//! assert!(curve.contains(&two_g));
//! ```

pub mod math;
pub mod point;

pub use point::Point;

use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

/// OID 1.3.132.0.10
pub const SECP256K1_OID: &[u64] = &[1, 3, 132, 0, 10];

lazy_static! {
    /// The secp256k1 parameter set
    pub static ref SECP256K1: Curve = Curve::new(
        "secp256k1",
        from_hex("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f"),
        from_hex("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"),
        BigInt::zero(),
        BigInt::from(7u8),
        Point::affine(
            from_hex("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"),
            from_hex("483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"),
        ),
        SECP256K1_OID,
    );
}

/// Elliptic curve parameter set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curve {
    pub name: &'static str,
    /// Field prime
    pub p: BigInt,
    /// Order of `g`
    pub n: BigInt,
    pub a: BigInt,
    pub b: BigInt,
    /// Base point
    pub g: Point,
    pub oid: &'static [u64],
}

impl Curve {
    pub fn new(
        name: &'static str,
        p: BigInt,
        n: BigInt,
        a: BigInt,
        b: BigInt,
        g: Point,
        oid: &'static [u64],
    ) -> Self {
        Self { name, p, n, a, b, g, oid }
    }

    /// The one supported curve
    pub fn secp256k1() -> &'static Curve {
        &*SECP256K1
    }

    /// Every registered curve
    pub fn supported() -> [&'static Curve; 1] {
        [&*SECP256K1]
    }

    /// Look up a registered curve by its object identifier
    pub fn by_oid(oid: &[u64]) -> Option<&'static Curve> {
        Self::supported().into_iter().find(|curve| curve.oid == oid)
    }

    /// Byte length of a scalar or coordinate
    pub fn length(&self) -> usize {
        (self.n.bits() as usize + 7) / 8
    }

    /// Whether `k` lies in `[1, N-1]`
    pub fn is_valid_scalar(&self, k: &BigInt) -> bool {
        k >= &BigInt::one() && k < &self.n
    }

    /// Whether `point` is a finite point satisfying the curve equation
    pub fn contains(&self, point: &Point) -> bool {
        match point {
            Point::Infinity => false,
            Point::Affine { x, y } => {
                if x < &BigInt::zero() || x >= &self.p || y < &BigInt::zero() || y >= &self.p {
                    return false;
                }
                (y * y - self.curve_rhs(x)).mod_floor(&self.p).is_zero()
            }
        }
    }

    /// `x³ + A·x + B (mod P)`
    pub fn curve_rhs(&self, x: &BigInt) -> BigInt {
        (x * x * x + &self.a * x + &self.b).mod_floor(&self.p)
    }
}

fn from_hex(hex: &str) -> BigInt {
    BigInt::parse_bytes(hex.as_bytes(), 16).expect("curve constant is valid hex")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_on_curve() {
        let curve = Curve::secp256k1();
        assert!(curve.contains(&curve.g));
        assert!(!curve.contains(&Point::Infinity));
        assert!(!curve.contains(&Point::affine(BigInt::from(1), BigInt::from(1))));
    }

    #[test]
    fn test_discriminant_nonzero() {
        let curve = Curve::secp256k1();
        let a = &curve.a;
        let disc = (BigInt::from(4) * a * a * a + BigInt::from(27) * &curve.b * &curve.b)
            .mod_floor(&curve.p);
        assert!(!disc.is_zero());
    }

    #[test]
    fn test_length_and_scalar_range() {
        let curve = Curve::secp256k1();
        assert_eq!(curve.length(), 32);
        assert!(!curve.is_valid_scalar(&BigInt::zero()));
        assert!(curve.is_valid_scalar(&BigInt::one()));
        assert!(curve.is_valid_scalar(&(&curve.n - BigInt::one())));
        assert!(!curve.is_valid_scalar(&curve.n));
    }

    #[test]
    fn test_by_oid() {
        assert_eq!(Curve::by_oid(&[1, 3, 132, 0, 10]).map(|c| c.name), Some("secp256k1"));
        assert!(Curve::by_oid(&[1, 2, 840, 10045, 3, 1, 7]).is_none());
    }
}

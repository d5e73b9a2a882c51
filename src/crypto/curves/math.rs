//! Field and Curve Arithmetic
//!
//! Modular helpers (inverse, Legendre symbol, square root) and the group
//! law. Scalar multiplication runs in Jacobian coordinates so that a single
//! field inversion is needed per call; the public functions take and
//! return affine points.
//!
//! None of this is constant time.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use super::{Curve, Point};
use crate::error::{SignerError, SignerResult};

/// Inverse of `a` modulo `m` by the extended Euclidean algorithm
///
/// Fails with `DegenerateKey` when `gcd(a, m) != 1`. For a prime modulus
/// that only happens for multiples of `m`.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> SignerResult<BigInt> {
    let a = a.mod_floor(m);
    if a.is_zero() {
        return Err(SignerError::degenerate_key("zero has no modular inverse"));
    }

    let (mut old_r, mut r) = (a, m.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    while !r.is_zero() {
        let q = old_r.div_floor(&r);
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return Err(SignerError::degenerate_key(format!(
            "value is not invertible, gcd with modulus is {}",
            old_r
        )));
    }
    Ok(old_s.mod_floor(m))
}

/// Legendre symbol `(a | p)` for an odd prime `p`: 1, -1 or 0
pub fn legendre_symbol(a: &BigInt, p: &BigInt) -> i8 {
    let exponent = (p - BigInt::one()) >> 1;
    let ls = a.mod_floor(p).modpow(&exponent, p);
    if ls.is_zero() {
        0
    } else if ls.is_one() {
        1
    } else {
        -1
    }
}

/// Square root of `a` modulo an odd prime `p`
///
/// Returns 0 when `a ≡ 0` or when `a` is not a quadratic residue. For
/// `p ≡ 3 (mod 4)` the closed form `a^((p+1)/4)` is used; other primes go
/// through Tonelli–Shanks.
pub fn modular_sqrt(a: &BigInt, p: &BigInt) -> BigInt {
    let a = a.mod_floor(p);
    if a.is_zero() || legendre_symbol(&a, p) != 1 {
        return BigInt::zero();
    }
    let two = BigInt::from(2u8);
    if p == &two {
        return a;
    }
    if (p % BigInt::from(4u8)) == BigInt::from(3u8) {
        let exponent = (p + BigInt::one()) >> 2;
        return a.modpow(&exponent, p);
    }

    // p - 1 = q · 2^e with q odd
    let mut q = p - BigInt::one();
    let mut e = 0u32;
    while q.is_even() {
        q >>= 1;
        e += 1;
    }

    // Any quadratic non-residue
    let mut z = two.clone();
    while legendre_symbol(&z, p) != -1 {
        z += 1u8;
    }

    let mut x = a.modpow(&((&q + BigInt::one()) >> 1), p);
    let mut b = a.modpow(&q, p);
    let mut g = z.modpow(&q, p);
    let mut r = e;

    loop {
        // Least m with b^(2^m) = 1
        let mut t = b.clone();
        let mut m = 0u32;
        while !t.is_one() {
            t = (&t * &t).mod_floor(p);
            m += 1;
            if m == r {
                return BigInt::zero();
            }
        }
        if m == 0 {
            return x;
        }

        let gs = g.modpow(&(BigInt::one() << (r - m - 1) as usize), p);
        g = (&gs * &gs).mod_floor(p);
        x = (&x * &gs).mod_floor(p);
        b = (&b * &g).mod_floor(p);
        r = m;
    }
}

/// Point in Jacobian coordinates, `(X, Y, Z) ~ (X/Z², Y/Z³)`; `Z = 0` is
/// the point at infinity
#[derive(Debug, Clone)]
struct Jacobian {
    x: BigInt,
    y: BigInt,
    z: BigInt,
}

impl Jacobian {
    fn infinity() -> Self {
        Self {
            x: BigInt::one(),
            y: BigInt::one(),
            z: BigInt::zero(),
        }
    }

    fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    fn from_affine(point: &Point) -> Self {
        match point {
            Point::Infinity => Self::infinity(),
            Point::Affine { x, y } => Self {
                x: x.clone(),
                y: y.clone(),
                z: BigInt::one(),
            },
        }
    }

    fn to_affine(&self, p: &BigInt) -> SignerResult<Point> {
        if self.is_infinity() {
            return Ok(Point::Infinity);
        }
        let z_inv = mod_inverse(&self.z, p)?;
        let z_inv2 = (&z_inv * &z_inv).mod_floor(p);
        let x = (&self.x * &z_inv2).mod_floor(p);
        let y = (&self.y * &z_inv2 * &z_inv).mod_floor(p);
        Ok(Point::affine(x, y))
    }

    fn double(&self, curve: &Curve) -> Self {
        let p = &curve.p;
        if self.is_infinity() || self.y.is_zero() {
            return Self::infinity();
        }

        let ysq = (&self.y * &self.y).mod_floor(p);
        let s = (BigInt::from(4u8) * &self.x * &ysq).mod_floor(p);
        let z2 = (&self.z * &self.z).mod_floor(p);
        let m = (BigInt::from(3u8) * &self.x * &self.x + &curve.a * &z2 * &z2).mod_floor(p);
        let nx = (&m * &m - BigInt::from(2u8) * &s).mod_floor(p);
        let ny = (&m * (&s - &nx) - BigInt::from(8u8) * &ysq * &ysq).mod_floor(p);
        let nz = (BigInt::from(2u8) * &self.y * &self.z).mod_floor(p);
        Self { x: nx, y: ny, z: nz }
    }

    fn add(&self, other: &Self, curve: &Curve) -> Self {
        let p = &curve.p;
        if self.is_infinity() {
            return other.clone();
        }
        if other.is_infinity() {
            return self.clone();
        }

        let z1z1 = (&self.z * &self.z).mod_floor(p);
        let z2z2 = (&other.z * &other.z).mod_floor(p);
        let u1 = (&self.x * &z2z2).mod_floor(p);
        let u2 = (&other.x * &z1z1).mod_floor(p);
        let s1 = (&self.y * &z2z2 * &other.z).mod_floor(p);
        let s2 = (&other.y * &z1z1 * &self.z).mod_floor(p);

        if u1 == u2 {
            if s1 != s2 {
                return Self::infinity();
            }
            return self.double(curve);
        }

        let h = (&u2 - &u1).mod_floor(p);
        let r = (&s2 - &s1).mod_floor(p);
        let h2 = (&h * &h).mod_floor(p);
        let h3 = (&h * &h2).mod_floor(p);
        let u1h2 = (&u1 * &h2).mod_floor(p);
        let nx = (&r * &r - &h3 - BigInt::from(2u8) * &u1h2).mod_floor(p);
        let ny = (&r * (&u1h2 - &nx) - &s1 * &h3).mod_floor(p);
        let nz = (&h * &self.z * &other.z).mod_floor(p);
        Self { x: nx, y: ny, z: nz }
    }

    fn multiply(&self, scalar: &BigInt, curve: &Curve) -> Self {
        if self.is_infinity() || scalar.is_zero() {
            return Self::infinity();
        }

        let mut acc = Self::infinity();
        for byte in scalar.magnitude().to_bytes_be() {
            for bit in (0..8).rev() {
                acc = acc.double(curve);
                if (byte >> bit) & 1 == 1 {
                    acc = acc.add(self, curve);
                }
            }
        }
        acc
    }
}

/// `p1 + p2`
pub fn add(p1: &Point, p2: &Point, curve: &Curve) -> SignerResult<Point> {
    Jacobian::from_affine(p1)
        .add(&Jacobian::from_affine(p2), curve)
        .to_affine(&curve.p)
}

/// `2 · point`
pub fn double(point: &Point, curve: &Curve) -> SignerResult<Point> {
    Jacobian::from_affine(point).double(curve).to_affine(&curve.p)
}

/// `-point`
pub fn negate(point: &Point, curve: &Curve) -> Point {
    match point {
        Point::Infinity => Point::Infinity,
        Point::Affine { x, y } => Point::affine(x.clone(), (-y).mod_floor(&curve.p)),
    }
}

/// `k · point` by double-and-add
///
/// `k` is reduced modulo the curve order first, so negative scalars act as
/// `(k mod N) · point` and `k ≡ 0` yields the point at infinity.
pub fn multiply(point: &Point, k: &BigInt, curve: &Curve) -> SignerResult<Point> {
    let k = k.mod_floor(&curve.n);
    Jacobian::from_affine(point)
        .multiply(&k, curve)
        .to_affine(&curve.p)
}

/// `u1 · p1 + u2 · p2` with a single conversion back to affine
pub fn multiply_add(
    p1: &Point,
    u1: &BigInt,
    p2: &Point,
    u2: &BigInt,
    curve: &Curve,
) -> SignerResult<Point> {
    let a = Jacobian::from_affine(p1).multiply(&u1.mod_floor(&curve.n), curve);
    let b = Jacobian::from_affine(p2).multiply(&u2.mod_floor(&curve.n), curve);
    a.add(&b, curve).to_affine(&curve.p)
}

/// Whether `value` is odd; used for y-parity decisions
pub fn is_odd(value: &BigInt) -> bool {
    value.abs().is_odd()
}

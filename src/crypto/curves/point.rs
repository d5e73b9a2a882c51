//! Curve points in affine form

use num_bigint::BigInt;
use std::fmt;

/// A point on a short Weierstrass curve, or the identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Point {
    /// Point at infinity (additive identity)
    Infinity,
    Affine { x: BigInt, y: BigInt },
}

impl Point {
    pub fn affine(x: BigInt, y: BigInt) -> Self {
        Point::Affine { x, y }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    pub fn x(&self) -> Option<&BigInt> {
        match self {
            Point::Infinity => None,
            Point::Affine { x, .. } => Some(x),
        }
    }

    pub fn y(&self) -> Option<&BigInt> {
        match self {
            Point::Infinity => None,
            Point::Affine { y, .. } => Some(y),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Point::Infinity => write!(f, "Point(infinity)"),
            Point::Affine { x, y } => write!(f, "Point({:x}, {:x})", x, y),
        }
    }
}

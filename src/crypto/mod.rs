//! Cryptographic primitives
//!
//! - Curve parameters and point arithmetic (`curves`)
//! - Private and public key values (`keys`)
//! - ECDSA signing and verification (`ecdsa`)

pub mod curves;
pub mod ecdsa;
pub mod keys;

pub use curves::{Curve, Point, SECP256K1};
pub use ecdsa::Signature;
pub use keys::{PrivateKey, PublicKey};

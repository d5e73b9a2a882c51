//! Bitcoin Message Signer
//!
//! secp256k1 ECDSA with Bitcoin "Signed Message" compact signatures.
//!
//! # Architecture
//!
//! This crate provides:
//! - **crypto**: Curve arithmetic, private/public keys, ECDSA
//! - **codec**: DER/PEM key files, Base58Check WIF keys and addresses
//! - **message_signer**: Message wrapping, compact signatures, public key
//!   recovery, sign and verify
//! - **wallet**: The public entry points (generate, sign, verify, address,
//!   PEM export)
//! - **utils**: Hashing, configuration, redacting logger
//!
//! # Security
//!
//! Encoded private key material (secret bytes, WIF strings, DER and PEM
//! bodies) is returned in `zeroize` buffers and cleared on drop. The
//! `BigInt` scalar inside a `PrivateKey` is not wiped. Curve arithmetic is
//! not constant-time.
//!
//! # Example
//!
//! ```rust,ignore
//! use btc_message_signer::wallet;
//!
//! let pair = wallet::generate_key_pair()?;
//! let signature = wallet::sign("hello", &pair.private_key, &pair.address)?;
//! let outcome = wallet::verify_message(&signature, "hello", &pair.address)?;
//! assert!(outcome.verified);
//! ```

pub mod codec;
pub mod crypto;
pub mod error;
pub mod message_signer;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use error::{ErrorCode, SignerError, SignerResult};
pub use types::*;

pub use codec::WifKey;
pub use crypto::{Curve, Point, PrivateKey, PublicKey, Signature};
pub use message_signer::{CompactSignature, MessageSigner};
pub use utils::config::{LengthPrefix, SignerSettings};

// Re-export the entry points
pub use wallet::{
    address_from_private_key, generate_key_pair, generate_key_pair_with, private_key_to_pem,
    sign, verify_message,
};

//! Wallet Module
//!
//! The public entry points: key pair generation, message signing and
//! verification, and WIF conversions.

mod keygen;

pub use keygen::*;

use crate::error::SignerResult;
use crate::message_signer::MessageSigner;
use crate::types::VerifyOutcome;

/// Sign `message` with a WIF key, checking the result against `address`
pub fn sign(message: &str, wif: &str, address: &str) -> SignerResult<String> {
    MessageSigner::default().sign_message(message, wif, address)
}

/// Verify a Base64 compact signature over `message` against `address`
pub fn verify_message(signature: &str, message: &str, address: &str) -> SignerResult<VerifyOutcome> {
    MessageSigner::default().verify_message(signature, message, address)
}

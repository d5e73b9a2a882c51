//! Key and Address Encodings
//!
//! DER and PEM for key files, Base58Check for WIF keys and P2PKH
//! addresses.

pub mod base58check;
pub mod der;
pub mod pem;

pub use base58check::WifKey;
pub use der::DerError;

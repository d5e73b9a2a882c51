//! Unified error types for the signer
//!
//! Decode and parse failures flow through `SignerError` with a code that
//! names the failure class. A signature that parses but does not check out
//! is not an error: it comes back as a negative `VerifyOutcome`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::der::DerError;

/// Main error type for all signer operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl SignerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn format(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::FormatError, msg)
    }

    pub fn range(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RangeError, msg)
    }

    pub fn checksum(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ChecksumError, msg)
    }

    pub fn exhausted_recovery_ids(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExhaustedRecoveryIds, msg)
    }

    pub fn degenerate_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DegenerateKey, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for SignerError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed Base64/Base58/hex/DER input, wrong length, unknown OID
    FormatError,
    /// Value outside its permitted range (header byte, r/s, secret)
    RangeError,
    /// Base58Check checksum mismatch
    ChecksumError,
    /// No recovery id 0..=3 reproduced the signer's address
    ExhaustedRecoveryIds,
    /// Non-invertible value in curve or scalar arithmetic
    DegenerateKey,
    /// Invalid settings
    ConfigError,
}

/// Result type alias for signer operations
pub type SignerResult<T> = Result<T, SignerError>;

// Conversions from common error types

impl From<hex::FromHexError> for SignerError {
    fn from(e: hex::FromHexError) -> Self {
        SignerError::format(format!("Invalid hex: {}", e))
    }
}

impl From<bs58::decode::Error> for SignerError {
    fn from(e: bs58::decode::Error) -> Self {
        SignerError::format(format!("Invalid base58: {}", e))
    }
}

impl From<base64::DecodeError> for SignerError {
    fn from(e: base64::DecodeError) -> Self {
        SignerError::format(format!("Invalid base64: {}", e))
    }
}

impl From<DerError> for SignerError {
    fn from(e: DerError) -> Self {
        SignerError::format(e.to_string())
    }
}

impl From<serde_json::Error> for SignerError {
    fn from(e: serde_json::Error) -> Self {
        SignerError::format(format!("Invalid JSON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = SignerError::checksum("WIF checksum mismatch")
            .with_details("expected 1a2b3c4d, got 00000000");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("checksum_error"));
        assert!(json.contains("WIF checksum mismatch"));
    }

    #[test]
    fn test_display_includes_details() {
        let err = SignerError::format("bad signature").with_details("64 bytes");
        assert_eq!(err.to_string(), "[FormatError] bad signature (64 bytes)");
    }

    #[test]
    fn test_from_base58_error() {
        let err: SignerError = bs58::decode("0OIl").into_vec().unwrap_err().into();
        assert_eq!(err.code, ErrorCode::FormatError);
    }
}

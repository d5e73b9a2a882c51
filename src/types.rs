//! Shared types for the signer
//!
//! Values returned across the public entry points, serializable for the
//! command-line `--json` output.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

// =============================================================================
// Key Generation
// =============================================================================

/// A freshly generated key pair
///
/// `Display` never prints the private key.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairInfo {
    /// WIF-encoded private key
    pub private_key: String,
    /// P2PKH address of the matching public key
    pub address: String,
}

impl KeyPairInfo {
    pub fn new(private_key: String, address: String) -> Self {
        Self {
            private_key,
            address,
        }
    }
}

impl fmt::Display for KeyPairInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "privateKey: ****, address: {}", self.address)
    }
}

impl fmt::Debug for KeyPairInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairInfo")
            .field("private_key", &"[REDACTED]")
            .field("address", &self.address)
            .finish()
    }
}

// =============================================================================
// Verification
// =============================================================================

/// Result of checking a signed message
///
/// A mismatch is an ordinary outcome, carried here with a description of
/// which check failed rather than raised as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub verified: bool,
    pub message: String,
}

/// Message of a successful verification
pub const VERIFY_SUCCESS: &str = "success";

impl VerifyOutcome {
    pub fn success() -> Self {
        Self {
            verified: true,
            message: VERIFY_SUCCESS.to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            verified: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for VerifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.verified, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_display_hides_secret() {
        let pair = KeyPairInfo::new(
            "KxPgZSiHf4QirYmX2AGjhQ8jXNErHQoUzcbttumtQ9wShaP1tSoX".to_string(),
            "1vofXj4Vf2cgJDQrbbN2Zc6gG9qmRmk96".to_string(),
        );
        assert_eq!(
            pair.to_string(),
            "privateKey: ****, address: 1vofXj4Vf2cgJDQrbbN2Zc6gG9qmRmk96"
        );
        assert!(!format!("{:?}", pair).contains("KxPg"));

        let json = serde_json::to_string(&pair).unwrap();
        assert!(json.contains("\"privateKey\""));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(VerifyOutcome::success().to_string(), "true:success");
        assert_eq!(
            VerifyOutcome::failure("address check failed").to_string(),
            "false:address check failed"
        );
    }
}

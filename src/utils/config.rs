//! Signer Configuration
//!
//! Settings that shape the wire output of the signer:
//! - Key compression (WIF marker byte and address key encoding)
//! - The signed-message magic prefix
//! - How the message length is prefixed before hashing
//! - Debug logging
//!
//! Settings are plain values handed to a `MessageSigner`; nothing here is
//! process-global.

use serde::{Deserialize, Serialize};

use crate::error::{SignerError, SignerResult};
use crate::utils::logging;

/// Magic prefix of the Bitcoin "Signed Message" convention
pub const BITCOIN_MESSAGE_PREFIX: &str = "Bitcoin Signed Message:\n";

/// Environment variable names read by `SignerSettings::from_env`
pub const ENV_COMPRESSED: &str = "BTCMSG_COMPRESSED";
pub const ENV_LENGTH_PREFIX: &str = "BTCMSG_LENGTH_PREFIX";
pub const ENV_DEBUG: &str = "BTCMSG_DEBUG";

/// Longest prefix whose length still fits the single-byte prefix header
const MAX_PREFIX_LEN: usize = 252;

/// How the message length is written in front of the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LengthPrefix {
    /// Bitcoin CompactSize varint (one byte below 253)
    CompactSize,
    /// One raw byte; messages of 256 bytes or more are rejected
    SingleByte,
}

impl LengthPrefix {
    pub fn parse(value: &str) -> SignerResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "compact" | "compact-size" | "varint" => Ok(Self::CompactSize),
            "single-byte" | "single" | "legacy" => Ok(Self::SingleByte),
            other => Err(SignerError::config(format!(
                "unknown length prefix '{}', expected 'compact' or 'single-byte'",
                other
            ))),
        }
    }
}

/// Signer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSettings {
    /// Encode WIF with the 0x01 marker and derive addresses from 33-byte keys
    pub compressed_keys: bool,
    /// Magic string hashed in front of every message
    pub message_prefix: String,
    /// Message length encoding
    pub length_prefix: LengthPrefix,
    /// Emit debug log lines; applied when a `MessageSigner` is built
    pub debug_logging: bool,
}

impl Default for SignerSettings {
    fn default() -> Self {
        Self::standard()
    }
}

impl SignerSettings {
    /// Bitcoin Core compatible preset
    pub fn standard() -> Self {
        Self {
            compressed_keys: true,
            message_prefix: BITCOIN_MESSAGE_PREFIX.to_string(),
            length_prefix: LengthPrefix::CompactSize,
            debug_logging: false,
        }
    }

    /// One-byte length prefix, as emitted by older signers
    pub fn legacy() -> Self {
        Self {
            length_prefix: LengthPrefix::SingleByte,
            ..Self::standard()
        }
    }

    /// Start from the standard preset and apply environment overrides
    pub fn from_env() -> SignerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> SignerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::standard();

        if let Some(value) = lookup(ENV_COMPRESSED) {
            settings.compressed_keys = parse_bool(ENV_COMPRESSED, &value)?;
        }
        if let Some(value) = lookup(ENV_LENGTH_PREFIX) {
            settings.length_prefix = LengthPrefix::parse(&value)?;
        }
        if let Some(value) = lookup(ENV_DEBUG) {
            settings.debug_logging = parse_bool(ENV_DEBUG, &value)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Switch on debug output if requested. Never switches it off.
    pub fn apply_logging(&self) {
        if self.debug_logging {
            logging::enable_debug();
        }
    }

    /// Validate settings consistency
    pub fn validate(&self) -> SignerResult<()> {
        if self.message_prefix.is_empty() {
            return Err(SignerError::config("message prefix must not be empty"));
        }
        if self.message_prefix.len() > MAX_PREFIX_LEN {
            return Err(SignerError::config(format!(
                "message prefix is {} bytes, at most {} allowed",
                self.message_prefix.len(),
                MAX_PREFIX_LEN
            )));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> SignerResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SignerError::config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_presets() {
        let standard = SignerSettings::standard();
        assert!(standard.compressed_keys);
        assert_eq!(standard.length_prefix, LengthPrefix::CompactSize);
        assert_eq!(standard.message_prefix, "Bitcoin Signed Message:\n");

        let legacy = SignerSettings::legacy();
        assert_eq!(legacy.length_prefix, LengthPrefix::SingleByte);
        assert!(legacy.compressed_keys);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let settings = SignerSettings::from_lookup(lookup_from(&[
            (ENV_COMPRESSED, "false"),
            (ENV_LENGTH_PREFIX, "single-byte"),
            (ENV_DEBUG, "1"),
        ]))
        .unwrap();

        assert!(!settings.compressed_keys);
        assert_eq!(settings.length_prefix, LengthPrefix::SingleByte);
        assert!(settings.debug_logging);
    }

    #[test]
    fn test_from_lookup_defaults() {
        let settings = SignerSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, SignerSettings::standard());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SignerSettings::from_lookup(lookup_from(&[(ENV_COMPRESSED, "maybe")]))
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigError);

        assert!(SignerSettings::from_lookup(lookup_from(&[(ENV_LENGTH_PREFIX, "utf16")])).is_err());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = SignerSettings::standard();
        settings.message_prefix.clear();
        assert!(settings.validate().is_err());

        settings.message_prefix = "x".repeat(253);
        assert!(settings.validate().is_err());
    }
}

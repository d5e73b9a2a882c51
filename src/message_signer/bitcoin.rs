//! Bitcoin Signed Message
//!
//! Implements the "Bitcoin Signed Message" convention used by
//! `signmessage`/`verifymessage`.
//!
//! Format: `len(prefix) ∥ "Bitcoin Signed Message:\n" ∥ len(message) ∥ message`,
//! hashed with double SHA-256. The signature travels as Base64 of a
//! 65-byte compact signature from which the verifier recovers the
//! signer's public key.

use num_bigint::BigInt;
use num_integer::Integer;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use super::compact::{CompactSignature, Header, MAX_RECOVERY_ID};
use crate::codec::base58check::{self, WifKey};
use crate::crypto::curves::{math, Curve, Point};
use crate::crypto::ecdsa::{self, Signature};
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::error::{ErrorCode, SignerError, SignerResult};
use crate::types::VerifyOutcome;
use crate::utils::config::{LengthPrefix, SignerSettings};
use crate::utils::hashing::double_sha256;
use crate::{log_debug, log_error, log_warn};

const MODULE: &str = "message_signer";

/// Signs and verifies messages under one set of `SignerSettings`
#[derive(Debug, Clone)]
pub struct MessageSigner {
    settings: SignerSettings,
    curve: &'static Curve,
}

impl Default for MessageSigner {
    fn default() -> Self {
        Self {
            settings: SignerSettings::standard(),
            curve: Curve::secp256k1(),
        }
    }
}

impl MessageSigner {
    /// Build a signer after validating `settings`, enabling debug output
    /// when `settings.debug_logging` is set
    pub fn new(settings: SignerSettings) -> SignerResult<Self> {
        settings.validate()?;
        settings.apply_logging();
        Ok(Self {
            settings,
            curve: Curve::secp256k1(),
        })
    }

    pub fn settings(&self) -> &SignerSettings {
        &self.settings
    }

    pub fn curve(&self) -> &'static Curve {
        self.curve
    }

    // MARK: - Message hashing

    /// Length-prefixed magic followed by the length-prefixed UTF-8 message
    pub fn wrap(&self, message: &str) -> SignerResult<Vec<u8>> {
        let prefix = self.settings.message_prefix.as_bytes();
        let body = message.as_bytes();

        let mut out = Vec::with_capacity(prefix.len() + body.len() + 10);
        self.write_length(prefix.len(), &mut out)?;
        out.extend_from_slice(prefix);
        self.write_length(body.len(), &mut out)?;
        out.extend_from_slice(body);
        Ok(out)
    }

    fn write_length(&self, len: usize, out: &mut Vec<u8>) -> SignerResult<()> {
        match self.settings.length_prefix {
            LengthPrefix::CompactSize => {
                write_compact_size(len as u64, out);
                Ok(())
            }
            LengthPrefix::SingleByte => {
                let byte = u8::try_from(len).map_err(|_| {
                    SignerError::format(format!(
                        "message of {} bytes does not fit a single-byte length prefix",
                        len
                    ))
                })?;
                out.push(byte);
                Ok(())
            }
        }
    }

    /// Double SHA-256 of the wrapped message, as an integer
    pub fn message_hash(&self, message: &str) -> SignerResult<BigInt> {
        let wrapped = self.wrap(message)?;
        Ok(ecdsa::hash_to_int(&double_sha256(&wrapped), self.curve))
    }

    // MARK: - Signing

    /// Sign `message` with a WIF key and return the Base64 compact signature
    ///
    /// # Arguments
    /// * `message` - The message text
    /// * `wif` - WIF private key; its compression flag selects the header
    /// * `address` - The address the signature must verify against
    ///
    /// # Returns
    /// The first candidate signature (recovery id 0 to 3) that verifies
    /// against `address`
    pub fn sign_message(&self, message: &str, wif: &str, address: &str) -> SignerResult<String> {
        self.sign_message_with_rng(message, wif, address, &mut OsRng)
    }

    /// Same as `sign_message`, drawing nonces from `rng`
    pub fn sign_message_with_rng<R: RngCore + CryptoRng>(
        &self,
        message: &str,
        wif: &str,
        address: &str,
        rng: &mut R,
    ) -> SignerResult<String> {
        let WifKey { key, compressed } = base58check::decode_wif(wif)?;
        self.sign_for_address(message, &key, compressed, address, rng)
    }

    /// Sign with a decoded key against the key's own address
    pub fn sign_message_with_key<R: RngCore + CryptoRng>(
        &self,
        message: &str,
        key: &PrivateKey,
        compressed: bool,
        rng: &mut R,
    ) -> SignerResult<String> {
        let address = key.public_key()?.address(compressed);
        self.sign_for_address(message, key, compressed, &address, rng)
    }

    fn sign_for_address<R: RngCore + CryptoRng>(
        &self,
        message: &str,
        key: &PrivateKey,
        compressed: bool,
        address: &str,
        rng: &mut R,
    ) -> SignerResult<String> {
        let hash = self.message_hash(message)?;
        let signature = ecdsa::sign(&hash, key, rng)?;

        for recovery_id in 0..MAX_RECOVERY_ID {
            let compact =
                CompactSignature::new(signature.clone(), Header::new(recovery_id, compressed)?);
            let candidate = compact.to_base64(self.curve);
            if self.verify_message(&candidate, message, address)?.verified {
                log_debug!(MODULE, "Message signed", recovery_id = recovery_id, address = address);
                return Ok(candidate);
            }
        }

        let own_address = key.public_key()?.address(compressed);
        let err = SignerError::exhausted_recovery_ids("no recovery id reproduced the signer address");
        if own_address != address.trim() {
            log_warn!(MODULE, "No recovery id verified", address = address);
            Err(err.with_details("the supplied address does not belong to the private key"))
        } else {
            // the key's own address must always be recoverable
            log_error!(MODULE, "Own address not recoverable", address = address);
            Err(err)
        }
    }

    // MARK: - Verification

    /// Verify a Base64 compact signature over `message` against `address`
    ///
    /// Malformed input (bad Base64, a decoded length other than 65) is an
    /// error. A signature that parses but does not check out is a negative
    /// `VerifyOutcome` naming the check that failed.
    pub fn verify_message(
        &self,
        signature: &str,
        message: &str,
        address: &str,
    ) -> SignerResult<VerifyOutcome> {
        let compact = match CompactSignature::from_base64(signature, self.curve) {
            Ok(compact) => compact,
            Err(e) if e.code == ErrorCode::RangeError => {
                log_debug!(MODULE, "Header check failed", signature = signature);
                return Ok(VerifyOutcome::failure(format!("header check failed: {}", e.message)));
            }
            Err(e) => return Err(e),
        };
        let hash = self.message_hash(message)?;

        if !compact.signature.is_in_range(self.curve) {
            log_debug!(MODULE, "Signature out of range", signature = signature);
            return Ok(VerifyOutcome::failure(
                "signature check failed: r and s must be in [1, N-1]",
            ));
        }

        let public_key = match recover_public_key(&hash, &compact, self.curve)? {
            Some(public_key) => public_key,
            None => {
                log_debug!(MODULE, "Public key recovery failed", signature = signature);
                return Ok(VerifyOutcome::failure(format!(
                    "signature check failed: no public key for recovery id {}",
                    compact.header.recovery_id
                )));
            }
        };

        if !ecdsa::verify(&hash, &compact.signature, &public_key)? {
            log_debug!(MODULE, "Signature check failed", signature = signature);
            return Ok(VerifyOutcome::failure(format!(
                "signature check failed, expected: {}, actual: {}",
                signature.trim(),
                compact.to_base64(self.curve)
            )));
        }

        let actual = public_key.address(compact.header.compressed);
        if actual != address.trim() {
            log_debug!(MODULE, "Address check failed", expected_address = address, actual_address = actual);
            return Ok(VerifyOutcome::failure(format!(
                "address check failed, expected: {}, actual: {}",
                address.trim(),
                actual
            )));
        }

        Ok(VerifyOutcome::success())
    }

    /// Recover the public key that produced `signature` over `message`
    pub fn recover(&self, signature: &str, message: &str) -> SignerResult<Option<PublicKey>> {
        let compact = CompactSignature::from_base64(signature, self.curve)?;
        let hash = self.message_hash(message)?;
        recover_public_key(&hash, &compact, self.curve)
    }
}

/// Bitcoin CompactSize unsigned integer
pub fn write_compact_size(value: u64, out: &mut Vec<u8>) {
    match value {
        0..=0xfc => out.push(value as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Public key recovery from a compact signature
///
/// `R = (r + ⌊id/2⌋·N, y)` with y of the recovery id's parity, then
/// `Q = r⁻¹·(s·R − e·G)`. Returns `None` when the candidate R is not a
/// curve point or Q is the identity.
pub fn recover_public_key(
    hash: &BigInt,
    compact: &CompactSignature,
    curve: &'static Curve,
) -> SignerResult<Option<PublicKey>> {
    let Signature { r, s } = &compact.signature;
    if !compact.signature.is_in_range(curve) {
        return Ok(None);
    }

    let recovery_id = compact.header.recovery_id;
    let x = r + BigInt::from(recovery_id / 2) * &curve.n;
    if x >= curve.p {
        return Ok(None);
    }

    let alpha = curve.curve_rhs(&x);
    let beta = math::modular_sqrt(&alpha, &curve.p);
    let y = if math::is_odd(&beta) == (recovery_id % 2 == 1) {
        beta
    } else {
        (&curve.p - beta).mod_floor(&curve.p)
    };
    let point_r = Point::affine(x, y);
    if !curve.contains(&point_r) {
        return Ok(None);
    }

    let r_inv = math::mod_inverse(r, &curve.n)?;
    let u1 = (s * &r_inv).mod_floor(&curve.n);
    let u2 = (-(hash * &r_inv)).mod_floor(&curve.n);
    let q = math::multiply_add(&point_r, &u1, &curve.g, &u2, curve)?;
    Ok(PublicKey::from_point(q, curve).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::logging;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const WIF: &str = "KxPgZSiHf4QirYmX2AGjhQ8jXNErHQoUzcbttumtQ9wShaP1tSoX";
    const ADDRESS: &str = "1vofXj4Vf2cgJDQrbbN2Zc6gG9qmRmk96";
    const SIGNATURE: &str =
        "ILvxYFjP/tAA9ce/JDxB1RQf0Pgu5SqxATP+8EsGZ+EVaz9Z3BETmSbraem9waMksWBTPPcjTXZJvpsTGdcLIn4=";

    #[test]
    fn test_debug_setting_enables_logging() {
        let _guard = logging::TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        logging::disable_debug();

        MessageSigner::new(SignerSettings::standard()).unwrap();
        assert!(!logging::is_debug_enabled());

        let settings = SignerSettings {
            debug_logging: true,
            ..SignerSettings::standard()
        };
        MessageSigner::new(settings).unwrap();
        assert!(logging::is_debug_enabled());
        logging::disable_debug();
    }

    #[test]
    fn test_wrap_layout() {
        let wrapped = MessageSigner::default().wrap("123456").unwrap();
        assert_eq!(wrapped[0], 0x18);
        assert_eq!(&wrapped[1..25], b"Bitcoin Signed Message:\n");
        assert_eq!(wrapped[25], 6);
        assert_eq!(&wrapped[26..], b"123456");
    }

    #[test]
    fn test_long_message_prefix() {
        let message = "a".repeat(300);
        let wrapped = MessageSigner::default().wrap(&message).unwrap();
        assert_eq!(&wrapped[25..28], &[0xfd, 0x2c, 0x01]);

        let legacy = MessageSigner::new(SignerSettings::legacy()).unwrap();
        assert_eq!(legacy.wrap(&message).unwrap_err().code, ErrorCode::FormatError);
        assert_eq!(legacy.wrap("123456").unwrap(), MessageSigner::default().wrap("123456").unwrap());
    }

    #[test]
    fn test_compact_size() {
        let encode = |value| {
            let mut out = Vec::new();
            write_compact_size(value, &mut out);
            out
        };
        assert_eq!(encode(0xfc), vec![0xfc]);
        assert_eq!(encode(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(encode(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(encode(0x1_0000_0000), vec![0xff, 0, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_known_signature_verifies() {
        let outcome = MessageSigner::default()
            .verify_message(SIGNATURE, "123456", ADDRESS)
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::success());
    }

    #[test]
    fn test_sign_then_verify() {
        let signer = MessageSigner::default();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let signature = signer
            .sign_message_with_rng("123456", WIF, ADDRESS, &mut rng)
            .unwrap();
        assert_eq!(signer.verify_message(&signature, "123456", ADDRESS).unwrap(), VerifyOutcome::success());
    }

    #[test]
    fn test_recovered_key_matches() {
        let signer = MessageSigner::default();
        let key = base58check::decode_wif(WIF).unwrap().key;
        let recovered = signer.recover(SIGNATURE, "123456").unwrap().unwrap();
        assert_eq!(recovered, key.public_key().unwrap());
    }

    #[test]
    fn test_wrong_message_or_address() {
        let signer = MessageSigner::default();
        let outcome = signer.verify_message(SIGNATURE, "1234567", ADDRESS).unwrap();
        assert!(!outcome.verified);

        let outcome = signer
            .verify_message(SIGNATURE, "123456", "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH")
            .unwrap();
        assert!(!outcome.verified);
        assert!(outcome.message.starts_with("address check failed"));
        assert!(outcome.message.contains(ADDRESS));
    }

    #[test]
    fn test_bad_header_is_negative_outcome() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let mut bytes = STANDARD.decode(SIGNATURE).unwrap();
        bytes[0] = 35;
        let outcome = MessageSigner::default()
            .verify_message(&STANDARD.encode(&bytes), "123456", ADDRESS)
            .unwrap();
        assert!(!outcome.verified);
        assert!(outcome.message.starts_with("header check failed"));
    }

    #[test]
    fn test_high_recovery_ids_without_point() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let signer = MessageSigner::default();
        let mut bytes = STANDARD.decode(SIGNATURE).unwrap();

        // ids 2 and 3 put x at r + N, which is past P for this r
        for (header, recovery_id) in [(33u8, 2u8), (34, 3)] {
            bytes[0] = header;
            let compact = CompactSignature::from_bytes(&bytes, signer.curve()).unwrap();
            assert_eq!(compact.header.recovery_id, recovery_id);
            let hash = signer.message_hash("123456").unwrap();
            assert!(recover_public_key(&hash, &compact, signer.curve()).unwrap().is_none());

            let outcome = signer
                .verify_message(&STANDARD.encode(&bytes), "123456", ADDRESS)
                .unwrap();
            assert!(!outcome.verified);
            assert_eq!(
                outcome.message,
                format!("signature check failed: no public key for recovery id {}", recovery_id)
            );
        }
    }

    #[test]
    fn test_wrong_length_is_error() {
        let err = MessageSigner::default()
            .verify_message("ILvxYFjP/tAA9ce/JDxB1RQf0Pgu5SqxATP+8EsGZ+EV", "123456", ADDRESS)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FormatError);
    }

    #[test]
    fn test_uncompressed_key_header() {
        let signer = MessageSigner::default();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let key = PrivateKey::generate(&mut rng, signer.curve());
        let signature = signer.sign_message_with_key("hi", &key, false, &mut rng).unwrap();
        let compact = CompactSignature::from_base64(&signature, signer.curve()).unwrap();
        assert!(!compact.header.compressed);

        let address = key.public_key().unwrap().address(false);
        assert!(signer.verify_message(&signature, "hi", &address).unwrap().verified);
    }

    #[test]
    fn test_foreign_address_exhausts_recovery_ids() {
        let signer = MessageSigner::default();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let err = signer
            .sign_message_with_rng("123456", WIF, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH", &mut rng)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExhaustedRecoveryIds);
        assert!(err.details.is_some());
    }
}

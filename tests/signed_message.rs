use base64::{engine::general_purpose::STANDARD, Engine as _};
use btc_message_signer::{
    address_from_private_key, private_key_to_pem, sign, verify_message, ErrorCode, PrivateKey,
    VerifyOutcome,
};

const WIF: &str = "KxPgZSiHf4QirYmX2AGjhQ8jXNErHQoUzcbttumtQ9wShaP1tSoX";
const ADDRESS: &str = "1vofXj4Vf2cgJDQrbbN2Zc6gG9qmRmk96";
const MESSAGE: &str = "123456";
const SIGNATURE: &str =
    "ILvxYFjP/tAA9ce/JDxB1RQf0Pgu5SqxATP+8EsGZ+EVaz9Z3BETmSbraem9waMksWBTPPcjTXZJvpsTGdcLIn4=";

#[test]
fn sign_then_verify_known_key() {
    let signature = sign(MESSAGE, WIF, ADDRESS).expect("signing succeeds");
    let outcome = verify_message(&signature, MESSAGE, ADDRESS).expect("signature parses");
    assert_eq!(outcome, VerifyOutcome::success());
    assert_eq!(outcome.to_string(), "true:success");
}

#[test]
fn known_signature_verifies() {
    let outcome = verify_message(SIGNATURE, MESSAGE, ADDRESS).expect("signature parses");
    assert!(outcome.verified, "{}", outcome);
}

#[test]
fn short_and_long_signatures_are_format_errors() {
    let bytes = STANDARD.decode(SIGNATURE).unwrap();

    let short = STANDARD.encode(&bytes[..64]);
    let err = verify_message(&short, MESSAGE, ADDRESS).unwrap_err();
    assert_eq!(err.code, ErrorCode::FormatError);

    let mut long = bytes.clone();
    long.push(0);
    let err = verify_message(&STANDARD.encode(&long), MESSAGE, ADDRESS).unwrap_err();
    assert_eq!(err.code, ErrorCode::FormatError);

    let err = verify_message("%%%", MESSAGE, ADDRESS).unwrap_err();
    assert_eq!(err.code, ErrorCode::FormatError);
}

#[test]
fn mismatches_are_outcomes_not_errors() {
    let outcome = verify_message(SIGNATURE, "654321", ADDRESS).unwrap();
    assert!(!outcome.verified);

    let outcome = verify_message(SIGNATURE, MESSAGE, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH").unwrap();
    assert!(!outcome.verified);
    assert!(outcome.message.contains("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"));
    assert!(outcome.message.contains(ADDRESS));
}

#[test]
fn address_and_pem_entry_points() {
    assert_eq!(address_from_private_key(WIF).unwrap(), ADDRESS);

    let pem = private_key_to_pem(WIF).unwrap();
    let key = PrivateKey::from_pem(&pem).unwrap();
    assert_eq!(key.public_key().unwrap().address(true), ADDRESS);
}

#[test]
fn malformed_wif_is_rejected() {
    assert_eq!(
        address_from_private_key("9vofXj4Vf2cgJDQrbbN2Zc6gG9qmRmk96").unwrap_err().code,
        ErrorCode::FormatError
    );
    let mut tampered = WIF.to_string();
    tampered.replace_range(10..11, "z");
    assert_eq!(
        address_from_private_key(&tampered).unwrap_err().code,
        ErrorCode::ChecksumError
    );
}

use base64::{engine::general_purpose::STANDARD, Engine as _};
use btc_message_signer::crypto::curves::math;
use btc_message_signer::{Curve, MessageSigner, PrivateKey};
use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn any_private_key() -> impl Strategy<Value = PrivateKey> {
    prop::array::uniform32(any::<u8>()).prop_filter_map("valid secp256k1 scalar", |bytes| {
        PrivateKey::from_bytes(&bytes, Curve::secp256k1()).ok()
    })
}

fn any_scalar() -> impl Strategy<Value = BigInt> {
    prop::array::uniform32(any::<u8>()).prop_map(|bytes| BigInt::from_bytes_be(Sign::Plus, &bytes))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn scalar_multiplication_is_additive(k1 in any_scalar(), k2 in any_scalar()) {
        let curve = Curve::secp256k1();
        let p1 = math::multiply(&curve.g, &k1, curve).unwrap();
        let p2 = math::multiply(&curve.g, &k2, curve).unwrap();
        let sum = math::add(&p1, &p2, curve).unwrap();
        let direct = math::multiply(&curve.g, &(&k1 + &k2).mod_floor(&curve.n), curve).unwrap();
        prop_assert_eq!(sum, direct);
    }

    #[test]
    fn wif_round_trips(key in any_private_key(), compressed in any::<bool>()) {
        let wif = key.to_wif(compressed);
        let decoded = btc_message_signer::codec::base58check::decode_wif(&wif).unwrap();
        prop_assert_eq!(decoded.compressed, compressed);
        prop_assert_eq!(decoded.key, key);
    }

    #[test]
    fn der_and_pem_round_trip(key in any_private_key()) {
        let der = key.to_der().unwrap();
        prop_assert_eq!(&PrivateKey::from_der(&der).unwrap(), &key);

        let pem = key.to_pem().unwrap();
        prop_assert_eq!(&PrivateKey::from_pem(&pem).unwrap(), &key);

        let public = key.public_key().unwrap();
        prop_assert_eq!(&btc_message_signer::PublicKey::from_pem(&public.to_pem()).unwrap(), &public);
    }

    #[test]
    fn sign_then_verify(key in any_private_key(), message in ".{0,300}", seed in any::<u64>()) {
        let signer = MessageSigner::default();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let address = key.public_key().unwrap().address(true);

        let signature = signer.sign_message_with_key(&message, &key, true, &mut rng).unwrap();
        let outcome = signer.verify_message(&signature, &message, &address).unwrap();
        prop_assert!(outcome.verified, "{}", outcome);

        let recovered = signer.recover(&signature, &message).unwrap().unwrap();
        prop_assert_eq!(recovered.address(true), address);
    }

    #[test]
    fn altered_address_fails(key in any_private_key(), position in 1usize..25, seed in any::<u64>()) {
        let signer = MessageSigner::default();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let address = key.public_key().unwrap().address(true);
        let signature = signer.sign_message_with_key("bound", &key, true, &mut rng).unwrap();

        let mut chars: Vec<char> = address.chars().collect();
        let index = position.min(chars.len() - 1);
        chars[index] = if chars[index] == 'z' { 'y' } else { 'z' };
        let altered: String = chars.into_iter().collect();

        let outcome = signer.verify_message(&signature, "bound", &altered).unwrap();
        prop_assert!(!outcome.verified);
    }

    #[test]
    fn flipped_bit_fails(key in any_private_key(), bit in 8usize..520, seed in any::<u64>()) {
        let signer = MessageSigner::default();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let address = key.public_key().unwrap().address(true);
        let signature = signer.sign_message_with_key("tamper", &key, true, &mut rng).unwrap();

        let mut bytes = STANDARD.decode(&signature).unwrap();
        bytes[bit / 8] ^= 1 << (bit % 8);
        let outcome = signer
            .verify_message(&STANDARD.encode(&bytes), "tamper", &address)
            .unwrap();
        prop_assert!(!outcome.verified);
    }
}

//! Chain-specific signature verification primitives.
//!
//! Each verifier checks a claimed signature over an already-built message
//! against a claimed account address. Malformed signatures or addresses
//! verify as `false` rather than raising a distinguishing error.

use crate::auth::account::{bech32_public_key, ss58_decode};
use ed25519_dalek::Verifier;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey as EcdsaVerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use log::debug;
use sha3::{Digest, Keccak256};

/// Signing context used by Substrate sr25519 signatures.
const SR25519_SIGNING_CONTEXT: &[u8] = b"substrate";
/// EIP-191 personal-sign envelope prefix.
const ETHEREUM_PERSONAL_PREFIX: &str = "\x19Ethereum Signed Message:\n";
/// MultiversX message-signing envelope prefix.
const MULTIVERSX_MESSAGE_PREFIX: &str = "\x17Elrond Signed Message:\n";

/// Verify a Polkadot signature.
///
/// The message is wrapped in a `<Bytes>` envelope before verification, for
/// compatibility with browser-extension raw signing. Both sr25519 and
/// ed25519 keyed accounts are accepted: 65-byte signatures carry a leading
/// scheme byte, bare 64-byte signatures are tried under both schemes.
pub(crate) fn polkadot(message: &str, signature: &str, address: &str) -> bool {
    let Ok(public_key) = ss58_decode(address) else {
        debug!("cannot verify: undecodable SS58 address");
        return false;
    };
    let Some(raw) = decode_hex_signature(signature) else {
        return false;
    };
    let wrapped = format!("<Bytes>{message}</Bytes>");
    match raw.len() {
        64 => {
            sr25519_verify(&public_key, wrapped.as_bytes(), &raw)
                || ed25519_verify(&public_key, wrapped.as_bytes(), &raw)
        }
        65 => match raw[0] {
            0x00 => ed25519_verify(&public_key, wrapped.as_bytes(), &raw[1..]),
            0x01 => sr25519_verify(&public_key, wrapped.as_bytes(), &raw[1..]),
            _ => false,
        },
        _ => false,
    }
}

/// Verify an Ethereum signature by address recovery.
///
/// The digest is the keccak-256 of the message bytes (the MetaMask
/// compatibility layer hashes the hex rendering of the message, which is
/// byte-equivalent).
pub(crate) fn ethereum(message: &str, signature: &str, address: &str) -> bool {
    let digest: [u8; 32] = Keccak256::digest(message.as_bytes()).into();
    recovered_address_matches(&digest, signature, address)
}

/// Verify a Crossmint (custodial Ethereum) signature.
///
/// Custodial wallets personal-sign the hex rendering of the message, so the
/// digest covers the EIP-191 envelope over the literal `0x…` string.
pub(crate) fn crossmint_ethereum(message: &str, signature: &str, address: &str) -> bool {
    let hex_message = format!("0x{}", hex::encode(message.as_bytes()));
    let envelope = format!(
        "{ETHEREUM_PERSONAL_PREFIX}{}{hex_message}",
        hex_message.len()
    );
    let digest: [u8; 32] = Keccak256::digest(envelope.as_bytes()).into();
    recovered_address_matches(&digest, signature, address)
}

/// Verify a MultiversX detached signature.
///
/// The public key is derived from the bech32 address; the signed payload is
/// the chain's message-signing serialization. The signature hex carries a
/// fixed 2-character scheme prefix which is stripped before decoding.
pub(crate) fn multiversx(message: &str, signature: &str, address: &str) -> bool {
    let Ok(public_key) = bech32_public_key(address) else {
        debug!("cannot verify: undecodable bech32 address");
        return false;
    };
    let Some(stripped) = signature.get(2..) else {
        return false;
    };
    let Ok(raw) = hex::decode(stripped) else {
        return false;
    };
    let serialized = multiversx_serialize_for_signing(message.as_bytes());
    ed25519_verify(&public_key, &serialized, &raw)
}

/// MultiversX message-signing serialization: keccak-256 over the
/// length-prefixed message envelope.
fn multiversx_serialize_for_signing(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(MULTIVERSX_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

fn sr25519_verify(public_key: &[u8; 32], message: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = schnorrkel::PublicKey::from_bytes(public_key) else {
        return false;
    };
    let Ok(parsed) = schnorrkel::Signature::from_bytes(signature) else {
        return false;
    };
    key.verify_simple(SR25519_SIGNING_CONTEXT, message, &parsed)
        .is_ok()
}

fn ed25519_verify(public_key: &[u8; 32], message: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let Ok(parsed) = ed25519_dalek::Signature::from_slice(signature) else {
        return false;
    };
    key.verify(message, &parsed).is_ok()
}

/// Recover the signer address from a 65-byte `r || s || v` signature over the
/// given digest and compare it, case-insensitively, to the claimed address.
fn recovered_address_matches(digest: &[u8; 32], signature: &str, address: &str) -> bool {
    let Some(raw) = decode_hex_signature(signature) else {
        return false;
    };
    if raw.len() != 65 {
        return false;
    }
    let Ok(parsed) = EcdsaSignature::from_slice(&raw[..64]) else {
        return false;
    };
    let Some(recovery_id) = normalize_recovery_id(raw[64]) else {
        return false;
    };
    let Ok(key) = EcdsaVerifyingKey::recover_from_prehash(digest, &parsed, recovery_id) else {
        debug!("cannot verify: address recovery failed");
        return false;
    };
    let recovered = ethereum_address(&key);
    let claimed = address.strip_prefix("0x").unwrap_or(address);
    recovered.eq_ignore_ascii_case(claimed)
}

/// Accept both raw (0/1) and Ethereum-offset (27/28) recovery bytes.
fn normalize_recovery_id(v: u8) -> Option<RecoveryId> {
    let v = if v >= 27 { v - 27 } else { v };
    RecoveryId::from_byte(v)
}

/// The lowercase hex address of a secp256k1 public key: last 20 bytes of the
/// keccak-256 of the uncompressed point.
fn ethereum_address(key: &EcdsaVerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    hex::encode(&digest[12..])
}

fn decode_hex_signature(signature: &str) -> Option<Vec<u8>> {
    let digits = signature.strip_prefix("0x").unwrap_or(signature);
    hex::decode(digits).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account::ss58_encode;
    use bech32::{ToBase32, Variant};
    use ed25519_dalek::Signer;
    use k256::ecdsa::SigningKey;
    use schnorrkel::{ExpansionMode, MiniSecretKey};

    fn sr25519_pair(seed: u8) -> schnorrkel::Keypair {
        MiniSecretKey::from_bytes(&[seed; 32])
            .unwrap()
            .expand_to_keypair(ExpansionMode::Ed25519)
    }

    fn ethereum_pair(seed: u8) -> (SigningKey, String) {
        let key = SigningKey::from_slice(&[seed; 32]).unwrap();
        let address = format!("0x{}", ethereum_address(key.verifying_key()));
        (key, address)
    }

    #[test]
    fn test_polkadot_sr25519_signature() {
        let pair = sr25519_pair(1);
        let address = ss58_encode(&pair.public.to_bytes(), 42);
        let message = "some canonical digest";

        let wrapped = format!("<Bytes>{message}</Bytes>");
        let signature = pair.sign_simple(SR25519_SIGNING_CONTEXT, wrapped.as_bytes());
        let signature_hex = hex::encode(signature.to_bytes());

        assert!(polkadot(message, &signature_hex, &address));
        assert!(polkadot(message, &format!("0x{signature_hex}"), &address));
        assert!(!polkadot("another message", &signature_hex, &address));

        let other = ss58_encode(&sr25519_pair(2).public.to_bytes(), 42);
        assert!(!polkadot(message, &signature_hex, &other));
    }

    #[test]
    fn test_polkadot_ed25519_signature() {
        let key = ed25519_dalek::SigningKey::from_bytes(&[3; 32]);
        let address = ss58_encode(&key.verifying_key().to_bytes(), 42);
        let message = "some canonical digest";

        let wrapped = format!("<Bytes>{message}</Bytes>");
        let signature = key.sign(wrapped.as_bytes());
        let signature_hex = hex::encode(signature.to_bytes());

        assert!(polkadot(message, &signature_hex, &address));

        // Scheme-prefixed form
        let prefixed = format!("00{signature_hex}");
        assert!(polkadot(message, &prefixed, &address));
    }

    #[test]
    fn test_polkadot_rejects_garbage() {
        let pair = sr25519_pair(1);
        let address = ss58_encode(&pair.public.to_bytes(), 42);
        assert!(!polkadot("message", "not-hex", &address));
        assert!(!polkadot("message", "abcd", &address));
        assert!(!polkadot("message", &hex::encode([0u8; 64]), "not-an-address"));
    }

    #[test]
    fn test_ethereum_signature_recovery() {
        let (key, address) = ethereum_pair(4);
        let message = "some canonical digest";

        let digest: [u8; 32] = Keccak256::digest(message.as_bytes()).into();
        let (signature, recovery_id) = key.sign_prehash_recoverable(&digest).unwrap();
        let mut raw = signature.to_bytes().to_vec();
        raw.push(recovery_id.to_byte() + 27);
        let signature_hex = format!("0x{}", hex::encode(raw));

        assert!(ethereum(message, &signature_hex, &address));
        assert!(ethereum(message, &signature_hex, &address.to_uppercase().replace("0X", "0x")));
        assert!(!ethereum("another message", &signature_hex, &address));

        let (_, other_address) = ethereum_pair(5);
        assert!(!ethereum(message, &signature_hex, &other_address));
    }

    #[test]
    fn test_crossmint_uses_personal_sign_envelope() {
        let (key, address) = ethereum_pair(6);
        let message = "some canonical digest";

        let hex_message = format!("0x{}", hex::encode(message.as_bytes()));
        let envelope = format!(
            "{ETHEREUM_PERSONAL_PREFIX}{}{hex_message}",
            hex_message.len()
        );
        let digest: [u8; 32] = Keccak256::digest(envelope.as_bytes()).into();
        let (signature, recovery_id) = key.sign_prehash_recoverable(&digest).unwrap();
        let mut raw = signature.to_bytes().to_vec();
        raw.push(recovery_id.to_byte() + 27);
        let signature_hex = format!("0x{}", hex::encode(raw));

        assert!(crossmint_ethereum(message, &signature_hex, &address));
        // The raw-digest convention must not be accepted in place of it.
        assert!(!ethereum(message, &signature_hex, &address));
    }

    #[test]
    fn test_multiversx_signature() {
        let key = ed25519_dalek::SigningKey::from_bytes(&[7; 32]);
        let public_key = key.verifying_key().to_bytes();
        let address = bech32::encode("erd", public_key.to_base32(), Variant::Bech32).unwrap();
        let message = "some canonical digest";

        let serialized = multiversx_serialize_for_signing(message.as_bytes());
        let signature = key.sign(&serialized);
        let signature_hex = format!("0x{}", hex::encode(signature.to_bytes()));

        assert!(multiversx(message, &signature_hex, &address));
        assert!(!multiversx("another message", &signature_hex, &address));
        assert!(!multiversx(message, "0x", &address));
    }
}

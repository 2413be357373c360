//! EdDSA key material for node-signed tokens.

use crate::auth::peer::PeerId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

/// PKCS#8 v2 framing for a raw Ed25519 seed: SEQUENCE, version 1, the
/// Ed25519 AlgorithmIdentifier, then the seed as a nested OCTET STRING.
const PKCS8_SEED_HEADER: [u8; 16] = [
    0x30, 0x53, 0x02, 0x01, 0x01, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04,
    0x20,
];
/// The `[1]` attributes slot carrying the public key as a BIT STRING.
const PKCS8_PUBLIC_KEY_HEADER: [u8; 5] = [0xa1, 0x23, 0x03, 0x21, 0x00];

/// Derives JWT signing and verification keys from node identities.
///
/// The issuer peer id embeds the node's Ed25519 public key, so a token's
/// `iss` claim doubles as the identifier of the key to verify it with.
pub struct NodeSigner;

impl NodeSigner {
    pub const ALGORITHM: Algorithm = Algorithm::EdDSA;

    /// Build the signing key from the node's raw private key bytes and its
    /// peer identity.
    pub fn encoding_key(peer_id: &PeerId, private_key: &[u8; 32]) -> EncodingKey {
        let public_key = peer_id.public_key_bytes();
        let mut der = Vec::with_capacity(
            PKCS8_SEED_HEADER.len() + PKCS8_PUBLIC_KEY_HEADER.len() + 64,
        );
        der.extend_from_slice(&PKCS8_SEED_HEADER);
        der.extend_from_slice(private_key);
        der.extend_from_slice(&PKCS8_PUBLIC_KEY_HEADER);
        der.extend_from_slice(&public_key);
        EncodingKey::from_ed_der(&der)
    }

    /// Build the verification key for tokens issued by the given peer.
    pub fn decoding_key(peer_id: &PeerId) -> DecodingKey {
        DecodingKey::from_ed_der(&peer_id.public_key_bytes())
    }
}

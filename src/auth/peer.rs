//! Node peer identities.
//!
//! Nodes identify themselves with a libp2p-style Ed25519 peer id: an identity
//! multihash over the protobuf-framed public key, base58-encoded. The peer id
//! therefore embeds the verification key for tokens the node signs.

use thiserror::Error;

const MULTIHASH_IDENTITY: u8 = 0x00;
const MULTIHASH_LENGTH: u8 = 0x24;
/// Protobuf framing for an Ed25519 public key: field 1 (key type) = 1,
/// field 2 (key data) of length 32.
const ED25519_KEY_HEADER: [u8; 4] = [0x08, 0x01, 0x12, 0x20];
const PEER_ID_LEN: usize = 38;
const KEY_OFFSET: usize = 6;

#[derive(Debug, Error)]
pub enum PeerIdError {
    #[error("Invalid base58 encoding: {0}")]
    Base58(String),

    #[error("Not an identity-hashed Ed25519 peer id")]
    UnsupportedFormat,
}

/// An Ed25519 node identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId {
    bytes: Vec<u8>,
}

impl PeerId {
    pub fn from_base58(encoded: &str) -> Result<PeerId, PeerIdError> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| PeerIdError::Base58(e.to_string()))?;
        PeerId::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<PeerId, PeerIdError> {
        if bytes.len() != PEER_ID_LEN
            || bytes[0] != MULTIHASH_IDENTITY
            || bytes[1] != MULTIHASH_LENGTH
            || bytes[2..KEY_OFFSET] != ED25519_KEY_HEADER
        {
            return Err(PeerIdError::UnsupportedFormat);
        }
        Ok(PeerId { bytes })
    }

    pub fn from_public_key(public_key: &[u8; 32]) -> PeerId {
        let mut bytes = Vec::with_capacity(PEER_ID_LEN);
        bytes.push(MULTIHASH_IDENTITY);
        bytes.push(MULTIHASH_LENGTH);
        bytes.extend_from_slice(&ED25519_KEY_HEADER);
        bytes.extend_from_slice(public_key);
        PeerId { bytes }
    }

    /// Canonical base58 string, used as the token issuer claim.
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.bytes).into_string()
    }

    /// Canonical hex encoding, matching on-chain opaque peer ids.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The Ed25519 public key embedded in the identity.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        let mut key = [0u8; 32];
        key.copy_from_slice(&self.bytes[KEY_OFFSET..]);
        key
    }
}

//! Canonical signed-message construction and per-chain verification services.

use crate::auth::account::AccountType;
use crate::auth::verifier;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Chain-specific signature flavors accepted at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureType {
    Polkadot,
    Ethereum,
    CrossmintEthereum,
    Multiversx,
}

impl SignatureType {
    /// The account type a token minted from this signature flavor carries.
    pub fn account_type(self) -> AccountType {
        match self {
            SignatureType::Polkadot => AccountType::Polkadot,
            SignatureType::Ethereum | SignatureType::CrossmintEthereum => AccountType::Ethereum,
            SignatureType::Multiversx => AccountType::Bech32,
        }
    }
}

/// One element of the signed-claims attribute list.
///
/// Lists flatten recursively during message construction, so the nesting
/// shape never affects the digest.
#[derive(Debug, Clone)]
pub enum Attribute {
    Text(String),
    Bool(bool),
    UInt(u64),
    List(Vec<Attribute>),
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Attribute {
        Attribute::Text(value.to_string())
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Attribute {
        Attribute::Text(value)
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Attribute {
        Attribute::Bool(value)
    }
}

impl From<u64> for Attribute {
    fn from(value: u64) -> Attribute {
        Attribute::UInt(value)
    }
}

impl From<Vec<Attribute>> for Attribute {
    fn from(values: Vec<Attribute>) -> Attribute {
        Attribute::List(values)
    }
}

/// Claims to check a signature against.
#[derive(Debug, Clone)]
pub struct VerifyParams<'a> {
    pub signature: &'a str,
    pub address: &'a str,
    pub resource: &'a str,
    pub operation: &'a str,
    pub timestamp: &'a str,
    pub attributes: Vec<Attribute>,
}

type VerifyFn = fn(message: &str, signature: &str, address: &str) -> bool;

/// Verifies account signatures over the canonical claims message.
///
/// The per-chain verification function is fixed at construction; adding a
/// chain type means adding a constructor, not touching the dispatch.
pub struct SignatureService {
    verifier: VerifyFn,
}

impl SignatureService {
    pub fn polkadot() -> SignatureService {
        SignatureService {
            verifier: verifier::polkadot,
        }
    }

    pub fn ethereum() -> SignatureService {
        SignatureService {
            verifier: verifier::ethereum,
        }
    }

    pub fn crossmint_ethereum() -> SignatureService {
        SignatureService {
            verifier: verifier::crossmint_ethereum,
        }
    }

    pub fn multiversx() -> SignatureService {
        SignatureService {
            verifier: verifier::multiversx,
        }
    }

    /// Build the canonical message the signer's client must have signed.
    ///
    /// Elements are concatenated in order: resource, operation, sanitized
    /// timestamp, then every attribute flattened depth-first. The digest is
    /// the SHA-256 of the UTF-8 concatenation, base64-encoded. Bit-exact
    /// stability matters here: any drift breaks every client.
    pub fn build_message(params: &VerifyParams) -> String {
        let mut hasher = Sha256::new();
        hasher.update(params.resource.as_bytes());
        hasher.update(params.operation.as_bytes());
        hasher.update(sanitize_timestamp(params.timestamp).as_bytes());
        for attribute in &params.attributes {
            hash_attribute(&mut hasher, attribute);
        }
        STANDARD.encode(hasher.finalize())
    }

    /// Build the canonical message and check the claimed signature over it.
    pub fn verify(&self, params: &VerifyParams) -> bool {
        let message = SignatureService::build_message(params);
        (self.verifier)(&message, params.signature, params.address)
    }
}

fn hash_attribute(hasher: &mut Sha256, attribute: &Attribute) {
    match attribute {
        Attribute::Text(value) => hasher.update(value.as_bytes()),
        Attribute::Bool(value) => hasher.update(if *value { "true" } else { "false" }),
        Attribute::UInt(value) => hasher.update(value.to_string().as_bytes()),
        Attribute::List(values) => {
            for value in values {
                hash_attribute(hasher, value);
            }
        }
    }
}

/// Strip a trailing `Z` offset marker so extension-signed and server-side
/// timestamps hash identically.
pub(crate) fn sanitize_timestamp(timestamp: &str) -> &str {
    timestamp.strip_suffix('Z').unwrap_or(timestamp)
}

/// The closed set of supported signature services, keyed by type.
pub struct SignatureServices {
    polkadot: SignatureService,
    ethereum: SignatureService,
    crossmint_ethereum: SignatureService,
    multiversx: SignatureService,
}

impl SignatureServices {
    pub fn get(&self, signature_type: SignatureType) -> &SignatureService {
        match signature_type {
            SignatureType::Polkadot => &self.polkadot,
            SignatureType::Ethereum => &self.ethereum,
            SignatureType::CrossmintEthereum => &self.crossmint_ethereum,
            SignatureType::Multiversx => &self.multiversx,
        }
    }
}

impl Default for SignatureServices {
    fn default() -> SignatureServices {
        SignatureServices {
            polkadot: SignatureService::polkadot(),
            ethereum: SignatureService::ethereum(),
            crossmint_ethereum: SignatureService::crossmint_ethereum(),
            multiversx: SignatureService::multiversx(),
        }
    }
}

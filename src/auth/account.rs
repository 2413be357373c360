//! Account identities and per-chain address handling.

use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Domain separator for the SS58 checksum.
const SS58_CHECKSUM_PREFIX: &[u8] = b"SS58PRE";

/// Errors raised when an address does not parse under its declared chain type.
#[derive(Debug, Error)]
pub enum InvalidAddress {
    #[error("Invalid SS58 address: {0}")]
    Ss58(String),

    #[error("Invalid Ethereum address")]
    Ethereum,

    #[error("Invalid bech32 address: {0}")]
    Bech32(String),
}

/// Supported account (chain) types.
///
/// Serialized names are the exact strings carried in the token's
/// `addressType` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Polkadot,
    Ethereum,
    Bech32,
}

impl AccountType {
    /// Parse an `addressType` claim value. Unknown types are rejected, never
    /// mapped to a default.
    pub fn from_claim(value: &str) -> Option<AccountType> {
        match value {
            "Polkadot" => Some(AccountType::Polkadot),
            "Ethereum" => Some(AccountType::Ethereum),
            "Bech32" => Some(AccountType::Bech32),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Polkadot => write!(f, "Polkadot"),
            AccountType::Ethereum => write!(f, "Ethereum"),
            AccountType::Bech32 => write!(f, "Bech32"),
        }
    }
}

/// A validated `(address, chain type)` pair.
///
/// Equality is structural: the same address text under a different chain
/// type is a different identity. Ethereum addresses are normalized to
/// lowercase at construction so equality is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidAccountId {
    address: String,
    account_type: AccountType,
}

impl ValidAccountId {
    pub fn new(address: &str, account_type: AccountType) -> Result<ValidAccountId, InvalidAddress> {
        match account_type {
            AccountType::Polkadot => ValidAccountId::polkadot(address),
            AccountType::Ethereum => ValidAccountId::ethereum(address),
            AccountType::Bech32 => ValidAccountId::bech32(address),
        }
    }

    pub fn polkadot(address: &str) -> Result<ValidAccountId, InvalidAddress> {
        ss58_decode(address)?;
        Ok(ValidAccountId {
            address: address.to_string(),
            account_type: AccountType::Polkadot,
        })
    }

    pub fn ethereum(address: &str) -> Result<ValidAccountId, InvalidAddress> {
        let digits = address.strip_prefix("0x").ok_or(InvalidAddress::Ethereum)?;
        if digits.len() != 40 || hex::decode(digits).is_err() {
            return Err(InvalidAddress::Ethereum);
        }
        Ok(ValidAccountId {
            address: address.to_lowercase(),
            account_type: AccountType::Ethereum,
        })
    }

    pub fn bech32(address: &str) -> Result<ValidAccountId, InvalidAddress> {
        bech32_public_key(address)?;
        Ok(ValidAccountId {
            address: address.to_string(),
            account_type: AccountType::Bech32,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }
}

impl fmt::Display for ValidAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.account_type, self.address)
    }
}

/// Decode an SS58 address into its 32-byte public key, checking the
/// blake2b-512 checksum.
///
/// Both registry prefix encodings are accepted: one byte for idents below
/// 64, two bytes (high bit 0b0100_0000 set on the first) for idents up to
/// 16383.
pub fn ss58_decode(address: &str) -> Result<[u8; 32], InvalidAddress> {
    let data = bs58::decode(address)
        .into_vec()
        .map_err(|e| InvalidAddress::Ss58(e.to_string()))?;

    // Prefix, 32-byte key, 2-byte checksum.
    let key_offset = match data.len() {
        35 => 1,
        36 if data[0] & 0b0100_0000 != 0 => 2,
        _ => {
            return Err(InvalidAddress::Ss58(format!(
                "unexpected length {}",
                data.len()
            )))
        }
    };
    let checksum_offset = key_offset + 32;

    let mut hasher = Blake2b512::new();
    hasher.update(SS58_CHECKSUM_PREFIX);
    hasher.update(&data[..checksum_offset]);
    let checksum = hasher.finalize();
    if checksum[..2] != data[checksum_offset..] {
        return Err(InvalidAddress::Ss58("checksum mismatch".to_string()));
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&data[key_offset..checksum_offset]);
    Ok(public_key)
}

/// Encode a 32-byte public key as an SS58 address under the given network
/// registry ident (0..=16383).
pub fn ss58_encode(public_key: &[u8; 32], network: u16) -> String {
    let mut data = Vec::with_capacity(36);
    if network < 64 {
        data.push(network as u8);
    } else {
        // Two-byte ident: 14 bits spread per the SS58 registry layout.
        data.push(((network & 0b0000_0000_1111_1100) as u8) >> 2 | 0b0100_0000);
        data.push((network >> 8) as u8 | ((network & 0b0000_0000_0000_0011) as u8) << 6);
    }
    data.extend_from_slice(public_key);

    let mut hasher = Blake2b512::new();
    hasher.update(SS58_CHECKSUM_PREFIX);
    hasher.update(&data);
    let checksum = hasher.finalize();
    data.extend_from_slice(&checksum[..2]);

    bs58::encode(data).into_string()
}

/// Human-readable part of MultiversX addresses.
const MULTIVERSX_HRP: &str = "erd";

/// Decode a bech32 (MultiversX) address into its Ed25519 public key.
pub fn bech32_public_key(address: &str) -> Result<[u8; 32], InvalidAddress> {
    use bech32::FromBase32;

    let (hrp, data, _variant) =
        bech32::decode(address).map_err(|e| InvalidAddress::Bech32(e.to_string()))?;
    if hrp != MULTIVERSX_HRP {
        return Err(InvalidAddress::Bech32(format!("unexpected prefix {hrp}")));
    }
    let bytes =
        Vec::<u8>::from_base32(&data).map_err(|e| InvalidAddress::Bech32(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| InvalidAddress::Bech32("unexpected key length".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ss58_round_trip() {
        let public_key = [0xEEu8; 32];
        let address = ss58_encode(&public_key, 42);
        assert_eq!(ss58_decode(&address).unwrap(), public_key);
    }

    #[test]
    fn test_ss58_two_byte_prefix_round_trip() {
        // Registry idents >= 64 use the two-byte prefix encoding.
        let public_key = [0xEEu8; 32];
        let address = ss58_encode(&public_key, 2021);
        assert_eq!(ss58_decode(&address).unwrap(), public_key);

        // 36 bytes before base58: two-byte prefix, key, checksum.
        let raw = bs58::decode(&address).into_vec().unwrap();
        assert_eq!(raw.len(), 36);
        assert_ne!(raw[0] & 0b0100_0000, 0);

        let account = ValidAccountId::polkadot(&address).unwrap();
        assert_eq!(account.account_type(), AccountType::Polkadot);
    }

    #[test]
    fn test_ss58_rejects_bad_checksum() {
        let address = ss58_encode(&[0xEEu8; 32], 42);
        let mut data = bs58::decode(&address).into_vec().unwrap();
        data[34] ^= 0x01;
        let tampered = bs58::encode(data).into_string();
        assert!(ss58_decode(&tampered).is_err());
    }

    #[test]
    fn test_ethereum_address_is_normalized() {
        let upper = ValidAccountId::ethereum("0xAB5801A7D398351B8BE11C439E05C5B3259AEC9B").unwrap();
        let lower = ValidAccountId::ethereum("0xab5801a7d398351b8be11c439e05c5b3259aec9b").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.address(), "0xab5801a7d398351b8be11c439e05c5b3259aec9b");
    }

    #[test]
    fn test_ethereum_address_validation() {
        assert!(ValidAccountId::ethereum("ab5801a7d398351b8be11c439e05c5b3259aec9b").is_err());
        assert!(ValidAccountId::ethereum("0x1234").is_err());
        assert!(ValidAccountId::ethereum("0xzz5801a7d398351b8be11c439e05c5b3259aec9b").is_err());
    }

    #[test]
    fn test_bech32_round_trip() {
        use bech32::{ToBase32, Variant};

        let public_key = [0x42u8; 32];
        let address = bech32::encode("erd", public_key.to_base32(), Variant::Bech32).unwrap();
        assert_eq!(bech32_public_key(&address).unwrap(), public_key);

        let account = ValidAccountId::bech32(&address).unwrap();
        assert_eq!(account.account_type(), AccountType::Bech32);
    }

    #[test]
    fn test_bech32_rejects_foreign_prefix() {
        use bech32::{ToBase32, Variant};

        // 32 bytes of key data under another chain's prefix.
        let address = bech32::encode("cosmos", [0x42u8; 32].to_base32(), Variant::Bech32).unwrap();
        assert!(bech32_public_key(&address).is_err());
        assert!(ValidAccountId::bech32(&address).is_err());
    }

    #[test]
    fn test_account_type_claim_names() {
        assert_eq!(AccountType::from_claim("Polkadot"), Some(AccountType::Polkadot));
        assert_eq!(AccountType::from_claim("Ethereum"), Some(AccountType::Ethereum));
        assert_eq!(AccountType::from_claim("Bech32"), Some(AccountType::Bech32));
        assert_eq!(AccountType::from_claim("Solana"), None);
        assert_eq!(AccountType::Polkadot.to_string(), "Polkadot");
    }
}

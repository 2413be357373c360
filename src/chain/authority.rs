//! On-chain legal officer authority queries.
//!
//! The chain is the single source of truth for the legal officer role:
//! membership lives in the `LoAuthorityList` pallet, and node trust derives
//! from the union of that pallet's node set and the `NodeAuthorization`
//! well-known nodes.

use crate::auth::account::{ss58_decode, AccountType, ValidAccountId};
use crate::auth::peer::PeerId;
use crate::chain::error::AuthorityError;
use async_trait::async_trait;
use log::{debug, info};
use scale::Decode;
use subxt::{OnlineClient, PolkadotConfig};
use tokio::sync::RwLock;

const LO_AUTHORITY_LIST_PALLET: &[u8] = b"LoAuthorityList";
const LEGAL_OFFICER_SET_ITEM: &[u8] = b"LegalOfficerSet";
const LEGAL_OFFICER_NODES_ITEM: &[u8] = b"LegalOfficerNodes";
const NODE_AUTHORIZATION_PALLET: &[u8] = b"NodeAuthorization";
const WELL_KNOWN_NODES_ITEM: &[u8] = b"WellKnownNodes";

/// Answers authority questions about accounts and nodes.
#[async_trait]
pub trait AuthorityService: Send + Sync {
    /// Whether the account holds the legal officer role anywhere.
    async fn is_legal_officer(&self, account: &ValidAccountId) -> Result<bool, AuthorityError>;

    /// Whether the account is a legal officer hosted on this node.
    async fn is_legal_officer_on_node(
        &self,
        account: &ValidAccountId,
    ) -> Result<bool, AuthorityError>;

    /// Whether the peer is a recognized legal officer or well-known node.
    async fn is_legal_officer_node(&self, peer_id: &PeerId) -> Result<bool, AuthorityError>;
}

/// Per-host settings of a legal officer entry.
#[derive(Debug, Clone, Decode, PartialEq, Eq)]
pub struct HostData {
    pub node_id: Option<Vec<u8>>,
    pub base_url: Option<Vec<u8>>,
}

/// A `LoAuthorityList` pallet entry.
///
/// Guests delegate hosting to another legal officer; resolution is a single
/// hop, a guest pointing at another guest never resolves to a node.
#[derive(Debug, Clone, Decode, PartialEq, Eq)]
pub enum LegalOfficerData {
    Host(HostData),
    Guest([u8; 32]),
}

impl LegalOfficerData {
    fn hosts_node(&self, peer_id: &PeerId) -> bool {
        match self {
            LegalOfficerData::Host(data) => data.node_id.as_deref() == Some(peer_id.as_bytes()),
            LegalOfficerData::Guest(_) => false,
        }
    }
}

/// Chain-backed implementation querying pallet storage over RPC.
pub struct ChainAuthorityService {
    /// The RPC URL for the chain node.
    rpc_url: String,

    /// Identity of the node this service runs next to.
    node_peer_id: PeerId,

    /// The subxt online client (lazy-initialized).
    client: RwLock<Option<OnlineClient<PolkadotConfig>>>,
}

impl ChainAuthorityService {
    /// Create a new authority service.
    ///
    /// Connection is established lazily on first query.
    pub fn new(rpc_url: String, node_peer_id: PeerId) -> Self {
        Self {
            rpc_url,
            node_peer_id,
            client: RwLock::new(None),
        }
    }

    /// Connect to the chain node.
    pub async fn connect(&self) -> Result<(), AuthorityError> {
        info!("Connecting to chain RPC at {}", self.rpc_url);

        let client = OnlineClient::<PolkadotConfig>::from_url(&self.rpc_url)
            .await
            .map_err(|e| AuthorityError::ConnectionFailed {
                url: self.rpc_url.clone(),
                reason: e.to_string(),
            })?;

        let mut guard = self.client.write().await;
        *guard = Some(client);

        info!("Successfully connected to chain at {}", self.rpc_url);
        Ok(())
    }

    /// Get or create the client connection.
    async fn get_client(&self) -> Result<OnlineClient<PolkadotConfig>, AuthorityError> {
        {
            let guard = self.client.read().await;
            if let Some(client) = guard.as_ref() {
                return Ok(client.clone());
            }
        }

        self.connect().await?;

        let guard = self.client.read().await;
        guard
            .clone()
            .ok_or_else(|| AuthorityError::ConnectionFailed {
                url: self.rpc_url.clone(),
                reason: "Failed to establish connection".to_string(),
            })
    }

    /// Fetch raw storage at the latest block.
    async fn fetch_raw(&self, storage_key: Vec<u8>) -> Result<Option<Vec<u8>>, AuthorityError> {
        let client = self.get_client().await?;

        debug!("Querying storage key {}", hex::encode(&storage_key));

        let block = client
            .blocks()
            .at_latest()
            .await
            .map_err(|e| AuthorityError::RpcError(e.to_string()))?;

        block
            .storage()
            .fetch_raw(storage_key)
            .await
            .map_err(|e| AuthorityError::RpcError(e.to_string()))
    }

    /// Fetch the `LoAuthorityList` entry of an account, if any.
    ///
    /// Only Polkadot accounts can appear in the pallet; other account types
    /// answer `None` without a chain query.
    async fn legal_officer_entry(
        &self,
        account: &ValidAccountId,
    ) -> Result<Option<LegalOfficerData>, AuthorityError> {
        if account.account_type() != AccountType::Polkadot {
            return Ok(None);
        }
        let public_key = ss58_decode(account.address())
            .map_err(|e| AuthorityError::UnsupportedAccount(e.to_string()))?;
        self.fetch_legal_officer_entry(&public_key).await
    }

    async fn fetch_legal_officer_entry(
        &self,
        public_key: &[u8; 32],
    ) -> Result<Option<LegalOfficerData>, AuthorityError> {
        let key = legal_officer_set_key(public_key);
        match self.fetch_raw(key).await? {
            Some(data) => {
                let entry = LegalOfficerData::decode(&mut &data[..])
                    .map_err(|e| AuthorityError::DecodeError(e.to_string()))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Fetch a storage value holding a SCALE list of opaque peer ids.
    /// Missing storage reads as the empty set.
    async fn fetch_node_set(&self, storage_key: Vec<u8>) -> Result<Vec<Vec<u8>>, AuthorityError> {
        match self.fetch_raw(storage_key).await? {
            Some(data) => Vec::<Vec<u8>>::decode(&mut &data[..])
                .map_err(|e| AuthorityError::DecodeError(e.to_string())),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl AuthorityService for ChainAuthorityService {
    async fn is_legal_officer(&self, account: &ValidAccountId) -> Result<bool, AuthorityError> {
        Ok(self.legal_officer_entry(account).await?.is_some())
    }

    async fn is_legal_officer_on_node(
        &self,
        account: &ValidAccountId,
    ) -> Result<bool, AuthorityError> {
        let Some(entry) = self.legal_officer_entry(account).await? else {
            return Ok(false);
        };
        match entry {
            LegalOfficerData::Host(_) => Ok(entry.hosts_node(&self.node_peer_id)),
            LegalOfficerData::Guest(host_key) => {
                // Single hop: the host must itself be a hosted entry.
                let host = self.fetch_legal_officer_entry(&host_key).await?;
                Ok(host.is_some_and(|entry| entry.hosts_node(&self.node_peer_id)))
            }
        }
    }

    async fn is_legal_officer_node(&self, peer_id: &PeerId) -> Result<bool, AuthorityError> {
        let legal_officer_nodes = self.fetch_node_set(legal_officer_nodes_key()).await?;
        if legal_officer_nodes
            .iter()
            .any(|node| node.as_slice() == peer_id.as_bytes())
        {
            return Ok(true);
        }
        let well_known_nodes = self.fetch_node_set(well_known_nodes_key()).await?;
        Ok(well_known_nodes
            .iter()
            .any(|node| node.as_slice() == peer_id.as_bytes()))
    }
}

impl std::fmt::Debug for ChainAuthorityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainAuthorityService")
            .field("rpc_url", &self.rpc_url)
            .field("node_peer_id", &self.node_peer_id)
            .finish_non_exhaustive()
    }
}

/// Storage key of a plain storage value: twox_128(pallet) ++ twox_128(item).
fn storage_value_key(pallet: &[u8], item: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&twox_128(pallet));
    key.extend_from_slice(&twox_128(item));
    key
}

/// Storage key of a `LegalOfficerSet` map entry, hashed with
/// blake2_128_concat as declared by the pallet.
fn legal_officer_set_key(public_key: &[u8; 32]) -> Vec<u8> {
    let mut key = storage_value_key(LO_AUTHORITY_LIST_PALLET, LEGAL_OFFICER_SET_ITEM);
    key.extend_from_slice(&blake2_128(public_key));
    key.extend_from_slice(public_key);
    key
}

fn legal_officer_nodes_key() -> Vec<u8> {
    storage_value_key(LO_AUTHORITY_LIST_PALLET, LEGAL_OFFICER_NODES_ITEM)
}

fn well_known_nodes_key() -> Vec<u8> {
    storage_value_key(NODE_AUTHORIZATION_PALLET, WELL_KNOWN_NODES_ITEM)
}

/// Compute TwoX 128-bit hash (Substrate standard for pallet/item names).
fn twox_128(data: &[u8]) -> [u8; 16] {
    use std::hash::Hasher;
    use twox_hash::XxHash64;

    // TwoX128 = XxHash64(seed=0) || XxHash64(seed=1)
    let mut h0 = XxHash64::with_seed(0);
    let mut h1 = XxHash64::with_seed(1);
    h0.write(data);
    h1.write(data);

    let r0 = h0.finish();
    let r1 = h1.finish();

    let mut result = [0u8; 16];
    result[..8].copy_from_slice(&r0.to_le_bytes());
    result[8..].copy_from_slice(&r1.to_le_bytes());
    result
}

/// Compute Blake2b 128-bit hash.
fn blake2_128(data: &[u8]) -> [u8; 16] {
    use blake2::{digest::consts::U16, Blake2b, Digest};

    let mut hasher = Blake2b::<U16>::new();
    hasher.update(data);
    let result = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&result);
    bytes
}

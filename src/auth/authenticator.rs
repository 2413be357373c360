//! Bearer token issuance and verification.

use crate::auth::account::{AccountType, ValidAccountId};
use crate::auth::error::Unauthorized;
use crate::auth::peer::PeerId;
use crate::auth::session::SignedSession;
use crate::auth::signer::NodeSigner;
use crate::auth::user::AuthenticatedUser;
use crate::chain::AuthorityService;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, EncodingKey, Header, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Static node configuration injected at construction. No ambient state:
/// every Authenticator call is keyed only by its inputs and this object.
pub struct AuthenticatorConfig {
    pub node_owner: ValidAccountId,
    pub node_peer_id: PeerId,
    /// Raw Ed25519 private key matching the peer id's embedded public key.
    pub node_key: [u8; 32],
    pub jwt_time_to_live: Duration,
    pub authority: Arc<dyn AuthorityService>,
}

/// A minted bearer credential. Self-contained: validity is entirely
/// determined by its signature, expiry claim and issuer trust at
/// verification time.
#[derive(Debug, Clone)]
pub struct Token {
    pub address: String,
    pub account_type: AccountType,
    /// Compact JWT encoding.
    pub value: String,
    pub expired_on: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iat: i64,
    exp: i64,
    iss: String,
    sub: String,
    #[serde(rename = "addressType", skip_serializing_if = "Option::is_none")]
    address_type: Option<String>,
}

/// Issues tokens for verified sessions and turns presented tokens back into
/// authenticated users.
pub struct Authenticator {
    config: AuthenticatorConfig,
    encoding_key: EncodingKey,
}

impl Authenticator {
    pub fn new(config: AuthenticatorConfig) -> Authenticator {
        let encoding_key = NodeSigner::encoding_key(&config.node_peer_id, &config.node_key);
        Authenticator {
            config,
            encoding_key,
        }
    }

    /// Mint one token per verified signature of the session. Issuance trusts
    /// the session's signature types; unsupported types only fail later, at
    /// verification.
    pub fn create_tokens(
        &self,
        signed_session: &SignedSession,
        issued_at: DateTime<Utc>,
    ) -> Result<Vec<Token>, Unauthorized> {
        signed_session
            .signatures
            .iter()
            .map(|signature| {
                self.create_token(
                    &signature.address,
                    signature.signature_type.account_type(),
                    issued_at,
                )
            })
            .collect()
    }

    /// Verify a token, then wrap the proven identity for authorization
    /// checks.
    pub async fn ensure_authenticated_user_or_throw(
        &self,
        token: &str,
    ) -> Result<AuthenticatedUser, Unauthorized> {
        let account = self.valid_token_or_throw(token).await?;
        Ok(AuthenticatedUser::new(
            account,
            self.config.node_owner.clone(),
            Arc::clone(&self.config.authority),
        ))
    }

    /// Verify a token, then mint a fresh one for the same account (sliding
    /// expiration). An already-expired token cannot be refreshed.
    pub async fn refresh_token(&self, token: &str) -> Result<Token, Unauthorized> {
        let account = self.valid_token_or_throw(token).await?;
        self.create_token(account.address(), account.account_type(), Utc::now())
    }

    fn create_token(
        &self,
        address: &str,
        account_type: AccountType,
        issued_at: DateTime<Utc>,
    ) -> Result<Token, Unauthorized> {
        let iat = issued_at.timestamp();
        let exp = iat + self.config.jwt_time_to_live.as_secs() as i64;
        let claims = Claims {
            iat,
            exp,
            iss: self.config.node_peer_id.to_base58(),
            sub: address.to_string(),
            address_type: Some(account_type.to_string()),
        };
        let value = encode(&Header::new(NodeSigner::ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| Unauthorized::new(e.to_string()))?;
        let expired_on = DateTime::<Utc>::from_timestamp(exp, 0)
            .ok_or_else(|| Unauthorized::new("Expiration out of range"))?;
        debug!("issued token for {address}, expires on {expired_on}");
        Ok(Token {
            address: address.to_string(),
            account_type,
            value,
            expired_on,
        })
    }

    async fn valid_token_or_throw(&self, token: &str) -> Result<ValidAccountId, Unauthorized> {
        // The issuer is read before any cryptographic check: it names the
        // key to verify with, and tokens from unrecognized issuers are not
        // worth a verification.
        let issuer = unverified_issuer(token)?;
        let peer_id =
            PeerId::from_base58(&issuer).map_err(|_| Unauthorized::new("Invalid issuer"))?;
        let trusted = self
            .config
            .authority
            .is_legal_officer_node(&peer_id)
            .await
            .map_err(|e| Unauthorized::new(e.to_string()))?;
        if !trusted {
            warn!("rejecting token from unrecognized issuer {issuer}");
            return Err(Unauthorized::new("Invalid issuer"));
        }

        let decoding_key = NodeSigner::decoding_key(&peer_id);
        let mut validation = Validation::new(NodeSigner::ALGORITHM);
        validation.set_required_spec_claims(&["iss", "sub", "exp"]);
        // Expiry is checked manually below with a strict boundary.
        validation.validate_exp = false;
        let data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| Unauthorized::new(e.to_string()))?;
        let claims = data.claims;

        if Utc::now().timestamp() >= claims.exp {
            return Err(Unauthorized::new("Token expired"));
        }

        let account_type = claims
            .address_type
            .as_deref()
            .and_then(AccountType::from_claim)
            .ok_or_else(|| {
                Unauthorized::new("Unable to find supported address type in payload")
            })?;
        ValidAccountId::new(&claims.sub, account_type).map_err(|e| Unauthorized::new(e.to_string()))
    }
}

/// Read the issuer claim without checking the signature.
fn unverified_issuer(token: &str) -> Result<String, Unauthorized> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(Unauthorized::new("Invalid token format")),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| Unauthorized::new(e.to_string()))?;
    let json: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| Unauthorized::new(e.to_string()))?;
    json.get("iss")
        .and_then(|iss| iss.as_str())
        .map(str::to_string)
        .ok_or_else(|| Unauthorized::new("Invalid issuer"))
}

//! Login sessions and batch signature verification.

use crate::auth::error::Unauthorized;
use crate::auth::signature::{
    sanitize_timestamp, Attribute, SignatureServices, SignatureType, VerifyParams,
};
use crate::auth::verifier;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use uuid::Uuid;

pub const LOGIN_RESOURCE: &str = "authentication";
pub const LOGIN_OPERATION: &str = "login";

/// A login challenge binding a random identifier to candidate account
/// addresses. Immutable once created; consumed by one verification attempt.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub addresses: Vec<String>,
    pub created_on: DateTime<Utc>,
}

/// A signature produced off-system by one of the session's account holders.
#[derive(Debug, Clone)]
pub struct SessionSignature {
    pub address: String,
    /// Hex or scheme-prefixed hex, per chain conventions.
    pub signature: String,
    /// ISO-8601 timestamp the client signed at, kept verbatim: it is part of
    /// the signed message.
    pub signed_on: String,
    pub signature_type: SignatureType,
}

/// A session whose every signature verified. Never constructed on failure.
#[derive(Debug, Clone)]
pub struct SignedSession {
    pub session: Session,
    pub signatures: Vec<SessionSignature>,
}

/// Creates login challenges and verifies the signatures answering them.
pub struct SessionManager {
    signature_services: SignatureServices,
}

impl SessionManager {
    pub fn new(signature_services: SignatureServices) -> SessionManager {
        SessionManager { signature_services }
    }

    /// Create a fresh challenge for the given candidate addresses.
    pub fn create_new_session(&self, addresses: Vec<String>) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            addresses,
            created_on: Utc::now(),
        };
        debug!("created session {}", session.id);
        session
    }

    /// Verify the whole signature batch, all-or-nothing.
    ///
    /// A single bad signature aborts the call, and the error never says which
    /// signature was rejected or why.
    pub fn signed_session_or_throw(
        &self,
        session: &Session,
        signatures: &[SessionSignature],
    ) -> Result<SignedSession, Unauthorized> {
        for signature in signatures {
            if !self.verifies(session, signature) {
                warn!("rejecting signatures for session {}", session.id);
                return Err(Unauthorized::new("Invalid signature"));
            }
        }
        Ok(SignedSession {
            session: session.clone(),
            signatures: signatures.to_vec(),
        })
    }

    fn verifies(&self, session: &Session, signature: &SessionSignature) -> bool {
        if !session
            .addresses
            .iter()
            .any(|address| address == &signature.address)
        {
            return false;
        }
        let service = self.signature_services.get(signature.signature_type);
        let params = VerifyParams {
            signature: &signature.signature,
            address: &signature.address,
            resource: LOGIN_RESOURCE,
            operation: LOGIN_OPERATION,
            timestamp: &signature.signed_on,
            attributes: vec![Attribute::from(session.id.to_string())],
        };
        if service.verify(&params) {
            return true;
        }
        // Older Polkadot clients sign the plain V2 challenge instead of the
        // canonical digest. Protocol choice is not negotiated in-band, so
        // both stay accepted.
        signature.signature_type == SignatureType::Polkadot
            && verifier::polkadot(
                &v2_message(session.id, &signature.signed_on),
                &signature.signature,
                &signature.address,
            )
    }
}

/// The simplified Polkadot-only login message.
pub fn v2_message(session_id: Uuid, timestamp: &str) -> String {
    format!(
        "logion-auth: {} on {}",
        session_id,
        sanitize_timestamp(timestamp)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account::ss58_encode;
    use crate::auth::signature::SignatureService;
    use schnorrkel::{ExpansionMode, Keypair, MiniSecretKey};

    const SR25519_SIGNING_CONTEXT: &[u8] = b"substrate";

    fn sr25519_pair(seed: u8) -> (Keypair, String) {
        let pair = MiniSecretKey::from_bytes(&[seed; 32])
            .unwrap()
            .expand_to_keypair(ExpansionMode::Ed25519);
        let address = ss58_encode(&pair.public.to_bytes(), 42);
        (pair, address)
    }

    fn sign_v1(pair: &Keypair, session: &Session, address: &str, timestamp: &str) -> SessionSignature {
        let params = VerifyParams {
            signature: "",
            address,
            resource: LOGIN_RESOURCE,
            operation: LOGIN_OPERATION,
            timestamp,
            attributes: vec![Attribute::from(session.id.to_string())],
        };
        let message = SignatureService::build_message(&params);
        let wrapped = format!("<Bytes>{message}</Bytes>");
        let signature = pair.sign_simple(SR25519_SIGNING_CONTEXT, wrapped.as_bytes());
        SessionSignature {
            address: address.to_string(),
            signature: hex::encode(signature.to_bytes()),
            signed_on: timestamp.to_string(),
            signature_type: SignatureType::Polkadot,
        }
    }

    #[test]
    fn test_create_new_session_binds_addresses() {
        let manager = SessionManager::new(SignatureServices::default());
        let session = manager.create_new_session(vec!["addr1".to_string(), "addr2".to_string()]);
        assert_eq!(session.addresses, vec!["addr1", "addr2"]);

        let other = manager.create_new_session(vec!["addr1".to_string()]);
        assert_ne!(session.id, other.id);
    }

    #[test]
    fn test_signed_session_with_valid_signature() {
        let manager = SessionManager::new(SignatureServices::default());
        let (pair, address) = sr25519_pair(1);
        let session = manager.create_new_session(vec![address.clone()]);

        let signature = sign_v1(&pair, &session, &address, "2024-05-10T12:00:00.000Z");
        let signed = manager
            .signed_session_or_throw(&session, &[signature])
            .unwrap();
        assert_eq!(signed.session.id, session.id);
        assert_eq!(signed.signatures.len(), 1);
    }

    #[test]
    fn test_all_or_nothing_batch() {
        let manager = SessionManager::new(SignatureServices::default());
        let (first_pair, first_address) = sr25519_pair(1);
        let (_, second_address) = sr25519_pair(2);
        let session =
            manager.create_new_session(vec![first_address.clone(), second_address.clone()]);

        let valid = sign_v1(&first_pair, &session, &first_address, "2024-05-10T12:00:00.000Z");
        // Signed by the wrong key: individually invalid.
        let invalid = SessionSignature {
            address: second_address,
            ..sign_v1(&first_pair, &session, &first_address, "2024-05-10T12:00:00.000Z")
        };

        let result = manager.signed_session_or_throw(&session, &[valid, invalid]);
        assert_eq!(result.unwrap_err(), Unauthorized::new("Invalid signature"));
    }

    #[test]
    fn test_rejects_address_outside_session() {
        let manager = SessionManager::new(SignatureServices::default());
        let (pair, address) = sr25519_pair(1);
        let session = manager.create_new_session(vec!["somebody else".to_string()]);

        let signature = sign_v1(&pair, &session, &address, "2024-05-10T12:00:00.000Z");
        assert!(manager.signed_session_or_throw(&session, &[signature]).is_err());
    }

    #[test]
    fn test_rejects_substituted_session_id() {
        let manager = SessionManager::new(SignatureServices::default());
        let (pair, address) = sr25519_pair(1);
        let session = manager.create_new_session(vec![address.clone()]);
        let other_session = manager.create_new_session(vec![address.clone()]);

        let signature = sign_v1(&pair, &other_session, &address, "2024-05-10T12:00:00.000Z");
        assert!(manager.signed_session_or_throw(&session, &[signature]).is_err());
    }

    #[test]
    fn test_v2_polkadot_protocol_is_accepted() {
        let manager = SessionManager::new(SignatureServices::default());
        let (pair, address) = sr25519_pair(1);
        let session = manager.create_new_session(vec![address.clone()]);

        let timestamp = "2024-05-10T12:00:00.000Z";
        let message = v2_message(session.id, timestamp);
        let wrapped = format!("<Bytes>{message}</Bytes>");
        let signature = pair.sign_simple(SR25519_SIGNING_CONTEXT, wrapped.as_bytes());

        let session_signature = SessionSignature {
            address: address.clone(),
            signature: hex::encode(signature.to_bytes()),
            signed_on: timestamp.to_string(),
            signature_type: SignatureType::Polkadot,
        };
        assert!(manager
            .signed_session_or_throw(&session, &[session_signature])
            .is_ok());
    }

    #[test]
    fn test_v2_message_format() {
        let id = Uuid::nil();
        assert_eq!(
            v2_message(id, "2024-05-10T12:00:00.000Z"),
            "logion-auth: 00000000-0000-0000-0000-000000000000 on 2024-05-10T12:00:00.000"
        );
    }
}

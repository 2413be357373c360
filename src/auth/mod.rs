//! Multi-chain authentication.
//!
//! This module covers the whole login flow: a client opens a session, signs
//! the resulting challenge with one or more chain accounts, and exchanges
//! the signatures for node-issued JWTs. Tokens presented later are verified
//! against the issuing node's key and wrapped as authenticated users.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐     ┌──────────────────┐     ┌───────────────────┐
//! │ SessionManager │────▶│ SignatureService │────▶│ verifier          │
//! │  (challenges)  │     │ (canonical msg)  │     │ (per-chain crypto)│
//! └────────────────┘     └──────────────────┘     └───────────────────┘
//!         │
//!         ▼
//! ┌────────────────┐     ┌──────────────────┐     ┌───────────────────┐
//! │ Authenticator  │────▶│ NodeSigner       │     │ AuthorityService  │
//! │ (JWT issue +   │     │ (EdDSA keys from │◀────│ (on-chain roles,  │
//! │  verification) │     │  peer identity)  │     │  trusted issuers) │
//! └────────────────┘     └──────────────────┘     └───────────────────┘
//!         │
//!         ▼
//! ┌───────────────────┐
//! │ AuthenticatedUser │
//! │ (authorization)   │
//! └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use logion_auth::auth::{Authenticator, SessionManager, SignatureServices};
//!
//! let manager = SessionManager::new(SignatureServices::default());
//! let session = manager.create_new_session(addresses);
//! // ... client signs the challenge ...
//! let signed = manager.signed_session_or_throw(&session, &signatures)?;
//! let tokens = authenticator.create_tokens(&signed, Utc::now())?;
//! ```

pub mod account;
pub mod authenticator;
pub mod error;
pub mod peer;
pub mod session;
pub mod signature;
pub mod signer;
pub mod user;
pub(crate) mod verifier;

pub use account::{AccountType, InvalidAddress, ValidAccountId};
pub use authenticator::{Authenticator, AuthenticatorConfig, Token};
pub use error::Unauthorized;
pub use peer::{PeerId, PeerIdError};
pub use session::{Session, SessionManager, SessionSignature, SignedSession};
pub use signature::{Attribute, SignatureService, SignatureServices, SignatureType, VerifyParams};
pub use signer::NodeSigner;
pub use user::AuthenticatedUser;

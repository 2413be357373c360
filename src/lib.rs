//! Multi-chain authentication toolkit.
//!
//! Turns chain-account signatures (Polkadot, Ethereum, Crossmint custodial
//! wallets, MultiversX) into node-issued JWTs, verifies presented tokens,
//! and answers authorization questions against on-chain authority state.

// Session, signature and token handling
pub mod auth;

// On-chain authority queries
pub mod chain;

pub use auth::{
    AccountType, Attribute, AuthenticatedUser, Authenticator, AuthenticatorConfig, PeerId, Session,
    SessionManager, SessionSignature, SignatureService, SignatureServices, SignatureType,
    SignedSession, Token, Unauthorized, ValidAccountId, VerifyParams,
};
pub use chain::{AuthorityError, AuthorityService, ChainAuthorityService};

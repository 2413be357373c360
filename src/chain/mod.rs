//! Chain-backed authority queries.
//!
//! The legal officer role and the set of trusted nodes are not configured
//! locally: they are read from pallet storage of the connected chain. This
//! module hides the subxt plumbing behind the [`AuthorityService`] trait so
//! the authentication layer can be tested against mocks.

pub mod authority;
pub mod error;

pub use authority::{AuthorityService, ChainAuthorityService, HostData, LegalOfficerData};
pub use error::AuthorityError;

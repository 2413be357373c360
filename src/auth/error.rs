//! Error type for authorization failures.

use thiserror::Error;

/// The single error kind raised by every authorization failure.
///
/// Callers can only tell failures apart by message text: malformed token,
/// untrusted issuer, bad signature and unsupported address type all surface
/// as this one kind, so a rejected request carries no discriminating signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Unauthorized(pub String);

impl Unauthorized {
    pub fn new(message: impl Into<String>) -> Self {
        Unauthorized(message.into())
    }
}

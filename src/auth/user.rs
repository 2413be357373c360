//! Authenticated identities and authorization checks.

use crate::auth::account::{AccountType, ValidAccountId};
use crate::auth::error::Unauthorized;
use crate::chain::AuthorityService;
use std::fmt;
use std::sync::Arc;

/// An account whose token verified. Carries the node context needed to
/// answer authorization questions about the proven identity.
#[derive(Clone)]
pub struct AuthenticatedUser {
    account: ValidAccountId,
    node_owner: ValidAccountId,
    authority: Arc<dyn AuthorityService>,
}

impl AuthenticatedUser {
    pub fn new(
        account: ValidAccountId,
        node_owner: ValidAccountId,
        authority: Arc<dyn AuthorityService>,
    ) -> AuthenticatedUser {
        AuthenticatedUser {
            account,
            node_owner,
            authority,
        }
    }

    pub fn address(&self) -> &str {
        self.account.address()
    }

    pub fn account_type(&self) -> AccountType {
        self.account.account_type()
    }

    pub fn account(&self) -> &ValidAccountId {
        &self.account
    }

    /// Whether this user is exactly the given account.
    pub fn is(&self, account: &ValidAccountId) -> bool {
        &self.account == account
    }

    /// Whether this user is any of the given accounts.
    pub fn is_one_of(&self, accounts: &[ValidAccountId]) -> bool {
        accounts.iter().any(|account| self.is(account))
    }

    pub fn is_node_owner(&self) -> bool {
        self.account == self.node_owner
    }

    /// Whether this user is a legal officer anywhere on the chain.
    ///
    /// Only Polkadot accounts can hold the role; other account types answer
    /// `false` without a chain query.
    pub async fn is_legal_officer(&self) -> Result<bool, Unauthorized> {
        if self.account.account_type() != AccountType::Polkadot {
            return Ok(false);
        }
        self.authority
            .is_legal_officer(&self.account)
            .await
            .map_err(|e| Unauthorized::new(e.to_string()))
    }

    /// Require this user to be a legal officer hosted on this very node.
    pub async fn require_legal_officer_on_node(&self) -> Result<&AuthenticatedUser, Unauthorized> {
        if self.account.account_type() != AccountType::Polkadot {
            return Err(Unauthorized::new("Authenticated user is not a legal officer on this node"));
        }
        let hosted = self
            .authority
            .is_legal_officer_on_node(&self.account)
            .await
            .map_err(|e| Unauthorized::new(e.to_string()))?;
        if hosted {
            Ok(self)
        } else {
            Err(Unauthorized::new("Authenticated user is not a legal officer on this node"))
        }
    }

    /// Turn an arbitrary predicate over this user into an authorization
    /// check. Without a message the failure reads plain "Unauthorized".
    pub fn require<F>(
        &self,
        predicate: F,
        message: Option<&str>,
    ) -> Result<&AuthenticatedUser, Unauthorized>
    where
        F: FnOnce(&AuthenticatedUser) -> bool,
    {
        if predicate(self) {
            Ok(self)
        } else {
            Err(Unauthorized::new(message.unwrap_or("Unauthorized")))
        }
    }
}

impl fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

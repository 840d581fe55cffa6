//! Local user accounts.
//!
//! Flows only see the two capabilities defined here; `DbUserStore` is the
//! SeaORM-backed implementation wired in at startup.

pub mod password;
pub mod store;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::error::UserStoreError;

pub use password::{hash_password, verify_password};
pub use store::{DbUserStore, NewUser};

/// Roles a user holds for a single client application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationGrant {
    pub application: String,
    pub roles: Vec<String>,
}

/// A user as seen by the consent flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub name: String,
    pub last_name: String,
    /// In stored order.
    pub applications: Vec<ApplicationGrant>,
}

/// Looks users up by username or email.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fails with `UserStoreError::NotFound` when neither username nor email match.
    async fn find_by_identifier(&self, identifier: &str) -> Result<UserRecord, UserStoreError>;
}

/// Checks a username-or-email / password pair.
///
/// No lockout or rate limiting happens here.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, identifier: &str, secret: &str) -> Result<bool, UserStoreError>;
}

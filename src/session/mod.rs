//! Account session facade.
//!
//! The runner only talks to the cloud service through the
//! [`AccountSession`] trait; [`client`] provides the HTTP implementation
//! used by the binary.

pub mod client;
#[cfg(test)]
pub mod fake;

use crate::models::{Account, CapacitySnapshot, FamilyInfo, FamilySignResult, UserSignResult};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use client::CloudConnector;

/// Errors raised by session operations.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Credentials were rejected or no session could be established.
    #[error("login failed: {0}")]
    Auth(String),

    /// The request did not complete in time. Aborts the whole run.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Transport-level failure other than a timeout.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("service error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl SessionError {
    /// Whether this error means the service or network is unusable.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout(_))
    }
}

/// An authenticated handle on one account.
#[async_trait]
pub trait AccountSession: Send + Sync {
    /// Authenticate with the account credentials.
    async fn login(&self) -> Result<(), SessionError>;

    /// Personal daily sign-in.
    async fn user_sign(&self) -> Result<UserSignResult, SessionError>;

    /// Family groups the account belongs to, in service order.
    async fn family_list(&self) -> Result<Vec<FamilyInfo>, SessionError>;

    /// Daily sign-in for one family group.
    async fn family_user_sign(&self, family_id: &str) -> Result<FamilySignResult, SessionError>;

    /// Current personal and family storage totals.
    async fn size_info(&self) -> Result<CapacitySnapshot, SessionError>;
}

/// Creates an unauthenticated session for an account.
pub trait Connector: Send + Sync {
    fn connect(&self, account: &Account) -> Arc<dyn AccountSession>;
}

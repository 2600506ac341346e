//! Identity provider boundary.
//!
//! Accounts live in the hosted auth provider. This service only lists them
//! and writes the optional `role` hint in their user metadata.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::Role;

pub use http::HttpIdentityStore;

/// An account as seen by this service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Phone-only accounts carry no email
    pub email: Option<String>,
    /// `user_metadata.role`, when the provider has one
    pub role_hint: Option<String>,
}

impl Account {
    pub fn has_email(&self, email: &str) -> bool {
        self.email.as_deref() == Some(email)
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid identity provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("identity provider is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("account listing did not terminate: {0}")]
    Pagination(String),
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Every account known to the provider. Partial listings are errors.
    async fn list_accounts(&self) -> Result<Vec<Account>, IdentityError>;

    /// Set `user_metadata.role` on one account, leaving other metadata intact
    async fn update_role_hint(&self, account_id: Uuid, role: Role) -> Result<(), IdentityError>;
}

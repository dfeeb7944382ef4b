use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::StoreError;
use crate::config::StoreConfig;
use crate::crypto::generate_token;

/// An opaque authentication token issued to an email address.
///
/// The expiry is kept as the string the auth service wrote; it is never
/// parsed or compared at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(rename = "tokenId")]
    pub id: String,
    pub email: String,
    pub token: String,
    pub token_valid_till_timestamp: String,
}

/// Input for [`TokenRepository::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToken {
    pub email: String,
    pub token: String,
    pub token_valid_till_timestamp: String,
}

impl NewToken {
    /// Builds a token record with a freshly generated opaque token.
    pub fn issue(
        email: impl Into<String>,
        valid_till: impl Into<String>,
        token_length: usize,
    ) -> Self {
        Self {
            email: email.into(),
            token: generate_token(token_length),
            token_valid_till_timestamp: valid_till.into(),
        }
    }

    /// Like [`NewToken::issue`], with the length taken from
    /// [`StoreConfig::token_length`].
    pub fn issue_with(
        config: &StoreConfig,
        email: impl Into<String>,
        valid_till: impl Into<String>,
    ) -> Self {
        Self::issue(email, valid_till, config.token_length)
    }
}

/// Storage for authentication tokens.
///
/// Neither email nor token is unique; the owning service is responsible for
/// clearing stale tokens (see [`TokenRepository::delete_by_email`]).
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, data: NewToken) -> Result<Token, StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Token>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Vec<Token>, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Deletes every token issued to `email`, returning how many were removed.
    async fn delete_by_email(&self, email: &str) -> Result<u64, StoreError>;
}

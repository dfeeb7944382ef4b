use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// An invitation for someone to join an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    /// Unique across all invitations.
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub org_id: Option<String>,
    pub token: Option<String>,
}

/// Input for [`InvitationRepository::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitation {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub org_id: Option<String>,
    pub token: Option<String>,
}

/// Storage for invitations.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Stores an invitation.
    ///
    /// Fails with [`StoreError::DuplicateKey`] (`field = "email"`) when an
    /// invitation for the same email already exists.
    async fn create(&self, data: NewInvitation) -> Result<Invitation, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Invitation>, StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError>;

    async fn find_by_organization(&self, org_id: &str) -> Result<Vec<Invitation>, StoreError>;

    /// Removes and returns the invitation carrying `token`.
    async fn consume(&self, token: &str) -> Result<Option<Invitation>, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use super::{
    INVITATIONS_COLLECTION, database_error, ensure_unique_index, insert_error, parse_object_id,
};
use crate::{Invitation, InvitationRepository, NewInvitation, StoreError};

/// Stored shape of an invitation. `email` carries a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "__v", default)]
    pub version: i32,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl From<InvitationDocument> for Invitation {
    fn from(document: InvitationDocument) -> Self {
        Invitation {
            id: document.id.to_hex(),
            email: document.email,
            first_name: document.first_name,
            last_name: document.last_name,
            org_id: document.org_id,
            token: document.token,
        }
    }
}

#[derive(Clone)]
pub struct MongoInvitationRepository {
    invitations: Collection<InvitationDocument>,
    indexed: Arc<AtomicBool>,
}

impl MongoInvitationRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            invitations: db.collection(INVITATIONS_COLLECTION),
            indexed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates the unique `email` index before the first write.
    async fn ensure_indexed(&self) -> Result<(), StoreError> {
        if self.indexed.load(Ordering::Acquire) {
            return Ok(());
        }
        ensure_unique_index(&self.invitations, "email").await?;
        self.indexed.store(true, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl InvitationRepository for MongoInvitationRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, data), err))]
    async fn create(&self, data: NewInvitation) -> Result<Invitation, StoreError> {
        self.ensure_indexed().await?;

        let document = InvitationDocument {
            id: ObjectId::new(),
            version: 0,
            email: data.email,
            first_name: data.first_name,
            last_name: data.last_name,
            org_id: data.org_id,
            token: data.token,
        };

        self.invitations
            .insert_one(&document)
            .await
            .map_err(|e| insert_error("create_invitation", "email", &e))?;

        log::info!(target: "enclave_tenancy", "msg=\"invitation created\", invitation_id=\"{}\"", document.id);

        Ok(document.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_email(&self, email: &str) -> Result<Option<Invitation>, StoreError> {
        let document = self
            .invitations
            .find_one(doc! { "email": email })
            .await
            .map_err(|e| database_error("find_invitation_by_email", &e))?;

        Ok(document.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token), err))]
    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let document = self
            .invitations
            .find_one(doc! { "token": token })
            .await
            .map_err(|e| database_error("find_invitation_by_token", &e))?;

        Ok(document.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_organization(&self, org_id: &str) -> Result<Vec<Invitation>, StoreError> {
        let documents: Vec<InvitationDocument> = self
            .invitations
            .find(doc! { "orgId": org_id })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|e| database_error("find_invitations_by_organization", &e))?
            .try_collect()
            .await
            .map_err(|e| database_error("find_invitations_by_organization", &e))?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token), err))]
    async fn consume(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let document = self
            .invitations
            .find_one_and_delete(doc! { "token": token })
            .await
            .map_err(|e| database_error("consume_invitation", &e))?;

        Ok(document.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = parse_object_id(id)?;

        self.invitations
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| database_error("delete_invitation", &e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_keys() {
        let document = InvitationDocument {
            id: ObjectId::new(),
            version: 0,
            email: "jane@example.com".to_owned(),
            first_name: Some("Jane".to_owned()),
            last_name: None,
            org_id: Some("org-1".to_owned()),
            token: Some("invite-token".to_owned()),
        };

        let stored = mongodb::bson::to_document(&document).unwrap();
        assert_eq!(stored.get_str("firstName").unwrap(), "Jane");
        assert_eq!(stored.get_str("orgId").unwrap(), "org-1");
        assert!(!stored.contains_key("lastName"));

        let invitation: Invitation = document.clone().into();
        assert_eq!(invitation.id, document.id.to_hex());
    }
}

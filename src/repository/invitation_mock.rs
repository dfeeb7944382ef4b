#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::StoreError;
use crate::crypto::new_record_id;

use super::invitation::{Invitation, InvitationRepository, NewInvitation};

/// In-memory invitations keyed by id, with the unique email index enforced.
pub struct MockInvitationRepository {
    invitations: RwLock<HashMap<String, Invitation>>,
}

impl MockInvitationRepository {
    pub fn new() -> Self {
        Self {
            invitations: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MockInvitationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvitationRepository for MockInvitationRepository {
    async fn create(&self, data: NewInvitation) -> Result<Invitation, StoreError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;

        if invitations.values().any(|i| i.email == data.email) {
            return Err(StoreError::DuplicateKey { field: "email" });
        }

        let invitation = Invitation {
            id: new_record_id(),
            email: data.email,
            first_name: data.first_name,
            last_name: data.last_name,
            org_id: data.org_id,
            token: data.token,
        };
        invitations.insert(invitation.id.clone(), invitation.clone());

        Ok(invitation)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Invitation>, StoreError> {
        let invitations = self
            .invitations
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(invitations.values().find(|i| i.email == email).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let invitations = self
            .invitations
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(invitations
            .values()
            .find(|i| i.token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_by_organization(&self, org_id: &str) -> Result<Vec<Invitation>, StoreError> {
        let invitations = self
            .invitations
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(invitations
            .values()
            .filter(|i| i.org_id.as_deref() == Some(org_id))
            .cloned()
            .collect())
    }

    async fn consume(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;

        let id = invitations
            .values()
            .find(|i| i.token.as_deref() == Some(token))
            .map(|i| i.id.clone());

        Ok(id.and_then(|id| invitations.remove(&id)))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut invitations = self
            .invitations
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        invitations.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(email: &str, token: &str) -> NewInvitation {
        NewInvitation {
            email: email.to_owned(),
            first_name: Some("Jane".to_owned()),
            last_name: Some("Doe".to_owned()),
            org_id: Some("org-1".to_owned()),
            token: Some(token.to_owned()),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = MockInvitationRepository::new();
        repo.create(invite("jane@example.com", "t1")).await.unwrap();

        let err = repo
            .create(invite("jane@example.com", "t2"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey { field: "email" });
    }

    #[tokio::test]
    async fn test_consume_removes_invitation() {
        let repo = MockInvitationRepository::new();
        let created = repo.create(invite("jane@example.com", "t1")).await.unwrap();

        let consumed = repo.consume("t1").await.unwrap();
        assert_eq!(consumed, Some(created));
        assert!(repo.consume("t1").await.unwrap().is_none());
        assert!(repo.find_by_email("jane@example.com").await.unwrap().is_none());

        // the email can be invited again once consumed
        repo.create(invite("jane@example.com", "t3")).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_by_organization() {
        let repo = MockInvitationRepository::new();
        repo.create(invite("a@example.com", "t1")).await.unwrap();
        repo.create(invite("b@example.com", "t2")).await.unwrap();
        repo.create(NewInvitation {
            email: "c@example.com".to_owned(),
            org_id: Some("org-2".to_owned()),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(repo.find_by_organization("org-1").await.unwrap().len(), 2);
        assert_eq!(repo.find_by_organization("org-2").await.unwrap().len(), 1);
    }
}

#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::StoreError;
use crate::crypto::new_record_id;

use super::session::{NewSession, Session, SessionProfile, SessionRepository};

/// In-memory sessions keyed by session id.
#[derive(Clone, Default)]
pub struct MockSessionRepository {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of sessions currently stored.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn create(&self, data: NewSession) -> Result<Session, StoreError> {
        let now = Utc::now();
        let session = Session {
            id: new_record_id(),
            user_id: data.user_id,
            jwt: data.jwt,
            name: data.profile.name,
            avatar: data.profile.avatar,
            email: data.profile.email,
            last_login_at: now,
            created_at: now,
            updated_at: now,
        };

        self.sessions
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?
            .insert(session.id.clone(), session.clone());

        Ok(session)
    }

    async fn find(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(sessions.get(id).cloned())
    }

    async fn find_by_jwt(&self, jwt: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(sessions.values().find(|s| s.jwt == jwt).cloned())
    }

    async fn record_login(&self, id: &str, jwt: &str) -> Result<Session, StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;

        let session = sessions.get_mut(id).ok_or(StoreError::NotFound)?;
        let now = Utc::now();
        jwt.clone_into(&mut session.jwt);
        session.last_login_at = now;
        session.updated_at = now;

        Ok(session.clone())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        profile: &SessionProfile,
    ) -> Result<u64, StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;

        let now = Utc::now();
        let mut updated = 0;
        for session in sessions.values_mut().filter(|s| s.user_id == user_id) {
            session.name.clone_from(&profile.name);
            session.avatar.clone_from(&profile.avatar);
            session.email.clone_from(&profile.email);
            session.updated_at = now;
            updated += 1;
        }

        Ok(updated)
    }

    async fn destroy(&self, id: &str) -> Result<(), StoreError> {
        self.sessions
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?
            .remove(id);

        Ok(())
    }

    async fn destroy_user_sessions(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;

        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);

        Ok(u64::try_from(before.saturating_sub(sessions.len())).unwrap_or(u64::MAX))
    }
}

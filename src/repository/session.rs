use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Profile fields copied from the user record into each session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
}

/// A login session.
///
/// The profile is a denormalized copy. It goes stale when the user record
/// changes until [`SessionRepository::update_profile`] runs or the user logs
/// in again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "sessionId")]
    pub id: String,
    pub user_id: String,
    /// Signed session token handed to the client.
    pub jwt: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub last_login_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn profile(&self) -> SessionProfile {
        SessionProfile {
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            email: self.email.clone(),
        }
    }
}

/// Input for [`SessionRepository::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub user_id: String,
    pub jwt: String,
    #[serde(flatten)]
    pub profile: SessionProfile,
}

/// Storage for sessions. Expiry is handled by whoever issues the JWT.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, data: NewSession) -> Result<Session, StoreError>;

    async fn find(&self, id: &str) -> Result<Option<Session>, StoreError>;

    async fn find_by_jwt(&self, jwt: &str) -> Result<Option<Session>, StoreError>;

    /// Replaces the session token and stamps `last_login_at` with now.
    async fn record_login(&self, id: &str, jwt: &str) -> Result<Session, StoreError>;

    /// Copies `profile` into every session of `user_id`.
    ///
    /// Returns the number of sessions updated.
    async fn update_profile(
        &self,
        user_id: &str,
        profile: &SessionProfile,
    ) -> Result<u64, StoreError>;

    async fn destroy(&self, id: &str) -> Result<(), StoreError>;

    async fn destroy_user_sessions(&self, user_id: &str) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_flattens_profile() {
        let data = NewSession {
            user_id: "u1".to_owned(),
            jwt: "header.payload.sig".to_owned(),
            profile: SessionProfile {
                name: Some("Jane".to_owned()),
                avatar: None,
                email: Some("jane@example.com".to_owned()),
            },
        };

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["name"], "Jane");
        assert_eq!(json["email"], "jane@example.com");
        assert!(json.get("profile").is_none());
    }

    #[test]
    fn test_session_serializes_with_session_id() {
        let now = Utc::now();
        let session = Session {
            id: "s1".to_owned(),
            user_id: "u1".to_owned(),
            jwt: "header.payload.sig".to_owned(),
            name: Some("Jane".to_owned()),
            avatar: None,
            email: None,
            last_login_at: now,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&session).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["sessionId"], "s1");
        assert_eq!(obj["userId"], "u1");
        assert_eq!(obj["jwt"], "header.payload.sig");
        assert!(obj.contains_key("lastLoginAt"));
        assert!(!obj.contains_key("id"));
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::database_error;
use crate::crypto::new_record_id;
use crate::{NewSession, Session, SessionProfile, SessionRepository, StoreError};

const COLUMNS: &str =
    "id, user_id, jwt, name, avatar, email, last_login_at, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: String,
    user_id: String,
    jwt: String,
    name: Option<String>,
    avatar: Option<String>,
    email: Option<String>,
    last_login_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRecord> for Session {
    fn from(row: SessionRecord) -> Self {
        Session {
            id: row.id,
            user_id: row.user_id,
            jwt: row.jwt,
            name: row.name,
            avatar: row.avatar,
            email: row.email,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, data), err))]
    async fn create(&self, data: NewSession) -> Result<Session, StoreError> {
        let now = Utc::now();

        let row: SessionRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO sessions (id, user_id, jwt, name, avatar, email, last_login_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "
        ))
        .bind(new_record_id())
        .bind(&data.user_id)
        .bind(&data.jwt)
        .bind(&data.profile.name)
        .bind(&data.profile.avatar)
        .bind(&data.profile.email)
        .bind(now)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("create_session", &e))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRecord> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM sessions WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("find_session", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, jwt), err))]
    async fn find_by_jwt(&self, jwt: &str) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRecord> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM sessions WHERE jwt = ? LIMIT 1"))
                .bind(jwt)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("find_session_by_jwt", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, jwt), err))]
    async fn record_login(&self, id: &str, jwt: &str) -> Result<Session, StoreError> {
        let now = Utc::now();

        let row: Option<SessionRecord> = sqlx::query_as(&format!(
            "UPDATE sessions SET jwt = ?, last_login_at = ?, updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
        ))
        .bind(jwt)
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("record_login", &e))?;

        row.map(Into::into).ok_or(StoreError::NotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, profile), err))]
    async fn update_profile(
        &self,
        user_id: &str,
        profile: &SessionProfile,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE sessions SET name = ?, avatar = ?, email = ?, updated_at = ? WHERE user_id = ?",
        )
        .bind(&profile.name)
        .bind(&profile.avatar)
        .bind(&profile.email)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("update_session_profile", &e))?;

        log::debug!(
            target: "enclave_tenancy",
            "msg=\"session profiles updated\", user_id=\"{user_id}\", sessions={}",
            result.rows_affected()
        );

        Ok(result.rows_affected())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn destroy(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("destroy_session", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn destroy_user_sessions(&self, user_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("destroy_user_sessions", &e))?;

        Ok(result.rows_affected())
    }
}

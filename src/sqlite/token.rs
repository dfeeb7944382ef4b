use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use super::database_error;
use crate::crypto::new_record_id;
use crate::{NewToken, StoreError, Token, TokenRepository};

#[derive(Clone)]
pub struct SqliteTokenRepository {
    pool: SqlitePool,
}

impl SqliteTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TokenRecord {
    id: String,
    email: String,
    token: String,
    token_valid_till_timestamp: String,
}

impl From<TokenRecord> for Token {
    fn from(row: TokenRecord) -> Self {
        Token {
            id: row.id,
            email: row.email,
            token: row.token,
            token_valid_till_timestamp: row.token_valid_till_timestamp,
        }
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, data), err))]
    async fn create(&self, data: NewToken) -> Result<Token, StoreError> {
        let row: TokenRecord = sqlx::query_as(
            r"INSERT INTO tokens (id, email, token, token_valid_till_timestamp)
               VALUES (?, ?, ?, ?)
               RETURNING id, email, token, token_valid_till_timestamp",
        )
        .bind(new_record_id())
        .bind(&data.email)
        .bind(&data.token)
        .bind(&data.token_valid_till_timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("create_token", &e))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token), err))]
    async fn find_by_token(&self, token: &str) -> Result<Option<Token>, StoreError> {
        let row: Option<TokenRecord> = sqlx::query_as(
            "SELECT id, email, token, token_valid_till_timestamp FROM tokens WHERE token = ? LIMIT 1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_token", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_email(&self, email: &str) -> Result<Vec<Token>, StoreError> {
        let rows: Vec<TokenRecord> = sqlx::query_as(
            "SELECT id, email, token, token_valid_till_timestamp FROM tokens WHERE email = ? ORDER BY rowid",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("find_tokens_by_email", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("delete_token", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_by_email(&self, email: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tokens WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("delete_tokens_by_email", &e))?;

        Ok(result.rows_affected())
    }
}

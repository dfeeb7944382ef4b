#![allow(clippy::significant_drop_tightening)]

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::StoreError;
use crate::crypto::new_record_id;

use super::token::{NewToken, Token, TokenRepository};

/// In-memory tokens in insertion order. Clones share the same store.
#[derive(Clone, Default)]
pub struct MockTokenRepository {
    tokens: Arc<RwLock<Vec<Token>>>,
}

impl MockTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Internal("lock poisoned".into())
}

#[async_trait]
impl TokenRepository for MockTokenRepository {
    async fn create(&self, data: NewToken) -> Result<Token, StoreError> {
        let token = Token {
            id: new_record_id(),
            email: data.email,
            token: data.token,
            token_valid_till_timestamp: data.token_valid_till_timestamp,
        };

        self.tokens.write().map_err(poisoned)?.push(token.clone());
        Ok(token)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Token>, StoreError> {
        let tokens = self.tokens.read().map_err(poisoned)?;
        Ok(tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Token>, StoreError> {
        let tokens = self.tokens.read().map_err(poisoned)?;
        Ok(tokens.iter().filter(|t| t.email == email).cloned().collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.tokens.write().map_err(poisoned)?.retain(|t| t.id != id);
        Ok(())
    }

    async fn delete_by_email(&self, email: &str) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.write().map_err(poisoned)?;
        let before = tokens.len();
        tokens.retain(|t| t.email != email);
        Ok((before - tokens.len()) as u64)
    }
}

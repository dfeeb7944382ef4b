use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use super::{TOKENS_COLLECTION, database_error, parse_object_id};
use crate::{NewToken, StoreError, Token, TokenRepository};

/// Stored shape of a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "__v", default)]
    pub version: i32,
    pub email: String,
    pub token: String,
    pub token_valid_till_timestamp: String,
}

impl From<TokenDocument> for Token {
    fn from(document: TokenDocument) -> Self {
        Token {
            id: document.id.to_hex(),
            email: document.email,
            token: document.token,
            token_valid_till_timestamp: document.token_valid_till_timestamp,
        }
    }
}

#[derive(Clone)]
pub struct MongoTokenRepository {
    tokens: Collection<TokenDocument>,
}

impl MongoTokenRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            tokens: db.collection(TOKENS_COLLECTION),
        }
    }
}

#[async_trait]
impl TokenRepository for MongoTokenRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, data), err))]
    async fn create(&self, data: NewToken) -> Result<Token, StoreError> {
        let document = TokenDocument {
            id: ObjectId::new(),
            version: 0,
            email: data.email,
            token: data.token,
            token_valid_till_timestamp: data.token_valid_till_timestamp,
        };

        self.tokens
            .insert_one(&document)
            .await
            .map_err(|e| database_error("create_token", &e))?;

        Ok(document.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token), err))]
    async fn find_by_token(&self, token: &str) -> Result<Option<Token>, StoreError> {
        let document = self
            .tokens
            .find_one(doc! { "token": token })
            .await
            .map_err(|e| database_error("find_token", &e))?;

        Ok(document.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_email(&self, email: &str) -> Result<Vec<Token>, StoreError> {
        let documents: Vec<TokenDocument> = self
            .tokens
            .find(doc! { "email": email })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|e| database_error("find_tokens_by_email", &e))?
            .try_collect()
            .await
            .map_err(|e| database_error("find_tokens_by_email", &e))?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = parse_object_id(id)?;

        self.tokens
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| database_error("delete_token", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_by_email(&self, email: &str) -> Result<u64, StoreError> {
        let result = self
            .tokens
            .delete_many(doc! { "email": email })
            .await
            .map_err(|e| database_error("delete_tokens_by_email", &e))?;

        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_uses_mongoose_keys() {
        let document = TokenDocument {
            id: ObjectId::new(),
            version: 0,
            email: "jane@example.com".to_owned(),
            token: "abc".to_owned(),
            token_valid_till_timestamp: "1718000000000".to_owned(),
        };

        let stored = mongodb::bson::to_document(&document).unwrap();
        assert!(stored.contains_key("_id"));
        assert!(stored.contains_key("__v"));
        assert!(stored.contains_key("tokenValidTillTimestamp"));
    }

    #[test]
    fn test_transform_strips_internal_fields() {
        let id = ObjectId::new();
        let token: Token = TokenDocument {
            id,
            version: 3,
            email: "jane@example.com".to_owned(),
            token: "abc".to_owned(),
            token_valid_till_timestamp: "1718000000000".to_owned(),
        }
        .into();

        let json = serde_json::to_value(&token).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["tokenId"], id.to_hex());
        assert!(!obj.contains_key("_id"));
        assert!(!obj.contains_key("__v"));
    }

    #[test]
    fn test_document_without_version_key() {
        let id = ObjectId::new();
        let raw = doc! {
            "_id": id,
            "email": "jane@example.com",
            "token": "abc",
            "tokenValidTillTimestamp": "1718000000000",
        };

        let document: TokenDocument = mongodb::bson::from_document(raw).unwrap();
        assert_eq!(document.version, 0);
        assert_eq!(document.id, id);
    }
}

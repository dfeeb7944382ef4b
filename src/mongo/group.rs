//! MongoDB implementation of [`GroupRepository`].
//!
//! Each [`GroupCollection`] is its own MongoDB collection, so the groups of
//! team `t42` live in `t42_groups`. Members are an embedded `userIds` array.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use super::{database_error, ensure_unique_index, insert_error, parse_object_id};
use crate::{Group, GroupCollection, GroupRepository, NewGroup, StoreError};

/// Stored shape of a group. `name` carries a unique index per collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "__v", default)]
    pub version: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
}

impl From<GroupDocument> for Group {
    fn from(document: GroupDocument) -> Self {
        Group {
            id: document.id.to_hex(),
            name: document.name,
            description: document.description,
            organization_id: document.organization_id,
            owner_id: document.owner_id,
            user_ids: document.user_ids,
        }
    }
}

/// MongoDB-backed group repository.
#[derive(Clone)]
pub struct MongoGroupRepository {
    db: Database,
    indexed: Arc<Mutex<HashSet<String>>>,
}

impl MongoGroupRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            indexed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn groups(&self, collection: &GroupCollection) -> Collection<GroupDocument> {
        self.db.collection(collection.as_str())
    }

    /// Creates the unique `name` index the first time a collection is written.
    async fn ensure_indexed(&self, collection: &GroupCollection) -> Result<(), StoreError> {
        let known = self
            .indexed
            .lock()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?
            .contains(collection.as_str());
        if known {
            return Ok(());
        }

        ensure_unique_index(&self.groups(collection), "name").await?;

        self.indexed
            .lock()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?
            .insert(collection.as_str().to_owned());
        Ok(())
    }

    async fn update_members(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        update: mongodb::bson::Document,
        operation: &str,
    ) -> Result<Group, StoreError> {
        let id = parse_object_id(group_id)?;

        let document = self
            .groups(collection)
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| database_error(operation, &e))?;

        document.map(Into::into).ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl GroupRepository for MongoGroupRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(
        &self,
        collection: &GroupCollection,
        data: NewGroup,
    ) -> Result<Group, StoreError> {
        self.ensure_indexed(collection).await?;

        let document = GroupDocument {
            id: ObjectId::new(),
            version: 0,
            user_ids: data.distinct_user_ids(),
            name: data.name,
            description: data.description,
            organization_id: data.organization_id,
            owner_id: data.owner_id,
        };

        self.groups(collection)
            .insert_one(&document)
            .await
            .map_err(|e| insert_error("create_group", "name", &e))?;

        log::info!(
            target: "enclave_tenancy",
            "msg=\"group created\", collection=\"{collection}\", name=\"{}\"",
            document.name
        );

        Ok(document.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(
        &self,
        collection: &GroupCollection,
        id: &str,
    ) -> Result<Option<Group>, StoreError> {
        let id = parse_object_id(id)?;

        let document = self
            .groups(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| database_error("find_group_by_id", &e))?;

        Ok(document.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_name(
        &self,
        collection: &GroupCollection,
        name: &str,
    ) -> Result<Option<Group>, StoreError> {
        let document = self
            .groups(collection)
            .find_one(doc! { "name": name })
            .await
            .map_err(|e| database_error("find_group_by_name", &e))?;

        Ok(document.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_organization(
        &self,
        collection: &GroupCollection,
        organization_id: &str,
    ) -> Result<Vec<Group>, StoreError> {
        let documents: Vec<GroupDocument> = self
            .groups(collection)
            .find(doc! { "organizationId": organization_id })
            .sort(doc! { "name": 1 })
            .await
            .map_err(|e| database_error("find_groups_by_organization", &e))?
            .try_collect()
            .await
            .map_err(|e| database_error("find_groups_by_organization", &e))?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn add_member(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, StoreError> {
        self.update_members(
            collection,
            group_id,
            doc! { "$addToSet": { "userIds": user_id } },
            "add_group_member",
        )
        .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn remove_member(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, StoreError> {
        self.update_members(
            collection,
            group_id,
            doc! { "$pull": { "userIds": user_id } },
            "remove_group_member",
        )
        .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, collection: &GroupCollection, id: &str) -> Result<(), StoreError> {
        let id = parse_object_id(id)?;

        self.groups(collection)
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| database_error("delete_group", &e))?;

        Ok(())
    }
}

//! `SQLite` implementation of [`GroupRepository`].
//!
//! Groups of every collection share the `user_groups` table; `(collection, name)`
//! is unique. Members live in `group_users`, in insertion order.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, SqliteExecutor, SqlitePool};

use super::{database_error, insert_error};
use crate::crypto::new_record_id;
use crate::{Group, GroupCollection, GroupRepository, NewGroup, StoreError};

/// `SQLite`-backed group repository.
#[derive(Clone)]
pub struct SqliteGroupRepository {
    pool: SqlitePool,
}

impl SqliteGroupRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn with_members(&self, row: GroupRecord) -> Result<Group, StoreError> {
        let user_ids = member_ids(&self.pool, &row.id).await?;
        Ok(row.into_group(user_ids))
    }
}

const COLUMNS: &str = "id, name, description, organization_id, owner_id";

async fn find_record<'e, E: SqliteExecutor<'e>>(
    executor: E,
    collection: &GroupCollection,
    id: &str,
) -> Result<Option<GroupRecord>, StoreError> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM user_groups WHERE collection = ? AND id = ?"
    ))
    .bind(collection.as_str())
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(|e| database_error("find_group_by_id", &e))
}

async fn member_ids<'e, E: SqliteExecutor<'e>>(
    executor: E,
    group_id: &str,
) -> Result<Vec<String>, StoreError> {
    sqlx::query_scalar::<_, String>(
        "SELECT user_id FROM group_users WHERE group_id = ? ORDER BY rowid",
    )
    .bind(group_id)
    .fetch_all(executor)
    .await
    .map_err(|e| database_error("find_group_members", &e))
}

#[derive(FromRow)]
struct GroupRecord {
    id: String,
    name: String,
    description: Option<String>,
    organization_id: Option<String>,
    owner_id: Option<String>,
}

impl GroupRecord {
    fn into_group(self, user_ids: Vec<String>) -> Group {
        Group {
            id: self.id,
            name: self.name,
            description: self.description,
            organization_id: self.organization_id,
            owner_id: self.owner_id,
            user_ids,
        }
    }
}

#[async_trait]
impl GroupRepository for SqliteGroupRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(
        &self,
        collection: &GroupCollection,
        data: NewGroup,
    ) -> Result<Group, StoreError> {
        let user_ids = data.distinct_user_ids();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("create_group", &e))?;

        let row: GroupRecord = sqlx::query_as(
            r"
            INSERT INTO user_groups (id, collection, name, description, organization_id, owner_id)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, name, description, organization_id, owner_id
            ",
        )
        .bind(new_record_id())
        .bind(collection.as_str())
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.organization_id)
        .bind(&data.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| insert_error("create_group", "name", &e))?;

        for user_id in &user_ids {
            sqlx::query("INSERT INTO group_users (group_id, user_id) VALUES (?, ?)")
                .bind(&row.id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| database_error("create_group", &e))?;
        }

        tx.commit()
            .await
            .map_err(|e| database_error("create_group", &e))?;

        Ok(row.into_group(user_ids))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(
        &self,
        collection: &GroupCollection,
        id: &str,
    ) -> Result<Option<Group>, StoreError> {
        match find_record(&self.pool, collection, id).await? {
            Some(row) => Ok(Some(self.with_members(row).await?)),
            None => Ok(None),
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_name(
        &self,
        collection: &GroupCollection,
        name: &str,
    ) -> Result<Option<Group>, StoreError> {
        let row: Option<GroupRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM user_groups WHERE collection = ? AND name = ?"
        ))
        .bind(collection.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_group_by_name", &e))?;

        match row {
            Some(row) => Ok(Some(self.with_members(row).await?)),
            None => Ok(None),
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_organization(
        &self,
        collection: &GroupCollection,
        organization_id: &str,
    ) -> Result<Vec<Group>, StoreError> {
        let rows: Vec<GroupRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM user_groups WHERE collection = ? AND organization_id = ? ORDER BY name"
        ))
        .bind(collection.as_str())
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("find_groups_by_organization", &e))?;

        let memberships: Vec<(String, String)> = sqlx::query_as(
            r"
            SELECT gu.group_id, gu.user_id
            FROM group_users gu
            JOIN user_groups g ON g.id = gu.group_id
            WHERE g.collection = ? AND g.organization_id = ?
            ORDER BY gu.rowid
            ",
        )
        .bind(collection.as_str())
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("find_groups_by_organization", &e))?;

        let mut members: HashMap<String, Vec<String>> = HashMap::new();
        for (group_id, user_id) in memberships {
            members.entry(group_id).or_default().push(user_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let user_ids = members.remove(&row.id).unwrap_or_default();
                row.into_group(user_ids)
            })
            .collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn add_member(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("add_group_member", &e))?;

        let row = find_record(&mut *tx, collection, group_id)
            .await?
            .ok_or(StoreError::NotFound)?;

        sqlx::query("INSERT OR IGNORE INTO group_users (group_id, user_id) VALUES (?, ?)")
            .bind(&row.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("add_group_member", &e))?;

        let user_ids = member_ids(&mut *tx, &row.id).await?;
        tx.commit()
            .await
            .map_err(|e| database_error("add_group_member", &e))?;

        Ok(row.into_group(user_ids))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn remove_member(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("remove_group_member", &e))?;

        let row = find_record(&mut *tx, collection, group_id)
            .await?
            .ok_or(StoreError::NotFound)?;

        sqlx::query("DELETE FROM group_users WHERE group_id = ? AND user_id = ?")
            .bind(&row.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("remove_group_member", &e))?;

        let user_ids = member_ids(&mut *tx, &row.id).await?;
        tx.commit()
            .await
            .map_err(|e| database_error("remove_group_member", &e))?;

        Ok(row.into_group(user_ids))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, collection: &GroupCollection, id: &str) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("delete_group", &e))?;

        let result = sqlx::query("DELETE FROM user_groups WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error("delete_group", &e))?;

        if result.rows_affected() > 0 {
            sqlx::query("DELETE FROM group_users WHERE group_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| database_error("delete_group", &e))?;
        }

        tx.commit()
            .await
            .map_err(|e| database_error("delete_group", &e))?;

        Ok(())
    }
}

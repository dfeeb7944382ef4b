//! `SQLite` implementation of [`OrganizationRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::{database_error, insert_error};
use crate::config::StoreConfig;
use crate::crypto::new_record_id;
use crate::{NewOrganization, Organization, OrganizationRepository, StoreError};

const COLUMNS: &str =
    "id, name, sub_domain, domain, fqdn, website, is_deleted, owner_id, created_at, updated_at";

/// `SQLite`-backed organization repository.
///
/// Every finder except `find_by_id_including_deleted` filters on
/// `is_deleted = 0`.
#[derive(Clone)]
pub struct SqliteOrganizationRepository {
    pool: SqlitePool,
    config: StoreConfig,
}

impl SqliteOrganizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_config(pool, StoreConfig::default())
    }

    pub fn with_config(pool: SqlitePool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    async fn set_deleted(
        &self,
        id: &str,
        deleted: bool,
        operation: &str,
    ) -> Result<Organization, StoreError> {
        let row: Option<OrganizationRecord> = sqlx::query_as(&format!(
            "UPDATE organizations SET is_deleted = ?, updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
        ))
        .bind(deleted)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error(operation, &e))?;

        row.map(Into::into).ok_or(StoreError::NotFound)
    }
}

#[derive(FromRow)]
struct OrganizationRecord {
    id: String,
    name: String,
    sub_domain: String,
    domain: String,
    fqdn: String,
    website: Option<String>,
    is_deleted: bool,
    owner_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrganizationRecord> for Organization {
    fn from(row: OrganizationRecord) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            sub_domain: row.sub_domain,
            domain: row.domain,
            fqdn: row.fqdn,
            website: row.website,
            is_deleted: row.is_deleted,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl OrganizationRepository for SqliteOrganizationRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: NewOrganization) -> Result<Organization, StoreError> {
        let (domain, fqdn) = data.resolve_domain(&self.config.default_domain);
        let now = Utc::now();

        let row: OrganizationRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO organizations (id, name, sub_domain, domain, fqdn, website, is_deleted, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
            RETURNING {COLUMNS}
            "
        ))
        .bind(new_record_id())
        .bind(&data.name)
        .bind(&data.sub_domain)
        .bind(&domain)
        .bind(&fqdn)
        .bind(&data.website)
        .bind(&data.owner_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error("create_organization", "subDomain", &e))?;

        log::info!(target: "enclave_tenancy", "msg=\"organization created\", sub_domain=\"{}\"", row.sub_domain);

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>, StoreError> {
        let row: Option<OrganizationRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM organizations WHERE id = ? AND is_deleted = 0"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_organization_by_id", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_sub_domain(
        &self,
        sub_domain: &str,
    ) -> Result<Option<Organization>, StoreError> {
        let row: Option<OrganizationRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM organizations WHERE sub_domain = ? AND is_deleted = 0"
        ))
        .bind(sub_domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_organization_by_sub_domain", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Organization>, StoreError> {
        let rows: Vec<OrganizationRecord> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM organizations WHERE owner_id = ? AND is_deleted = 0 ORDER BY created_at"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("find_organizations_by_owner", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id_including_deleted(
        &self,
        id: &str,
    ) -> Result<Option<Organization>, StoreError> {
        let row: Option<OrganizationRecord> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM organizations WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("find_organization_including_deleted", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn soft_delete(&self, id: &str) -> Result<(), StoreError> {
        let org = self.set_deleted(id, true, "soft_delete_organization").await?;
        log::info!(target: "enclave_tenancy", "msg=\"organization soft-deleted\", sub_domain=\"{}\"", org.sub_domain);
        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn restore(&self, id: &str) -> Result<Organization, StoreError> {
        self.set_deleted(id, false, "restore_organization").await
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// A tenant organization, addressed by its unique subdomain.
///
/// Organizations are soft-deleted: `is_deleted` hides them from every
/// repository finder except [`OrganizationRepository::find_by_id_including_deleted`],
/// and the record keeps its subdomain reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub sub_domain: String,
    pub domain: String,
    pub fqdn: String,
    pub website: Option<String>,
    pub is_deleted: bool,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn is_visible(&self) -> bool {
        !self.is_deleted
    }
}

/// Input for [`OrganizationRepository::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    pub name: String,
    pub sub_domain: String,
    /// Falls back to [`StoreConfig::default_domain`](crate::config::StoreConfig).
    pub domain: Option<String>,
    /// Falls back to `<subDomain>.<domain>`.
    pub fqdn: Option<String>,
    pub website: Option<String>,
    pub owner_id: Option<String>,
}

impl NewOrganization {
    /// Resolves `(domain, fqdn)` against the configured default domain.
    pub(crate) fn resolve_domain(&self, default_domain: &str) -> (String, String) {
        let domain = self
            .domain
            .clone()
            .unwrap_or_else(|| default_domain.to_owned());
        let fqdn = self
            .fqdn
            .clone()
            .unwrap_or_else(|| format!("{}.{domain}", self.sub_domain));
        (domain, fqdn)
    }
}

/// Storage for organizations.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Stores an organization.
    ///
    /// Fails with [`StoreError::DuplicateKey`] (`field = "subDomain"`) when the
    /// subdomain is taken, including by a soft-deleted organization.
    async fn create(&self, data: NewOrganization) -> Result<Organization, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>, StoreError>;

    async fn find_by_sub_domain(
        &self,
        sub_domain: &str,
    ) -> Result<Option<Organization>, StoreError>;

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Organization>, StoreError>;

    /// Bypasses the visibility filter.
    async fn find_by_id_including_deleted(
        &self,
        id: &str,
    ) -> Result<Option<Organization>, StoreError>;

    async fn soft_delete(&self, id: &str) -> Result<(), StoreError>;

    async fn restore(&self, id: &str) -> Result<Organization, StoreError>;
}

#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::StoreError;
use crate::config::StoreConfig;
use crate::crypto::new_record_id;

use super::organization::{NewOrganization, Organization, OrganizationRepository};

pub struct MockOrganizationRepository {
    organizations: RwLock<HashMap<String, Organization>>,
    config: StoreConfig,
}

impl MockOrganizationRepository {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            organizations: RwLock::new(HashMap::new()),
            config,
        }
    }

    fn set_deleted(&self, id: &str, deleted: bool) -> Result<Organization, StoreError> {
        let mut organizations = self
            .organizations
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;

        let org = organizations.get_mut(id).ok_or(StoreError::NotFound)?;
        org.is_deleted = deleted;
        org.updated_at = Utc::now();

        Ok(org.clone())
    }
}

impl Default for MockOrganizationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrganizationRepository for MockOrganizationRepository {
    async fn create(&self, data: NewOrganization) -> Result<Organization, StoreError> {
        let mut organizations = self
            .organizations
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;

        // deleted organizations keep their subdomain
        if organizations
            .values()
            .any(|o| o.sub_domain == data.sub_domain)
        {
            return Err(StoreError::DuplicateKey { field: "subDomain" });
        }

        let (domain, fqdn) = data.resolve_domain(&self.config.default_domain);
        let now = Utc::now();
        let org = Organization {
            id: new_record_id(),
            name: data.name,
            sub_domain: data.sub_domain,
            domain,
            fqdn,
            website: data.website,
            is_deleted: false,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };
        organizations.insert(org.id.clone(), org.clone());

        Ok(org)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>, StoreError> {
        let organizations = self
            .organizations
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(organizations
            .get(id)
            .filter(|o| o.is_visible())
            .cloned())
    }

    async fn find_by_sub_domain(
        &self,
        sub_domain: &str,
    ) -> Result<Option<Organization>, StoreError> {
        let organizations = self
            .organizations
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(organizations
            .values()
            .find(|o| o.is_visible() && o.sub_domain == sub_domain)
            .cloned())
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Organization>, StoreError> {
        let organizations = self
            .organizations
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        let mut owned: Vec<Organization> = organizations
            .values()
            .filter(|o| o.is_visible() && o.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(owned)
    }

    async fn find_by_id_including_deleted(
        &self,
        id: &str,
    ) -> Result<Option<Organization>, StoreError> {
        let organizations = self
            .organizations
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(organizations.get(id).cloned())
    }

    async fn soft_delete(&self, id: &str) -> Result<(), StoreError> {
        self.set_deleted(id, true).map(|_| ())
    }

    async fn restore(&self, id: &str) -> Result<Organization, StoreError> {
        self.set_deleted(id, false)
    }
}

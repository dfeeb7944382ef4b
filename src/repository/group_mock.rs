#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::StoreError;
use crate::crypto::new_record_id;

use super::group::{Group, GroupCollection, GroupRepository, NewGroup};

type Collections = HashMap<GroupCollection, Vec<Group>>;

/// In-memory groups, partitioned by collection, membership embedded in the
/// group like the document store does it.
pub struct MockGroupRepository {
    collections: RwLock<Collections>,
}

impl MockGroupRepository {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn update_group<F>(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        f: F,
    ) -> Result<Group, StoreError>
    where
        F: FnOnce(&mut Group),
    {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;

        let group = collections
            .get_mut(collection)
            .and_then(|groups| groups.iter_mut().find(|g| g.id == group_id))
            .ok_or(StoreError::NotFound)?;
        f(group);

        Ok(group.clone())
    }
}

impl Default for MockGroupRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupRepository for MockGroupRepository {
    async fn create(
        &self,
        collection: &GroupCollection,
        data: NewGroup,
    ) -> Result<Group, StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        let groups = collections.entry(collection.clone()).or_default();

        if groups.iter().any(|g| g.name == data.name) {
            return Err(StoreError::DuplicateKey { field: "name" });
        }

        let user_ids = data.distinct_user_ids();
        let group = Group {
            id: new_record_id(),
            name: data.name,
            description: data.description,
            organization_id: data.organization_id,
            owner_id: data.owner_id,
            user_ids,
        };
        groups.push(group.clone());

        Ok(group)
    }

    async fn find_by_id(
        &self,
        collection: &GroupCollection,
        id: &str,
    ) -> Result<Option<Group>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(collections
            .get(collection)
            .and_then(|groups| groups.iter().find(|g| g.id == id))
            .cloned())
    }

    async fn find_by_name(
        &self,
        collection: &GroupCollection,
        name: &str,
    ) -> Result<Option<Group>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(collections
            .get(collection)
            .and_then(|groups| groups.iter().find(|g| g.name == name))
            .cloned())
    }

    async fn find_by_organization(
        &self,
        collection: &GroupCollection,
        organization_id: &str,
    ) -> Result<Vec<Group>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        Ok(collections
            .get(collection)
            .map(|groups| {
                groups
                    .iter()
                    .filter(|g| g.organization_id.as_deref() == Some(organization_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add_member(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, StoreError> {
        self.update_group(collection, group_id, |group| {
            if !group.has_member(user_id) {
                group.user_ids.push(user_id.to_owned());
            }
        })
    }

    async fn remove_member(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, StoreError> {
        self.update_group(collection, group_id, |group| {
            group.user_ids.retain(|id| id != user_id);
        })
    }

    async fn delete(&self, collection: &GroupCollection, id: &str) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))?;
        if let Some(groups) = collections.get_mut(collection) {
            groups.retain(|g| g.id != id);
        }
        Ok(())
    }
}

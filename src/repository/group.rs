//! Groups and the per-team collections they live in.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::StoreError;
use crate::config::StoreConfig;

/// Collection name used when no team is involved.
pub const DEFAULT_GROUP_COLLECTION: &str = "groups";

/// Name of the storage collection a set of groups belongs to.
///
/// Tenants are isolated by collection name: the groups of team `t42` live in
/// `t42_groups`. Group names are unique within a collection only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupCollection(String);

impl GroupCollection {
    /// The collection for `team_id`, named `<teamId>_groups`.
    pub fn for_team(team_id: &str) -> Self {
        Self::for_team_with_config(team_id, &StoreConfig::default())
    }

    /// The collection for `team_id` under
    /// [`StoreConfig::group_collection_suffix`].
    pub fn for_team_with_config(team_id: &str, config: &StoreConfig) -> Self {
        Self::for_team_with_suffix(team_id, &config.group_collection_suffix)
    }

    pub fn for_team_with_suffix(team_id: &str, suffix: &str) -> Self {
        Self(format!("{team_id}{suffix}"))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GroupCollection {
    fn default() -> Self {
        Self(DEFAULT_GROUP_COLLECTION.to_owned())
    }
}

impl fmt::Display for GroupCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named set of users inside an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(rename = "groupId")]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<String>,
    pub owner_id: Option<String>,
    /// Member user ids, in insertion order, without duplicates.
    #[serde(default)]
    pub user_ids: Vec<String>,
}

impl Group {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.user_ids.iter().any(|id| id == user_id)
    }
}

/// Input for [`GroupRepository::create`].
///
/// `NewGroup::default()` is named after [`StoreConfig::default_group_name`]
/// (`users`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<String>,
    pub owner_id: Option<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
}

impl Default for NewGroup {
    fn default() -> Self {
        Self::with_config(&StoreConfig::default())
    }
}

impl NewGroup {
    /// An unnamed group input, named after `config.default_group_name`.
    pub fn with_config(config: &StoreConfig) -> Self {
        Self::named(config.default_group_name.clone())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            organization_id: None,
            owner_id: None,
            user_ids: Vec::new(),
        }
    }

    /// Member ids with duplicates removed, first occurrence kept.
    pub(crate) fn distinct_user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.user_ids.len());
        for id in &self.user_ids {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

/// Storage for groups. Every call is scoped to a [`GroupCollection`].
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Stores a group.
    ///
    /// Fails with [`StoreError::DuplicateKey`] (`field = "name"`) when the
    /// collection already holds a group with the same name.
    async fn create(
        &self,
        collection: &GroupCollection,
        data: NewGroup,
    ) -> Result<Group, StoreError>;

    async fn find_by_id(
        &self,
        collection: &GroupCollection,
        id: &str,
    ) -> Result<Option<Group>, StoreError>;

    async fn find_by_name(
        &self,
        collection: &GroupCollection,
        name: &str,
    ) -> Result<Option<Group>, StoreError>;

    async fn find_by_organization(
        &self,
        collection: &GroupCollection,
        organization_id: &str,
    ) -> Result<Vec<Group>, StoreError>;

    /// Adds `user_id` to the group. Adding an existing member is a no-op.
    async fn add_member(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, StoreError>;

    async fn remove_member(
        &self,
        collection: &GroupCollection,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, StoreError>;

    async fn delete(&self, collection: &GroupCollection, id: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_for_team() {
        assert_eq!(GroupCollection::for_team("t42").as_str(), "t42_groups");
        assert_eq!(GroupCollection::default().as_str(), "groups");
    }

    #[test]
    fn test_collection_follows_configured_suffix() {
        let config = StoreConfig {
            group_collection_suffix: "-teams".to_owned(),
            ..Default::default()
        };
        assert_eq!(
            GroupCollection::for_team_with_config("t42", &config).as_str(),
            "t42-teams"
        );
    }

    #[test]
    fn test_new_group_follows_configured_name() {
        let config = StoreConfig {
            default_group_name: "members".to_owned(),
            ..Default::default()
        };
        assert_eq!(NewGroup::with_config(&config).name, "members");
    }

    #[test]
    fn test_new_group_defaults_to_users() {
        let group = NewGroup::default();
        assert_eq!(group.name, "users");
        assert!(group.user_ids.is_empty());
    }

    #[test]
    fn test_group_serializes_with_group_id() {
        let group = Group {
            id: "g1".to_owned(),
            name: "general".to_owned(),
            description: None,
            organization_id: Some("o1".to_owned()),
            owner_id: Some("u1".to_owned()),
            user_ids: vec!["u1".to_owned(), "u2".to_owned()],
        };

        let json = serde_json::to_value(&group).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["groupId"], "g1");
        assert_eq!(obj["organizationId"], "o1");
        assert_eq!(obj["userIds"][1], "u2");
        assert!(!obj.contains_key("_id"));
        assert!(!obj.contains_key("__v"));
        assert!(!obj.contains_key("id"));
    }

    #[test]
    fn test_distinct_user_ids() {
        let group = NewGroup {
            user_ids: vec!["a".to_owned(), "b".to_owned(), "a".to_owned()],
            ..NewGroup::default()
        };
        assert_eq!(group.distinct_user_ids(), vec!["a".to_owned(), "b".to_owned()]);
    }
}

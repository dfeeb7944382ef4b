use crate::config::StoreConfig;
use crate::{GroupCollection, GroupLookupError, GroupRepository};

/// Looks up the id of a team's `general` group.
///
/// The team's groups live in their own collection, `<teamId>_groups`.
pub struct FetchGeneralGroupAction<G: GroupRepository> {
    group_repository: G,
    config: StoreConfig,
}

impl<G: GroupRepository> FetchGeneralGroupAction<G> {
    pub fn new(group_repository: G) -> Self {
        Self::with_config(group_repository, StoreConfig::default())
    }

    pub fn with_config(group_repository: G, config: StoreConfig) -> Self {
        FetchGeneralGroupAction {
            group_repository,
            config,
        }
    }

    /// # Returns
    ///
    /// - `Ok(Some(group_id))` - the team has a general group
    /// - `Ok(None)` - it does not
    /// - `Err(_)` - the query failed; the error carries `id: 400`
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "fetch_general_group", skip(self), err)
    )]
    pub async fn execute(&self, team_id: &str) -> Result<Option<String>, GroupLookupError> {
        let collection = GroupCollection::for_team_with_config(team_id, &self.config);

        let group = self
            .group_repository
            .find_by_name(&collection, &self.config.general_group_name)
            .await
            .map_err(|e| {
                log::warn!(
                    target: "enclave_tenancy",
                    "msg=\"general group lookup failed\", collection=\"{collection}\", error=\"{e}\""
                );
                GroupLookupError::from(e)
            })?;

        if group.is_none() {
            log::debug!(
                target: "enclave_tenancy",
                "msg=\"general group missing\", collection=\"{collection}\""
            );
        }

        Ok(group.map(|g| g.id))
    }
}

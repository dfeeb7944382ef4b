pub mod fetch_general_group;

pub use fetch_general_group::FetchGeneralGroupAction;

use crate::{GroupLookupError, GroupRepository};

/// Returns the id of the `general` group in `<team_id>_groups`, or `None`.
///
/// Shorthand for [`FetchGeneralGroupAction`] with the default configuration.
pub async fn fetch_general_group<G: GroupRepository>(
    group_repository: G,
    team_id: &str,
) -> Result<Option<String>, GroupLookupError> {
    FetchGeneralGroupAction::new(group_repository)
        .execute(team_id)
        .await
}

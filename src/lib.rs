//! Storage models for a multi-service application: authentication tokens,
//! invitations, groups, organizations and sessions.
//!
//! Each entity has one canonical record type and a repository trait in
//! [`repository`]. Backends map the records onto a concrete store:
//!
//! - `mocks`: in-memory repositories for tests and prototypes
//! - `mongo`: MongoDB documents (`_id`/`__v`, embedded group members)
//! - `sqlx_sqlite`: SQLite tables (group membership in a join table)
//!
//! ```rust
//! use enclave_tenancy::{GroupCollection, NewGroup};
//!
//! let collection = GroupCollection::for_team("t42");
//! assert_eq!(collection.as_str(), "t42_groups");
//! assert_eq!(NewGroup::default().name, "users");
//! ```

pub mod actions;
pub mod config;
pub mod crypto;
mod error;
pub mod repository;

#[cfg(feature = "mongo")]
pub mod mongo;
#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

pub use actions::{FetchGeneralGroupAction, fetch_general_group};
pub use config::StoreConfig;
pub use error::{GroupLookupError, StoreError};

pub use repository::{
    Group, GroupCollection, GroupRepository, Invitation, InvitationRepository, NewGroup,
    NewInvitation, NewOrganization, NewSession, NewToken, Organization, OrganizationRepository,
    Session, SessionProfile, SessionRepository, Token, TokenRepository,
};

#[cfg(any(test, feature = "mocks"))]
pub use repository::{
    MockGroupRepository, MockInvitationRepository, MockOrganizationRepository,
    MockSessionRepository, MockTokenRepository,
};

//! Repository traits and data types.
//!
//! This module defines the canonical record shapes and the storage
//! abstractions every backend implements.
//!
//! # Traits
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`TokenRepository`] | Opaque auth tokens |
//! | [`InvitationRepository`] | Invitations, unique by email |
//! | [`GroupRepository`] | Groups, scoped to a [`GroupCollection`] |
//! | [`OrganizationRepository`] | Soft-deletable organizations |
//! | [`SessionRepository`] | Sessions with a denormalized user profile |
//!
//! # Backends
//!
//! | Backend | Feature | Implements |
//! |---------|---------|------------|
//! | `Mock*` (in-memory) | `mocks` | all |
//! | [`crate::mongo`] | `mongo` | tokens, invitations, groups |
//! | [`crate::sqlite`] | `sqlx_sqlite` | tokens, groups, organizations, sessions |

mod group;
mod invitation;
mod organization;
mod session;
mod token;

#[cfg(any(test, feature = "mocks"))]
mod group_mock;
#[cfg(any(test, feature = "mocks"))]
mod invitation_mock;
#[cfg(any(test, feature = "mocks"))]
mod organization_mock;
#[cfg(any(test, feature = "mocks"))]
mod session_mock;
#[cfg(any(test, feature = "mocks"))]
mod token_mock;

pub use group::{DEFAULT_GROUP_COLLECTION, Group, GroupCollection, GroupRepository, NewGroup};
pub use invitation::{Invitation, InvitationRepository, NewInvitation};
pub use organization::{NewOrganization, Organization, OrganizationRepository};
pub use session::{NewSession, Session, SessionProfile, SessionRepository};
pub use token::{NewToken, Token, TokenRepository};

#[cfg(any(test, feature = "mocks"))]
pub use group_mock::MockGroupRepository;
#[cfg(any(test, feature = "mocks"))]
pub use invitation_mock::MockInvitationRepository;
#[cfg(any(test, feature = "mocks"))]
pub use organization_mock::MockOrganizationRepository;
#[cfg(any(test, feature = "mocks"))]
pub use session_mock::MockSessionRepository;
#[cfg(any(test, feature = "mocks"))]
pub use token_mock::MockTokenRepository;

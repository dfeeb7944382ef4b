//! `SQLite` database backend implementations.
//!
//! Enable the `sqlx_sqlite` feature to use these implementations. Group
//! membership is stored in a `group_users` join table; group collections are
//! a partition column on `groups`.

mod group;
pub mod migrations;
mod organization;
mod session;
mod token;

pub use group::SqliteGroupRepository;
pub use organization::SqliteOrganizationRepository;
pub use session::SqliteSessionRepository;
pub use token::SqliteTokenRepository;

use sqlx::SqlitePool;

use crate::StoreError;
use crate::config::StoreConfig;

/// Creates all `SQLite` repository instances from a connection pool.
pub fn create_repositories(
    pool: SqlitePool,
    config: StoreConfig,
) -> (
    SqliteTokenRepository,
    SqliteGroupRepository,
    SqliteOrganizationRepository,
    SqliteSessionRepository,
) {
    (
        SqliteTokenRepository::new(pool.clone()),
        SqliteGroupRepository::new(pool.clone()),
        SqliteOrganizationRepository::with_config(pool.clone(), config),
        SqliteSessionRepository::new(pool),
    )
}

fn database_error(operation: &str, e: &sqlx::Error) -> StoreError {
    log::error!(target: "enclave_tenancy", "msg=\"database error\", operation=\"{operation}\", error=\"{e}\"");
    StoreError::DatabaseError(e.to_string())
}

/// Maps a failed insert, turning unique violations into [`StoreError::DuplicateKey`].
fn insert_error(operation: &str, field: &'static str, e: &sqlx::Error) -> StoreError {
    if e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        log::debug!(target: "enclave_tenancy", "msg=\"duplicate key\", operation=\"{operation}\", field=\"{field}\"");
        return StoreError::DuplicateKey { field };
    }
    database_error(operation, e)
}

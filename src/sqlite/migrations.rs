//! Database migrations for `SQLite`.
//!
//! Migrations are embedded at compile time and tracked in the
//! `_tenancy_migrations` table.
//!
//! # Example
//!
//! ```rust,ignore
//! use enclave_tenancy::sqlite::migrations;
//! use sqlx::SqlitePool;
//!
//! async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
//!     migrations::run(pool).await?;
//!     Ok(())
//! }
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250301000001_create_tokens_table",
        include_str!("../../migrations_sqlite/20250301000001_create_tokens_table.sql"),
    ),
    (
        "20250301000002_create_user_groups_table",
        include_str!("../../migrations_sqlite/20250301000002_create_user_groups_table.sql"),
    ),
    (
        "20250301000003_create_group_users_table",
        include_str!("../../migrations_sqlite/20250301000003_create_group_users_table.sql"),
    ),
    (
        "20250301000004_create_organizations_table",
        include_str!("../../migrations_sqlite/20250301000004_create_organizations_table.sql"),
    ),
    (
        "20250301000005_create_sessions_table",
        include_str!("../../migrations_sqlite/20250301000005_create_sessions_table.sql"),
    ),
];

/// Runs all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _tenancy_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _tenancy_migrations WHERE name = ?)")
                .bind(*name)
                .fetch_one(pool)
                .await?;

        if applied {
            continue;
        }

        // statements are split on `;`, so migrations must not put one inside a literal
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                pool.execute(trimmed).await?;
            }
        }

        sqlx::query("INSERT INTO _tenancy_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(pool)
            .await?;

        log::info!(target: "enclave_tenancy", "msg=\"migration applied\", name=\"{name}\"");
    }

    Ok(())
}

//! MongoDB backend implementations.
//!
//! Enable the `mongo` feature to use these implementations. Records are
//! stored as documents carrying `_id` (an `ObjectId`) and the `__v` version
//! key; both are replaced by plain string ids when converted to the public
//! record types. Group members are embedded in the group document.
//!
//! # Example
//!
//! ```rust,ignore
//! use enclave_tenancy::mongo;
//!
//! let db = mongo::connect("mongodb://localhost:27017", "app").await?;
//! mongo::ensure_indexes(&db).await?;
//! let (tokens, invitations, groups) = mongo::create_repositories(&db);
//! ```

mod group;
mod invitation;
mod token;

pub use group::{GroupDocument, MongoGroupRepository};
pub use invitation::{InvitationDocument, MongoInvitationRepository};
pub use token::{MongoTokenRepository, TokenDocument};

use mongodb::bson::{Document, oid::ObjectId};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use crate::StoreError;

/// Collection holding tokens.
pub const TOKENS_COLLECTION: &str = "tokens";
/// Collection holding invitations.
pub const INVITATIONS_COLLECTION: &str = "invitations";

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Connects to `uri` and returns a handle to `database`.
pub async fn connect(uri: &str, database: &str) -> Result<Database, StoreError> {
    let client = Client::with_uri_str(uri)
        .await
        .map_err(|e| database_error("connect", &e))?;
    Ok(client.database(database))
}

/// Creates the unique indexes of the fixed collections up front.
///
/// Repositories also create their indexes on first write, so this only
/// moves that cost to startup.
pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    ensure_unique_index(&db.collection::<Document>(INVITATIONS_COLLECTION), "email").await?;
    ensure_unique_index(
        &db.collection::<Document>(crate::repository::DEFAULT_GROUP_COLLECTION),
        "name",
    )
    .await?;
    Ok(())
}

/// Creates all MongoDB repository instances for a database.
pub fn create_repositories(
    db: &Database,
) -> (
    MongoTokenRepository,
    MongoInvitationRepository,
    MongoGroupRepository,
) {
    (
        MongoTokenRepository::new(db),
        MongoInvitationRepository::new(db),
        MongoGroupRepository::new(db),
    )
}

async fn ensure_unique_index<T>(collection: &Collection<T>, field: &str) -> Result<(), StoreError>
where
    T: Send + Sync,
{
    let mut keys = Document::new();
    keys.insert(field, 1_i32);

    let index = IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build();

    collection
        .create_index(index)
        .await
        .map_err(|e| database_error("create_index", &e))?;

    log::debug!(
        target: "enclave_tenancy",
        "msg=\"unique index ensured\", collection=\"{}\", field=\"{field}\"",
        collection.name()
    );
    Ok(())
}

fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::Internal(format!("invalid object id `{id}`")))
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn database_error(operation: &str, e: &mongodb::error::Error) -> StoreError {
    log::error!(target: "enclave_tenancy", "msg=\"database error\", operation=\"{operation}\", error=\"{e}\"");
    StoreError::DatabaseError(e.to_string())
}

/// Maps a failed insert, turning duplicate-key errors into [`StoreError::DuplicateKey`].
fn insert_error(operation: &str, field: &'static str, e: &mongodb::error::Error) -> StoreError {
    if is_duplicate_key(e) {
        log::debug!(target: "enclave_tenancy", "msg=\"duplicate key\", operation=\"{operation}\", field=\"{field}\"");
        return StoreError::DuplicateKey { field };
    }
    database_error(operation, e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_id() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex()).unwrap(), id);
        assert!(matches!(
            parse_object_id("not-an-id"),
            Err(StoreError::Internal(_))
        ));
    }
}

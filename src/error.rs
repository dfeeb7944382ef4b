use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors surfaced by the storage backends.
///
/// Lookups that find nothing are not errors: finders return `Ok(None)`.
/// [`StoreError::NotFound`] is reserved for mutations that address a record
/// which does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Duplicate value for unique field `{field}`")]
    DuplicateKey { field: &'static str },
    #[error("Record not found")]
    NotFound,
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

/// Structured failure returned by the general-group lookup.
///
/// Serializes as `{"id": 400, "msg": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLookupError {
    pub id: u16,
    pub msg: String,
}

impl GroupLookupError {
    pub const STATUS: u16 = 400;

    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            id: Self::STATUS,
            msg: msg.into(),
        }
    }
}

impl From<StoreError> for GroupLookupError {
    fn from(err: StoreError) -> Self {
        Self::new(err.to_string())
    }
}

impl fmt::Display for GroupLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.msg)
    }
}

impl std::error::Error for GroupLookupError {}

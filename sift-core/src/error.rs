use crate::Error;
use std::sync::Arc;

/// Failures the data layer raises itself, each one with a stable numeric code.
///
/// They travel inside [`crate::Error`], the `is_*_error` helpers below find them again
/// through any amount of added context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DbError {
    #[error("query failed")]
    Query,
    #[error("model is not a valid record")]
    Model,
    #[error("primary key not set")]
    PrimaryKeyUnset,
    #[error("primary key invalid")]
    PrimaryKeyInvalid,
    #[error("primary key is empty")]
    PrimaryKeyEmpty,
    #[error("find duplicate record")]
    RecordNotUnique,
    #[error("{0}")]
    RecordNotFound(String),
    #[error("{0}")]
    RecordNotAffected(String),
    #[error("pluck not supplied")]
    Pluck,
    #[error("invalid filter operator `{0}`")]
    Symbol(String),
    #[error("{0}")]
    Value(String),
    #[error("refusing to touch every row, no condition given")]
    MissingCondition,
    #[error("{message}")]
    UniqueIndex { index: String, message: String },
    #[error("unique index not declared")]
    UniqueIndexUnset,
    #[error("unique index list is empty")]
    UniqueIndexEmpty,
    #[error("unique index does not match")]
    UniqueIndexMismatch,
    #[error("unique index name not found in the error message")]
    UniqueIndexNameEmpty,
    #[error("unique index message not set")]
    UniqueIndexMessageUnset,
    /// Raw duplicate key violation reported by a driver, carries the server message.
    #[error("{0}")]
    DuplicateKey(String),
}

impl DbError {
    pub fn code(&self) -> u16 {
        match self {
            DbError::Query => 1100,
            DbError::Model => 1101,
            DbError::PrimaryKeyUnset => 1102,
            DbError::PrimaryKeyInvalid => 1103,
            DbError::PrimaryKeyEmpty => 1104,
            DbError::RecordNotUnique => 1110,
            DbError::RecordNotFound(..) => 1111,
            DbError::RecordNotAffected(..) => 1112,
            DbError::Pluck => 1113,
            DbError::Symbol(..) => 1114,
            DbError::Value(..) => 1115,
            DbError::MissingCondition => 1116,
            DbError::UniqueIndex { .. } => 1120,
            DbError::UniqueIndexUnset => 1121,
            DbError::UniqueIndexEmpty => 1122,
            DbError::UniqueIndexMismatch => 1123,
            DbError::UniqueIndexNameEmpty => 1125,
            DbError::UniqueIndexMessageUnset => 1126,
            DbError::DuplicateKey(..) => 1127,
        }
    }
}

/// Builds the error returned in place of a default one, see [`crate::QueryOptions`].
pub type ErrorFactory = Arc<dyn Fn() -> Error + Send + Sync>;

/// The [`DbError`] carried by `error`, if any.
pub fn find_db_error(error: &Error) -> Option<&DbError> {
    error
        .downcast_ref::<DbError>()
        .or_else(|| error.chain().find_map(|e| e.downcast_ref::<DbError>()))
}

pub fn is_unique_index_error(error: &Error) -> bool {
    find_db_error(error).is_some_and(|e| (1120..=1127).contains(&e.code()))
}

pub fn is_not_single_error(error: &Error) -> bool {
    matches!(find_db_error(error), Some(DbError::RecordNotUnique))
}

pub fn is_record_not_found_error(error: &Error) -> bool {
    matches!(find_db_error(error), Some(DbError::RecordNotFound(..)))
}

pub fn is_record_not_affected_error(error: &Error) -> bool {
    matches!(find_db_error(error), Some(DbError::RecordNotAffected(..)))
}

use crate::{DbError, Error, Model, find_db_error};
use regex::Regex;
use std::sync::LazyLock;

/// A unique index of a model and the message reported when an insert or update violates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueIndex {
    /// Index name, optionally qualified with the table: `user.uk_email`.
    pub name: &'static str,
    pub message: Option<&'static str>,
}

static INDEX_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"for key '(.*?)'").expect("The index name pattern must be a valid regex")
});

/// Extracts the index name from a duplicate key message such as
/// `Duplicate entry 'a@b.c' for key 'user.uk_email'`.
pub fn index_name(message: &str) -> Option<&str> {
    INDEX_NAME
        .captures(message)
        .and_then(|v| v.get(1))
        .map(|v| v.as_str())
        .filter(|v| !v.is_empty())
}

fn unqualified(name: &str) -> Option<&str> {
    let mut parts = name.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(name), None) => Some(name),
        _ => None,
    }
}

/// Maps a duplicate key message to the error declared by `M` for the violated index.
///
/// Names match when they are equal or when one is the other qualified with a table.
pub fn unique_index_error<M: Model>(message: &str) -> Error {
    let Some(indexes) = M::unique_indexes() else {
        return DbError::UniqueIndexUnset.into();
    };
    if indexes.is_empty() {
        return DbError::UniqueIndexEmpty.into();
    }
    let Some(name) = index_name(message) else {
        return DbError::UniqueIndexNameEmpty.into();
    };
    let found = indexes.iter().find(|index| {
        index.name == name
            || unqualified(index.name) == Some(name)
            || unqualified(name) == Some(index.name)
    });
    match found {
        Some(UniqueIndex {
            name,
            message: Some(message),
        }) => DbError::UniqueIndex {
            index: name.to_string(),
            message: message.to_string(),
        }
        .into(),
        Some(..) => DbError::UniqueIndexMessageUnset.into(),
        None => DbError::UniqueIndexMismatch.into(),
    }
}

/// Driver errors after a write: duplicate keys become the error of the violated unique
/// index, anything else is reported as a failed query.
pub(crate) fn reconcile_write_error<M: Model>(error: Error) -> Error {
    if let Some(DbError::DuplicateKey(message)) = find_db_error(&error) {
        let result = unique_index_error::<M>(message);
        log::debug!("{:#}, reported as: {}", error, result);
        return result;
    }
    error.context(DbError::Query)
}

use sift_core::{DbError, Error};

/// Server error raised when an insert or update hits a unique index.
pub const ER_DUP_ENTRY: u16 = 1062;

/// Wraps a driver error, duplicate key violations become [`DbError::DuplicateKey`] so the
/// repository can map them to the unique index declared on the model.
pub fn convert_error(error: mysql_async::Error) -> Error {
    match &error {
        mysql_async::Error::Server(server) if server.code == ER_DUP_ENTRY => {
            Error::new(DbError::DuplicateKey(server.message.clone()))
        }
        _ => Error::new(error),
    }
}

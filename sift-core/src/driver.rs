use crate::{Connection, SqlWriter, Transaction};

pub trait Driver: Send + Sync {
    type Connection: Connection;
    type SqlWriter: SqlWriter;
    type Transaction<'c>: Transaction<'c>;

    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}

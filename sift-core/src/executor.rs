use crate::{
    Driver, QueryResult, Result, RowLabeled, RowsAffected,
    stream::{Stream, TryStreamExt},
};
use std::future::Future;

/// Something able to run SQL text: a connection or a transaction.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Runs `query` and streams whatever it produces, rows and write counts alike.
    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Rows of `query`, write counts are dropped.
    fn fetch(&mut self, query: String) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(query).try_filter_map(|v| async move {
            Ok(match v {
                QueryResult::Row(row) => Some(row),
                QueryResult::Affected(..) => None,
            })
        })
    }

    /// Sum of the write counts of `query`, rows are dropped.
    fn execute(&mut self, query: String) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(query)
            .try_filter_map(|v| async move {
                Ok(match v {
                    QueryResult::Affected(affected) => Some(affected),
                    QueryResult::Row(..) => None,
                })
            })
            .try_collect()
    }
}

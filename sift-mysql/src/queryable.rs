use crate::{MySQLDriver, RowWrap, convert_error};
use async_stream::try_stream;
use log::Level;
use sift_core::{
    DatabaseConfig, DbError, Error, Executor, QueryResult, Result, RowsAffected, find_db_error,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// How statements get logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    /// Log every statement at info level instead of debug.
    pub debug: bool,
    /// Statements slower than this are logged as warnings, zero disables the check.
    pub slow_threshold: Duration,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            debug: false,
            slow_threshold: Duration::from_millis(200),
        }
    }
}

impl From<&DatabaseConfig> for QuerySettings {
    fn from(value: &DatabaseConfig) -> Self {
        Self {
            debug: value.debug,
            slow_threshold: value.slow_threshold(),
        }
    }
}

impl QuerySettings {
    fn trace(&self, query: &str, elapsed: Duration, rows: u64) {
        if !self.slow_threshold.is_zero() && elapsed > self.slow_threshold {
            log::warn!(
                "Slow query, {:.3?} (threshold {:?}), rows {}:\n{}",
                elapsed,
                self.slow_threshold,
                rows,
                truncate_long!(query)
            );
        } else if self.debug {
            log::info!("[{:.3?}] [rows:{}] {}", elapsed, rows, truncate_long!(query));
        } else {
            log::debug!("[{:.3?}] [rows:{}] {}", elapsed, rows, truncate_long!(query));
        }
    }
}

/// Executor over anything `mysql_async` can query: a connection, a pooled connection or a
/// transaction.
pub struct MySQLQueryable<T: mysql_async::prelude::Queryable> {
    pub(crate) executor: T,
    pub(crate) settings: QuerySettings,
}

impl<T: mysql_async::prelude::Queryable> MySQLQueryable<T> {
    pub(crate) fn new(executor: T, settings: QuerySettings) -> Self {
        Self { executor, settings }
    }
}

impl<T: mysql_async::prelude::Queryable> Executor for MySQLQueryable<T> {
    type Driver = MySQLDriver;

    fn driver(&self) -> &Self::Driver {
        &MySQLDriver {}
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        let context = Arc::new(format!(
            "While running the query:\n{}",
            truncate_long!(query)
        ));
        let settings = self.settings;
        try_stream! {
            let started = Instant::now();
            let mut result = self
                .executor
                .query_iter(query.as_str())
                .await
                .map_err(convert_error)?;
            let mut rows = 0;
            while let Some(mut stream) = result.stream::<RowWrap>().await.map_err(convert_error)? {
                while let Some(row) = stream.next().await.transpose().map_err(convert_error)? {
                    rows += 1;
                    yield QueryResult::Row(row.0)
                }
            }
            let affected = result.affected_rows();
            let last_affected_id = result.last_insert_id().map(|v| v as i64);
            settings.trace(&query, started.elapsed(), rows.max(affected));
            if rows == 0 {
                yield QueryResult::Affected(RowsAffected {
                    rows_affected: affected,
                    last_affected_id,
                });
            }
        }
        .map_err(move |e: Error| {
            let error = e.context(context.clone());
            log_error(&error);
            error
        })
    }
}

/// Duplicate keys are reconciled into unique index errors by the repository, the rest
/// are failures.
pub(crate) fn error_level(error: &Error) -> Level {
    match find_db_error(error) {
        Some(DbError::DuplicateKey(..)) => Level::Debug,
        _ => Level::Error,
    }
}

fn log_error(error: &Error) {
    log::log!(error_level(error), "{:#}", error);
}

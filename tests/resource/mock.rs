use log::LevelFilter;
use sift::{
    Connection, DbError, Driver, Error, Executor, GenericSqlWriter, QueryResult, Result,
    RowLabeled, RowsAffected, Transaction, Value,
    stream::{self, Stream},
};
use std::{borrow::Cow, collections::VecDeque, env, future::Future};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Scripted answer to the next statement.
#[derive(Debug, Clone)]
pub enum Response {
    Rows(Vec<RowLabeled>),
    Affected(u64, Option<i64>),
    Duplicate(String),
    Failure(String),
}

pub fn row<const N: usize>(values: [(&str, Value); N]) -> RowLabeled {
    values.into_iter().collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockDriver;

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = GenericSqlWriter;
    type Transaction<'c> = MockTransaction<'c>;

    const NAME: &'static str = "mock";
    fn sql_writer(&self) -> Self::SqlWriter {
        GenericSqlWriter::new()
    }
}

/// Records every statement and answers with the queued responses, an empty result once
/// they run out.
#[derive(Debug, Default)]
pub struct MockConnection {
    driver: MockDriver,
    pub log: Vec<String>,
    pub responses: VecDeque<Response>,
}

impl MockConnection {
    pub fn new() -> Self {
        init_logs();
        Self::default()
    }
    pub fn respond(&mut self, response: Response) -> &mut Self {
        self.responses.push_back(response);
        self
    }
    pub fn rows(&mut self, rows: impl IntoIterator<Item = RowLabeled>) -> &mut Self {
        self.respond(Response::Rows(rows.into_iter().collect()))
    }
    pub fn affected(&mut self, rows: u64) -> &mut Self {
        self.respond(Response::Affected(rows, None))
    }
    pub fn last(&self) -> &str {
        self.log.last().map(String::as_str).unwrap_or_default()
    }
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.log.push(query);
        let items: Vec<Result<QueryResult>> = match self.responses.pop_front() {
            None => Vec::new(),
            Some(Response::Rows(rows)) => rows.into_iter().map(|v| Ok(QueryResult::Row(v))).collect(),
            Some(Response::Affected(rows_affected, last_affected_id)) => {
                vec![Ok(QueryResult::Affected(RowsAffected {
                    rows_affected,
                    last_affected_id,
                }))]
            }
            Some(Response::Duplicate(message)) => {
                vec![Err(Error::new(DbError::DuplicateKey(message)))]
            }
            Some(Response::Failure(message)) => vec![Err(Error::msg(message))],
        };
        stream::iter(items)
    }
}

impl Connection for MockConnection {
    async fn connect(_url: Cow<'static, str>) -> Result<Self> {
        Ok(Self::new())
    }

    fn begin(&mut self) -> impl Future<Output = Result<MockTransaction<'_>>> + Send {
        self.log.push("BEGIN;".into());
        async move { Ok(MockTransaction { connection: self }) }
    }
}

pub struct MockTransaction<'c> {
    connection: &'c mut MockConnection,
}

impl<'c> Executor for MockTransaction<'c> {
    type Driver = MockDriver;

    fn driver(&self) -> &Self::Driver {
        self.connection.driver()
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.connection.run(query)
    }
}

impl<'c> Transaction<'c> for MockTransaction<'c> {
    async fn commit(self) -> Result<()> {
        self.connection.log.push("COMMIT;".into());
        Ok(())
    }
    async fn rollback(self) -> Result<()> {
        self.connection.log.push("ROLLBACK;".into());
        Ok(())
    }
}

use crate::{MySQLConnection, MySQLDriver, MySQLQueryable, convert_error};
use mysql_async::TxOpts;
use sift_core::{Executor, QueryResult, Result, Transaction, stream::Stream};

pub struct MySQLTransaction<'c> {
    pub(crate) transaction: MySQLQueryable<mysql_async::Transaction<'c>>,
}

impl<'c> MySQLTransaction<'c> {
    pub async fn new(connection: &'c mut MySQLConnection) -> Result<Self> {
        let settings = connection.conn.settings;
        let transaction = connection
            .conn
            .executor
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| {
                let error = convert_error(e);
                log::error!("{:#}", error);
                error
            })?;
        Ok(Self {
            transaction: MySQLQueryable::new(transaction, settings),
        })
    }
}

impl<'c> Executor for MySQLTransaction<'c> {
    type Driver = MySQLDriver;

    fn driver(&self) -> &Self::Driver {
        self.transaction.driver()
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.transaction.run(query)
    }
}

impl<'c> Transaction<'c> for MySQLTransaction<'c> {
    async fn commit(self) -> Result<()> {
        self.transaction
            .executor
            .commit()
            .await
            .map_err(convert_error)
    }
    async fn rollback(self) -> Result<()> {
        self.transaction
            .executor
            .rollback()
            .await
            .map_err(convert_error)
    }
}

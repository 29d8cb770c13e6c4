use crate::{MySQLDriver, MySQLQueryable, MySQLTransaction, QuerySettings, convert_error};
use mysql_async::{Conn, Opts};
use sift_core::{
    Connection, Context, Driver, Error, Executor, QueryResult, Result, stream::Stream,
    truncate_long,
};
use std::borrow::Cow;

pub struct MySQLConnection {
    pub(crate) conn: MySQLQueryable<Conn>,
}

impl MySQLConnection {
    pub(crate) fn new(conn: Conn, settings: QuerySettings) -> Self {
        Self {
            conn: MySQLQueryable::new(conn, settings),
        }
    }
    pub fn settings(&self) -> QuerySettings {
        self.conn.settings
    }
    pub fn set_settings(&mut self, settings: QuerySettings) {
        self.conn.settings = settings;
    }
    /// Closes the connection. Drop a pooled connection instead to give it back to the pool.
    pub async fn disconnect(self) -> Result<()> {
        self.conn.executor.disconnect().await.map_err(convert_error)
    }
}

impl Executor for MySQLConnection {
    type Driver = MySQLDriver;

    fn driver(&self) -> &Self::Driver {
        self.conn.driver()
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.conn.run(query)
    }
}

impl Connection for MySQLConnection {
    async fn connect(url: Cow<'static, str>) -> Result<MySQLConnection> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "MySQL connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let opts = Opts::from_url(&url).with_context(context)?;
        let conn = Conn::new(opts)
            .await
            .map_err(convert_error)
            .with_context(context)?;
        Ok(MySQLConnection::new(conn, QuerySettings::default()))
    }

    #[allow(refining_impl_trait)]
    async fn begin(&mut self) -> Result<MySQLTransaction<'_>> {
        MySQLTransaction::new(self).await
    }
}

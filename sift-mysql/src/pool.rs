use crate::{MySQLConnection, MySQLDriver, QuerySettings, convert_error};
use mysql_async::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts};
use sift_core::{Context, DatabaseConfig, Driver, Error, Result, truncate_long};
use std::time::Duration;

/// Connections are recycled after this long.
pub const CONNECTION_LIFETIME: Duration = Duration::from_secs(600);

/// Connection pool sized after a [`DatabaseConfig`].
#[derive(Debug, Clone)]
pub struct MySQLPool {
    pool: Pool,
    settings: QuerySettings,
}

impl MySQLPool {
    /// Builds the pool without opening any connection.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;
        if !config.dialect.eq_ignore_ascii_case(MySQLDriver::NAME) {
            return Err(Error::msg(format!(
                "Unsupported dialect `{}`, expected `{}`",
                config.dialect,
                MySQLDriver::NAME
            )));
        }
        let context = || {
            format!(
                "While configuring the pool for `{}`",
                truncate_long!(config.url)
            )
        };
        let max = config.max_open_conns;
        let min = config.max_idle_conns.min(max);
        let constraints = PoolConstraints::new(min, max)
            .ok_or_else(|| Error::msg(format!("Invalid pool size {min}..{max}")))
            .with_context(context)?;
        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_abs_conn_ttl(Some(CONNECTION_LIFETIME));
        let opts = Opts::from_url(&config.url).with_context(context)?;
        let opts = OptsBuilder::from_opts(opts).pool_opts(pool_opts);
        Ok(Self {
            pool: Pool::new(opts),
            settings: QuerySettings::from(config),
        })
    }

    /// Builds the pool and checks the database answers.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = Self::new(config)?;
        pool.ping().await?;
        log::info!("Connected to the `{}` database", MySQLDriver::NAME);
        Ok(pool)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut connection = self.get_connection().await?;
        mysql_async::prelude::Queryable::ping(&mut connection.conn.executor)
            .await
            .map_err(convert_error)
            .context("While pinging the database")
    }

    pub async fn get_connection(&self) -> Result<MySQLConnection> {
        let conn = self
            .pool
            .get_conn()
            .await
            .map_err(convert_error)
            .context("While taking a connection from the pool")?;
        Ok(MySQLConnection::new(conn, self.settings))
    }

    pub async fn disconnect(self) -> Result<()> {
        self.pool.disconnect().await.map_err(convert_error)
    }
}

use crate::{Connection, Driver, Error, Executor, Result};
use futures::FutureExt;
use std::{any::Any, future::Future, panic::AssertUnwindSafe};

pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>>;
    fn rollback(self) -> impl Future<Output = Result<()>>;
}

/// Runs `f` inside a transaction: commits when it returns `Ok`, rolls back when it returns
/// an error or panics.
///
/// ```rust,ignore
/// transaction(&mut connection, async |tx| {
///     order.create(tx, QueryOptions::new()).await?;
///     item.create(tx, QueryOptions::new()).await?;
///     Ok(())
/// })
/// .await?;
/// ```
pub async fn transaction<'c, C, T, F>(connection: &'c mut C, f: F) -> Result<T>
where
    C: Connection,
    F: AsyncFnOnce(&mut <C::Driver as Driver>::Transaction<'c>) -> Result<T>,
{
    let mut transaction = connection.begin().await?;
    let result = AssertUnwindSafe(f(&mut transaction)).catch_unwind().await;
    match result {
        Ok(Ok(value)) => {
            transaction.commit().await?;
            Ok(value)
        }
        Ok(Err(error)) => {
            rollback(transaction).await;
            Err(error)
        }
        Err(panic) => {
            rollback(transaction).await;
            Err(Error::msg(format!(
                "Transaction aborted by a panic: {}",
                panic_message(&*panic)
            )))
        }
    }
}

async fn rollback<'c, T: Transaction<'c>>(transaction: T) {
    if let Err(e) = transaction.rollback().await {
        log::error!("{:#}", e.context("While rolling back the transaction"));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

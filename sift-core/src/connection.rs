use crate::{Driver, Executor, Result};
use std::{borrow::Cow, future::Future};

pub trait Connection: Executor {
    /// Open a connection to the given URL.
    fn connect(url: Cow<'static, str>) -> impl Future<Output = Result<Self>>;

    /// Start a transaction, it borrows the connection until committed or rolled back.
    fn begin(
        &mut self,
    ) -> impl Future<Output = Result<<Self::Driver as Driver>::Transaction<'_>>> + Send;
}

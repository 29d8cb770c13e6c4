mod connection;
mod driver;
mod error;
mod pool;
mod queryable;
mod row_wrap;
mod sql_writer;
mod transaction;
mod value_wrap;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use pool::*;
pub use queryable::*;
pub(crate) use row_wrap::*;
pub use sql_writer::*;
pub use transaction::*;
pub(crate) use value_wrap::*;

mod as_value;
mod changes;
mod column;
mod condition;
mod connection;
mod database_config;
mod driver;
mod error;
mod executor;
mod filter;
mod model;
mod option;
mod row;
mod repository;
mod service;
mod sql_writer;
mod statement;
mod table_ref;
mod transaction;
mod unique_index;
mod user_id;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use changes::*;
pub use column::*;
pub use condition::*;
pub use connection::*;
pub use database_config::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use filter::*;
pub use model::*;
pub use option::*;
pub use row::*;
pub use repository::*;
pub use service::*;
pub use sql_writer::*;
pub use statement::*;
pub use table_ref::*;
pub use transaction::*;
pub use unique_index::*;
pub use user_id::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;

pub mod db;
pub use db::Db;

mod engine;

pub mod query;
pub use query::Query;

pub use lintel_core::{
    bail, convert, driver, err, schema, stmt, Converters, Error, IntoError, Result, Schema,
};

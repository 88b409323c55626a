//! csvql core - shared abstractions for the batch query runner
//!
//! This crate provides the types every other csvql crate depends on:
//!
//! - `Connection` / `Transaction` - traits implemented by the store driver
//! - `Value`, `Row`, `ColumnMeta`, `QueryResult` - materialized query results
//! - `CsvqlError` - the error type surfaced by store operations

mod connection;
mod error;
mod types;

pub use connection::*;
pub use error::*;
pub use types::*;

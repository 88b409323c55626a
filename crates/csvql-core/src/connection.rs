//! Connection trait and transaction handling

use crate::{QueryResult, Result, StatementResult, Value};
use async_trait::async_trait;

/// A connection to the relational store
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a statement that modifies data or schema
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Execute a query and materialize every row it returns
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Begin a transaction
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>>;

    /// Switch the store into (or out of) query-only mode.
    ///
    /// While enabled, any statement that would write is rejected by the
    /// engine and surfaces as `CsvqlError::Query`.
    async fn set_query_only(&self, enabled: bool) -> Result<()>;

    /// Close the connection and release the store.
    ///
    /// Closing an already closed connection is a no-op.
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// A store transaction
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;

    /// Execute a statement within the transaction
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;
}

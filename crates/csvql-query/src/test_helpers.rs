//! Test scaffolding for the csvql-query crate
//!
//! `MockConnection` stands in for the store so the executor and runner can be
//! driven through failure kinds the real engine cannot produce on demand.

use std::sync::Arc;

use async_trait::async_trait;
use csvql_core::{
    ColumnMeta, Connection, CsvqlError, QueryResult, Result, Row, StatementResult, Transaction,
    Value,
};
use parking_lot::Mutex;

/// Build a query result from column names and row values.
pub fn mock_query_result(columns: Vec<&str>, rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult {
        columns: columns
            .iter()
            .enumerate()
            .map(|(ordinal, name)| ColumnMeta {
                name: name.to_string(),
                data_type: "DYNAMIC".to_string(),
                ordinal,
            })
            .collect(),
        rows: rows
            .into_iter()
            .map(Row::new)
            .collect(),
        execution_time_ms: 0,
    }
}

#[derive(Clone)]
enum MockResponse {
    Rows(QueryResult),
    EngineError(String),
    ConversionError(String),
}

/// In-memory stand-in for the store.
///
/// Queries are answered by the first registered pattern the SQL contains;
/// unmatched queries return an empty result.
pub struct MockConnection {
    responses: Vec<(String, MockResponse)>,
    query_log: Arc<Mutex<Vec<String>>>,
    execute_log: Arc<Mutex<Vec<String>>>,
    close_count: Arc<Mutex<usize>>,
    query_only: Arc<Mutex<bool>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            query_log: Arc::new(Mutex::new(Vec::new())),
            execute_log: Arc::new(Mutex::new(Vec::new())),
            close_count: Arc::new(Mutex::new(0)),
            query_only: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_rows(mut self, sql_contains: &str, result: QueryResult) -> Self {
        self.responses
            .push((sql_contains.to_string(), MockResponse::Rows(result)));
        self
    }

    pub fn with_engine_error(mut self, sql_contains: &str, message: &str) -> Self {
        self.responses.push((
            sql_contains.to_string(),
            MockResponse::EngineError(message.to_string()),
        ));
        self
    }

    pub fn with_conversion_error(mut self, sql_contains: &str, message: &str) -> Self {
        self.responses.push((
            sql_contains.to_string(),
            MockResponse::ConversionError(message.to_string()),
        ));
        self
    }

    pub fn query_log(&self) -> Vec<String> {
        self.query_log.lock().clone()
    }

    pub fn execute_log(&self) -> Vec<String> {
        self.execute_log.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        *self.close_count.lock()
    }

    pub fn is_query_only(&self) -> bool {
        *self.query_only.lock()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        self.execute_log.lock().push(sql.to_string());
        Ok(StatementResult { affected_rows: 1 })
    }

    async fn query(&self, sql: &str, _params: &[Value]) -> Result<QueryResult> {
        self.query_log.lock().push(sql.to_string());

        let response = self
            .responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, response)| response.clone());

        match response {
            Some(MockResponse::Rows(result)) => Ok(result),
            Some(MockResponse::EngineError(message)) => Err(CsvqlError::Query(message)),
            Some(MockResponse::ConversionError(message)) => {
                Err(CsvqlError::Conversion(message))
            }
            None => Ok(QueryResult::empty()),
        }
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        Ok(Box::new(MockTransaction {
            execute_log: Arc::clone(&self.execute_log),
        }))
    }

    async fn set_query_only(&self, enabled: bool) -> Result<()> {
        *self.query_only.lock() = enabled;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        *self.close_count.lock() += 1;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        *self.close_count.lock() > 0
    }
}

struct MockTransaction {
    execute_log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transaction for MockTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        self.execute_log.lock().push(sql.to_string());
        Ok(StatementResult { affected_rows: 1 })
    }
}

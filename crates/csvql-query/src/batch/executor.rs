//! Statement execution with per-statement failure isolation

use std::convert::Infallible;
use std::fmt;
use std::time::{Duration, Instant};

use csvql_core::{Connection, CsvqlError, QueryResult};
use serde::{Deserialize, Serialize};

/// Which side a statement failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The engine rejected the statement: bad SQL, unknown column or table,
    /// attempted write.
    Engine,
    /// Anything else, e.g. a value that could not be materialized.
    Unexpected,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Engine => "engine",
            FailureKind::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error information for a failed statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StatementFailure {
    pub fn engine(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Engine,
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Unexpected,
            message: message.into(),
        }
    }
}

impl From<CsvqlError> for StatementFailure {
    fn from(err: CsvqlError) -> Self {
        if err.is_engine_error() {
            Self::engine(err.to_string())
        } else {
            Self::unexpected(err.to_string())
        }
    }
}

impl fmt::Display for StatementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Outcome of running one statement
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// All rows, possibly none
    Success(QueryResult),
    Failure(StatementFailure),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionOutcome::Failure(_))
    }

    pub fn query_result(&self) -> Option<&QueryResult> {
        match self {
            ExecutionOutcome::Success(result) => Some(result),
            ExecutionOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&StatementFailure> {
        match self {
            ExecutionOutcome::Success(_) => None,
            ExecutionOutcome::Failure(failure) => Some(failure),
        }
    }
}

impl From<csvql_core::Result<QueryResult>> for ExecutionOutcome {
    fn from(result: csvql_core::Result<QueryResult>) -> Self {
        match result {
            Ok(result) => ExecutionOutcome::Success(result),
            Err(err) => ExecutionOutcome::Failure(err.into()),
        }
    }
}

/// Result of executing a single statement in the batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Index of this statement in the script (0-based)
    pub index: usize,
    /// The SQL that was executed
    pub sql: String,
    pub outcome: ExecutionOutcome,
    pub execution_time: Duration,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn is_failed(&self) -> bool {
        self.outcome.is_failure()
    }
}

/// Result of batch execution containing all statement results
#[derive(Debug, Clone)]
pub struct BatchExecutionResult {
    /// Results for each statement in script order
    pub results: Vec<BatchResult>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl BatchExecutionResult {
    pub fn new(results: Vec<BatchResult>) -> Self {
        let success_count = results.iter().filter(|r| r.is_success()).count();
        let failure_count = results.iter().filter(|r| r.is_failed()).count();

        Self {
            results,
            success_count,
            failure_count,
        }
    }

    pub fn statement_count(&self) -> usize {
        self.results.len()
    }
}

/// Run one statement as a read query and materialize all of its rows.
///
/// Never fails: every error becomes an `ExecutionOutcome::Failure`.
pub async fn execute_statement(conn: &dyn Connection, sql: &str) -> ExecutionOutcome {
    conn.query(sql, &[]).await.into()
}

/// Execute statements strictly in order, handing each result to `on_result`
/// before the next statement starts.
///
/// A failed statement never stops the batch; only an error from `on_result`
/// does.
pub async fn execute_batch_with<F, E>(
    conn: &dyn Connection,
    statements: Vec<String>,
    mut on_result: F,
) -> Result<BatchExecutionResult, E>
where
    F: FnMut(&BatchResult) -> Result<(), E>,
{
    let mut results = Vec::with_capacity(statements.len());

    for (index, sql) in statements.into_iter().enumerate() {
        let start = Instant::now();
        let outcome = execute_statement(conn, &sql).await;
        let execution_time = start.elapsed();

        match &outcome {
            ExecutionOutcome::Success(result) => tracing::debug!(
                index,
                row_count = result.row_count(),
                execution_time_ms = execution_time.as_millis() as u64,
                "statement succeeded"
            ),
            ExecutionOutcome::Failure(failure) => tracing::warn!(
                index,
                kind = %failure.kind,
                error = %failure.message,
                execution_time_ms = execution_time.as_millis() as u64,
                "statement failed"
            ),
        }

        let result = BatchResult {
            index,
            sql,
            outcome,
            execution_time,
        };
        on_result(&result)?;
        results.push(result);
    }

    Ok(BatchExecutionResult::new(results))
}

/// Execute statements in order and collect every result
pub async fn execute_batch(conn: &dyn Connection, statements: Vec<String>) -> BatchExecutionResult {
    let collected: Result<_, Infallible> =
        execute_batch_with(conn, statements, |_| Ok(())).await;
    match collected {
        Ok(batch) => batch,
        Err(never) => match never {},
    }
}

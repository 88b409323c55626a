//! SQLite connection implementation

use async_trait::async_trait;
use csvql_core::{
    ColumnMeta, Connection, CsvqlError, QueryResult, Result, Row, StatementResult, Transaction,
    Value,
};
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, params_from_iter};
use std::sync::Arc;

type SharedConnection = Arc<Mutex<Option<RusqliteConnection>>>;

/// In-memory SQLite store.
///
/// The underlying handle is taken out on `close`, after which every
/// operation fails with `CsvqlError::Closed`.
pub struct SqliteConnection {
    conn: SharedConnection,
}

impl SqliteConnection {
    /// Open a fresh, empty in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = RusqliteConnection::open_in_memory().map_err(|e| {
            CsvqlError::Connection(format!("Failed to open in-memory database: {}", e))
        })?;

        tracing::debug!("in-memory SQLite store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }
}

fn with_conn<T>(
    conn: &SharedConnection,
    f: impl FnOnce(&RusqliteConnection) -> Result<T>,
) -> Result<T> {
    let guard = conn.lock();
    let conn = guard.as_ref().ok_or(CsvqlError::Closed)?;
    f(conn)
}

#[async_trait]
impl Connection for SqliteConnection {
    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        with_conn(&self.conn, |conn| execute_on(conn, sql, params))
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();

        let (columns, rows) = with_conn(&self.conn, |conn| query_on(conn, sql, params))?;

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );
        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms,
        })
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        tracing::debug!("beginning SQLite transaction");
        with_conn(&self.conn, |conn| {
            conn.execute_batch("BEGIN DEFERRED")
                .map_err(|e| classify(e, "begin transaction"))
        })?;
        Ok(Box::new(SqliteTransaction {
            conn: Arc::clone(&self.conn),
            committed: false,
            rolled_back: false,
        }))
    }

    async fn set_query_only(&self, enabled: bool) -> Result<()> {
        with_conn(&self.conn, |conn| {
            conn.pragma_update(None, "query_only", enabled)
                .map_err(|e| classify(e, "set query_only"))
        })?;
        tracing::debug!(enabled, "query_only pragma updated");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let Some(conn) = self.conn.lock().take() else {
            tracing::debug!("SQLite store already closed");
            return Ok(());
        };

        tracing::info!("closing SQLite store");
        conn.close().map_err(|(_, e)| {
            CsvqlError::Connection(format!("Failed to close SQLite store: {}", e))
        })
    }

    fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}

/// Transaction over the shared store handle.
///
/// Dropping it without commit or rollback rolls back.
pub struct SqliteTransaction {
    conn: SharedConnection,
    committed: bool,
    rolled_back: bool,
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.committed && !self.rolled_back {
            tracing::warn!(
                "SQLite transaction dropped without commit or rollback, issuing automatic rollback"
            );
            let guard = self.conn.lock();
            if let Some(conn) = guard.as_ref()
                && let Err(e) = conn.execute_batch("ROLLBACK")
            {
                tracing::error!(error = %e, "automatic rollback on drop failed");
            }
        }
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("committing SQLite transaction");

        if self.rolled_back {
            return Err(CsvqlError::Driver("Transaction already rolled back".into()));
        }
        if self.committed {
            return Err(CsvqlError::Driver("Transaction already committed".into()));
        }

        with_conn(&self.conn, |conn| {
            conn.execute_batch("COMMIT")
                .map_err(|e| classify(e, "commit transaction"))
        })?;

        self.committed = true;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("rolling back SQLite transaction");

        if self.committed {
            return Err(CsvqlError::Driver("Transaction already committed".into()));
        }
        if self.rolled_back {
            return Ok(());
        }

        with_conn(&self.conn, |conn| {
            conn.execute_batch("ROLLBACK")
                .map_err(|e| classify(e, "rollback transaction"))
        })?;

        self.rolled_back = true;
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        with_conn(&self.conn, |conn| execute_on(conn, sql, params))
    }
}

fn execute_on(conn: &RusqliteConnection, sql: &str, params: &[Value]) -> Result<StatementResult> {
    ensure_has_sql(sql)?;
    let rusqlite_params = values_to_rusqlite(params);

    // Cached so the loader's per-row INSERT is only prepared once.
    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| classify(e, "prepare statement"))?;
    let rows_affected = stmt
        .execute(params_from_iter(rusqlite_params.iter()))
        .map_err(|e| classify(e, "execute statement"))?;

    Ok(StatementResult {
        affected_rows: rows_affected as u64,
    })
}

fn query_on(
    conn: &RusqliteConnection,
    sql: &str,
    params: &[Value],
) -> Result<(Vec<ColumnMeta>, Vec<Row>)> {
    ensure_has_sql(sql)?;
    let rusqlite_params = values_to_rusqlite(params);

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| classify(e, "prepare query"))?;

    // decl_type comes from the CREATE TABLE; computed expressions have none
    let columns: Vec<ColumnMeta> = stmt
        .columns()
        .iter()
        .enumerate()
        .map(|(ordinal, col)| ColumnMeta {
            name: col.name().to_string(),
            data_type: col.decl_type().unwrap_or("DYNAMIC").to_string(),
            ordinal,
        })
        .collect();

    let mut rows = Vec::new();
    let mut query_rows = stmt
        .query(params_from_iter(rusqlite_params.iter()))
        .map_err(|e| classify(e, "execute query"))?;

    while let Some(row) = query_rows
        .next()
        .map_err(|e| classify(e, "fetch row"))?
    {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(rusqlite_to_value(row, i)?);
        }
        rows.push(Row::new(values));
    }

    Ok((columns, rows))
}

/// SQLite prepares text made only of whitespace and comments to no statement
/// at all and reports it with the OK status ("not an error").
fn ensure_has_sql(sql: &str) -> Result<()> {
    if has_sql_tokens(sql) {
        Ok(())
    } else {
        Err(CsvqlError::Query("statement contains no SQL".into()))
    }
}

/// Whether `sql` has anything besides whitespace, `--` line comments and
/// `/* */` block comments.
fn has_sql_tokens(sql: &str) -> bool {
    let mut rest = sql;
    loop {
        rest = rest.trim_start();
        if let Some(comment) = rest.strip_prefix("--") {
            match comment.find('\n') {
                Some(end) => rest = &comment[end + 1..],
                None => return false,
            }
        } else if let Some(comment) = rest.strip_prefix("/*") {
            // An unterminated block comment runs to the end of input
            match comment.find("*/") {
                Some(end) => rest = &comment[end + 2..],
                None => return false,
            }
        } else {
            return !rest.is_empty();
        }
    }
}

/// Map a rusqlite error onto the engine/driver split.
///
/// Only failures reported by SQLite itself count as engine errors; their
/// message is kept verbatim (e.g. `no such column: Foo`).
fn classify(err: rusqlite::Error, action: &str) -> CsvqlError {
    match err {
        rusqlite::Error::SqliteFailure(..) | rusqlite::Error::MultipleStatement => {
            CsvqlError::Query(err.to_string())
        }
        other => CsvqlError::Driver(format!("Failed to {}: {}", action, other)),
    }
}

/// Convert our Value types to rusqlite-compatible types
fn values_to_rusqlite(values: &[Value]) -> Vec<rusqlite::types::Value> {
    values.iter().map(value_to_rusqlite).collect()
}

fn value_to_rusqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Int64(i) => rusqlite::types::Value::Integer(*i),
        Value::Float64(f) => rusqlite::types::Value::Real(*f),
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| CsvqlError::Conversion(format!("column {}: {}", idx, e)))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => {
            let text = std::str::from_utf8(s).map_err(|e| {
                CsvqlError::Conversion(format!("column {} is not valid UTF-8: {}", idx, e))
            })?;
            Value::String(text.to_string())
        }
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    };

    Ok(value)
}

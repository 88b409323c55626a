//! Loading a CSV dataset into the store as a single table

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use csvql_core::{Connection, CsvqlError};

use crate::Dataset;

/// Errors while loading the dataset. All of them are fatal for a run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read dataset '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset has no header row")]
    MissingHeader,

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Line {line}: expected {expected} fields, found {found}")]
    RowLength {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Store error while loading table: {0}")]
    Store(#[from] CsvqlError),
}

/// What ended up in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: String,
    pub columns: usize,
    pub rows: usize,
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build the `CREATE TABLE` statement for a dataset's columns
pub fn generate_create_table_sql(table_name: &str, dataset: &Dataset) -> String {
    let column_defs: Vec<String> = dataset
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.column_type.sql_type()))
        .collect();

    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table_name),
        column_defs.join(", ")
    )
}

fn generate_insert_sql(table_name: &str, dataset: &Dataset) -> String {
    let columns: Vec<String> = dataset
        .column_names()
        .into_iter()
        .map(quote_identifier)
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table_name),
        columns.join(", "),
        placeholders
    )
}

/// Materializes a dataset as one named table, replacing any previous table
/// of that name.
pub struct TableLoader {
    connection: Arc<dyn Connection>,
    table_name: String,
}

impl TableLoader {
    pub fn new(connection: Arc<dyn Connection>, table_name: impl Into<String>) -> Self {
        Self {
            connection,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Read the CSV at `path` and load it
    pub async fn load_file(&self, path: &Path) -> Result<LoadSummary, LoadError> {
        let dataset = Dataset::from_path(path)?;
        self.load_dataset(&dataset).await
    }

    /// Drop and recreate the table, then insert every row in one transaction.
    #[tracing::instrument(skip_all, fields(table = %self.table_name))]
    pub async fn load_dataset(&self, dataset: &Dataset) -> Result<LoadSummary, LoadError> {
        let drop_sql = format!("DROP TABLE IF EXISTS {}", quote_identifier(&self.table_name));
        self.connection.execute(&drop_sql, &[]).await?;

        let create_sql = generate_create_table_sql(&self.table_name, dataset);
        tracing::debug!(sql = %create_sql, "creating table");
        self.connection.execute(&create_sql, &[]).await?;

        let insert_sql = generate_insert_sql(&self.table_name, dataset);
        let tx = self.connection.begin_transaction().await?;
        for index in 0..dataset.row_count() {
            let Some(values) = dataset.row(index) else {
                break;
            };
            let inserted = tx.execute(&insert_sql, &values).await;
            if let Err(e) = inserted {
                tracing::error!(error = %e, row = index + 1, "insert failed, rolling back load");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback after failed insert failed");
                }
                return Err(e.into());
            }
        }
        tx.commit().await?;

        let summary = LoadSummary {
            table: self.table_name.clone(),
            columns: dataset.column_count(),
            rows: dataset.row_count(),
        };
        tracing::info!(
            table = %summary.table,
            columns = summary.columns,
            rows = summary.rows,
            "dataset loaded"
        );
        Ok(summary)
    }
}

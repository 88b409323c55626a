//! csvql interchange - getting delimited data into the store
//!
//! - `Dataset` reads a CSV file into typed, equal-length columns
//! - `TableLoader` materializes a `Dataset` as a single table

mod csv_import;
mod dataset;

#[cfg(test)]
mod csv_import_tests;
#[cfg(test)]
mod dataset_tests;

pub use csv_import::{LoadError, LoadSummary, TableLoader, generate_create_table_sql, quote_identifier};
pub use dataset::{ColumnType, Dataset, DatasetColumn};

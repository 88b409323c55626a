//! Batch query execution over a loaded CSV dataset
//!
//! A run loads one dataset into an in-memory store, splits a SQL script into
//! statements and executes them in order. Each statement's outcome is
//! rendered as soon as it completes, and a failing statement never stops the
//! ones after it.

pub mod batch;
pub mod config;
pub mod presenter;
pub mod runner;

#[cfg(test)]
mod test_helpers;

pub use batch::{
    BatchExecutionResult, BatchResult, ExecutionOutcome, FailureKind, SplitMode,
    StatementFailure, execute_batch, execute_batch_with, execute_statement, split_statements,
    split_statements_quote_aware,
};
pub use config::{ConfigError, ConfigFile, RunConfig};
pub use presenter::{NO_RESULTS_SENTINEL, ReportFormat, ResultPresenter};
pub use runner::{BatchRunner, RunError, RunState, RunSummary};

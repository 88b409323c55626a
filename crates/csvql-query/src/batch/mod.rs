//! Batch query execution
//!
//! Splits a script into statements and runs them one at a time against the
//! store. Each statement's failure is contained in its own result; later
//! statements always run.

mod executor;
mod splitter;

pub use executor::{
    BatchExecutionResult, BatchResult, ExecutionOutcome, FailureKind, StatementFailure,
    execute_batch, execute_batch_with, execute_statement,
};
pub use splitter::{SplitMode, split_statements, split_statements_quote_aware};

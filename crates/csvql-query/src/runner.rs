//! Orchestration of a single batch run

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use csvql_core::{Connection, CsvqlError};
use csvql_driver_sqlite::SqliteConnection;
use csvql_interchange::{LoadError, LoadSummary, TableLoader};
use thiserror::Error;

use crate::batch::execute_batch_with;
use crate::config::RunConfig;
use crate::presenter::ResultPresenter;


/// Fatal errors of a run. Statement failures are never reported here.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Cannot read script '{}': {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] CsvqlError),

    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

/// Where a runner is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Dataset loaded and script read
    Loaded,
    Running,
    /// Every statement processed and the store closed
    Done,
    /// A fatal error ended the run
    Failed,
}

/// Counts reported once a run is done
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub statements: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub load: LoadSummary,
}

/// Loads the dataset, runs every statement of the script in order and writes
/// one report block per statement.
pub struct BatchRunner {
    config: RunConfig,
    presenter: ResultPresenter,
    state: RunState,
}

impl BatchRunner {
    pub fn new(config: RunConfig) -> Self {
        let presenter = ResultPresenter::new(config.format);
        Self {
            config,
            presenter,
            state: RunState::Idle,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run against a fresh in-memory store.
    pub async fn run<W: Write>(&mut self, out: &mut W) -> Result<RunSummary, RunError> {
        let store: Arc<dyn Connection> = match SqliteConnection::open_in_memory() {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                self.state = RunState::Failed;
                return Err(e.into());
            }
        };
        self.run_on(store, out).await
    }

    /// Run against the given store, which is closed exactly once before this
    /// returns, whatever the outcome.
    #[tracing::instrument(skip_all, fields(
        dataset = %self.config.dataset_path.display(),
        script = %self.config.script_path.display(),
    ))]
    pub async fn run_on<W: Write>(
        &mut self,
        store: Arc<dyn Connection>,
        out: &mut W,
    ) -> Result<RunSummary, RunError> {
        let outcome = self.drive(&store, out).await;

        if let Err(e) = store.close().await {
            tracing::warn!(error = %e, "failed to close store");
        }

        match outcome {
            Ok(summary) => {
                self.state = RunState::Done;
                tracing::info!(
                    statements = summary.statements,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "run complete"
                );
                Ok(summary)
            }
            Err(e) => {
                self.state = RunState::Failed;
                // The caller reports the error itself
                tracing::debug!(error = %e, "run failed");
                Err(e)
            }
        }
    }

    async fn drive<W: Write>(
        &mut self,
        store: &Arc<dyn Connection>,
        out: &mut W,
    ) -> Result<RunSummary, RunError> {
        let loader = TableLoader::new(Arc::clone(store), self.config.table_name.clone());
        let load = loader.load_file(&self.config.dataset_path).await?;
        store.set_query_only(true).await?;

        let script = std::fs::read_to_string(&self.config.script_path).map_err(|source| {
            RunError::Script {
                path: self.config.script_path.clone(),
                source,
            }
        })?;
        self.state = RunState::Loaded;

        let statements = self.config.split_mode.split(&script);
        tracing::debug!(
            statements = statements.len(),
            split_mode = %self.config.split_mode,
            "script split"
        );
        self.state = RunState::Running;

        let presenter = self.presenter;
        let batch = execute_batch_with(store.as_ref(), statements, |result| {
            out.write_all(presenter.render(result).as_bytes())?;
            out.flush()
        })
        .await?;

        Ok(RunSummary {
            statements: batch.statement_count(),
            succeeded: batch.success_count,
            failed: batch.failure_count,
            load,
        })
    }
}

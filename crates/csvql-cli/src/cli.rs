//! csvql loads a CSV dataset into an in-memory table and runs every statement
//! of a SQL script against it, printing one report block per statement.
//!
//! Exit codes: 0 once every statement has been processed (even if some
//! failed), 1 when the run cannot start or its output cannot be written, 2 on
//! invalid configuration.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as _;
use csvql_query::{BatchRunner, ConfigError, ConfigFile, ReportFormat, RunConfig, SplitMode};

const EXIT_RUN_FAILED: u8 = 1;
const EXIT_BAD_CONFIG: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = logging::init(&cli.logging_config()) {
        eprintln!("Warning: {error:#}");
    }

    let config = match cli.run_config() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {error}");
            return ExitCode::from(EXIT_BAD_CONFIG);
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::from(EXIT_RUN_FAILED)
        }
    }
}

async fn run(config: RunConfig) -> anyhow::Result<()> {
    tracing::debug!(?config, "starting run");
    let mut runner = BatchRunner::new(config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    runner.run(&mut out).await?;
    Ok(())
}

/// The csvql command.
#[derive(clap::Parser, Debug)]
#[command(
    name = "csvql",
    about = "Run a SQL script against a CSV dataset loaded into an in-memory table.",
    version
)]
struct Cli {
    /// Directory holding the processed dataset.
    #[arg(long, env = "CSVQL_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Directory holding the SQL script.
    #[arg(long, env = "CSVQL_SQL_DIR")]
    sql_dir: Option<PathBuf>,
    /// Dataset file, overriding --data-dir.
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Script file, overriding --sql-dir.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Name of the table the dataset is loaded into.
    #[arg(long)]
    table: Option<String>,
    /// How the script is split into statements: naive or quote-aware.
    #[arg(long)]
    split_mode: Option<SplitMode>,
    /// Report format: text or json.
    #[arg(long)]
    format: Option<ReportFormat>,
    /// TOML file with defaults for any of the above.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log debug diagnostics to stderr.
    #[arg(short, long)]
    verbose: bool,
    /// Log diagnostics as JSON.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn logging_config(&self) -> logging::LoggingConfig {
        logging::LoggingConfig::new(self.verbose, self.log_json)
    }

    /// Flags and environment, which clap has already merged.
    fn layer(&self) -> ConfigFile {
        ConfigFile {
            data_dir: self.data_dir.clone(),
            sql_dir: self.sql_dir.clone(),
            dataset: self.dataset.clone(),
            script: self.script.clone(),
            table: self.table.clone(),
            split_mode: self.split_mode,
            format: self.format,
        }
    }

    fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let file = match &self.config {
            Some(path) => ConfigFile::from_file(path)?,
            None => ConfigFile::default(),
        };
        file.merge(self.layer()).into_run_config()
    }
}

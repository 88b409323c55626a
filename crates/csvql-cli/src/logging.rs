//! Diagnostics for the csvql binary
//!
//! Everything goes to stderr so the report on stdout stays clean. `RUST_LOG`
//! takes precedence over the built-in filter.

use std::io::IsTerminal;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "warn,csvql_cli=info,csvql_query=info,csvql_interchange=info";
const VERBOSE_FILTER: &str =
    "info,csvql_cli=debug,csvql_query=debug,csvql_interchange=debug,csvql_driver_sqlite=debug";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Emit JSON events instead of human-readable lines
    pub json: bool,
    pub default_filter: String,
}

impl LoggingConfig {
    pub fn new(verbose: bool, json: bool) -> Self {
        let default_filter = if verbose {
            VERBOSE_FILTER
        } else {
            DEFAULT_FILTER
        };
        Self {
            json,
            default_filter: default_filter.to_string(),
        }
    }
}

pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let layer = if config.json {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(std::io::stderr().is_terminal())
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::debug!(json = config.json, "logging initialized");
    Ok(())
}

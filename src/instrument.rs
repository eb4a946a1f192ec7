//! Query instrumentation and tracing setup
//!
//! Every executor call is wrapped in [`timed`], which measures wall-clock
//! elapsed time and emits exactly one structured log event with the
//! outcome. It never retries and never swallows errors.

use std::future::Future;
use std::time::Instant;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::types::{ExecuteOutcome, JsonRow, MysqlMcpError};

/// Outcomes that can report a row count to the query log
pub trait RowsReported {
    fn rows_reported(&self) -> Option<u64>;
}

impl RowsReported for Vec<JsonRow> {
    fn rows_reported(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

impl RowsReported for ExecuteOutcome {
    fn rows_reported(&self) -> Option<u64> {
        self.affected_rows
    }
}

/// Run an executor future, timing it and logging the outcome
///
/// Emits one event per call regardless of outcome, with sub-millisecond
/// duration resolution, then returns the result unchanged.
pub async fn timed<T, F>(
    operation: &str,
    sql: &str,
    params: &[String],
    fut: F,
) -> Result<T, MysqlMcpError>
where
    T: RowsReported,
    F: Future<Output = Result<T, MysqlMcpError>>,
{
    let start = Instant::now();
    let result = fut.await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    match &result {
        Ok(outcome) => {
            tracing::info!(
                operation,
                sql,
                params = ?params,
                duration_ms,
                success = true,
                rows = outcome.rows_reported(),
                "statement completed"
            );
        }
        Err(err) => {
            tracing::error!(
                operation,
                sql,
                params = ?params,
                duration_ms,
                success = false,
                error = %err,
                "statement failed"
            );
        }
    }

    result
}

/// Initialize tracing to stderr (stdout carries the MCP transport)
///
/// Filtering via `RUST_LOG`, defaulting the crate to `info`. Set
/// `LOG_FORMAT=json` for structured JSON output.
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}

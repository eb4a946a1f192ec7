//! MySQL MCP Server
//!
//! Exposes a MySQL database to LLM clients through four typed tools:
//! read-only queries in a rolled-back snapshot transaction, committed
//! data-modification statements, table listing, and table structure.
//! Per-table schemas are also published as MCP resources.
//!
//! Incoming statements pass a best-effort regex denylist (stacked
//! statements, EXEC, INTO OUTFILE) and a length limit before touching
//! the bounded connection pool. The denylist is a heuristic, not a
//! parser: run this server with least-privilege database credentials.
//!
//! Configuration is environment-based (`MYSQL_HOST`, `MYSQL_PORT`,
//! `MYSQL_USER`, `MYSQL_PASSWORD`, `MYSQL_DATABASE`).

pub mod catalog;
pub mod config;
pub mod envelope;
pub mod executor;
pub mod guard;
pub mod instrument;
pub mod params;
pub mod server;
pub mod types;

// Re-export main server type
pub use config::Config;
pub use instrument::init_tracing;
pub use server::MysqlMcpServer;

// Re-export parameter types for direct API usage
pub use params::{DescribeTableParams, ExecuteParams, QueryParams};

//! MySQL MCP Server entrypoint
//!
//! Serves over stdio. Logging goes to stderr; stdout carries the MCP
//! transport. Exits 0 after a clean shutdown with the pool closed, 1 on
//! startup failure.

use rmcp::ServiceExt;

use mysql_mcp::{Config, MysqlMcpServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mysql_mcp::init_tracing("mysql_mcp")?;

    tracing::info!("Starting mysql-mcp MCP Server");

    let config = Config::from_env();
    let server = MysqlMcpServer::new(config)?;
    let pool = server.pool();

    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!("Server running, waiting for requests...");

    service.waiting().await?;

    tracing::info!("Server shutting down, closing pool");
    pool.close().await;

    Ok(())
}

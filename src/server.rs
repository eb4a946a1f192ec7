//! MCP server implementation for MySQL access
//!
//! Exposes the four tools plus per-table schema resources. Tool methods
//! stay thin: routing, argument validation and response shaping live
//! here, execution lives in the executor and catalog modules.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, CallToolResult, ListResourcesResult, PaginatedRequestParam, RawResource,
        ReadResourceRequestParam, ReadResourceResult, ResourceContents, ServerCapabilities,
        ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer,
};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::catalog;
use crate::config::{Config, ConnectionConfig};
use crate::envelope::{execute_content, json_content, to_mcp_error};
use crate::executor;
use crate::guard::SqlGuard;
use crate::params::{DescribeTableParams, ExecuteParams, QueryParams};
use crate::types::{ExecuteOutcome, MysqlMcpError, OperationKind};

/// Build the bounded connection pool
///
/// Connects lazily: the first acquisition performs the handshake, so the
/// server can start before the database is reachable.
pub fn build_pool(connection: &ConnectionConfig) -> MySqlPool {
    let mut options = MySqlConnectOptions::new()
        .host(&connection.host)
        .port(connection.port)
        .username(&connection.user)
        .password(&connection.password);
    if !connection.database.is_empty() {
        options = options.database(&connection.database);
    }

    MySqlPoolOptions::new()
        .max_connections(connection.pool_size)
        .connect_lazy_with(options)
}

/// The MySQL MCP Server
#[derive(Clone)]
pub struct MysqlMcpServer {
    pool: MySqlPool,
    guard: SqlGuard,
    config: Config,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MysqlMcpServer {
    pub fn new(config: Config) -> Result<Self, MysqlMcpError> {
        let guard = SqlGuard::new(&config.limits)?;
        let pool = build_pool(&config.connection);

        tracing::info!(
            host = %config.connection.host,
            port = config.connection.port,
            database = %config.connection.database,
            pool_size = config.connection.pool_size,
            max_query_length = config.limits.max_query_length,
            // Declared but not enforced; logged so operators see them.
            max_rows = config.limits.max_rows,
            query_timeout_ms = config.limits.query_timeout_ms,
            "MySQL MCP server configured"
        );

        Ok(Self {
            pool,
            guard,
            config,
            tool_router: Self::tool_router(),
        })
    }

    /// The pool handle, for closing it at shutdown
    pub fn pool(&self) -> MySqlPool {
        self.pool.clone()
    }

    #[tool(
        description = "Run a read-only SQL query. Executes inside a read-only snapshot transaction that is always rolled back, so it can never change data. Returns the result rows as a JSON array of objects."
    )]
    async fn mysql_query(
        &self,
        Parameters(params): Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        let rows = executor::run_snapshot_read(&self.pool, &self.guard, &params.sql)
            .await
            .map_err(to_mcp_error)?;
        json_content(&rows)
    }

    #[tool(
        description = "Run a data-modification statement (INSERT, UPDATE, DELETE, DDL) inside a committed transaction with rollback on failure. Returns {success, affectedRows, insertId, message}. SELECT statements are rejected; use mysql_query for reads."
    )]
    async fn mysql_execute(
        &self,
        Parameters(params): Parameters<ExecuteParams>,
    ) -> Result<CallToolResult, McpError> {
        // Usage guidance, not security: reads belong on the snapshot path.
        if OperationKind::classify(&params.sql) == OperationKind::Select {
            return execute_content(&ExecuteOutcome::failed(
                "SELECT statements are not allowed here. Use mysql_query for read operations.",
            ));
        }

        let bind = params.params.unwrap_or_default();
        let outcome = executor::run_modify(&self.pool, &self.guard, &params.sql, &bind).await;
        execute_content(&outcome)
    }

    #[tool(description = "List all tables in the currently connected database.")]
    async fn list_tables(&self) -> Result<CallToolResult, McpError> {
        let tables = catalog::list_tables(&self.pool, &self.guard)
            .await
            .map_err(to_mcp_error)?;
        json_content(&tables)
    }

    #[tool(
        description = "Describe the structure of a table: column names and declared data types, in column order."
    )]
    async fn describe_table(
        &self,
        Parameters(params): Parameters<DescribeTableParams>,
    ) -> Result<CallToolResult, McpError> {
        let columns = catalog::describe_table(&self.pool, &self.guard, &params.table)
            .await
            .map_err(to_mcp_error)?;
        json_content(&columns)
    }
}

#[tool_handler]
impl rmcp::ServerHandler for MysqlMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "MySQL database MCP server. Use mysql_query for read-only queries \
                 (run in a rolled-back snapshot transaction), mysql_execute for \
                 INSERT/UPDATE/DELETE (run in a committed transaction), list_tables \
                 to enumerate tables, and describe_table for column structure. \
                 Statements are screened by a best-effort denylist; it is not a \
                 substitute for least-privilege database credentials."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let tables = catalog::list_tables(&self.pool, &self.guard)
            .await
            .map_err(to_mcp_error)?;

        let resources = tables
            .iter()
            .filter_map(|row| row.get("table_name").and_then(|v| v.as_str()))
            .map(|table| {
                let uri = catalog::schema_resource_uri(
                    &self.config.connection.host,
                    self.config.connection.port,
                    table,
                );
                let mut resource = RawResource::new(uri, format!("{} schema", table));
                resource.description = Some(format!("Column structure of the {} table", table));
                resource.mime_type = Some("application/json".into());
                resource.no_annotation()
            })
            .collect();

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let table = catalog::table_from_schema_uri(&uri).map_err(to_mcp_error)?;
        let columns = catalog::describe_table(&self.pool, &self.guard, table)
            .await
            .map_err(to_mcp_error)?;

        let json = serde_json::to_string_pretty(&columns)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(json, uri)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::ServerHandler;

    fn server() -> MysqlMcpServer {
        // Lazy pool: nothing here reaches the database.
        MysqlMcpServer::new(Config::default()).unwrap()
    }

    fn first_text(result: &CallToolResult) -> &str {
        result.content[0].as_text().unwrap().text.as_str()
    }

    #[tokio::test]
    async fn test_execute_rejects_select_before_database() {
        let result = server()
            .mysql_execute(Parameters(ExecuteParams {
                sql: "SELECT * FROM t".into(),
                params: None,
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(first_text(&result).contains("mysql_query"));
    }

    #[tokio::test]
    async fn test_execute_rejects_lowercase_select() {
        let result = server()
            .mysql_execute(Parameters(ExecuteParams {
                sql: "  select 1".into(),
                params: None,
            }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
    }

    #[tokio::test]
    async fn test_query_guard_rejection_is_protocol_error() {
        let err = server()
            .mysql_query(Parameters(QueryParams {
                sql: "SELECT 1; DROP TABLE t".into(),
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("Security violation"));
    }

    #[tokio::test]
    async fn test_describe_table_empty_name_is_invalid_params() {
        let err = server()
            .describe_table(Parameters(DescribeTableParams { table: "".into() }))
            .await
            .unwrap_err();
        assert_eq!(err.code, McpError::invalid_params("", None).code);
    }

    #[tokio::test]
    async fn test_info_advertises_tools_and_resources() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.instructions.unwrap().contains("mysql_query"));
    }
}

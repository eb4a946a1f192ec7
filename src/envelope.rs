//! Response shaping for MCP tool calls
//!
//! Tool results travel as JSON text content blocks. The read and catalog
//! paths surface failures as protocol errors; the modify path instead
//! returns its structured `{success: false, message}` payload in an
//! `isError` content block. That asymmetry is load-bearing: clients
//! treat modify failures as data, not transport faults.

use rmcp::{
    model::{CallToolResult, Content},
    ErrorData as McpError,
};
use serde::Serialize;

use crate::types::{ExecuteOutcome, MysqlMcpError};

/// Wrap serializable data in a successful JSON content block
pub fn json_content<T: Serialize>(data: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Wrap a modify outcome, setting the envelope's error flag on failure
pub fn execute_content(outcome: &ExecuteOutcome) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(outcome)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    let contents = vec![Content::text(json)];
    if outcome.success {
        Ok(CallToolResult::success(contents))
    } else {
        Ok(CallToolResult::error(contents))
    }
}

/// Map the library error taxonomy onto MCP protocol error codes
pub fn to_mcp_error(err: MysqlMcpError) -> McpError {
    match &err {
        MysqlMcpError::Validation(_) => McpError::invalid_params(err.to_string(), None),
        MysqlMcpError::Protocol(_) => McpError::invalid_request(err.to_string(), None),
        MysqlMcpError::Connection(_)
        | MysqlMcpError::Security(_)
        | MysqlMcpError::Limit(_)
        | MysqlMcpError::Database(_)
        | MysqlMcpError::Config(_) => McpError::internal_error(err.to_string(), None),
    }
}

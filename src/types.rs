//! Type definitions for the MySQL MCP server

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A decoded result row: column name to JSON value, in column order
pub type JsonRow = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum MysqlMcpError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Security violation: {0}")]
    Security(String),

    #[error("Query length limit exceeded: {0}")]
    Limit(String),

    #[error("Invalid arguments: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MysqlMcpError {
    /// Wrap a pool-acquisition failure
    pub fn connection(err: sqlx::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

// ============================================================================
// Execution Outcomes
// ============================================================================

/// Result of a data-modification statement
///
/// Serialized as the `mysql_execute` response payload. Failures are a
/// value of this type with `success: false`, never a protocol error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExecuteOutcome {
    pub fn committed(affected_rows: u64, insert_id: u64) -> Self {
        Self {
            success: true,
            affected_rows: Some(affected_rows),
            insert_id: Some(insert_id),
            message: Some(format!("{} row(s) affected", affected_rows)),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            affected_rows: None,
            insert_id: None,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Operation Kind
// ============================================================================

/// Statement kind derived from the leading keyword
///
/// Used only as a logging/metrics label and for the dispatcher-level
/// check that routes SELECT statements away from `mysql_execute`. It is
/// not a security mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl OperationKind {
    /// Classify a statement by its first token
    pub fn classify(sql: &str) -> Self {
        let first = sql.split_whitespace().next().unwrap_or("");
        if first.eq_ignore_ascii_case("SELECT") {
            Self::Select
        } else if first.eq_ignore_ascii_case("INSERT") {
            Self::Insert
        } else if first.eq_ignore_ascii_case("UPDATE") {
            Self::Update
        } else if first.eq_ignore_ascii_case("DELETE") {
            Self::Delete
        } else {
            Self::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_leading_keyword() {
        assert_eq!(OperationKind::classify("SELECT * FROM t"), OperationKind::Select);
        assert_eq!(OperationKind::classify("insert into t values (1)"), OperationKind::Insert);
        assert_eq!(OperationKind::classify("Update t SET a = 1"), OperationKind::Update);
        assert_eq!(OperationKind::classify("DELETE FROM t"), OperationKind::Delete);
        assert_eq!(OperationKind::classify("TRUNCATE TABLE t"), OperationKind::Other);
    }

    #[test]
    fn test_classify_leading_whitespace() {
        assert_eq!(OperationKind::classify("  \n\tSELECT 1"), OperationKind::Select);
    }

    #[test]
    fn test_classify_empty() {
        assert_eq!(OperationKind::classify(""), OperationKind::Other);
    }

    #[test]
    fn test_committed_outcome_shape() {
        let outcome = ExecuteOutcome::committed(3, 42);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["affectedRows"], 3);
        assert_eq!(json["insertId"], 42);
    }

    #[test]
    fn test_failed_outcome_omits_counts() {
        let outcome = ExecuteOutcome::failed("duplicate key");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "duplicate key");
        assert!(json.get("affectedRows").is_none());
        assert!(json.get("insertId").is_none());
    }
}

//! Catalog queries and schema resources
//!
//! Every catalog query filters on `TABLE_SCHEMA = DATABASE()`. Scoping to
//! the active database is a hard invariant: a server instance shared by
//! multiple databases must never leak another schema's tables or columns.

use sqlx::mysql::MySqlPool;

use crate::executor::run_query;
use crate::guard::SqlGuard;
use crate::types::{JsonRow, MysqlMcpError};

pub const LIST_TABLES_SQL: &str = "SELECT TABLE_NAME AS table_name \
     FROM information_schema.tables \
     WHERE TABLE_SCHEMA = DATABASE() \
     ORDER BY TABLE_NAME";

pub const DESCRIBE_TABLE_SQL: &str = "SELECT COLUMN_NAME AS column_name, DATA_TYPE AS data_type \
     FROM information_schema.columns \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

/// List the tables of the currently connected database
pub async fn list_tables(pool: &MySqlPool, guard: &SqlGuard) -> Result<Vec<JsonRow>, MysqlMcpError> {
    run_query(pool, guard, LIST_TABLES_SQL, &[]).await
}

/// Describe the columns of one table in the currently connected database
pub async fn describe_table(
    pool: &MySqlPool,
    guard: &SqlGuard,
    table: &str,
) -> Result<Vec<JsonRow>, MysqlMcpError> {
    if table.trim().is_empty() {
        return Err(MysqlMcpError::Validation("table name is required".into()));
    }
    let columns = run_query(pool, guard, DESCRIBE_TABLE_SQL, &[table.to_string()]).await?;
    require_columns(table, columns)
}

/// An empty column set means the table does not exist in the current
/// database; surface that instead of an empty success.
fn require_columns(table: &str, columns: Vec<JsonRow>) -> Result<Vec<JsonRow>, MysqlMcpError> {
    if columns.is_empty() {
        return Err(MysqlMcpError::Validation(format!(
            "Table '{}' not found",
            table
        )));
    }
    Ok(columns)
}

// ============================================================================
// Schema Resource URIs
// ============================================================================

/// Build the schema resource URI for a table
pub fn schema_resource_uri(host: &str, port: u16, table: &str) -> String {
    format!("mysql://{}:{}/{}/schema", host, port, table)
}

/// Extract the table name from a schema resource URI
///
/// The final two path segments must be `<table>/schema`; anything else is
/// a protocol error.
pub fn table_from_schema_uri(uri: &str) -> Result<&str, MysqlMcpError> {
    let rest = uri
        .strip_prefix("mysql://")
        .ok_or_else(|| MysqlMcpError::Protocol(format!("Invalid resource URI: {}", uri)))?;

    // authority / ... / table / schema
    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        [_authority, .., table, "schema"] if !table.is_empty() => Ok(table),
        _ => Err(MysqlMcpError::Protocol(format!(
            "Invalid resource URI: {}",
            uri
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_queries_scoped_to_current_database() {
        // Cross-schema leakage guard: the scoping predicate must be present
        // in every catalog query.
        assert!(LIST_TABLES_SQL.contains("TABLE_SCHEMA = DATABASE()"));
        assert!(DESCRIBE_TABLE_SQL.contains("TABLE_SCHEMA = DATABASE()"));
    }

    #[test]
    fn test_describe_table_is_parameterized() {
        assert!(DESCRIBE_TABLE_SQL.contains("TABLE_NAME = ?"));
    }

    #[test]
    fn test_schema_uri_round_trip() {
        let uri = schema_resource_uri("127.0.0.1", 3306, "users");
        assert_eq!(uri, "mysql://127.0.0.1:3306/users/schema");
        assert_eq!(table_from_schema_uri(&uri).unwrap(), "users");
    }

    #[test]
    fn test_uri_missing_schema_suffix_rejected() {
        let err = table_from_schema_uri("mysql://127.0.0.1:3306/users").unwrap_err();
        assert!(matches!(err, MysqlMcpError::Protocol(_)));
    }

    #[test]
    fn test_uri_wrong_suffix_rejected() {
        let err = table_from_schema_uri("mysql://127.0.0.1:3306/users/data").unwrap_err();
        assert!(matches!(err, MysqlMcpError::Protocol(_)));
    }

    #[test]
    fn test_uri_too_few_segments_rejected() {
        let err = table_from_schema_uri("mysql://127.0.0.1:3306/schema").unwrap_err();
        assert!(matches!(err, MysqlMcpError::Protocol(_)));
    }

    #[test]
    fn test_uri_wrong_scheme_rejected() {
        let err = table_from_schema_uri("postgres://h:1/users/schema").unwrap_err();
        assert!(matches!(err, MysqlMcpError::Protocol(_)));
    }

    #[test]
    fn test_unknown_table_surfaces_not_found() {
        let err = require_columns("ghosts", vec![]).unwrap_err();
        match err {
            MysqlMcpError::Validation(message) => assert!(message.contains("ghosts")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_known_table_columns_pass_through() {
        let mut row = JsonRow::new();
        row.insert("column_name".into(), "id".into());
        row.insert("data_type".into(), "int".into());
        let columns = require_columns("users", vec![row]).unwrap();
        assert_eq!(columns.len(), 1);
    }

    #[tokio::test]
    async fn test_describe_table_empty_name_is_validation_error() {
        let pool = crate::server::build_pool(&crate::config::ConnectionConfig::default());
        let guard = SqlGuard::new(&crate::config::Limits::default()).unwrap();
        let err = describe_table(&pool, &guard, "  ").await.unwrap_err();
        assert!(matches!(err, MysqlMcpError::Validation(_)));
    }
}

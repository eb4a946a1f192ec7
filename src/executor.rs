//! Statement executors over the connection pool
//!
//! Three execution paths share the pool: a generic parameterized query,
//! a read-only snapshot read (transaction always rolled back), and a
//! committed modify transaction. Connections are pool-scoped: dropping
//! the `PoolConnection` or `Transaction` returns the connection on every
//! exit path, so no branch can leak one.

use sqlx::mysql::{MySql, MySqlPool, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::guard::SqlGuard;
use crate::instrument::timed;
use crate::types::{ExecuteOutcome, JsonRow, MysqlMcpError, OperationKind};

const SET_SESSION_READ_ONLY: &str = "SET SESSION TRANSACTION READ ONLY";
const SET_SESSION_READ_WRITE: &str = "SET SESSION TRANSACTION READ WRITE";
const BEGIN_TRANSACTION: &str = "START TRANSACTION";
const ROLLBACK: &str = "ROLLBACK";

// ============================================================================
// Generic Query Executor
// ============================================================================

/// Execute a single parameterized statement and collect its rows
///
/// Order of checks: acquire, denylist, length. Failures map to
/// `Connection`, `Security` and `Limit` respectively; driver failures
/// surface as `Database`.
pub async fn run_query(
    pool: &MySqlPool,
    guard: &SqlGuard,
    sql: &str,
    params: &[String],
) -> Result<Vec<JsonRow>, MysqlMcpError> {
    timed("query", sql, params, async {
        let mut conn = pool.acquire().await.map_err(MysqlMcpError::connection)?;

        let verdict = guard.check_patterns(sql);
        if !verdict.safe {
            return Err(MysqlMcpError::Security(
                verdict.reason.unwrap_or_else(|| "statement denied".into()),
            ));
        }
        if guard.exceeds_length(sql) {
            return Err(MysqlMcpError::Limit(format!(
                "statement longer than {} characters",
                guard.max_query_length()
            )));
        }

        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&mut *conn).await?;
        rows_to_json(&rows)
    })
    .await
}

// ============================================================================
// Snapshot Read Executor
// ============================================================================

/// Run a statement inside a read-only transaction that is always rolled
/// back, yielding a consistent view without ever committing.
///
/// The guard runs before any connection is touched. The session is
/// restored to read-write on both the success and failure paths.
pub async fn run_snapshot_read(
    pool: &MySqlPool,
    guard: &SqlGuard,
    sql: &str,
) -> Result<Vec<JsonRow>, MysqlMcpError> {
    timed("read_only_query", sql, &[], async {
        let verdict = guard.check_patterns(sql);
        if !verdict.safe {
            return Err(MysqlMcpError::Security(
                verdict.reason.unwrap_or_else(|| "statement denied".into()),
            ));
        }
        if guard.exceeds_length(sql) {
            return Err(MysqlMcpError::Limit(format!(
                "statement longer than {} characters",
                guard.max_query_length()
            )));
        }

        let mut conn = pool.acquire().await.map_err(MysqlMcpError::connection)?;

        let result = snapshot_read(&mut conn, sql).await;

        for &statement in snapshot_cleanup(result.is_err()) {
            if let Err(e) = sqlx::query(statement).execute(&mut *conn).await {
                tracing::warn!(statement, error = %e, "snapshot cleanup statement failed");
            }
        }

        result
    })
    .await
}

/// Statements issued after a snapshot read, in order
///
/// The read-write session restore runs on both the success and failure
/// paths. The extra rollback on failure covers a transaction left open
/// by a mid-flight error; on success the read already rolled back.
fn snapshot_cleanup(failed: bool) -> &'static [&'static str] {
    if failed {
        &[ROLLBACK, SET_SESSION_READ_WRITE]
    } else {
        &[SET_SESSION_READ_WRITE]
    }
}

async fn snapshot_read(
    conn: &mut PoolConnection<MySql>,
    sql: &str,
) -> Result<Vec<JsonRow>, MysqlMcpError> {
    sqlx::query(SET_SESSION_READ_ONLY).execute(&mut **conn).await?;
    sqlx::query(BEGIN_TRANSACTION).execute(&mut **conn).await?;
    let rows = sqlx::query(sql).fetch_all(&mut **conn).await?;
    let decoded = rows_to_json(&rows)?;
    sqlx::query(ROLLBACK).execute(&mut **conn).await?;
    Ok(decoded)
}

// ============================================================================
// Modify Executor
// ============================================================================

/// Run a data-modification statement inside a committed transaction
///
/// Never returns an error: guard rejections and driver failures become a
/// `{success: false, message}` outcome after being logged. The statement
/// either fully commits or fully rolls back.
pub async fn run_modify(
    pool: &MySqlPool,
    guard: &SqlGuard,
    sql: &str,
    params: &[String],
) -> ExecuteOutcome {
    let kind = OperationKind::classify(sql);
    match timed(kind.label(), sql, params, modify(pool, guard, sql, params)).await {
        Ok(outcome) => outcome,
        Err(err) => ExecuteOutcome::failed(err.to_string()),
    }
}

async fn modify(
    pool: &MySqlPool,
    guard: &SqlGuard,
    sql: &str,
    params: &[String],
) -> Result<ExecuteOutcome, MysqlMcpError> {
    let verdict = guard.check(sql);
    if !verdict.safe {
        return Err(MysqlMcpError::Security(
            verdict.reason.unwrap_or_else(|| "statement denied".into()),
        ));
    }

    let mut tx = pool.begin().await.map_err(MysqlMcpError::connection)?;

    let mut query = sqlx::query(sql);
    for param in params {
        query = query.bind(param);
    }
    // Dropping the transaction on the `?` path rolls it back.
    let result = query.execute(&mut *tx).await?;
    tx.commit().await?;

    Ok(ExecuteOutcome::committed(
        result.rows_affected(),
        result.last_insert_id(),
    ))
}

// ============================================================================
// Row Decoding
// ============================================================================

/// Decode driver rows into ordered column-name → JSON maps
pub fn rows_to_json(rows: &[MySqlRow]) -> Result<Vec<JsonRow>, MysqlMcpError> {
    rows.iter().map(row_to_json).collect()
}

fn row_to_json(row: &MySqlRow) -> Result<JsonRow, MysqlMcpError> {
    let mut map = JsonRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), decode_value(row, idx)?);
    }
    Ok(map)
}

fn decode_value(row: &MySqlRow, idx: usize) -> Result<serde_json::Value, MysqlMcpError> {
    use serde_json::{json, Value};

    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = row.columns()[idx].type_info().name();
    let value = match type_name {
        "BOOLEAN" => json!(row.try_get::<bool, _>(idx)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            json!(row.try_get::<i64, _>(idx)?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "BIT" => json!(row.try_get::<u64, _>(idx)?),
        "FLOAT" => json!(row.try_get::<f32, _>(idx)? as f64),
        "DOUBLE" => json!(row.try_get::<f64, _>(idx)?),
        "DECIMAL" => Value::String(row.try_get::<bigdecimal::BigDecimal, _>(idx)?.to_string()),
        "DATE" => Value::String(row.try_get::<chrono::NaiveDate, _>(idx)?.to_string()),
        "TIME" => Value::String(row.try_get::<chrono::NaiveTime, _>(idx)?.to_string()),
        "DATETIME" => Value::String(row.try_get::<chrono::NaiveDateTime, _>(idx)?.to_string()),
        "TIMESTAMP" => Value::String(
            row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx)?
                .to_rfc3339(),
        ),
        "JSON" => row.try_get::<serde_json::Value, _>(idx)?,
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            Value::String(row.try_get::<String, _>(idx)?)
        }
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            let bytes: Vec<u8> = row.try_get(idx)?;
            Value::String(format!("<binary {} bytes>", bytes.len()))
        }
        _ => {
            // YEAR and anything else the arms above miss: try text, then
            // summarize as bytes.
            if let Ok(s) = row.try_get::<String, _>(idx) {
                Value::String(s)
            } else if let Ok(n) = row.try_get::<i64, _>(idx) {
                json!(n)
            } else {
                let bytes: Vec<u8> = row.try_get(idx)?;
                Value::String(format!("<binary {} bytes>", bytes.len()))
            }
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, Limits};
    use crate::server::build_pool;

    fn guard() -> SqlGuard {
        SqlGuard::new(&Limits::default()).unwrap()
    }

    // A lazy pool performs no I/O until a connection is acquired, so
    // rejection paths can be exercised without a running server.
    fn unreachable_pool() -> MySqlPool {
        build_pool(&ConnectionConfig {
            host: "127.0.0.1".into(),
            port: 1,
            user: "nobody".into(),
            password: String::new(),
            database: String::new(),
            pool_size: 1,
        })
    }

    #[test]
    fn test_session_restored_on_success_path() {
        assert_eq!(
            snapshot_cleanup(false),
            ["SET SESSION TRANSACTION READ WRITE"]
        );
    }

    #[test]
    fn test_session_restored_after_rollback_on_failure_path() {
        assert_eq!(
            snapshot_cleanup(true),
            ["ROLLBACK", "SET SESSION TRANSACTION READ WRITE"]
        );
    }

    #[tokio::test]
    async fn test_snapshot_read_rejects_denied_before_pool() {
        let result =
            run_snapshot_read(&unreachable_pool(), &guard(), "SELECT 1; DROP TABLE t").await;
        assert!(matches!(result, Err(MysqlMcpError::Security(_))));
    }

    #[tokio::test]
    async fn test_snapshot_read_rejects_over_length_before_pool() {
        let long = format!("SELECT '{}'", "x".repeat(5000));
        let result = run_snapshot_read(&unreachable_pool(), &guard(), &long).await;
        assert!(matches!(result, Err(MysqlMcpError::Limit(_))));
    }

    #[tokio::test]
    async fn test_modify_guard_rejection_is_structured() {
        let outcome = run_modify(
            &unreachable_pool(),
            &guard(),
            "UPDATE t SET a = 1; DELETE FROM t",
            &[],
        )
        .await;
        assert!(!outcome.success);
        assert!(outcome.message.unwrap().contains("denied pattern"));
        assert!(outcome.affected_rows.is_none());
    }

    #[test]
    fn test_rows_to_json_empty() {
        assert!(rows_to_json(&[]).unwrap().is_empty());
    }
}

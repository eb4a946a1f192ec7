//! Parameter types for MySQL MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    #[schemars(description = "The SELECT statement to execute inside a read-only snapshot transaction")]
    pub sql: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteParams {
    #[schemars(description = "The INSERT/UPDATE/DELETE statement to execute inside a committed transaction. SELECT statements are rejected; use mysql_query instead.")]
    pub sql: String,

    #[schemars(description = "Positional bind values for ? placeholders (optional)")]
    #[serde(default)]
    pub params: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DescribeTableParams {
    #[schemars(description = "Name of the table to describe")]
    pub table: String,
}

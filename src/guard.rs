//! Statement guard - denylist safety layer for incoming SQL
//!
//! Pattern-matches statements against a fixed set of dangerous constructs
//! and enforces the maximum statement length. This is a denylist, not a
//! parser: anything not matching a pattern is presumed safe, including
//! all well-formed single-statement SQL. It is a best-effort heuristic
//! and is NOT injection-proof; the real protection is the read-only
//! snapshot transaction on the query path and the privileges of the
//! configured MySQL account.

use regex::Regex;

use crate::config::Limits;
use crate::types::MysqlMcpError;

/// Denylisted construct classes, matched case-insensitively:
/// statement stacking (a second clause after a semicolon introducing a
/// write), EXEC/EXECUTE, and writing results to a server-side file.
const DENY_PATTERNS: &[&str] = &[
    r"(?i);\s*(drop|delete|update|insert)\b",
    r"(?i)\bexec(ute)?\b",
    r"(?i)\binto\s+(outfile|dumpfile)\b",
];

/// Safety decision for a single statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub safe: bool,
    pub reason: Option<String>,
}

impl Verdict {
    fn safe() -> Self {
        Self { safe: true, reason: None }
    }

    fn unsafe_because(reason: impl Into<String>) -> Self {
        Self { safe: false, reason: Some(reason.into()) }
    }
}

/// Statement guard with precompiled denylist patterns
#[derive(Clone)]
pub struct SqlGuard {
    deny_patterns: Vec<Regex>,
    max_query_length: usize,
}

impl SqlGuard {
    pub fn new(limits: &Limits) -> Result<Self, MysqlMcpError> {
        Ok(Self {
            deny_patterns: compile_deny_patterns(DENY_PATTERNS)?,
            max_query_length: limits.max_query_length,
        })
    }

    /// Full check: length first, then the denylist
    pub fn check(&self, sql: &str) -> Verdict {
        if self.exceeds_length(sql) {
            return Verdict::unsafe_because(format!(
                "Statement exceeds maximum length of {} characters",
                self.max_query_length
            ));
        }
        self.check_patterns(sql)
    }

    /// Denylist check only
    pub fn check_patterns(&self, sql: &str) -> Verdict {
        for pattern in &self.deny_patterns {
            if pattern.is_match(sql) {
                return Verdict::unsafe_because(format!(
                    "Statement matches denied pattern: {}",
                    pattern.as_str()
                ));
            }
        }
        Verdict::safe()
    }

    /// Length check only, used by the generic executor's limit path
    pub fn exceeds_length(&self, sql: &str) -> bool {
        sql.chars().count() > self.max_query_length
    }

    pub fn max_query_length(&self) -> usize {
        self.max_query_length
    }
}

fn compile_deny_patterns(patterns: &[&str]) -> Result<Vec<Regex>, MysqlMcpError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| MysqlMcpError::Config(format!("Invalid deny pattern '{}': {}", p, e)))
        })
        .collect()
}

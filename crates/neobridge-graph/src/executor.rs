//! Bounded query execution against the graph store.
//!
//! The executor owns the session lifecycle: one transaction per
//! invocation, committed on success and rolled back on every failure
//! path, with a hard wall-clock deadline. Store failures are classified
//! into the protocol taxonomy here; a raw neo4rs error never crosses
//! this boundary.

use std::future::Future;
use std::time::Duration;

use neo4rs::Query;
use serde_json::{Map, Value};

use neobridge_core::{NodeRecord, SchemaInfo, ToolError};

use crate::client::GraphClient;
use crate::convert;
use crate::cypher::{self, BuiltQuery};

/// Policy applied to pass-through statements from `execute_query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPolicy {
    /// Reject statements containing mutating clauses before they reach
    /// the store. Defense in depth, not a substitute for store-level
    /// permissions.
    ReadOnly,
    /// Pass statements through unchecked.
    Unrestricted,
}

/// Executes one statement (or the fixed introspection set) inside a
/// bounded transaction.
#[derive(Clone)]
pub struct Executor {
    client: GraphClient,
    policy: QueryPolicy,
    timeout: Duration,
}

impl Executor {
    pub fn new(client: GraphClient, policy: QueryPolicy, timeout: Duration) -> Self {
        Self {
            client,
            policy,
            timeout,
        }
    }

    /// Run a builder-produced statement and decode the `n` column of every
    /// row as a node.
    pub async fn run_nodes(&self, built: &BuiltQuery) -> Result<Vec<NodeRecord>, ToolError> {
        let query = convert::to_query(built)?;
        with_deadline(self.timeout, async {
            let mut txn = self.client.start_txn().await.map_err(classify)?;
            let rows = match Self::collect_rows(&mut txn, query).await {
                Ok(rows) => rows,
                Err(e) => {
                    let _ = txn.rollback().await;
                    return Err(e);
                }
            };

            let decoded: Result<Vec<NodeRecord>, ToolError> = rows
                .iter()
                .map(|row| {
                    let node: neo4rs::Node = column(row, "n")?;
                    convert::node_to_record(&node)
                })
                .collect();
            match decoded {
                Ok(records) => {
                    txn.commit().await.map_err(classify)?;
                    Ok(records)
                }
                Err(e) => {
                    let _ = txn.rollback().await;
                    Err(e)
                }
            }
        })
        .await
    }

    /// Run caller-supplied query text with bound parameters.
    ///
    /// Under [`QueryPolicy::ReadOnly`], statements containing mutating
    /// clause keywords are rejected before any store contact.
    pub async fn run_passthrough(
        &self,
        text: &str,
        parameters: &Map<String, Value>,
    ) -> Result<Vec<Value>, ToolError> {
        if self.policy == QueryPolicy::ReadOnly {
            if let Some(keyword) = mutating_keyword(text) {
                return Err(ToolError::WriteNotPermitted(format!(
                    "statement contains mutating clause {keyword} and the bridge is read-only"
                )));
            }
        }

        let mut query = neo4rs::query(text);
        for (name, value) in parameters {
            query = query.param(name, convert::json_to_bolt(name, value)?);
        }

        with_deadline(self.timeout, async {
            let mut txn = self.client.start_txn().await.map_err(classify)?;
            let rows = match Self::collect_rows(&mut txn, query).await {
                Ok(rows) => rows,
                Err(e) => {
                    let _ = txn.rollback().await;
                    return Err(e);
                }
            };

            let decoded: Result<Vec<Value>, ToolError> =
                rows.iter().map(convert::row_to_json).collect();
            match decoded {
                Ok(values) => {
                    txn.commit().await.map_err(classify)?;
                    Ok(values)
                }
                Err(e) => {
                    let _ = txn.rollback().await;
                    Err(e)
                }
            }
        })
        .await
    }

    /// Run the fixed introspection set behind `get_schema` in one
    /// read transaction.
    pub async fn fetch_schema(&self) -> Result<SchemaInfo, ToolError> {
        with_deadline(self.timeout, async {
            let mut txn = self.client.start_txn().await.map_err(classify)?;
            match Self::collect_schema(&mut txn).await {
                Ok(info) => {
                    txn.commit().await.map_err(classify)?;
                    Ok(info)
                }
                Err(e) => {
                    let _ = txn.rollback().await;
                    Err(e)
                }
            }
        })
        .await
    }

    async fn collect_schema(txn: &mut neo4rs::Txn) -> Result<SchemaInfo, ToolError> {
        let [labels_q, rel_types_q, keys_q, node_count_q, rel_count_q] =
            cypher::schema_statements();

        let row = Self::single_row(txn, labels_q).await?;
        let labels: Vec<String> = column(&row, "labels")?;

        let row = Self::single_row(txn, rel_types_q).await?;
        let relationship_types: Vec<String> = column(&row, "relationship_types")?;

        let row = Self::single_row(txn, keys_q).await?;
        let property_keys: Vec<String> = column(&row, "property_keys")?;

        let row = Self::single_row(txn, node_count_q).await?;
        let node_count: i64 = column(&row, "node_count")?;

        let row = Self::single_row(txn, rel_count_q).await?;
        let relationship_count: i64 = column(&row, "relationship_count")?;

        Ok(SchemaInfo {
            labels,
            relationship_types,
            property_keys,
            node_count,
            relationship_count,
        })
    }

    async fn single_row(txn: &mut neo4rs::Txn, text: &str) -> Result<neo4rs::Row, ToolError> {
        let rows = Self::collect_rows(txn, neo4rs::query(text)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ToolError::Internal(format!("introspection returned no rows: {text}")))
    }

    async fn collect_rows(
        txn: &mut neo4rs::Txn,
        query: Query,
    ) -> Result<Vec<neo4rs::Row>, ToolError> {
        let mut stream = txn.execute(query).await.map_err(classify)?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next(txn.handle()).await.map_err(classify)? {
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Bound one whole store interaction by a wall-clock deadline: session
/// acquisition, execution, and commit all count against it. A pool wait
/// that never yields a connection expires here instead of blocking the
/// invocation forever; expiry drops the in-flight transaction, which
/// returns its pool slot.
async fn with_deadline<T>(
    limit: Duration,
    work: impl Future<Output = Result<T, ToolError>>,
) -> Result<T, ToolError> {
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ToolError::Timeout(limit)),
    }
}

fn column<T: for<'de> serde::Deserialize<'de>>(
    row: &neo4rs::Row,
    name: &str,
) -> Result<T, ToolError> {
    row.get::<T>(name)
        .map_err(|e| ToolError::Internal(format!("failed to decode column '{name}': {e}")))
}

/// Map a neo4rs error into the protocol taxonomy.
pub(crate) fn classify(e: neo4rs::Error) -> ToolError {
    classify_message(&e.to_string())
}

/// Classification is keyed on the Neo4j status code embedded in the
/// failure message. Anything unrecognized is treated as a transport
/// problem, the only retryable default.
fn classify_message(msg: &str) -> ToolError {
    if msg.contains("SyntaxError") || msg.contains("Neo.ClientError.Statement") {
        ToolError::Syntax(msg.to_string())
    } else if msg.contains("ConstraintValidation") || msg.contains("Neo.ClientError.Schema") {
        ToolError::ConstraintViolation(msg.to_string())
    } else {
        ToolError::Connectivity(msg.to_string())
    }
}

/// Clause keywords that mutate the graph. `CALL` is deliberately absent:
/// procedure calls are needed for introspection and store-level
/// permissions remain the real gate.
const WRITE_KEYWORDS: &[&str] = &[
    "CREATE", "MERGE", "DELETE", "DETACH", "SET", "REMOVE", "DROP", "FOREACH", "LOAD",
];

/// Scan the whole statement for mutating clause keywords, not just the
/// leading clause: `MATCH (n) DETACH DELETE n` opens with a read clause.
/// Comments and string/backtick literals are blanked first so a keyword
/// can neither hide in nor be faked by one.
fn mutating_keyword(text: &str) -> Option<&'static str> {
    let stripped = strip_literals(text);
    for token in stripped.split(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
        if token.is_empty() {
            continue;
        }
        let upper = token.to_ascii_uppercase();
        if let Some(keyword) = WRITE_KEYWORDS.iter().find(|k| **k == upper) {
            return Some(keyword);
        }
    }
    None
}

/// Blank out `//` line comments, `/* */` block comments, quoted strings,
/// and backtick identifiers. Clause keywords cannot occur inside any of
/// them, and a line comment opener inside a string must not eat the rest
/// of the statement.
fn strip_literals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            '\'' | '"' | '`' => {
                let quote = c;
                while let Some(c) = chars.next() {
                    if c == '\\' && quote != '`' {
                        chars.next();
                    } else if c == quote {
                        break;
                    }
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

//! Record types returned across the tool-protocol boundary.
//!
//! These are the caller-facing shapes: plain serde structs, no neo4rs types.
//! Node and relationship identifiers are store-assigned and opaque to
//! callers (read-only).

use serde::{Deserialize, Serialize};

/// A node as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    /// Store-assigned identifier. Opaque and read-only for callers.
    pub id: i64,
    pub labels: Vec<String>,
    /// Property map; values are scalars or lists of scalars.
    pub properties: serde_json::Value,
}

/// A relationship as returned to the caller. Never created independently
/// of its endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub start_id: i64,
    pub end_id: i64,
    pub properties: serde_json::Value,
}

/// Database schema summary returned by `get_schema`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaInfo {
    pub labels: Vec<String>,
    pub relationship_types: Vec<String>,
    pub property_keys: Vec<String>,
    pub node_count: i64,
    pub relationship_count: i64,
}

/// Successful result of one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ResultPayload {
    /// Result of `get_schema`.
    Schema(SchemaInfo),
    /// Result of `create_node` / `find_nodes`.
    Nodes(Vec<NodeRecord>),
    /// Result of `execute_query`: one JSON object per row, keyed by the
    /// RETURN column names.
    Rows(Vec<serde_json::Value>),
}

impl ResultPayload {
    /// Number of records in the payload.
    pub fn len(&self) -> usize {
        match self {
            Self::Schema(_) => 1,
            Self::Nodes(nodes) => nodes.len(),
            Self::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

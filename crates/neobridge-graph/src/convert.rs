//! Conversions between JSON values, Bolt values, and caller-facing records.
//!
//! Argument values arrive as JSON and leave for the store as Bolt
//! parameters; rows come back as Bolt and leave for the caller as JSON.
//! Node and relationship columns keep their store identity (id, labels,
//! type) instead of collapsing to bare property maps.

use neo4rs::{BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltType, Query};
use serde_json::Value;

use neobridge_core::{NodeRecord, RelationshipRecord, ToolError};

use crate::cypher::BuiltQuery;

/// Turn a built statement into an executable neo4rs query, binding every
/// parameter as a Bolt value.
pub fn to_query(built: &BuiltQuery) -> Result<Query, ToolError> {
    let mut query = neo4rs::query(&built.text);
    for (name, value) in &built.params {
        query = query.param(name, json_to_bolt(name, value)?);
    }
    Ok(query)
}

/// Convert a JSON value into its Bolt equivalent.
///
/// Nulls are rejected rather than silently written: a caller that wants an
/// absent property omits the key. `field` names the offending argument in
/// the error.
pub fn json_to_bolt(field: &str, value: &Value) -> Result<BoltType, ToolError> {
    match value {
        Value::Null => Err(ToolError::InvalidArgument {
            field: field.to_string(),
            reason: "null values are not supported; omit the key instead".to_string(),
        }),
        Value::Bool(b) => Ok(BoltType::Boolean(BoltBoolean::new(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(BoltType::Integer(BoltInteger::new(i)))
            } else if let Some(f) = n.as_f64() {
                Ok(BoltType::Float(BoltFloat::new(f)))
            } else {
                Err(ToolError::InvalidArgument {
                    field: field.to_string(),
                    reason: format!("number {n} is out of range"),
                })
            }
        }
        Value::String(s) => Ok(BoltType::String(s.as_str().into())),
        Value::Array(items) => {
            let mut list = BoltList::default();
            for item in items {
                list.value.push(json_to_bolt(field, item)?);
            }
            Ok(BoltType::List(list))
        }
        Value::Object(map) => {
            let mut bolt_map = BoltMap::default();
            for (key, item) in map {
                bolt_map.value.insert(key.as_str().into(), json_to_bolt(field, item)?);
            }
            Ok(BoltType::Map(bolt_map))
        }
    }
}

/// Convert a neo4rs node into the caller-facing record, preserving the
/// store-assigned id and all labels.
pub fn node_to_record(node: &neo4rs::Node) -> Result<NodeRecord, ToolError> {
    let properties = node
        .to::<Value>()
        .map_err(|e| ToolError::Internal(format!("failed to decode node properties: {e}")))?;
    Ok(NodeRecord {
        id: node.id(),
        labels: node.labels().iter().map(|l| l.to_string()).collect(),
        properties,
    })
}

/// Convert a neo4rs relationship into the caller-facing record.
pub fn relation_to_record(rel: &neo4rs::Relation) -> Result<RelationshipRecord, ToolError> {
    let properties = rel
        .to::<Value>()
        .map_err(|e| ToolError::Internal(format!("failed to decode relationship properties: {e}")))?;
    Ok(RelationshipRecord {
        id: rel.id(),
        rel_type: rel.typ().to_string(),
        start_id: rel.start_node_id(),
        end_id: rel.end_node_id(),
        properties,
    })
}

/// Convert an arbitrary result row into a JSON object keyed by column name.
///
/// Columns holding nodes or relationships are re-read typed so their
/// identity survives; everything else passes through as plain JSON.
pub fn row_to_json(row: &neo4rs::Row) -> Result<Value, ToolError> {
    let base = row
        .to::<Value>()
        .map_err(|e| ToolError::Internal(format!("failed to decode row: {e}")))?;

    let Value::Object(columns) = base else {
        return Ok(base);
    };

    let mut out = serde_json::Map::with_capacity(columns.len());
    for (column, value) in columns {
        if let Ok(node) = row.get::<neo4rs::Node>(column.as_str()) {
            let record = node_to_record(&node)?;
            out.insert(column, serde_json::to_value(record).map_err(internal)?);
        } else if let Ok(rel) = row.get::<neo4rs::Relation>(column.as_str()) {
            let record = relation_to_record(&rel)?;
            out.insert(column, serde_json::to_value(record).map_err(internal)?);
        } else {
            out.insert(column, value);
        }
    }
    Ok(Value::Object(out))
}

fn internal(e: serde_json::Error) -> ToolError {
    ToolError::Internal(e.to_string())
}

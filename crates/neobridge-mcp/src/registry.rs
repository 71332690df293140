//! The operation catalog: one descriptor per callable tool.
//!
//! The registry is built once at startup from the fixed built-in set and
//! never mutated afterwards, so lookups need no synchronization. The
//! descriptors double as the source of the MCP `inputSchema` JSON.

use std::collections::HashMap;

use serde_json::{json, Value};

use neobridge_core::ToolError;

/// Declared type of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Integer,
    /// Non-empty-checked elsewhere; here just "array of strings".
    StringList,
    /// Map whose values are scalars or lists of scalars — the only
    /// property values the graph data model admits.
    PropertyMap,
    /// Map with arbitrary JSON values, for pass-through query parameters.
    AnyMap,
}

impl ArgType {
    /// Human-readable shape, used in validation error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::StringList => "an array of strings",
            Self::PropertyMap => "an object of scalar or list-of-scalar values",
            Self::AnyMap => "an object",
        }
    }

    /// Does the supplied JSON value fit this type?
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.as_i64().is_some(),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::PropertyMap => value
                .as_object()
                .is_some_and(|map| map.values().all(is_property_value)),
            Self::AnyMap => value.is_object(),
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            Self::String => json!({ "type": "string" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::StringList => json!({ "type": "array", "items": { "type": "string" } }),
            Self::PropertyMap | Self::AnyMap => json!({ "type": "object" }),
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    value.is_string() || value.is_number() || value.is_boolean()
}

fn is_property_value(value: &Value) -> bool {
    is_scalar(value)
        || value
            .as_array()
            .is_some_and(|items| items.iter().all(is_scalar))
}

/// Declaration of one argument of one operation.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: &'static str,
    pub ty: ArgType,
    pub required: bool,
    pub description: &'static str,
    /// Inclusive lower bound, for integer arguments.
    pub min: Option<i64>,
}

impl ArgSpec {
    pub fn new(name: &'static str, ty: ArgType, required: bool, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required,
            description,
            min: None,
        }
    }

    pub fn with_min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }
}

/// Tag for the shape of a successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    Schema,
    Nodes,
    Rows,
}

impl ResultShape {
    /// The `kind` tag payloads of this shape carry on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Nodes => "nodes",
            Self::Rows => "rows",
        }
    }
}

/// Schema entry declaring one callable tool. Immutable once registered.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub args: Vec<ArgSpec>,
    pub result: ResultShape,
}

impl OperationDescriptor {
    /// Render the MCP `inputSchema` JSON for `tools/list`.
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for arg in &self.args {
            let mut schema = arg.ty.json_schema();
            schema["description"] = json!(arg.description);
            if let Some(min) = arg.min {
                schema["minimum"] = json!(min);
            }
            properties.insert(arg.name.to_string(), schema);
            if arg.required {
                required.push(arg.name);
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Mapping from operation name to descriptor. Built at startup, read-only
/// thereafter.
pub struct Registry {
    ops: HashMap<&'static str, OperationDescriptor>,
}

impl Registry {
    /// The fixed built-in catalog.
    pub fn builtin() -> Self {
        let mut registry = Self {
            ops: HashMap::new(),
        };
        for descriptor in builtin_descriptors() {
            registry
                .register(descriptor)
                .expect("built-in catalog has unique operation names");
        }
        registry
    }

    fn register(&mut self, descriptor: OperationDescriptor) -> Result<(), ToolError> {
        if self.ops.contains_key(descriptor.name) {
            return Err(ToolError::DuplicateOperation(descriptor.name.to_string()));
        }
        self.ops.insert(descriptor.name, descriptor);
        Ok(())
    }

    /// Look up a descriptor by operation name.
    pub fn lookup(&self, name: &str) -> Result<&OperationDescriptor, ToolError> {
        self.ops
            .get(name)
            .ok_or_else(|| ToolError::UnknownOperation(name.to_string()))
    }

    /// All descriptors, sorted by name for a deterministic `tools/list`.
    pub fn descriptors(&self) -> Vec<&OperationDescriptor> {
        let mut all: Vec<_> = self.ops.values().collect();
        all.sort_by_key(|d| d.name);
        all
    }
}

fn builtin_descriptors() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor {
            name: "get_schema",
            description: "Summarize the database schema: node labels, relationship types, \
                          property keys, and node/relationship counts.",
            args: vec![],
            result: ResultShape::Schema,
        },
        OperationDescriptor {
            name: "create_node",
            description: "Create one node with the given labels and properties.",
            args: vec![
                ArgSpec::new(
                    "labels",
                    ArgType::StringList,
                    true,
                    "Labels for the node, e.g. [\"Person\"]. At least one is required.",
                ),
                ArgSpec::new(
                    "properties",
                    ArgType::PropertyMap,
                    true,
                    "Properties as key-value pairs; values are scalars or lists of scalars.",
                ),
            ],
            result: ResultShape::Nodes,
        },
        OperationDescriptor {
            name: "find_nodes",
            description: "Find nodes by label and/or exact property values.",
            args: vec![
                ArgSpec::new(
                    "label",
                    ArgType::String,
                    false,
                    "Label to filter by; omit to match any label.",
                ),
                ArgSpec::new(
                    "properties",
                    ArgType::PropertyMap,
                    false,
                    "Property values that must match exactly.",
                ),
                ArgSpec::new(
                    "limit",
                    ArgType::Integer,
                    false,
                    "Maximum number of nodes to return (default 100, capped at 1000).",
                )
                .with_min(1),
            ],
            result: ResultShape::Nodes,
        },
        OperationDescriptor {
            name: "execute_query",
            description: "Execute a Cypher statement. Variable values must be passed via \
                          `parameters`, never concatenated into the text.",
            args: vec![
                ArgSpec::new("text", ArgType::String, true, "The Cypher statement to run."),
                ArgSpec::new(
                    "parameters",
                    ArgType::AnyMap,
                    false,
                    "Named parameters referenced as $name in the statement.",
                ),
            ],
            result: ResultShape::Rows,
        },
    ]
}

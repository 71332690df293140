//! The protocol entry point: validate, route, execute, respond.
//!
//! One invocation moves through Received → Validating → Building or
//! PassThrough → Executing and terminates on first completion. Validation
//! failures never reach the store; execution failures arrive here already
//! classified. Nothing is retried — retry policy belongs to the caller,
//! informed by the error kind.

use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use neobridge_core::{ResultPayload, ToolError};
use neobridge_graph::{cypher, Executor};

use crate::registry::{OperationDescriptor, Registry};

/// Structured error as it appears on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Response for one invocation. The operation name is always echoed back;
/// exactly one of `result` / `error` is populated.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationResponse {
    pub operation: String,
    pub status: String,
    pub result: Option<ResultPayload>,
    pub error: Option<ErrorBody>,
}

impl InvocationResponse {
    fn ok(operation: &str, payload: ResultPayload) -> Self {
        Self {
            operation: operation.to_string(),
            status: "ok".to_string(),
            result: Some(payload),
            error: None,
        }
    }

    fn fail(operation: &str, err: &ToolError) -> Self {
        Self {
            operation: operation.to_string(),
            status: "error".to_string(),
            result: None,
            error: Some(ErrorBody {
                kind: err.kind().to_string(),
                message: err.to_string(),
                retryable: err.retryable(),
                field: err.field().map(str::to_string),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

/// Routes validated invocations to the query builder and executor.
pub struct Dispatcher {
    registry: Registry,
    executor: Executor,
    default_find_limit: i64,
}

impl Dispatcher {
    pub fn new(registry: Registry, executor: Executor, default_find_limit: i64) -> Self {
        Self {
            registry,
            executor,
            default_find_limit,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Serve one invocation end to end.
    pub async fn dispatch(&self, operation: &str, arguments: &Map<String, Value>) -> InvocationResponse {
        let invocation_id = Uuid::new_v4();
        let started = Instant::now();

        let outcome = self.invoke(operation, arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(payload) => {
                tracing::info!(
                    %invocation_id,
                    operation,
                    records = payload.len(),
                    elapsed_ms,
                    "invocation succeeded"
                );
                InvocationResponse::ok(operation, payload)
            }
            Err(err) => {
                tracing::warn!(
                    %invocation_id,
                    operation,
                    kind = err.kind(),
                    elapsed_ms,
                    error = %err,
                    "invocation failed"
                );
                InvocationResponse::fail(operation, &err)
            }
        }
    }

    async fn invoke(
        &self,
        operation: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ResultPayload, ToolError> {
        let descriptor = self.registry.lookup(operation)?;
        validate_arguments(descriptor, arguments)?;

        match operation {
            "get_schema" => {
                let info = self.executor.fetch_schema().await?;
                Ok(ResultPayload::Schema(info))
            }
            "create_node" => {
                let labels = string_list_arg(arguments, "labels");
                let properties = map_arg(arguments, "properties");
                let built = cypher::create_node(&labels, &properties)?;
                let nodes = self.executor.run_nodes(&built).await?;
                Ok(ResultPayload::Nodes(nodes))
            }
            "find_nodes" => {
                let label = string_arg(arguments, "label");
                let properties = map_arg(arguments, "properties");
                let limit = int_arg(arguments, "limit").or(Some(self.default_find_limit));
                let built = cypher::find_nodes(label, &properties, limit)?;
                let nodes = self.executor.run_nodes(&built).await?;
                Ok(ResultPayload::Nodes(nodes))
            }
            "execute_query" => {
                let text = string_arg(arguments, "text").unwrap_or_default();
                let parameters = map_arg(arguments, "parameters");
                let rows = self.executor.run_passthrough(text, &parameters).await?;
                Ok(ResultPayload::Rows(rows))
            }
            other => Err(ToolError::UnknownOperation(other.to_string())),
        }
    }
}

/// Check the supplied arguments against the descriptor: unknown fields are
/// rejected, required fields must be present, every supplied value must
/// match its declared type and bounds. Fails on the first violation.
pub fn validate_arguments(
    descriptor: &OperationDescriptor,
    arguments: &Map<String, Value>,
) -> Result<(), ToolError> {
    for field in arguments.keys() {
        if !descriptor.args.iter().any(|a| a.name == field) {
            return Err(ToolError::InvalidArgument {
                field: field.clone(),
                reason: format!("unknown argument for operation '{}'", descriptor.name),
            });
        }
    }

    for spec in &descriptor.args {
        match arguments.get(spec.name) {
            None => {
                if spec.required {
                    return Err(ToolError::InvalidArgument {
                        field: spec.name.to_string(),
                        reason: "required argument is missing".to_string(),
                    });
                }
            }
            Some(value) => {
                if !spec.ty.matches(value) {
                    return Err(ToolError::InvalidArgument {
                        field: spec.name.to_string(),
                        reason: format!("expected {}", spec.ty.describe()),
                    });
                }
                if let (Some(min), Some(n)) = (spec.min, value.as_i64()) {
                    if n < min {
                        return Err(ToolError::InvalidArgument {
                            field: spec.name.to_string(),
                            reason: format!("must be >= {min}"),
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

// ── Typed extraction (post-validation) ───────────────────────────

fn string_arg<'a>(arguments: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    arguments.get(name).and_then(Value::as_str)
}

fn int_arg(arguments: &Map<String, Value>, name: &str) -> Option<i64> {
    arguments.get(name).and_then(Value::as_i64)
}

fn string_list_arg(arguments: &Map<String, Value>, name: &str) -> Vec<String> {
    arguments
        .get(name)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn map_arg(arguments: &Map<String, Value>, name: &str) -> Map<String, Value> {
    arguments
        .get(name)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use neobridge_core::SchemaInfo;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn missing_required_argument_names_the_field() {
        let registry = Registry::builtin();
        let descriptor = registry.lookup("create_node").unwrap();

        let err = validate_arguments(descriptor, &args(json!({"labels": ["Person"]}))).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert_eq!(err.field(), Some("properties"));
    }

    #[test]
    fn unknown_argument_is_rejected() {
        let registry = Registry::builtin();
        let descriptor = registry.lookup("find_nodes").unwrap();

        let err = validate_arguments(descriptor, &args(json!({"lable": "Person"}))).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert_eq!(err.field(), Some("lable"));
    }

    #[test]
    fn wrong_type_is_rejected_with_expected_shape() {
        let registry = Registry::builtin();
        let descriptor = registry.lookup("create_node").unwrap();

        let err = validate_arguments(
            descriptor,
            &args(json!({"labels": "Person", "properties": {}})),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("labels"));
        assert!(err.to_string().contains("array of strings"));
    }

    #[test]
    fn non_positive_limit_is_rejected_not_clamped() {
        let registry = Registry::builtin();
        let descriptor = registry.lookup("find_nodes").unwrap();

        let err = validate_arguments(descriptor, &args(json!({"limit": 0}))).unwrap_err();
        assert_eq!(err.field(), Some("limit"));

        // Oversized limits are valid here; the builder clamps them.
        validate_arguments(descriptor, &args(json!({"limit": 5000}))).unwrap();
    }

    #[test]
    fn nested_property_values_are_rejected() {
        let registry = Registry::builtin();
        let descriptor = registry.lookup("create_node").unwrap();

        let err = validate_arguments(
            descriptor,
            &args(json!({"labels": ["Person"], "properties": {"address": {"city": "x"}}})),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("properties"));
    }

    #[test]
    fn execute_query_parameters_may_nest() {
        let registry = Registry::builtin();
        let descriptor = registry.lookup("execute_query").unwrap();

        validate_arguments(
            descriptor,
            &args(json!({"text": "RETURN $x", "parameters": {"x": {"nested": [1, 2]}}})),
        )
        .unwrap();
    }

    #[test]
    fn get_schema_takes_no_arguments() {
        let registry = Registry::builtin();
        let descriptor = registry.lookup("get_schema").unwrap();

        validate_arguments(descriptor, &Map::new()).unwrap();
        let err = validate_arguments(descriptor, &args(json!({"verbose": true}))).unwrap_err();
        assert_eq!(err.field(), Some("verbose"));
    }

    #[test]
    fn error_response_shape() {
        let err = ToolError::InvalidArgument {
            field: "labels".into(),
            reason: "required argument is missing".into(),
        };
        let response = InvocationResponse::fail("create_node", &err);
        assert!(response.is_error());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["operation"], "create_node");
        assert_eq!(json["status"], "error");
        assert_eq!(json["result"], Value::Null);
        assert_eq!(json["error"]["kind"], "invalid_argument");
        assert_eq!(json["error"]["field"], "labels");
        assert_eq!(json["error"]["retryable"], false);
    }

    #[test]
    fn ok_response_shape() {
        let response = InvocationResponse::ok("find_nodes", ResultPayload::Nodes(vec![]));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["error"], Value::Null);
        assert_eq!(json["result"]["kind"], "nodes");
    }

    #[test]
    fn payload_tags_match_declared_result_shapes() {
        let registry = Registry::builtin();

        let nodes = serde_json::to_value(ResultPayload::Nodes(vec![])).unwrap();
        for op in ["create_node", "find_nodes"] {
            assert_eq!(registry.lookup(op).unwrap().result.kind(), nodes["kind"]);
        }

        let rows = serde_json::to_value(ResultPayload::Rows(vec![])).unwrap();
        assert_eq!(
            registry.lookup("execute_query").unwrap().result.kind(),
            rows["kind"]
        );

        let schema = serde_json::to_value(ResultPayload::Schema(SchemaInfo {
            labels: vec![],
            relationship_types: vec![],
            property_keys: vec![],
            node_count: 0,
            relationship_count: 0,
        }))
        .unwrap();
        assert_eq!(
            registry.lookup("get_schema").unwrap().result.kind(),
            schema["kind"]
        );
    }
}

//! MCP stdio server: reads JSON-RPC from stdin, writes responses to
//! stdout. Logs go to stderr so stdout stays a clean protocol channel.

use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::dispatch::Dispatcher;
use crate::protocol::*;
use crate::registry::Registry;

/// Serves the fixed tool catalog over stdin/stdout.
pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Run the server loop until stdin closes. One JSON-RPC message per
    /// line, one response line per message.
    pub async fn run(&self) -> std::io::Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break; // EOF
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some(response) = self.handle_message(trimmed).await else {
                continue;
            };
            let mut out = serde_json::to_string(&response)
                .unwrap_or_else(|e| format!(r#"{{"jsonrpc":"2.0","error":{{"code":-32603,"message":"{e}"}}}}"#));
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }

        Ok(())
    }

    /// Handle a single JSON-RPC message. `None` means the message was a
    /// notification and no response line may be written.
    pub async fn handle_message(&self, msg: &str) -> Option<JsonRpcResponse> {
        let req: JsonRpcRequest = match serde_json::from_str(msg) {
            Ok(r) => r,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("parse error: {e}"),
                ))
            }
        };

        // `initialized` and other id-less messages are notifications;
        // replying to them would emit an uncorrelatable response.
        if is_notification(&req) {
            return None;
        }

        let id = req.id.clone();
        Some(match req.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                serde_json::to_value(InitializeResult::current()).unwrap_or_default(),
            ),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                serde_json::json!({ "tools": tool_listing(self.dispatcher.registry()) }),
            ),
            "tools/call" => self.handle_tool_call(id, &req.params).await,
            other => {
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("method not found: {other}"))
            }
        })
    }

    async fn handle_tool_call(&self, id: Option<Value>, params: &Value) -> JsonRpcResponse {
        let (name, arguments) = match parse_tool_call(params) {
            Ok(parsed) => parsed,
            Err(reason) => return JsonRpcResponse::error(id, INVALID_PARAMS, reason),
        };

        let response = self.dispatcher.dispatch(&name, &arguments).await;
        let is_error = response.is_error();
        let text = match serde_json::to_string(&response) {
            Ok(text) => text,
            Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
        };

        let result = ToolCallResult::new(text, is_error);
        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap_or_default())
    }
}

/// A JSON-RPC request without an id is a notification and gets no reply.
fn is_notification(req: &JsonRpcRequest) -> bool {
    req.id.is_none()
}

/// Render the registry as MCP tool descriptors.
pub fn tool_listing(registry: &Registry) -> Vec<ToolDescriptor> {
    registry
        .descriptors()
        .iter()
        .map(|d| ToolDescriptor {
            name: d.name.to_string(),
            description: d.description.to_string(),
            input_schema: d.input_schema(),
        })
        .collect()
}

/// Extract the tool name and argument object from `tools/call` params.
pub fn parse_tool_call(params: &Value) -> Result<(String, Map<String, Value>), String> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing tool name".to_string())?;

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return Err(format!(
                "arguments must be an object, got {}",
                value_kind(other)
            ))
        }
    };

    Ok((name.to_string(), arguments))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_listing_matches_registry() {
        let listing = tool_listing(&Registry::builtin());
        let names: Vec<_> = listing.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["create_node", "execute_query", "find_nodes", "get_schema"]
        );
        for tool in &listing {
            assert_eq!(tool.input_schema["type"], "object");
            assert!(!tool.description.is_empty());
        }
    }

    #[test]
    fn initialized_is_a_notification_and_ping_is_not() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"initialized"}"#).unwrap();
        assert!(is_notification(&req));

        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
        assert!(!is_notification(&req));
    }

    #[test]
    fn parse_tool_call_requires_a_name() {
        let err = parse_tool_call(&json!({"arguments": {}})).unwrap_err();
        assert!(err.contains("missing tool name"));
    }

    #[test]
    fn parse_tool_call_defaults_arguments_to_empty() {
        let (name, arguments) = parse_tool_call(&json!({"name": "get_schema"})).unwrap();
        assert_eq!(name, "get_schema");
        assert!(arguments.is_empty());
    }

    #[test]
    fn parse_tool_call_rejects_non_object_arguments() {
        let err = parse_tool_call(&json!({"name": "find_nodes", "arguments": [1, 2]})).unwrap_err();
        assert!(err.contains("must be an object"));
        assert!(err.contains("array"));
    }
}

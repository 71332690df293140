//! neobridge-mcp: the tool-protocol layer of neobridge.
//!
//! Exposes a fixed catalog of graph operations to LLM-driven agents over
//! the Model Context Protocol (JSON-RPC 2.0 on stdin/stdout):
//!
//! | Tool | Description |
//! |------|-------------|
//! | `get_schema` | Database schema summary (labels, types, keys, counts) |
//! | `create_node` | Create one node with labels and properties |
//! | `find_nodes` | Find nodes by label and/or property equality |
//! | `execute_query` | Run caller-supplied Cypher with bound parameters |
//!
//! Every invocation is validated against the [`registry`] before any
//! query text is built or executed; results and failures come back as
//! structured, typed payloads.

pub mod config;
pub mod dispatch;
pub mod protocol;
pub mod registry;
pub mod server;

pub use config::BridgeConfig;
pub use dispatch::{Dispatcher, InvocationResponse};
pub use registry::Registry;
pub use server::McpServer;

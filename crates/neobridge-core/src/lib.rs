//! neobridge-core: Shared types and error taxonomy for the neobridge tool protocol.
//!
//! This crate provides the foundational types used across all neobridge components:
//! - Record types (nodes, relationships, schema summaries) returned to callers
//! - The protocol error taxonomy with stable wire kinds and retryability
//!
//! It is pure data — no I/O, no async.

pub mod error;
pub mod types;

pub use error::ToolError;
pub use types::{NodeRecord, RelationshipRecord, ResultPayload, SchemaInfo};

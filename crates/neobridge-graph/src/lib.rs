//! neobridge-graph: Neo4j access layer for the neobridge tool protocol.
//!
//! This crate is the single point of contact with the graph store. All
//! query text for structural operations is produced by the builder in
//! [`cypher`]; user-supplied scalars always travel as bound parameters.
//! The [`executor`] owns the session/transaction lifecycle and maps every
//! store failure into the protocol error taxonomy before it can escape.

pub mod client;
pub mod convert;
pub mod cypher;
pub mod executor;

pub use client::{GraphClient, GraphConfig};
pub use cypher::BuiltQuery;
pub use executor::{Executor, QueryPolicy};

use serde_json::Value;

use crate::error::ValidationError;
use crate::model::{Normalized, normalize};

/// Keys that may hold the edge list, in lookup order.
pub const EDGE_KEYS: [&str; 3] = ["links", "edges", "relations"];

/// The two record lists of a dataset payload, not yet validated.
#[derive(Clone, Debug, PartialEq)]
pub struct RawGraph {
    pub nodes: Value,
    pub edges: Value,
}

pub fn parse_payload(raw: &str) -> Result<RawGraph, ValidationError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(mut object) = value else {
        return Err(ValidationError::PayloadNotObject);
    };

    let nodes = object.remove("nodes").ok_or(ValidationError::MissingNodes)?;
    let edges = EDGE_KEYS
        .iter()
        .find_map(|key| object.remove(*key))
        .unwrap_or_else(|| Value::Array(Vec::new()));

    Ok(RawGraph { nodes, edges })
}

/// Parses and normalizes a payload in one step.
pub fn load_payload(raw: &str) -> Result<Normalized, ValidationError> {
    let graph = parse_payload(raw)?;
    normalize(&graph.nodes, &graph.edges)
}

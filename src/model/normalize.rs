use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use super::{Edge, GraphSnapshot, Node};
use crate::error::ValidationError;

const SOURCE_ID_KEYS: [&str; 3] = ["source", "from", "from_id"];
const TARGET_ID_KEYS: [&str; 3] = ["target", "to", "to_id"];
const SOURCE_INDEX_KEY: &str = "from_idx";
const TARGET_INDEX_KEY: &str = "to_idx";
const WEIGHT_KEYS: [&str; 2] = ["weight", "count"];
const SNIPPET_KEYS: [&str; 3] = ["subjects", "snippets", "metadata"];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Normalized {
    pub snapshot: GraphSnapshot,
    pub dropped_edges: usize,
}

/// Resolves raw node and edge records into a [`GraphSnapshot`].
///
/// Node records must be objects carrying an `id` (string or integer). Edge
/// endpoints are looked up by id (`source`/`target`, `from`/`to`,
/// `from_id`/`to_id`) or by position in the node array (`from_idx`/`to_idx`).
/// Edges whose endpoints do not resolve are counted and skipped.
pub fn normalize(raw_nodes: &Value, raw_edges: &Value) -> Result<Normalized, ValidationError> {
    let node_records = raw_nodes.as_array().ok_or(ValidationError::NodesNotArray)?;
    let edge_records = raw_edges.as_array().ok_or(ValidationError::EdgesNotArray)?;

    let mut nodes = Vec::with_capacity(node_records.len());
    let mut index_by_id = HashMap::with_capacity(node_records.len());

    for (index, record) in node_records.iter().enumerate() {
        let object = record
            .as_object()
            .ok_or(ValidationError::NodeNotObject { index })?;
        let raw_id = object.get("id").ok_or(ValidationError::MissingId { index })?;
        let id = id_string(raw_id).ok_or(ValidationError::InvalidId { index })?;

        if index_by_id.insert(id.clone(), index).is_some() {
            return Err(ValidationError::DuplicateId { id });
        }

        let label = object
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        nodes.push(Node {
            id,
            label,
            attributes: object.clone(),
        });
    }

    let mut edges = Vec::with_capacity(edge_records.len());
    let mut dropped_edges = 0usize;

    for (index, record) in edge_records.iter().enumerate() {
        let object = record
            .as_object()
            .ok_or(ValidationError::EdgeNotObject { index })?;

        let source = resolve_endpoint(
            object,
            &SOURCE_ID_KEYS,
            SOURCE_INDEX_KEY,
            &index_by_id,
            nodes.len(),
        );
        let target = resolve_endpoint(
            object,
            &TARGET_ID_KEYS,
            TARGET_INDEX_KEY,
            &index_by_id,
            nodes.len(),
        );

        let (Some(source), Some(target)) = (source, target) else {
            dropped_edges += 1;
            continue;
        };

        edges.push(Edge {
            source,
            target,
            weight: weight_of(object),
            label: object.get("label").and_then(Value::as_str).map(str::to_owned),
            attributes: object.clone(),
            snippets: snippets_of(object),
        });
    }

    if dropped_edges > 0 {
        warn!(
            dropped_edges,
            kept_edges = edges.len(),
            "dropped edges with unresolved endpoints"
        );
    }

    Ok(Normalized {
        snapshot: GraphSnapshot::from_parts(nodes, edges),
        dropped_edges,
    })
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => number
            .as_i64()
            .map(|value| value.to_string())
            .or_else(|| number.as_u64().map(|value| value.to_string())),
        _ => None,
    }
}

fn resolve_endpoint(
    object: &Map<String, Value>,
    id_keys: &[&str],
    index_key: &str,
    index_by_id: &HashMap<String, usize>,
    node_count: usize,
) -> Option<usize> {
    if let Some(raw_id) = id_keys.iter().find_map(|key| object.get(*key)) {
        return id_string(raw_id).and_then(|id| index_by_id.get(&id).copied());
    }

    object
        .get(index_key)
        .and_then(Value::as_u64)
        .and_then(|index| usize::try_from(index).ok())
        .filter(|&index| index < node_count)
}

fn weight_of(object: &Map<String, Value>) -> f64 {
    let weight = WEIGHT_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_f64))
        .unwrap_or(1.0);

    if weight.is_finite() { weight.max(0.0) } else { 0.0 }
}

fn snippets_of(object: &Map<String, Value>) -> Vec<String> {
    SNIPPET_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

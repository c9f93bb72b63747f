//! In-memory graph model shared by every pipeline stage.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

mod normalize;

pub use normalize::{Normalized, normalize};

/// Raw record fields, kept verbatim and in their original order.
pub type Attributes = Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub attributes: Attributes,
}

impl Node {
    /// Numeric attribute lookup. Missing, non-numeric and non-finite values
    /// all read as `None`.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.attributes
            .get(name)
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite())
    }
}

/// An edge whose endpoints are indices into the owning snapshot's nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
    pub label: Option<String>,
    pub attributes: Attributes,
    pub snippets: Vec<String>,
}

impl Edge {
    /// `weight` resolves to the normalized weight; any other name is read
    /// from the raw attributes.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        if name == "weight" {
            return Some(self.weight);
        }

        self.attributes
            .get(name)
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite())
    }

    pub fn touches(&self, index: usize) -> bool {
        self.source == index || self.target == index
    }

    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index_by_id: HashMap<String, usize>,
}

impl GraphSnapshot {
    /// Builds a snapshot from nodes with unique ids and edges that already
    /// point inside `nodes`. Edges with out-of-range endpoints are skipped.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let node_count = nodes.len();
        let edges = edges
            .into_iter()
            .filter(|edge| edge.source < node_count && edge.target < node_count)
            .collect();

        Self {
            nodes,
            edges,
            index_by_id,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    /// Per-node count of incident edges, self-loops excluded.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0usize; self.nodes.len()];
        for edge in self.edges.iter().filter(|edge| !edge.is_loop()) {
            degrees[edge.source] += 1;
            degrees[edge.target] += 1;
        }
        degrees
    }

    /// Edges touching `index`, paired with the index of the other endpoint.
    pub fn incident(&self, index: usize) -> impl Iterator<Item = (&Edge, usize)> + '_ {
        self.edges.iter().filter_map(move |edge| {
            if edge.source == index {
                Some((edge, edge.target))
            } else if edge.target == index {
                Some((edge, edge.source))
            } else {
                None
            }
        })
    }

    pub fn labels(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| !node.label.is_empty())
            .map(|node| node.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.attributes
                    .iter()
                    .filter(|(_, value)| value.is_number())
                    .map(|(name, _)| name.clone())
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn edge_metric_names(&self) -> Vec<String> {
        let extra = self
            .edges
            .iter()
            .flat_map(|edge| {
                edge.attributes
                    .iter()
                    .filter(|(name, value)| value.is_number() && name.as_str() != "weight")
                    .map(|(name, _)| name.clone())
            })
            .collect::<BTreeSet<_>>();

        std::iter::once("weight".to_owned()).chain(extra).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, label: &str, attributes: Value) -> Node {
        Node {
            id: id.to_owned(),
            label: label.to_owned(),
            attributes: attributes.as_object().cloned().unwrap_or_default(),
        }
    }

    fn edge(source: usize, target: usize, weight: f64) -> Edge {
        Edge {
            source,
            target,
            weight,
            label: None,
            attributes: Attributes::new(),
            snippets: Vec::new(),
        }
    }

    #[test]
    fn metric_ignores_missing_and_non_numeric_values() {
        let node = node("a", "ORG", json!({"pagerank": 0.5, "name": "Acme"}));
        assert_eq!(node.metric("pagerank"), Some(0.5));
        assert_eq!(node.metric("name"), None);
        assert_eq!(node.metric("hits_hub"), None);
    }

    #[test]
    fn degrees_skip_self_loops() {
        let snapshot = GraphSnapshot::from_parts(
            vec![
                node("a", "ORG", json!({})),
                node("b", "PERSON", json!({})),
            ],
            vec![edge(0, 1, 1.0), edge(1, 1, 1.0)],
        );
        assert_eq!(snapshot.degrees(), vec![1, 1]);
    }

    #[test]
    fn from_parts_drops_out_of_range_edges() {
        let snapshot =
            GraphSnapshot::from_parts(vec![node("a", "", json!({}))], vec![edge(0, 3, 1.0)]);
        assert_eq!(snapshot.edge_count(), 0);
    }

    #[test]
    fn metric_names_are_sorted_and_unique() {
        let snapshot = GraphSnapshot::from_parts(
            vec![
                node("a", "Source", json!({"pagerank": 0.1, "name": "x"})),
                node("b", "Source", json!({"hits_hub": 1, "pagerank": 0.2})),
            ],
            Vec::new(),
        );
        assert_eq!(snapshot.metric_names(), vec!["hits_hub", "pagerank"]);
        assert_eq!(snapshot.labels(), vec!["Source"]);
    }
}

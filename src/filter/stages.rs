use std::collections::VecDeque;

use crate::model::GraphSnapshot;

use super::Predicate;

/// Keep-masks over a snapshot that predicates narrow in place.
pub(super) struct Selection<'a> {
    graph: &'a GraphSnapshot,
    nodes: Vec<bool>,
    edges: Vec<bool>,
}

impl<'a> Selection<'a> {
    pub(super) fn new(graph: &'a GraphSnapshot) -> Self {
        Self {
            graph,
            nodes: vec![true; graph.node_count()],
            edges: vec![true; graph.edge_count()],
        }
    }

    /// Applies one predicate. Returns false when the predicate turned out to
    /// be inert and must not count as active.
    pub(super) fn narrow(&mut self, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::EntitySelection { focal_id, depth } => {
                let Some(focal) = self.graph.index_of(focal_id) else {
                    return false;
                };
                self.keep_neighbourhood(focal, (*depth).max(1));
            }
            Predicate::CategoryEquality { label } => self.keep_category(label),
            Predicate::EdgeFocus { node_id } => {
                let Some(focus) = self.graph.index_of(node_id) else {
                    return false;
                };
                for (keep, edge) in self.edges.iter_mut().zip(self.graph.edges()) {
                    *keep &= edge.touches(focus);
                }
            }
            Predicate::Threshold { attribute, floor } => {
                if floor.is_nan() {
                    return false;
                }
                let attribute = attribute.as_deref().unwrap_or("weight");
                for (keep, edge) in self.edges.iter_mut().zip(self.graph.edges()) {
                    *keep &= edge.numeric(attribute).is_some_and(|value| value >= *floor);
                }
            }
        }

        self.drop_dangling_edges();
        true
    }

    fn keep_neighbourhood(&mut self, focal: usize, depth: usize) {
        if !self.nodes[focal] {
            self.nodes.fill(false);
            return;
        }

        let mut reached = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([(focal, 0usize)]);
        reached[focal] = true;

        while let Some((index, hops)) = queue.pop_front() {
            if hops >= depth {
                continue;
            }

            for (edge_index, edge) in self.graph.edges().iter().enumerate() {
                if !self.edges[edge_index] || !edge.touches(index) {
                    continue;
                }

                let next = if edge.source == index {
                    edge.target
                } else {
                    edge.source
                };
                if self.nodes[next] && !reached[next] {
                    reached[next] = true;
                    queue.push_back((next, hops + 1));
                }
            }
        }

        for (keep, reached) in self.nodes.iter_mut().zip(reached) {
            *keep &= reached;
        }
    }

    /// Edges survive only between two kept nodes, through
    /// `drop_dangling_edges`.
    fn keep_category(&mut self, label: &str) {
        for (keep, node) in self.nodes.iter_mut().zip(self.graph.nodes()) {
            *keep &= node.label == label;
        }
    }

    fn drop_dangling_edges(&mut self) {
        for (keep, edge) in self.edges.iter_mut().zip(self.graph.edges()) {
            *keep &= self.nodes[edge.source] && self.nodes[edge.target];
        }
    }

    /// Drops nodes that no retained edge touches.
    pub(super) fn prune_disconnected(&mut self) {
        let mut connected = vec![false; self.nodes.len()];
        for (edge, _) in self
            .graph
            .edges()
            .iter()
            .zip(&self.edges)
            .filter(|(_, keep)| **keep)
        {
            connected[edge.source] = true;
            connected[edge.target] = true;
        }

        for (keep, connected) in self.nodes.iter_mut().zip(connected) {
            *keep &= connected;
        }
        self.drop_dangling_edges();
    }

    /// Copies the kept nodes and edges into a fresh snapshot, re-indexing
    /// edge endpoints.
    pub(super) fn materialize(self) -> GraphSnapshot {
        let mut remap = vec![usize::MAX; self.nodes.len()];
        let mut nodes = Vec::new();
        for (index, node) in self.graph.nodes().iter().enumerate() {
            if self.nodes[index] {
                remap[index] = nodes.len();
                nodes.push(node.clone());
            }
        }

        let edges = self
            .graph
            .edges()
            .iter()
            .zip(&self.edges)
            .filter(|(_, keep)| **keep)
            .map(|(edge, _)| {
                let mut edge = edge.clone();
                edge.source = remap[edge.source];
                edge.target = remap[edge.target];
                edge
            })
            .collect();

        GraphSnapshot::from_parts(nodes, edges)
    }
}

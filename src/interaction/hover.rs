use eframe::egui::{Pos2, vec2};

use crate::filter::edge_endpoints;
use crate::model::{Edge, GraphSnapshot};
use crate::util::{format_number, format_value};

/// Layout bookkeeping keys that never show up in a node tooltip.
pub const POSITIONAL_KEYS: [&str; 7] = ["x", "y", "vx", "vy", "fx", "fy", "index"];

const MAX_SNIPPETS: usize = 5;
const TOOLTIP_OFFSET: f32 = 12.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub x: f32,
    pub y: f32,
    pub content_lines: Vec<String>,
}

/// Indices into the snapshot the hit test ran against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverTarget {
    Node(usize),
    Edge(usize),
}

/// Resolves what is under `pointer`. Nodes win over edges, and among
/// overlapping nodes the one drawn last wins. All coordinates are in the
/// same space, normally screen pixels.
pub fn hit_test(
    pointer: Pos2,
    positions: &[Pos2],
    radii: &[f32],
    edges: &[Edge],
    edge_tolerance: f32,
) -> Option<HoverTarget> {
    let node = (0..positions.len()).rev().find(|&index| {
        let radius = radii.get(index).copied().unwrap_or(0.0);
        positions[index].distance_sq(pointer) <= radius * radius
    });
    if let Some(index) = node {
        return Some(HoverTarget::Node(index));
    }

    edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| {
            !edge.is_loop() && edge.source < positions.len() && edge.target < positions.len()
        })
        .map(|(index, edge)| {
            let distance =
                distance_to_segment(pointer, positions[edge.source], positions[edge.target]);
            (index, distance)
        })
        .filter(|(_, distance)| *distance <= edge_tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| HoverTarget::Edge(index))
}

fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

/// Every non-positional attribute as `key: value`, then the node's
/// connections with their weights.
pub fn node_tooltip_lines(snapshot: &GraphSnapshot, index: usize) -> Vec<String> {
    let Some(node) = snapshot.nodes().get(index) else {
        return Vec::new();
    };

    let mut lines = node
        .attributes
        .iter()
        .filter(|(key, _)| !POSITIONAL_KEYS.contains(&key.as_str()))
        .map(|(key, value)| format!("{key}: {}", format_value(value)))
        .collect::<Vec<_>>();

    let connections = snapshot
        .incident(index)
        .map(|(edge, other)| {
            let direction = if edge.source == index { "→" } else { "←" };
            format!(
                "  {direction} {} ({})",
                snapshot.nodes()[other].id,
                format_number(edge.weight)
            )
        })
        .collect::<Vec<_>>();
    if !connections.is_empty() {
        lines.push(format!("connections: {}", connections.len()));
        lines.extend(connections);
    }

    lines
}

pub fn edge_tooltip_lines(snapshot: &GraphSnapshot, index: usize) -> Vec<String> {
    let Some(edge) = snapshot.edges().get(index) else {
        return Vec::new();
    };

    let (source, target) = edge_endpoints(snapshot, edge);
    let mut lines = vec![
        format!("{source} → {target}"),
        format!("weight: {}", format_number(edge.weight)),
    ];
    lines.extend(
        edge.snippets
            .iter()
            .take(MAX_SNIPPETS)
            .map(|snippet| format!("• {snippet}")),
    );
    lines
}

pub fn tooltip_for(snapshot: &GraphSnapshot, target: HoverTarget, pointer: Pos2) -> Tooltip {
    let content_lines = match target {
        HoverTarget::Node(index) => node_tooltip_lines(snapshot, index),
        HoverTarget::Edge(index) => edge_tooltip_lines(snapshot, index),
    };
    let anchor = pointer + vec2(TOOLTIP_OFFSET, TOOLTIP_OFFSET);
    Tooltip {
        x: anchor.x,
        y: anchor.y,
        content_lines,
    }
}

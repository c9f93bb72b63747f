//! Force-directed layout simulation.
//!
//! A [`LayoutSimulator`] owns all per-node kinematic state. The caller
//! hands it a filtered graph through [`LayoutSimulator::restart`] and then
//! calls [`LayoutSimulator::tick`] once per frame until it reports
//! convergence. Interaction code only touches node pins.

mod config;
mod forces;
mod quadtree;

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use eframe::egui::{Pos2, Vec2, vec2};
use tracing::{debug, warn};

use crate::model::GraphSnapshot;
use crate::util::stable_pair;

pub use config::LayoutConfig;
use forces::{
    ChargeParams, CollisionParams, LinkParams, accumulate_charge_for_node,
    accumulate_collision_pairs, apply_links,
};
use quadtree::Cell;

const DEFAULT_RADIUS: f32 = 9.0;
const SEED_SPACING: f32 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
    pub id: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pin: Option<Vec2>,
    /// Visual radius; collision adds the configured padding.
    pub radius: f32,
    /// Degree zero in the current graph: placed on the outer ring and left
    /// out of every force.
    pub isolated: bool,
}

impl SimNode {
    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }

    pub fn pos(&self) -> Pos2 {
        self.position.to_pos2()
    }
}

pub struct Frame<'a> {
    pub positions: HashMap<&'a str, Pos2>,
    /// Active edges as indices into [`LayoutSimulator::nodes`].
    pub edges: &'a [(usize, usize)],
    pub alpha: f32,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    predicted: Vec<Vec2>,
    radii: Vec<f32>,
    corrections: Vec<Vec2>,
}

pub struct LayoutSimulator {
    config: LayoutConfig,
    nodes: Vec<SimNode>,
    links: Vec<(usize, usize)>,
    degrees: Vec<usize>,
    index_by_id: HashMap<String, usize>,
    alpha: f32,
    alpha_target: f32,
    ticks: u64,
    scratch: Scratch,
}

impl Default for LayoutSimulator {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutSimulator {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            links: Vec::new(),
            degrees: Vec::new(),
            index_by_id: HashMap::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            ticks: 0,
            scratch: Scratch::default(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.index_of(id).map(|index| self.nodes[index].position)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Safe to stop ticking: alpha has cooled below `alpha_min` and nothing
    /// is holding it up.
    pub fn is_converged(&self) -> bool {
        self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
    }

    /// Replaces the simulated graph and re-heats to alpha 1. Nodes whose id
    /// was already simulated keep their position, velocity and pin.
    pub fn restart(&mut self, snapshot: &GraphSnapshot, radii: &[f32]) {
        let mut prior = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();
        let degrees = snapshot.degrees();

        let mut warm = 0usize;
        let mut fresh = 0usize;
        let mut nodes = Vec::with_capacity(snapshot.node_count());
        for (index, node) in snapshot.nodes().iter().enumerate() {
            let radius = radii.get(index).copied().unwrap_or(DEFAULT_RADIUS);
            let isolated = degrees[index] == 0;

            if let Some(mut existing) = prior.remove(&node.id) {
                existing.radius = radius;
                existing.isolated = isolated;
                nodes.push(existing);
                warm += 1;
            } else {
                nodes.push(SimNode {
                    id: node.id.clone(),
                    position: self.seed_position(fresh),
                    velocity: Vec2::ZERO,
                    pin: None,
                    radius,
                    isolated,
                });
                fresh += 1;
            }
        }

        self.index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        self.links = snapshot
            .edges()
            .iter()
            .filter(|edge| !edge.is_loop())
            .map(|edge| (edge.source, edge.target))
            .collect();
        self.nodes = nodes;
        self.degrees = degrees;
        self.alpha = 1.0;
        self.ticks = 0;
        self.place_isolated();

        debug!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            warm,
            fresh,
            "layout restarted"
        );
    }

    pub fn update_radii(&mut self, radii: &[f32]) {
        for (node, radius) in self.nodes.iter_mut().zip(radii) {
            node.radius = *radius;
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.degrees.clear();
        self.index_by_id.clear();
        self.alpha = 0.0;
        self.alpha_target = 0.0;
        self.ticks = 0;
    }

    /// Fixes `id` at `position` until [`LayoutSimulator::unpin`]. The node
    /// keeps acting on its neighbours. Non-finite positions are refused.
    pub fn pin(&mut self, id: &str, position: Vec2) -> bool {
        if !position.is_finite() {
            return false;
        }

        let Some(index) = self.index_of(id) else {
            return false;
        };

        let node = &mut self.nodes[index];
        node.pin = Some(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        let was_pinned = self.nodes[index].pin.take().is_some();
        self.place_isolated();
        was_pinned
    }

    pub fn unpin_all(&mut self) -> usize {
        let mut released = 0;
        for node in &mut self.nodes {
            if node.pin.take().is_some() {
                released += 1;
            }
        }
        self.place_isolated();
        released
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame {
            positions: self
                .nodes
                .iter()
                .map(|node| (node.id.as_str(), node.pos()))
                .collect(),
            edges: &self.links,
            alpha: self.alpha,
        }
    }

    /// Advances the simulation one step. Returns true while it should keep
    /// being ticked.
    pub fn tick(&mut self) -> bool {
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.ticks += 1;

        self.recover_non_finite();

        let participants = (0..self.nodes.len())
            .filter(|&index| !self.nodes[index].isolated)
            .collect::<Vec<_>>();
        if !participants.is_empty() {
            self.apply_forces(&participants);
            self.apply_centering(&participants);
        }

        self.place_isolated();
        self.recover_non_finite();
        !self.is_converged()
    }

    pub fn run_until_converged(&mut self, max_ticks: usize) -> usize {
        let mut taken = 0;
        while taken < max_ticks && !self.is_converged() {
            self.tick();
            taken += 1;
        }
        taken
    }

    fn apply_forces(&mut self, participants: &[usize]) {
        let Self {
            config,
            nodes,
            links,
            degrees,
            alpha,
            scratch,
            ..
        } = self;

        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.radii.clear();
        let mut max_radius = 0.0_f32;
        for node in nodes.iter() {
            let radius = node.radius.max(0.0) + config.collision_padding;
            scratch.positions.push(node.position);
            scratch.velocities.push(node.velocity);
            scratch.radii.push(radius);
            if !node.isolated {
                max_radius = max_radius.max(radius);
            }
        }

        apply_links(
            links,
            degrees,
            &scratch.positions,
            &mut scratch.velocities,
            LinkParams {
                distance: config.link_distance,
                strength: config.link_strength,
                alpha: *alpha,
            },
        );

        if let Some(tree) = Cell::build(&scratch.positions, participants.to_vec()) {
            let params = ChargeParams {
                strength: config.charge_strength,
                alpha: *alpha,
                theta: config.theta,
                distance_min_sq: config.charge_distance_min * config.charge_distance_min,
            };
            for &index in participants {
                accumulate_charge_for_node(
                    &tree,
                    index,
                    &scratch.positions,
                    params,
                    &mut scratch.velocities[index],
                );
            }
        }

        scratch.predicted.clear();
        scratch.predicted.extend(
            scratch
                .positions
                .iter()
                .zip(&scratch.velocities)
                .map(|(position, velocity)| *position + *velocity),
        );
        scratch.corrections.clear();
        scratch.corrections.resize(nodes.len(), Vec2::ZERO);

        let max_distance = max_radius * 2.0;
        if max_distance > 0.0
            && config.collision_strength > 0.0
            && let Some(tree) = Cell::build(&scratch.predicted, participants.to_vec())
        {
            accumulate_collision_pairs(
                &tree,
                &tree,
                true,
                &scratch.predicted,
                &scratch.radii,
                CollisionParams {
                    strength: config.collision_strength,
                    reach: max_distance,
                },
                &mut scratch.corrections,
            );
        }

        let retain = (1.0 - config.velocity_decay).clamp(0.0, 1.0);
        let max_speed_sq = config.max_speed * config.max_speed;
        for &index in participants {
            let node = &mut nodes[index];
            if let Some(pin) = node.pin {
                node.position = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = (scratch.velocities[index] + scratch.corrections[index]) * retain;
            let speed_sq = velocity.length_sq();
            if speed_sq > max_speed_sq {
                velocity *= config.max_speed / speed_sq.sqrt();
            }

            node.velocity = velocity;
            node.position += velocity;
        }
    }

    fn apply_centering(&mut self, participants: &[usize]) {
        let strength = self.config.center_strength.clamp(0.0, 1.0);
        if strength <= 0.0 {
            return;
        }

        let mut centroid = Vec2::ZERO;
        let mut count = 0usize;
        for &index in participants {
            if !self.nodes[index].is_pinned() {
                centroid += self.nodes[index].position;
                count += 1;
            }
        }
        if count == 0 {
            return;
        }

        centroid /= count as f32;
        let (cx, cy) = self.config.center();
        let shift = (vec2(cx, cy) - centroid) * strength;
        if !shift.is_finite() || shift.length_sq() <= 1e-12 {
            return;
        }

        for &index in participants {
            let node = &mut self.nodes[index];
            if !node.is_pinned() {
                node.position += shift;
            }
        }
    }

    fn place_isolated(&mut self) {
        let count = self.nodes.iter().filter(|node| node.isolated).count();
        if count == 0 {
            return;
        }

        let (cx, cy) = self.config.center();
        let center = vec2(cx, cy);
        let ring = self.config.isolated_ring_radius;
        for (slot, node) in self
            .nodes
            .iter_mut()
            .filter(|node| node.isolated)
            .enumerate()
        {
            node.velocity = Vec2::ZERO;
            if let Some(pin) = node.pin {
                node.position = pin;
                continue;
            }

            let angle = TAU * slot as f32 / count as f32;
            node.position = center + vec2(angle.cos(), angle.sin()) * ring;
        }
    }

    /// Phyllotaxis spiral around the center, so fresh nodes never start on
    /// top of each other.
    fn seed_position(&self, slot: usize) -> Vec2 {
        let (cx, cy) = self.config.center();
        let radius = SEED_SPACING * (0.5 + slot as f32).sqrt();
        let angle = slot as f32 * PI * (3.0 - 5.0_f32.sqrt());
        vec2(cx, cy) + vec2(angle.cos(), angle.sin()) * radius
    }

    fn recover_non_finite(&mut self) {
        let (cx, cy) = self.config.center();
        let mut recovered = 0usize;
        for node in &mut self.nodes {
            if node.position.is_finite() && node.velocity.is_finite() {
                continue;
            }

            let (jx, jy) = stable_pair(&node.id);
            node.position = node
                .pin
                .unwrap_or_else(|| vec2(cx, cy) + vec2(jx, jy) * (SEED_SPACING * 4.0));
            node.velocity = Vec2::ZERO;
            recovered += 1;
        }

        if recovered > 0 {
            warn!(recovered, "reset nodes with non-finite position or velocity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::normalize;
    use serde_json::{Value, json};

    fn snapshot(nodes: Value, edges: Value) -> GraphSnapshot {
        normalize(&nodes, &edges).unwrap().snapshot
    }

    fn star() -> GraphSnapshot {
        snapshot(
            json!([{"id": "hub"}, {"id": "n1"}, {"id": "n2"}, {"id": "n3"}, {"id": "n4"}]),
            json!([
                {"source": "hub", "target": "n1"},
                {"source": "hub", "target": "n2"},
                {"source": "hub", "target": "n3"},
                {"source": "hub", "target": "n4"}
            ]),
        )
    }

    fn assert_separated(simulator: &LayoutSimulator) {
        let padding = simulator.config().collision_padding;
        let nodes = simulator.nodes();
        for (offset, a) in nodes.iter().enumerate() {
            for b in &nodes[offset + 1..] {
                let min_distance = a.radius + b.radius + 2.0 * padding;
                let distance = (a.position - b.position).length();
                assert!(
                    distance >= min_distance - 0.5,
                    "{} and {} are {distance} apart, expected at least {min_distance}",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn empty_graph_ticks_without_work() {
        let mut simulator = LayoutSimulator::default();
        simulator.restart(&GraphSnapshot::default(), &[]);

        assert!(simulator.tick());
        let ticks = simulator.run_until_converged(1_000);
        assert!(simulator.is_converged());
        assert!(ticks < 1_000);
        assert!(simulator.frame().positions.is_empty());

        simulator.restart(&star(), &[10.0; 5]);
        simulator.clear();
        assert!(simulator.nodes().is_empty());
        assert!(simulator.is_converged());
    }

    #[test]
    fn converged_star_keeps_nodes_apart() {
        let graph = star();
        let mut simulator = LayoutSimulator::default();
        simulator.restart(&graph, &[12.0; 5]);

        simulator.run_until_converged(2_000);

        assert!(simulator.is_converged());
        assert!(simulator.alpha() < simulator.config().alpha_min);
        assert_separated(&simulator);
    }

    #[test]
    fn coincident_nodes_are_pulled_apart() {
        let graph = snapshot(
            json!([{"id": "a"}, {"id": "b"}]),
            json!([{"source": "a", "target": "b"}]),
        );
        let mut simulator = LayoutSimulator::default();
        simulator.restart(&graph, &[12.0, 12.0]);

        let spot = vec2(600.0, 400.0);
        assert!(simulator.pin("a", spot));
        assert!(simulator.pin("b", spot));
        simulator.unpin("a");
        simulator.unpin("b");
        simulator.set_alpha(1.0);

        simulator.run_until_converged(2_000);

        for node in simulator.nodes() {
            assert!(node.position.is_finite());
        }
        assert_separated(&simulator);
    }

    #[test]
    fn pinned_node_never_moves() {
        let graph = star();
        let mut simulator = LayoutSimulator::default();
        simulator.restart(&graph, &[10.0; 5]);

        let pin = vec2(100.0, 120.0);
        assert!(simulator.pin("hub", pin));
        simulator.set_alpha_target(0.3);

        for _ in 0..120 {
            simulator.tick();
            assert!(simulator.alpha() > 0.0);
            assert_eq!(simulator.position("hub"), Some(pin));
        }

        assert!(simulator.nodes()[1..].iter().all(|node| node.position != pin));
    }

    #[test]
    fn isolated_nodes_sit_on_ring() {
        let graph = snapshot(
            json!([{"id": "a"}, {"id": "b"}, {"id": "lonely-1"}, {"id": "lonely-2"}]),
            json!([{"source": "a", "target": "b"}]),
        );
        let mut simulator = LayoutSimulator::default();
        simulator.restart(&graph, &[10.0; 4]);

        for _ in 0..30 {
            simulator.tick();
        }

        let center = vec2(600.0, 400.0);
        let first = simulator.position("lonely-1").unwrap();
        let second = simulator.position("lonely-2").unwrap();
        assert!(((first - center).length() - 300.0).abs() < 1e-3);
        assert!(((second - center).length() - 300.0).abs() < 1e-3);
        assert!((first - vec2(900.0, 400.0)).length() < 1e-3);
        assert!((second - vec2(300.0, 400.0)).length() < 1e-3);
        assert!(simulator.nodes()[2].isolated);
        assert!(!simulator.nodes()[0].isolated);
    }

    #[test]
    fn restart_warm_starts_shared_ids() {
        let first = snapshot(
            json!([{"id": "a"}, {"id": "b"}, {"id": "c"}]),
            json!([{"source": "a", "target": "b"}, {"source": "b", "target": "c"}]),
        );
        let mut simulator = LayoutSimulator::default();
        simulator.restart(&first, &[10.0; 3]);
        for _ in 0..80 {
            simulator.tick();
        }
        assert_eq!(simulator.tick_count(), 80);
        let b_before = simulator.position("b").unwrap();

        let second = snapshot(
            json!([{"id": "b"}, {"id": "d"}]),
            json!([{"source": "b", "target": "d"}]),
        );
        simulator.restart(&second, &[10.0; 2]);

        assert_eq!(simulator.alpha(), 1.0);
        assert_eq!(simulator.tick_count(), 0);
        assert_eq!(simulator.position("b"), Some(b_before));
        assert_eq!(simulator.position("a"), None);
        assert_eq!(simulator.links(), &[(0, 1)]);
        assert!(simulator.position("d").unwrap().is_finite());
    }

    #[test]
    fn non_finite_state_is_recovered() {
        let graph = star();
        let mut simulator = LayoutSimulator::default();
        simulator.restart(&graph, &[10.0; 5]);
        simulator.nodes[1].position = vec2(f32::NAN, 0.0);
        simulator.nodes[2].velocity = vec2(f32::INFINITY, 1.0);

        simulator.tick();

        for node in simulator.nodes() {
            assert!(node.position.is_finite(), "{} not finite", node.id);
            assert!(node.velocity.is_finite());
        }
        assert!(!simulator.pin("hub", vec2(f32::NAN, 1.0)));
    }

    #[test]
    fn frame_exposes_positions_by_id() {
        let graph = star();
        let mut simulator = LayoutSimulator::default();
        simulator.restart(&graph, &[10.0; 5]);
        simulator.tick();

        let frame = simulator.frame();
        assert_eq!(frame.positions.len(), 5);
        assert_eq!(frame.edges.len(), 4);
        assert_eq!(
            frame.positions.get("hub").copied(),
            simulator.position("hub").map(Vec2::to_pos2)
        );
    }
}

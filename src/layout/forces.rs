use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::Cell;

/// Unit vector from `from` toward `to` for points that sit on top of each
/// other. Swapping the arguments flips the vector so a coincident pair is
/// pushed in opposite directions.
pub(super) fn jitter_direction(from: usize, to: usize) -> Vec2 {
    let (low, high) = if from < to { (from, to) } else { (to, from) };
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214 + 0.13) * TAU;
    let direction = vec2(angle.cos(), angle.sin());
    if from < to { direction } else { -direction }
}

#[derive(Clone, Copy)]
pub(super) struct LinkParams {
    pub(super) distance: f32,
    pub(super) strength: f32,
    pub(super) alpha: f32,
}

/// Spring pass over `links`, nudging the velocities of both endpoints
/// toward the preferred separation. The endpoint with more links moves less.
pub(super) fn apply_links(
    links: &[(usize, usize)],
    degrees: &[usize],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    params: LinkParams,
) {
    for &(source, target) in links {
        let predicted_source = positions[source] + velocities[source];
        let predicted_target = positions[target] + velocities[target];

        let mut delta = predicted_target - predicted_source;
        let mut distance = delta.length();
        if distance <= 0.0001 {
            delta = jitter_direction(source, target) * 0.001;
            distance = 0.001;
        }

        let source_degree = degrees[source].max(1) as f32;
        let target_degree = degrees[target].max(1) as f32;
        let strength = params.strength / source_degree.min(target_degree);
        let bias = source_degree / (source_degree + target_degree);

        let correction =
            delta * (((distance - params.distance) / distance) * params.alpha * strength);
        velocities[target] -= correction * bias;
        velocities[source] += correction * (1.0 - bias);
    }
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Negative values repel.
    pub(super) strength: f32,
    pub(super) alpha: f32,
    pub(super) theta: f32,
    pub(super) distance_min_sq: f32,
}

fn charge_between(
    index: usize,
    other: usize,
    point: Vec2,
    source: Vec2,
    weight: f32,
    params: ChargeParams,
) -> Vec2 {
    let mut delta = source - point;
    let mut distance_sq = delta.length_sq();
    if distance_sq <= 1e-8 {
        delta = jitter_direction(index, other);
        distance_sq = params.distance_min_sq.max(1.0);
    } else if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }

    delta * (params.strength * params.alpha * weight / distance_sq)
}

/// Barnes-Hut walk accumulating the many-body term for one point into
/// `velocity`. Far cells act through their centroid.
pub(super) fn accumulate_charge_for_node(
    node: &Cell,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.members {
            if other == index {
                continue;
            }
            *velocity += charge_between(index, other, point, positions[other], 1.0, params);
        }
        return;
    }

    if node.is_far_from(point, params.theta) {
        // index pair only matters for the coincident fallback, which a far
        // cell never triggers
        *velocity += charge_between(index, index, point, node.centroid, node.mass, params);
        return;
    }

    for child in node.children() {
        accumulate_charge_for_node(child, index, positions, params, velocity);
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    /// Largest center distance at which two circles can still overlap.
    pub(super) reach: f32,
}

fn resolve_overlap(
    from: usize,
    to: usize,
    predicted: &[Vec2],
    radii: &[f32],
    strength: f32,
    corrections: &mut [Vec2],
) {
    let min_distance = radii[from] + radii[to];
    let delta = predicted[from] - predicted[to];
    let distance_sq = delta.length_sq();
    if distance_sq >= min_distance * min_distance {
        return;
    }

    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        jitter_direction(to, from)
    };

    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = if from_sq + to_sq > 0.0 {
        to_sq / (from_sq + to_sq)
    } else {
        0.5
    };

    let push = direction * ((min_distance - distance) * strength);
    corrections[from] += push * share;
    corrections[to] -= push * (1.0 - share);
}

/// Dual-tree traversal over cell pairs close enough to hold overlapping
/// circles. Writes velocity corrections into `corrections`.
pub(super) fn accumulate_collision_pairs(
    node_a: &Cell,
    node_b: &Cell,
    same_node: bool,
    predicted: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    corrections: &mut [Vec2],
) {
    if !node_a.within_reach(node_b, params.reach) {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.members.iter().enumerate() {
                for &to in &node_a.members[offset + 1..] {
                    resolve_overlap(from, to, predicted, radii, params.strength, corrections);
                }
            }
        } else {
            for &from in &node_a.members {
                for &to in &node_b.members {
                    resolve_overlap(from, to, predicted, radii, params.strength, corrections);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children();
        for (first, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(
                child_a, child_a, true, predicted, radii, params, corrections,
            );
            for child_b in &children[first + 1..] {
                accumulate_collision_pairs(
                    child_a, child_b, false, predicted, radii, params, corrections,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.width() >= node_b.width()
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, predicted, radii, params, corrections);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, predicted, radii, params, corrections);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_is_antisymmetric() {
        let forward = jitter_direction(2, 5);
        let backward = jitter_direction(5, 2);
        assert!((forward + backward).length() < 1e-6);
        assert!((forward.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn charge_pushes_points_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = Cell::build(&positions, vec![0, 1]).unwrap();
        let params = ChargeParams {
            strength: -250.0,
            alpha: 1.0,
            theta: 0.9,
            distance_min_sq: 1.0,
        };

        let mut left = Vec2::ZERO;
        accumulate_charge_for_node(&tree, 0, &positions, params, &mut left);
        let mut right = Vec2::ZERO;
        accumulate_charge_for_node(&tree, 1, &positions, params, &mut right);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left + right).length() < 1e-4);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let positions = vec![vec2(0.0, 0.0), vec2(300.0, 0.0)];
        let mut velocities = vec![Vec2::ZERO; 2];
        apply_links(
            &[(0, 1)],
            &[1, 1],
            &positions,
            &mut velocities,
            LinkParams {
                distance: 100.0,
                strength: 0.5,
                alpha: 1.0,
            },
        );

        assert!(velocities[0].x > 0.0);
        assert!(velocities[1].x < 0.0);
    }

    #[test]
    fn overlapping_circles_get_separated() {
        let predicted = vec![vec2(0.0, 0.0), vec2(4.0, 0.0), vec2(400.0, 0.0)];
        let radii = vec![10.0, 10.0, 10.0];
        let tree = Cell::build(&predicted, vec![0, 1, 2]).unwrap();
        let mut corrections = vec![Vec2::ZERO; 3];

        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            &predicted,
            &radii,
            CollisionParams {
                strength: 1.0,
                reach: 40.0,
            },
            &mut corrections,
        );

        assert_eq!(corrections[0].x, -8.0);
        assert_eq!(corrections[1].x, 8.0);
        assert_eq!(corrections[2], Vec2::ZERO);
    }
}

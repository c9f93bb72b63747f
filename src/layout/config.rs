use serde::{Deserialize, Serialize};

/// Simulation tunables. Every field falls back to its default when absent
/// from a config file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Canvas the layout is centered in, in world units.
    pub width: f32,
    pub height: f32,
    pub link_distance: f32,
    /// Divided by the smaller endpoint degree for each link.
    pub link_strength: f32,
    pub charge_strength: f32,
    pub theta: f32,
    pub charge_distance_min: f32,
    pub center_strength: f32,
    /// Added to each node's visual radius to form its collision radius.
    pub collision_padding: f32,
    pub collision_strength: f32,
    pub isolated_ring_radius: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub max_speed: f32,
    /// Alpha target while a drag is active.
    pub reheat_alpha_target: f32,
}

impl LayoutConfig {
    pub fn center(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            width: 1200.0,
            height: 800.0,
            link_distance: 100.0,
            link_strength: 0.5,
            charge_strength: -250.0,
            theta: 0.9,
            charge_distance_min: 1.0,
            center_strength: 1.0,
            collision_padding: 5.0,
            collision_strength: 1.0,
            isolated_ring_radius: 300.0,
            alpha_min,
            // reaches alpha_min from 1.0 in 300 ticks
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            max_speed: 160.0,
            reheat_alpha_target: 0.3,
        }
    }
}

//! Pointer handling that sits between egui input and the simulation.
//!
//! Dragging is a pure transition function over [`DragState`]; the resulting
//! [`Effect`]s are applied to a [`LayoutSimulator`] explicitly so the state
//! machine can be exercised without a running simulation.

mod hover;
mod transform;

use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::LayoutSimulator;

pub use hover::{
    HoverTarget, POSITIONAL_KEYS, Tooltip, edge_tooltip_lines, hit_test, node_tooltip_lines,
    tooltip_for,
};
pub use transform::{MAX_SCALE, MIN_SCALE, ViewTransform};

pub type PointerId = u64;

/// What happens to a dragged node when it is released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    #[default]
    Unpin,
    KeepPinned,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        node_id: String,
        /// Node position minus the world-space grab point.
        grab_offset: Vec2,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum PointerEvent {
    /// `node` carries the id and current position of the node under the
    /// pointer, if any.
    Down {
        world: Pos2,
        node: Option<(String, Pos2)>,
    },
    Move {
        world: Pos2,
    },
    Up,
    Leave,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Pin { node_id: String, position: Pos2 },
    Unpin { node_id: String },
    Reheat { alpha_target: f32 },
    Cool,
}

pub fn transition(
    state: DragState,
    event: &PointerEvent,
    policy: ReleasePolicy,
    reheat_target: f32,
) -> (DragState, Vec<Effect>) {
    match (state, event) {
        (
            DragState::Idle,
            PointerEvent::Down {
                world,
                node: Some((node_id, position)),
            },
        ) => {
            let effects = vec![
                Effect::Pin {
                    node_id: node_id.clone(),
                    position: *position,
                },
                Effect::Reheat {
                    alpha_target: reheat_target,
                },
            ];
            let state = DragState::Dragging {
                node_id: node_id.clone(),
                grab_offset: *position - *world,
            };
            (state, effects)
        }
        (
            DragState::Dragging {
                node_id,
                grab_offset,
            },
            PointerEvent::Move { world },
        ) => {
            let effects = vec![Effect::Pin {
                node_id: node_id.clone(),
                position: *world + grab_offset,
            }];
            (
                DragState::Dragging {
                    node_id,
                    grab_offset,
                },
                effects,
            )
        }
        (DragState::Dragging { node_id, .. }, PointerEvent::Up | PointerEvent::Leave) => {
            let mut effects = Vec::with_capacity(2);
            if policy == ReleasePolicy::Unpin {
                effects.push(Effect::Unpin { node_id });
            }
            effects.push(Effect::Cool);
            (DragState::Idle, effects)
        }
        (state, _) => (state, Vec::new()),
    }
}

#[derive(Debug)]
pub struct InteractionController {
    drags: HashMap<PointerId, DragState>,
    policy: ReleasePolicy,
    reheat_target: f32,
}

impl InteractionController {
    pub fn new(policy: ReleasePolicy, reheat_target: f32) -> Self {
        Self {
            drags: HashMap::new(),
            policy,
            reheat_target,
        }
    }

    pub fn policy(&self) -> ReleasePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ReleasePolicy) {
        self.policy = policy;
    }

    pub fn state(&self, pointer: PointerId) -> &DragState {
        static IDLE: DragState = DragState::Idle;
        self.drags.get(&pointer).unwrap_or(&IDLE)
    }

    pub fn is_dragging(&self) -> bool {
        !self.drags.is_empty()
    }

    pub fn dragged_node(&self, pointer: PointerId) -> Option<&str> {
        match self.drags.get(&pointer)? {
            DragState::Dragging { node_id, .. } => Some(node_id),
            DragState::Idle => None,
        }
    }

    /// Runs one pointer event through the state machine. `Cool` is held
    /// back while another pointer is still dragging.
    pub fn handle(&mut self, pointer: PointerId, event: &PointerEvent) -> Vec<Effect> {
        let state = self.drags.remove(&pointer).unwrap_or_default();
        let (next, mut effects) = transition(state, event, self.policy, self.reheat_target);
        if next != DragState::Idle {
            self.drags.insert(pointer, next);
        }

        if self.is_dragging() {
            effects.retain(|effect| *effect != Effect::Cool);
        }
        effects
    }

    pub fn cancel_missing(&mut self, simulator: &LayoutSimulator) -> Vec<Effect> {
        let before = self.drags.len();
        self.drags.retain(|_, state| match state {
            DragState::Dragging { node_id, .. } => simulator.index_of(node_id).is_some(),
            DragState::Idle => false,
        });

        if before > 0 && self.drags.is_empty() {
            debug!(cancelled = before, "drag target left the graph");
            vec![Effect::Cool]
        } else {
            Vec::new()
        }
    }

    pub fn apply_effects(effects: &[Effect], simulator: &mut LayoutSimulator) {
        for effect in effects {
            match effect {
                Effect::Pin { node_id, position } => {
                    simulator.pin(node_id, position.to_vec2());
                }
                Effect::Unpin { node_id } => {
                    simulator.unpin(node_id);
                }
                Effect::Reheat { alpha_target } => simulator.set_alpha_target(*alpha_target),
                Effect::Cool => simulator.set_alpha_target(0.0),
            }
        }
    }
}

use eframe::egui::{self, Pos2, Rect, Ui};

use entigraph::interaction::{HoverTarget, InteractionController, PointerEvent, PointerId, hit_test};

use super::super::ViewModel;

const MOUSE: PointerId = 0;
const EDGE_HOVER_TOLERANCE: f32 = 4.0;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.transform.zoom_at(pointer, zoom_factor);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || (self.panning && response.dragged_by(egui::PointerButton::Primary))
        {
            self.transform.pan(response.drag_delta());
        }
    }

    /// Feeds primary-button drags on nodes into the drag state machine.
    /// A primary drag that starts on empty canvas pans instead.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) {
        let pointer = ui.input(|input| input.pointer.interact_pos());

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(pointer) = pointer
        {
            let node = match hit_test(pointer, screen_positions, screen_radii, &[], 0.0) {
                Some(HoverTarget::Node(index)) => self
                    .simulator
                    .nodes()
                    .get(index)
                    .map(|node| (node.id.clone(), node.pos())),
                _ => None,
            };
            self.panning = node.is_none();

            let event = PointerEvent::Down {
                world: self.transform.to_world(pointer),
                node,
            };
            self.dispatch(&event);
        } else if response.dragged_by(egui::PointerButton::Primary)
            && self.controller.is_dragging()
            && let Some(pointer) = pointer
        {
            let event = PointerEvent::Move {
                world: self.transform.to_world(pointer),
            };
            self.dispatch(&event);
        }

        if response.drag_stopped() {
            self.panning = false;
            self.dispatch(&PointerEvent::Up);
        } else if self.controller.is_dragging() && pointer.is_none() {
            self.dispatch(&PointerEvent::Leave);
        }
    }

    pub(in crate::app) fn hovered_target(
        &self,
        pointer: Option<Pos2>,
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<HoverTarget> {
        let pointer = pointer.filter(|pointer| rect.contains(*pointer))?;
        hit_test(
            pointer,
            screen_positions,
            screen_radii,
            self.filtered.edges(),
            EDGE_HOVER_TOLERANCE,
        )
    }

    fn dispatch(&mut self, event: &PointerEvent) {
        let effects = self.controller.handle(MOUSE, event);
        InteractionController::apply_effects(&effects, &mut self.simulator);
    }
}

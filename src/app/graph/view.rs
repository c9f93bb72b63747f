use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, vec2};

use entigraph::interaction::{HoverTarget, Tooltip, tooltip_for};
use entigraph::util::short_label;

use super::super::ViewModel;
use super::super::render_utils::{
    arrow_head, blend_color, circle_visible, dim_color, draw_background, edge_visible, edge_width,
};

const LABEL_CHARS: usize = 24;

impl ViewModel {
    fn screen_space(&self) -> (Vec<Pos2>, Vec<f32>) {
        self.simulator
            .nodes()
            .iter()
            .map(|node| {
                (
                    self.transform.to_screen(node.pos()),
                    self.transform.to_screen_length(node.radius).max(2.0),
                )
            })
            .unzip()
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if !self.fitted {
            let config = self.simulator.config();
            let (width, height) = (config.width, config.height);
            self.transform.fit_canvas(rect, width, height);
            self.fitted = true;
        }

        draw_background(&painter, rect, &self.transform);

        if self.filtered.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes match the current filters.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        let (screen_positions, screen_radii) = self.screen_space();
        self.handle_node_drag(ui, &response, &screen_positions, &screen_radii);

        if self.live_layout && !self.simulator.is_converged() {
            self.simulator.tick();
            ui.ctx().request_repaint();
        }

        let (screen_positions, screen_radii) = self.screen_space();
        let pointer = ui.input(|input| input.pointer.hover_pos());
        let target = if self.controller.is_dragging() {
            None
        } else {
            self.hovered_target(pointer, rect, &screen_positions, &screen_radii)
        };
        self.hovered_node = match target {
            Some(HoverTarget::Node(index)) => Some(index),
            _ => None,
        };
        self.hover = match (target, pointer) {
            (Some(target), Some(pointer)) => Some(tooltip_for(&self.filtered, target, pointer)),
            _ => None,
        };
        if target.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let hovered_edge = match target {
            Some(HoverTarget::Edge(index)) => Some(index),
            _ => None,
        };
        let focus = self.hovered_node;
        let scale = self.transform.scale;

        for (index, edge) in self.filtered.edges().iter().enumerate() {
            if edge.is_loop() {
                continue;
            }

            let start = screen_positions[edge.source];
            let end = screen_positions[edge.target];
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let touches_focus = focus.is_some_and(|focus| edge.touches(focus));
            let base = Color32::from_rgba_unmultiplied(130, 138, 150, 150);
            let color = if hovered_edge == Some(index) || touches_focus {
                blend_color(base, Color32::from_rgb(241, 146, 94), 0.8)
            } else if focus.is_some() {
                dim_color(base, 0.45)
            } else {
                base
            };
            let width = edge_width(edge.weight, scale);

            painter.line_segment([start, end], Stroke::new(width, color));
            let arrow_size = (5.0 + width * 1.5).min(14.0);
            if let Some(points) = arrow_head(start, end, screen_radii[edge.target], arrow_size) {
                painter.add(egui::Shape::convex_polygon(
                    points.to_vec(),
                    color,
                    Stroke::NONE,
                ));
            }
        }

        let neighbours = focus
            .map(|focus| {
                self.filtered
                    .incident(focus)
                    .map(|(_, other)| other)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        for (index, node) in self.simulator.nodes().iter().enumerate() {
            let position = screen_positions[index];
            let radius = screen_radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let base = self
                .encoded
                .colors
                .get(index)
                .copied()
                .unwrap_or(Color32::GRAY);
            let is_focus = focus == Some(index);
            let color = if is_focus {
                blend_color(base, Color32::from_rgb(255, 164, 101), 0.7)
            } else if focus.is_some() && !neighbours.contains(&index) {
                dim_color(base, 0.5)
            } else {
                base
            };

            painter.circle_filled(position, radius, color);
            let stroke = if node.is_pinned() {
                Stroke::new(2.2, Color32::from_rgb(245, 206, 93))
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, stroke);

            let draw_label =
                is_focus || (self.show_labels && (radius > 14.0 || scale > 1.35 || node.isolated));
            if draw_label {
                let text = match self.filtered.nodes().get(index) {
                    Some(source) if !source.label.is_empty() && is_focus => {
                        format!("{} [{}]", short_label(&node.id, LABEL_CHARS), source.label)
                    }
                    _ => short_label(&node.id, LABEL_CHARS),
                };
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    text,
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(tooltip) = &self.hover {
            draw_tooltip(&painter, tooltip);
        }
    }
}

fn draw_tooltip(painter: &egui::Painter, tooltip: &Tooltip) {
    if tooltip.content_lines.is_empty() {
        return;
    }

    let galley = painter.layout_no_wrap(
        tooltip.content_lines.join("\n"),
        FontId::proportional(12.5),
        Color32::from_gray(235),
    );
    let origin = Pos2::new(tooltip.x, tooltip.y);
    let frame = egui::Rect::from_min_size(origin, galley.size()).expand(6.0);
    painter.rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(12, 14, 18, 235));
    painter.rect_stroke(
        frame,
        4.0,
        Stroke::new(1.0, Color32::from_gray(70)),
        egui::StrokeKind::Inside,
    );
    painter.galley(origin, galley, Color32::from_gray(235));
}

use eframe::egui::{self, Align, Context, Layout};

use entigraph::ViewerConfig;
use entigraph::encoding::{EncodingSpec, encode};
use entigraph::filter::FilterSpec;
use entigraph::interaction::{InteractionController, ViewTransform};
use entigraph::layout::LayoutSimulator;
use entigraph::source::LoadedDataset;

use super::super::{FilterDraft, ShellRequest, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(
        loaded: LoadedDataset,
        config: &ViewerConfig,
        encoding: EncodingSpec,
        filters: FilterSpec,
    ) -> Self {
        let full = loaded.normalized.snapshot;
        let draft = FilterDraft {
            entity_depth: 1,
            threshold_attribute: "weight".to_owned(),
            ..FilterDraft::default()
        };

        Self {
            dataset: loaded.name,
            encoded: encode(&full, &encoding),
            filtered: full.clone(),
            full,
            dropped_edges: loaded.normalized.dropped_edges,
            encoding,
            filters,
            draft,
            simulator: LayoutSimulator::new(config.layout),
            controller: InteractionController::new(
                config.release_policy,
                config.layout.reheat_alpha_target,
            ),
            transform: ViewTransform::default(),
            fitted: false,
            panning: false,
            hover: None,
            hovered_node: None,
            live_layout: true,
            show_labels: true,
            graph_dirty: true,
            encoding_dirty: false,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        datasets: &[String],
        is_loading: bool,
        shell: &mut ShellRequest,
    ) {
        if self.graph_dirty {
            self.rebuild_graph();
        } else if self.encoding_dirty {
            self.reencode();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("entigraph");
                    ui.separator();

                    let mut selected = self.dataset.clone();
                    egui::ComboBox::from_id_salt("dataset")
                        .selected_text(selected.as_str())
                        .show_ui(ui, |ui| {
                            for name in datasets {
                                ui.selectable_value(&mut selected, name.clone(), name.as_str());
                            }
                        });
                    if selected != self.dataset {
                        shell.dataset = Some(selected);
                    }

                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        shell.reload = true;
                    }
                    if is_loading {
                        ui.spinner();
                    }

                    ui.separator();
                    ui.label(format!(
                        "nodes: {}/{}",
                        self.filtered.node_count(),
                        self.full.node_count()
                    ));
                    ui.label(format!(
                        "edges: {}/{}",
                        self.filtered.edge_count(),
                        self.full.edge_count()
                    ));
                    if self.dropped_edges > 0 {
                        ui.label(format!("dropped: {}", self.dropped_edges))
                            .on_hover_text("Edges whose endpoints did not resolve to a node.");
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let ticks = self.simulator.tick_count();
                        let status = if self.simulator.is_converged() {
                            format!("settled after {ticks} ticks")
                        } else {
                            format!("alpha {:.3} · tick {ticks}", self.simulator.alpha())
                        };
                        ui.label(status);
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }
}

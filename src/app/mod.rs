use std::sync::Arc;

use eframe::egui::{self, Context};
use tracing::{info, warn};

use entigraph::ViewerConfig;
use entigraph::encoding::{EncodedGraph, EncodingSpec};
use entigraph::filter::FilterSpec;
use entigraph::interaction::{InteractionController, Tooltip, ViewTransform};
use entigraph::layout::LayoutSimulator;
use entigraph::model::GraphSnapshot;
use entigraph::source::{GraphLoader, GraphSource, LoadEvent, LoadedDataset};

mod graph;
mod render_utils;
mod ui;

pub struct EntigraphApp {
    loader: GraphLoader,
    config: ViewerConfig,
    datasets: Vec<String>,
    /// Dataset of the newest request, shown while it loads.
    requested: Option<String>,
    state: AppState,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
    Error(String),
    /// The worker went away without answering.
    Unavailable,
    NoDatasets,
}

struct ViewModel {
    dataset: String,
    full: GraphSnapshot,
    dropped_edges: usize,
    filtered: GraphSnapshot,
    encoded: EncodedGraph,
    encoding: EncodingSpec,
    filters: FilterSpec,
    draft: FilterDraft,
    simulator: LayoutSimulator,
    controller: InteractionController,
    transform: ViewTransform,
    fitted: bool,
    panning: bool,
    hover: Option<Tooltip>,
    hovered_node: Option<usize>,
    live_layout: bool,
    show_labels: bool,
    graph_dirty: bool,
    encoding_dirty: bool,
}

/// Editable values behind the predicate widgets, kept apart from the
/// active [`FilterSpec`] so half-typed input never reaches the filter.
#[derive(Default)]
struct FilterDraft {
    category: String,
    entity_query: String,
    entity_depth: usize,
    focus_query: String,
    threshold_attribute: String,
    threshold_floor: f64,
}

/// What the UI asked the shell to do this frame.
#[derive(Default)]
struct ShellRequest {
    dataset: Option<String>,
    reload: bool,
}

impl EntigraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: Arc<dyn GraphSource>,
        config: ViewerConfig,
        dataset: Option<String>,
    ) -> Self {
        let datasets = match source.datasets() {
            Ok(datasets) => datasets,
            Err(error) => {
                warn!("failed to list datasets: {error:#}");
                Vec::new()
            }
        };

        let mut app = Self {
            loader: GraphLoader::new(source),
            config,
            datasets,
            requested: None,
            state: AppState::NoDatasets,
        };

        if let Some(initial) = dataset.or_else(|| app.datasets.first().cloned()) {
            app.request(initial);
        }
        app
    }

    fn request(&mut self, dataset: String) {
        self.loader.request(&dataset);
        self.requested = Some(dataset);
        if !matches!(self.state, AppState::Ready(_)) {
            self.state = AppState::Loading;
        }
    }

    fn on_loaded(&mut self, loaded: LoadedDataset) {
        info!(dataset = %loaded.name, "showing dataset");
        let (encoding, filters) = match &self.state {
            AppState::Ready(model) => (model.encoding.clone(), model.filters.clone()),
            _ => (self.config.encoding.clone(), self.config.filters.clone()),
        };

        self.state = AppState::Ready(Box::new(ViewModel::new(
            loaded,
            &self.config,
            encoding,
            filters,
        )));
    }

    fn show_centered(ctx: &Context, heading: &str, body: Option<&str>) -> bool {
        let mut retry = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                ui.heading(heading);
                if let Some(body) = body {
                    ui.add_space(6.0);
                    ui.label(body);
                }
                ui.add_space(10.0);
                retry = ui.button("Retry").clicked();
            });
        });
        retry
    }
}

impl eframe::App for EntigraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        match self.loader.poll() {
            Some(LoadEvent::Loaded(loaded)) => self.on_loaded(loaded),
            Some(LoadEvent::Failed(error)) => {
                warn!("dataset load failed: {error}");
                self.state = AppState::Error(error);
            }
            Some(LoadEvent::WorkerLost) => {
                warn!("dataset worker exited without a result");
                self.state = AppState::Unavailable;
            }
            None => {}
        }

        let is_loading = self.loader.is_loading();
        if is_loading {
            ctx.request_repaint();
        }

        let mut shell = ShellRequest::default();
        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                shell.reload =
                    Self::show_centered(ctx, "Failed to load graph", Some(error.as_str()));
            }
            AppState::Unavailable => {
                shell.reload = Self::show_centered(ctx, "Data unavailable", None);
            }
            AppState::NoDatasets => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("No datasets found");
                        ui.label("Point --data-dir at a directory of <name>.json graph files.");
                    });
                });
            }
            AppState::Ready(model) => {
                model.show(ctx, &self.datasets, is_loading, &mut shell);
            }
        }

        if let Some(dataset) = shell.dataset {
            self.request(dataset);
        } else if shell.reload
            && !is_loading
            && let Some(dataset) = self.requested.clone()
        {
            self.request(dataset);
        }
    }
}

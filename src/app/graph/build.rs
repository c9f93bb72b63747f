use tracing::debug;

use entigraph::encoding::encode;
use entigraph::filter;
use entigraph::interaction::InteractionController;

use super::super::ViewModel;

impl ViewModel {
    /// Re-derives the filtered graph, its encoding and the simulation.
    pub(in crate::app) fn rebuild_graph(&mut self) {
        self.filtered = filter::apply(&self.full, &self.filters);
        self.encoded = encode(&self.filtered, &self.encoding);
        self.simulator.restart(&self.filtered, &self.encoded.radii);

        let effects = self.controller.cancel_missing(&self.simulator);
        InteractionController::apply_effects(&effects, &mut self.simulator);

        self.hover = None;
        self.hovered_node = None;
        self.graph_dirty = false;
        self.encoding_dirty = false;

        debug!(
            dataset = %self.dataset,
            nodes = self.filtered.node_count(),
            edges = self.filtered.edge_count(),
            "graph rebuilt"
        );
    }

    /// Metric change only: radii and colors move, positions stay.
    pub(in crate::app) fn reencode(&mut self) {
        self.encoded = encode(&self.filtered, &self.encoding);
        self.simulator.update_radii(&self.encoded.radii);
        self.simulator.set_alpha(self.simulator.alpha().max(0.1));
        self.encoding_dirty = false;
    }
}

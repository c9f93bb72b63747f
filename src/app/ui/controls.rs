use eframe::egui::{self, Color32, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use entigraph::encoding::DEGREE_METRIC;
use entigraph::filter::Predicate;
use entigraph::interaction::ReleasePolicy;
use entigraph::model::GraphSnapshot;
use entigraph::util::{format_number, short_label};

use super::super::ViewModel;

const ENTITY_RESULTS: usize = 12;
const CATEGORY_FILTER: &str = "category";
const ENTITY_FILTER: &str = "entity";
const EDGE_FOCUS_FILTER: &str = "edge_focus";
const THRESHOLD_FILTER: &str = "threshold";

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Node indices whose id fuzzy-matches `query`, best first.
fn entity_matches(snapshot: &GraphSnapshot, query: &str, limit: usize) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = snapshot
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            fuzzy_match_score(&matcher, &node.id, query).map(|score| (index, score))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored.into_iter().map(|(index, _)| index).collect()
}

fn describe(predicate: &Predicate) -> String {
    match predicate {
        Predicate::EntitySelection { focal_id, depth } => {
            format!("within {} of {}", (*depth).max(1), short_label(focal_id, 28))
        }
        Predicate::CategoryEquality { label } => format!("label = {label}"),
        Predicate::EdgeFocus { node_id } => format!("edges of {}", short_label(node_id, 28)),
        Predicate::Threshold { attribute, floor } => format!(
            "{} ≥ {}",
            attribute.as_deref().unwrap_or("weight"),
            format_number(*floor)
        ),
    }
}

/// Picks a node from a fuzzy-filtered list. Returns the clicked id.
fn entity_picker(ui: &mut Ui, snapshot: &GraphSnapshot, query: &mut String, salt: &str) -> Option<String> {
    ui.add(egui::TextEdit::singleline(query).hint_text("search entities"));

    let mut picked = None;
    egui::ScrollArea::vertical()
        .id_salt(salt)
        .max_height(140.0)
        .show(ui, |ui| {
            for index in entity_matches(snapshot, query, ENTITY_RESULTS) {
                let node = &snapshot.nodes()[index];
                let text = if node.label.is_empty() {
                    short_label(&node.id, 36)
                } else {
                    format!("{}  ({})", short_label(&node.id, 36), node.label)
                };
                if ui.selectable_label(false, text).clicked() {
                    picked = Some(node.id.clone());
                }
            }
        });
    picked
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Encoding");
        ui.separator();
        self.draw_encoding_controls(ui);

        ui.add_space(10.0);
        ui.heading("Filters");
        ui.separator();
        self.draw_active_filters(ui);
        ui.add_space(6.0);
        self.draw_filter_editors(ui);

        ui.add_space(10.0);
        ui.heading("Layout");
        ui.separator();
        self.draw_layout_controls(ui);
    }

    fn draw_encoding_controls(&mut self, ui: &mut Ui) {
        let mut metrics = self.full.metric_names();
        if !metrics.iter().any(|name| name == DEGREE_METRIC) {
            metrics.push(DEGREE_METRIC.to_owned());
        }

        let before = self.encoding.clone();
        egui::ComboBox::from_label("size")
            .selected_text(self.encoding.size_metric.as_str())
            .show_ui(ui, |ui| {
                for name in &metrics {
                    ui.selectable_value(&mut self.encoding.size_metric, name.clone(), name.as_str());
                }
            });
        egui::ComboBox::from_label("color")
            .selected_text(self.encoding.color_metric.as_str())
            .show_ui(ui, |ui| {
                for name in &metrics {
                    ui.selectable_value(&mut self.encoding.color_metric, name.clone(), name.as_str());
                }
            });
        if self.encoding != before {
            self.encoding_dirty = true;
        }

        let scale = self.encoded.color_scale.scale();
        match scale.domain() {
            Some((low, high)) => {
                ui.label(format!(
                    "{}: {} … {}",
                    self.encoding.color_metric,
                    format_number(low),
                    format_number(high)
                ));
            }
            None => {
                ui.label(
                    RichText::new(format!("no node carries {}", self.encoding.color_metric))
                        .color(Color32::from_gray(150)),
                );
            }
        }
    }

    fn draw_active_filters(&mut self, ui: &mut Ui) {
        if self.filters.predicates.is_empty() {
            ui.label(RichText::new("No filters").color(Color32::from_gray(150)));
            return;
        }

        let mut removed = None;
        let mut toggled = false;
        for entry in &mut self.filters.predicates {
            ui.horizontal(|ui| {
                toggled |= ui
                    .checkbox(&mut entry.enabled, describe(&entry.predicate))
                    .changed();
                if ui.small_button("✖").on_hover_text("Remove filter").clicked() {
                    removed = Some(entry.name.clone());
                }
            });
        }

        if let Some(name) = removed {
            self.filters.remove(&name);
            toggled = true;
        }
        if ui.button("Clear filters").clicked() {
            self.filters.predicates.clear();
            toggled = true;
        }
        if toggled {
            self.graph_dirty = true;
        }
    }

    fn draw_filter_editors(&mut self, ui: &mut Ui) {
        let mut changed = false;

        egui::CollapsingHeader::new("Category")
            .default_open(true)
            .show(ui, |ui| {
                let labels = self.full.labels();
                ui.horizontal(|ui| {
                    egui::ComboBox::from_id_salt("category")
                        .selected_text(self.draft.category.as_str())
                        .show_ui(ui, |ui| {
                            for label in &labels {
                                ui.selectable_value(
                                    &mut self.draft.category,
                                    label.clone(),
                                    label.as_str(),
                                );
                            }
                        });
                    let can_apply = !self.draft.category.is_empty();
                    if ui.add_enabled(can_apply, egui::Button::new("Apply")).clicked() {
                        self.filters.upsert(
                            CATEGORY_FILTER,
                            Predicate::CategoryEquality {
                                label: self.draft.category.clone(),
                            },
                        );
                        changed = true;
                    }
                });
            });

        egui::CollapsingHeader::new("Entity neighbourhood")
            .default_open(true)
            .show(ui, |ui| {
                let depth_changed = ui
                    .add(egui::Slider::new(&mut self.draft.entity_depth, 1..=4).text("hops"))
                    .changed();
                if depth_changed
                    && let Some(entry) = self.filters.get(ENTITY_FILTER)
                    && let Predicate::EntitySelection { focal_id, .. } = &entry.predicate
                {
                    let focal_id = focal_id.clone();
                    self.filters.upsert(
                        ENTITY_FILTER,
                        Predicate::EntitySelection {
                            focal_id,
                            depth: self.draft.entity_depth,
                        },
                    );
                    changed = true;
                }

                if let Some(focal_id) =
                    entity_picker(ui, &self.full, &mut self.draft.entity_query, "entity")
                {
                    self.filters.upsert(
                        ENTITY_FILTER,
                        Predicate::EntitySelection {
                            focal_id,
                            depth: self.draft.entity_depth,
                        },
                    );
                    changed = true;
                }
            });

        egui::CollapsingHeader::new("Edge focus")
            .default_open(false)
            .show(ui, |ui| {
                if let Some(node_id) =
                    entity_picker(ui, &self.full, &mut self.draft.focus_query, "edge_focus")
                {
                    self.filters
                        .upsert(EDGE_FOCUS_FILTER, Predicate::EdgeFocus { node_id });
                    changed = true;
                }
            });

        egui::CollapsingHeader::new("Edge threshold")
            .default_open(true)
            .show(ui, |ui| {
                let attributes = self.full.edge_metric_names();
                egui::ComboBox::from_id_salt("threshold_attribute")
                    .selected_text(self.draft.threshold_attribute.as_str())
                    .show_ui(ui, |ui| {
                        for name in &attributes {
                            ui.selectable_value(
                                &mut self.draft.threshold_attribute,
                                name.clone(),
                                name.as_str(),
                            );
                        }
                    });

                let ceiling = self
                    .full
                    .edges()
                    .iter()
                    .filter_map(|edge| edge.numeric(&self.draft.threshold_attribute))
                    .fold(1.0_f64, f64::max);
                ui.horizontal(|ui| {
                    ui.add(
                        egui::Slider::new(&mut self.draft.threshold_floor, 0.0..=ceiling)
                            .text("min"),
                    );
                    if ui.button("Apply").clicked() {
                        let attribute = (self.draft.threshold_attribute != "weight")
                            .then(|| self.draft.threshold_attribute.clone());
                        self.filters.upsert(
                            THRESHOLD_FILTER,
                            Predicate::Threshold {
                                attribute,
                                floor: self.draft.threshold_floor,
                            },
                        );
                        changed = true;
                    }
                });
            });

        if changed {
            self.graph_dirty = true;
        }
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        ui.checkbox(&mut self.live_layout, "Live layout")
            .on_hover_text("Advance the simulation every frame until it settles.");
        ui.checkbox(&mut self.show_labels, "Labels");

        let mut policy = self.controller.policy();
        ui.horizontal(|ui| {
            ui.label("On release");
            ui.radio_value(&mut policy, ReleasePolicy::Unpin, "unpin");
            ui.radio_value(&mut policy, ReleasePolicy::KeepPinned, "keep pinned");
        });
        if policy != self.controller.policy() {
            self.controller.set_policy(policy);
        }

        ui.horizontal(|ui| {
            if ui.button("Reheat").clicked() {
                self.simulator.set_alpha(1.0);
            }
            let pinned = self
                .simulator
                .nodes()
                .iter()
                .filter(|node| node.is_pinned())
                .count();
            let unpin = ui.add_enabled(pinned > 0, egui::Button::new(format!("Unpin all ({pinned})")));
            if unpin.clicked() {
                self.simulator.unpin_all();
                self.simulator.set_alpha(self.simulator.alpha().max(0.3));
            }
            if ui.button("Fit view").clicked() {
                self.fitted = false;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entigraph::model::normalize;
    use serde_json::json;

    #[test]
    fn entity_search_ranks_close_matches_first() {
        let snapshot = normalize(
            &json!([{"id": "Acme Corp"}, {"id": "Ada Lovelace"}, {"id": "Globex"}]),
            &json!([]),
        )
        .unwrap()
        .snapshot;

        let matches = entity_matches(&snapshot, "acme", 5);
        assert_eq!(matches.first(), Some(&0));
        assert!(!matches.contains(&2));
        assert!(entity_matches(&snapshot, "  ", 5).is_empty());
    }

    #[test]
    fn predicates_read_as_short_phrases() {
        assert_eq!(
            describe(&Predicate::Threshold {
                attribute: None,
                floor: 2.0
            }),
            "weight ≥ 2"
        );
        assert_eq!(
            describe(&Predicate::CategoryEquality {
                label: "ORG".to_owned()
            }),
            "label = ORG"
        );
    }
}

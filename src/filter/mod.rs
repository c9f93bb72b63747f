//! Declarative subgraph derivation.
//!
//! Predicates are applied in a fixed stage order regardless of their
//! position in the [`FilterSpec`]: selection predicates (category, entity,
//! edge focus) first, edge thresholds second, and a final connectivity pass
//! that drops nodes left without a retained edge.

use serde::{Deserialize, Serialize};

use crate::model::{Edge, GraphSnapshot};

mod stages;

use stages::Selection;

fn default_depth() -> usize {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Keep nodes within `depth` hops of `focal_id`, and the edges among them.
    /// A depth of 0 reaches the direct neighbours, like 1.
    EntitySelection {
        focal_id: String,
        #[serde(default = "default_depth")]
        depth: usize,
    },
    /// Keep nodes carrying `label`, and the edges between them.
    CategoryEquality { label: String },
    /// Keep only edges incident to `node_id`.
    EdgeFocus { node_id: String },
    /// Drop edges whose `attribute` (the edge weight when unset) is below
    /// `floor`. Edges lacking the attribute are dropped as well.
    Threshold {
        #[serde(default)]
        attribute: Option<String>,
        floor: f64,
    },
}

impl Predicate {
    fn is_selection(&self) -> bool {
        !matches!(self, Self::Threshold { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedPredicate {
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub predicate: Predicate,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub predicates: Vec<NamedPredicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, predicate: Predicate) -> Self {
        self.upsert(name, predicate);
        self
    }

    /// Replaces the predicate stored under `name`, keeping its position and
    /// toggle, or appends it enabled.
    pub fn upsert(&mut self, name: impl Into<String>, predicate: Predicate) {
        let name = name.into();
        if let Some(existing) = self.predicates.iter_mut().find(|entry| entry.name == name) {
            existing.predicate = predicate;
            return;
        }

        self.predicates.push(NamedPredicate {
            name,
            enabled: true,
            predicate,
        });
    }

    pub fn remove(&mut self, name: &str) -> Option<NamedPredicate> {
        let position = self.predicates.iter().position(|entry| entry.name == name)?;
        Some(self.predicates.remove(position))
    }

    pub fn get(&self, name: &str) -> Option<&NamedPredicate> {
        self.predicates.iter().find(|entry| entry.name == name)
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.predicates.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Predicate> + '_ {
        self.predicates
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| &entry.predicate)
    }

    pub fn is_empty(&self) -> bool {
        self.enabled().next().is_none()
    }
}

/// Derives the subgraph selected by `spec`. `full` is never modified.
///
/// When no predicate ends up active (none enabled, or every enabled
/// selection names an id absent from `full`) the result equals `full`,
/// isolated nodes included.
pub fn apply(full: &GraphSnapshot, spec: &FilterSpec) -> GraphSnapshot {
    let mut selection = Selection::new(full);
    let mut active = 0usize;

    for predicate in spec.enabled().filter(|predicate| predicate.is_selection()) {
        if selection.narrow(predicate) {
            active += 1;
        }
    }

    for predicate in spec.enabled().filter(|predicate| !predicate.is_selection()) {
        if selection.narrow(predicate) {
            active += 1;
        }
    }

    if active == 0 {
        return full.clone();
    }

    selection.prune_disconnected();
    selection.materialize()
}

pub fn edge_endpoints<'a>(snapshot: &'a GraphSnapshot, edge: &Edge) -> (&'a str, &'a str) {
    let nodes = snapshot.nodes();
    (nodes[edge.source].id.as_str(), nodes[edge.target].id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn org_graph() -> GraphSnapshot {
        normalize(
            &json!([
                {"id": "A", "label": "ORG"},
                {"id": "B", "label": "PERSON"},
                {"id": "C", "label": "PERSON"}
            ]),
            &json!([
                {"source": "A", "target": "B", "weight": 2},
                {"source": "A", "target": "C", "weight": 1}
            ]),
        )
        .unwrap()
        .snapshot
    }

    fn chain_graph() -> GraphSnapshot {
        normalize(
            &json!([
                {"id": "a", "label": "ORG"},
                {"id": "b", "label": "PERSON"},
                {"id": "c", "label": "PERSON"},
                {"id": "d", "label": "ORG"},
                {"id": "lonely", "label": "ORG"}
            ]),
            &json!([
                {"source": "a", "target": "b", "weight": 3, "similarity": 0.9},
                {"source": "b", "target": "c", "weight": 1, "similarity": 0.6},
                {"source": "c", "target": "d", "weight": 5}
            ]),
        )
        .unwrap()
        .snapshot
    }

    fn ids(snapshot: &GraphSnapshot) -> Vec<&str> {
        snapshot.nodes().iter().map(|node| node.id.as_str()).collect()
    }

    fn pairs(snapshot: &GraphSnapshot) -> Vec<(&str, &str)> {
        snapshot
            .edges()
            .iter()
            .map(|edge| edge_endpoints(snapshot, edge))
            .collect()
    }

    #[test]
    fn empty_spec_returns_full_graph() {
        let full = chain_graph();
        assert_eq!(apply(&full, &FilterSpec::new()), full);
    }

    #[test]
    fn disabled_predicates_are_inert() {
        let full = chain_graph();
        let mut spec = FilterSpec::new().with(
            "min_weight",
            Predicate::Threshold {
                attribute: None,
                floor: 4.0,
            },
        );
        spec.set_enabled("min_weight", false);

        assert!(spec.is_empty());
        assert_eq!(apply(&full, &spec), full);
    }

    #[test]
    fn min_weight_drops_light_edges_and_orphans() {
        let full = org_graph();
        let spec = FilterSpec::new().with(
            "min_weight",
            Predicate::Threshold {
                attribute: None,
                floor: 2.0,
            },
        );

        let filtered = apply(&full, &spec);
        assert_eq!(ids(&filtered), vec!["A", "B"]);
        assert_eq!(pairs(&filtered), vec![("A", "B")]);
    }

    #[test]
    fn unknown_focal_entity_is_no_selection() {
        let full = org_graph();
        let spec = FilterSpec::new().with(
            "entity",
            Predicate::EntitySelection {
                focal_id: "nobody".to_owned(),
                depth: 1,
            },
        );

        assert_eq!(apply(&full, &spec), full);
    }

    #[test]
    fn entity_selection_keeps_neighbourhood() {
        let full = chain_graph();
        let spec = FilterSpec::new().with(
            "entity",
            Predicate::EntitySelection {
                focal_id: "b".to_owned(),
                depth: 1,
            },
        );

        let filtered = apply(&full, &spec);
        assert_eq!(ids(&filtered), vec!["a", "b", "c"]);
        assert_eq!(pairs(&filtered), vec![("a", "b"), ("b", "c")]);

        let wider = FilterSpec::new().with(
            "entity",
            Predicate::EntitySelection {
                focal_id: "b".to_owned(),
                depth: 2,
            },
        );
        assert_eq!(ids(&apply(&full, &wider)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn threshold_only_narrows_inside_selection() {
        let full = chain_graph();
        let spec = FilterSpec::new()
            .with(
                "min_weight",
                Predicate::Threshold {
                    attribute: None,
                    floor: 2.0,
                },
            )
            .with(
                "entity",
                Predicate::EntitySelection {
                    focal_id: "b".to_owned(),
                    depth: 1,
                },
            );

        // selection runs first even though it is listed second, so `c` is
        // reached through the light b-c edge before thresholding removes it
        let filtered = apply(&full, &spec);
        assert_eq!(ids(&filtered), vec!["a", "b"]);
        assert_eq!(pairs(&filtered), vec![("a", "b")]);
    }

    #[test]
    fn category_keeps_only_nodes_with_that_label() {
        let full = normalize(
            &json!([
                {"id": "A", "label": "ORG"},
                {"id": "B", "label": "PERSON"},
                {"id": "C", "label": "PERSON"},
                {"id": "D", "label": "ORG"}
            ]),
            &json!([
                {"source": "A", "target": "B"},
                {"source": "B", "target": "C"},
                {"source": "A", "target": "D", "label": "ORG"}
            ]),
        )
        .unwrap()
        .snapshot;
        let category = |label: &str| {
            FilterSpec::new().with(
                "category",
                Predicate::CategoryEquality {
                    label: label.to_owned(),
                },
            )
        };

        let orgs = apply(&full, &category("ORG"));
        assert_eq!(ids(&orgs), vec!["A", "D"]);
        assert_eq!(pairs(&orgs), vec![("A", "D")]);

        let people = apply(&full, &category("PERSON"));
        assert_eq!(ids(&people), vec!["B", "C"]);
        assert_eq!(pairs(&people), vec![("B", "C")]);
    }

    #[test]
    fn category_without_internal_edges_leaves_nothing() {
        let spec = FilterSpec::new().with(
            "category",
            Predicate::CategoryEquality {
                label: "ORG".to_owned(),
            },
        );

        let filtered = apply(&org_graph(), &spec);
        assert!(filtered.is_empty());
    }

    #[test]
    fn zero_depth_selection_reaches_direct_neighbours() {
        let spec: FilterSpec = serde_json::from_value(json!({
            "predicates": [{
                "name": "focus",
                "predicate": {"kind": "entity_selection", "focal_id": "A", "depth": 0}
            }]
        }))
        .unwrap();

        let filtered = apply(&org_graph(), &spec);
        assert_eq!(ids(&filtered), vec!["A", "B", "C"]);
        assert_eq!(pairs(&filtered), vec![("A", "B"), ("A", "C")]);
    }

    #[test]
    fn repeated_application_is_stable_but_composition_may_narrow() {
        let full = normalize(
            &json!([{"id": "F"}, {"id": "X"}, {"id": "Y"}]),
            &json!([
                {"source": "F", "target": "X", "weight": 1},
                {"source": "F", "target": "Y", "weight": 5},
                {"source": "X", "target": "Y", "weight": 5}
            ]),
        )
        .unwrap()
        .snapshot;
        let spec = FilterSpec::new()
            .with(
                "focus",
                Predicate::EntitySelection {
                    focal_id: "F".to_owned(),
                    depth: 1,
                },
            )
            .with(
                "min_weight",
                Predicate::Threshold {
                    attribute: None,
                    floor: 2.0,
                },
            );

        let once = apply(&full, &spec);
        assert_eq!(apply(&full, &spec), once);
        assert_eq!(ids(&once), vec!["F", "X", "Y"]);

        // the threshold cut F-X, so X is no longer one hop from F
        let twice = apply(&once, &spec);
        assert_eq!(ids(&twice), vec!["F", "Y"]);
        assert_eq!(pairs(&twice), vec![("F", "Y")]);
    }

    #[test]
    fn edge_focus_keeps_incident_edges() {
        let full = chain_graph();
        let spec = FilterSpec::new().with(
            "focus",
            Predicate::EdgeFocus {
                node_id: "c".to_owned(),
            },
        );

        let filtered = apply(&full, &spec);
        assert_eq!(ids(&filtered), vec!["b", "c", "d"]);
        assert_eq!(pairs(&filtered), vec![("b", "c"), ("c", "d")]);
    }

    #[test]
    fn named_attribute_threshold_drops_edges_without_it() {
        let full = chain_graph();
        let spec = FilterSpec::new().with(
            "similarity",
            Predicate::Threshold {
                attribute: Some("similarity".to_owned()),
                floor: 0.5,
            },
        );

        let filtered = apply(&full, &spec);
        assert_eq!(pairs(&filtered), vec![("a", "b"), ("b", "c")]);
    }

    #[test]
    fn apply_does_not_touch_its_input_and_is_repeatable() {
        let full = chain_graph();
        let before = full.clone();
        let spec = FilterSpec::new().with(
            "min_weight",
            Predicate::Threshold {
                attribute: None,
                floor: 3.0,
            },
        );

        let first = apply(&full, &spec);
        let second = apply(&full, &spec);
        assert_eq!(full, before);
        assert_eq!(first, second);
        assert_eq!(apply(&first, &spec), first);

        let orgs = FilterSpec::new().with(
            "orgs",
            Predicate::CategoryEquality {
                label: "ORG".to_owned(),
            },
        );
        let narrowed = apply(&full, &orgs);
        assert_eq!(apply(&narrowed, &orgs), narrowed);
    }

    #[test]
    fn filtering_everything_away_is_valid() {
        let full = chain_graph();
        let spec = FilterSpec::new().with(
            "min_weight",
            Predicate::Threshold {
                attribute: None,
                floor: 100.0,
            },
        );

        let filtered = apply(&full, &spec);
        assert!(filtered.is_empty());
        assert_eq!(filtered.edge_count(), 0);
    }

    #[test]
    fn spec_round_trips_through_json_config() {
        let spec: FilterSpec = serde_json::from_value(json!({
            "predicates": [
                {"name": "entity", "predicate": {"kind": "entity_selection", "focal_id": "A"}},
                {"name": "min", "enabled": false, "predicate": {"kind": "threshold", "floor": 2}}
            ]
        }))
        .unwrap();

        assert_eq!(
            spec.get("entity").map(|entry| &entry.predicate),
            Some(&Predicate::EntitySelection {
                focal_id: "A".to_owned(),
                depth: 1
            })
        );
        assert!(!spec.get("min").unwrap().enabled);
    }
}

//! Metric-to-visual scales.
//!
//! Domains are always computed over the node set handed in, which in the
//! viewer is the currently filtered graph. Changing a filter can therefore
//! rescale sizes and colors even when the metric stays the same.

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

use crate::model::{GraphSnapshot, Node};

/// Reserved metric name resolving to a node's degree in the given snapshot.
pub const DEGREE_METRIC: &str = "degree";

pub const RADIUS_RANGE: (f32, f32) = (9.0, 25.0);
pub const COLOR_LOW: Color32 = Color32::from_rgb(0xd3, 0xd3, 0xd3);
pub const COLOR_HIGH: Color32 = Color32::from_rgb(0x00, 0x00, 0x8b);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingSpec {
    pub size_metric: String,
    pub color_metric: String,
}

impl Default for EncodingSpec {
    fn default() -> Self {
        Self {
            size_metric: "pagerank".to_owned(),
            color_metric: "referenced_by_count".to_owned(),
        }
    }
}

/// Linear map from a metric domain into an output range.
///
/// Missing values, empty domains and constant domains all map to the range
/// midpoint. Values outside the domain clamp to the range ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    domain: Option<(f64, f64)>,
    range: (f32, f32),
}

impl Scale {
    pub fn from_values(values: impl IntoIterator<Item = Option<f64>>, range: (f32, f32)) -> Self {
        let domain = values
            .into_iter()
            .flatten()
            .filter(|value| value.is_finite())
            .fold(None, |domain: Option<(f64, f64)>, value| match domain {
                Some((min, max)) => Some((min.min(value), max.max(value))),
                None => Some((value, value)),
            });

        Self { domain, range }
    }

    pub fn domain(&self) -> Option<(f64, f64)> {
        self.domain
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    pub fn is_constant(&self) -> bool {
        self.domain
            .is_none_or(|(min, max)| (max - min).abs() <= f64::EPSILON)
    }

    pub fn midpoint(&self) -> f32 {
        (self.range.0 + self.range.1) * 0.5
    }

    pub fn normalized(&self, value: Option<f64>) -> Option<f32> {
        let (min, max) = self.domain?;
        let value = value.filter(|value| value.is_finite())?;
        if self.is_constant() {
            return None;
        }

        Some(((value - min) / (max - min)).clamp(0.0, 1.0) as f32)
    }

    pub fn map(&self, value: Option<f64>) -> f32 {
        match self.normalized(value) {
            Some(t) => self.range.0 + (self.range.1 - self.range.0) * t,
            None => self.midpoint(),
        }
    }
}

pub fn build_scale(nodes: &[Node], metric: &str, output_range: (f32, f32)) -> Scale {
    Scale::from_values(nodes.iter().map(|node| node.metric(metric)), output_range)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorScale {
    scale: Scale,
    low: Color32,
    high: Color32,
}

impl ColorScale {
    pub fn new(scale: Scale, low: Color32, high: Color32) -> Self {
        Self {
            scale: Scale {
                domain: scale.domain,
                range: (0.0, 1.0),
            },
            low,
            high,
        }
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn map(&self, value: Option<f64>) -> Color32 {
        lerp_color(self.low, self.high, self.scale.map(value))
    }
}

pub fn lerp_color(low: Color32, high: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * amount).round() as u8;

    Color32::from_rgba_unmultiplied(
        channel(low.r(), high.r()),
        channel(low.g(), high.g()),
        channel(low.b(), high.b()),
        channel(low.a(), high.a()),
    )
}

pub fn metric_values(snapshot: &GraphSnapshot, metric: &str) -> Vec<Option<f64>> {
    if metric == DEGREE_METRIC {
        return snapshot
            .degrees()
            .into_iter()
            .map(|degree| Some(degree as f64))
            .collect();
    }

    snapshot
        .nodes()
        .iter()
        .map(|node| node.metric(metric))
        .collect()
}

/// Per-node visual attributes, index-aligned with the snapshot they were
/// computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedGraph {
    pub radii: Vec<f32>,
    pub colors: Vec<Color32>,
    pub size_scale: Scale,
    pub color_scale: ColorScale,
}

pub fn encode(snapshot: &GraphSnapshot, spec: &EncodingSpec) -> EncodedGraph {
    let size_values = metric_values(snapshot, &spec.size_metric);
    let color_values = metric_values(snapshot, &spec.color_metric);

    let size_scale = Scale::from_values(size_values.iter().copied(), RADIUS_RANGE);
    let color_scale = ColorScale::new(
        Scale::from_values(color_values.iter().copied(), (0.0, 1.0)),
        COLOR_LOW,
        COLOR_HIGH,
    );

    EncodedGraph {
        radii: size_values.iter().map(|value| size_scale.map(*value)).collect(),
        colors: color_values
            .iter()
            .map(|value| color_scale.map(*value))
            .collect(),
        size_scale,
        color_scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::normalize;
    use proptest::prelude::*;
    use serde_json::json;

    fn snapshot() -> GraphSnapshot {
        normalize(
            &json!([
                {"id": "a", "pagerank": 0.1, "referenced_by_count": 1},
                {"id": "b", "pagerank": 0.5, "referenced_by_count": 3},
                {"id": "c", "pagerank": 0.9},
                {"id": "d", "pagerank": "n/a", "referenced_by_count": 5}
            ]),
            &json!([{"source": "a", "target": "b"}, {"source": "a", "target": "c"}]),
        )
        .unwrap()
        .snapshot
    }

    #[test]
    fn domain_skips_missing_values() {
        let snapshot = snapshot();
        let scale = build_scale(snapshot.nodes(), "pagerank", RADIUS_RANGE);
        assert_eq!(scale.domain(), Some((0.1, 0.9)));
        assert_eq!(scale.map(Some(0.1)), 9.0);
        assert_eq!(scale.map(Some(0.9)), 25.0);
        assert_eq!(scale.map(None), 17.0);
    }

    #[test]
    fn empty_and_constant_domains_map_to_midpoint() {
        let empty = build_scale(&[], "pagerank", RADIUS_RANGE);
        assert!(empty.is_constant());
        assert_eq!(empty.map(Some(4.0)), 17.0);

        let constant = Scale::from_values([Some(2.0), Some(2.0)], (0.0, 10.0));
        assert_eq!(constant.map(Some(2.0)), 5.0);
    }

    #[test]
    fn out_of_domain_inputs_clamp() {
        let scale = Scale::from_values([Some(0.0), Some(10.0)], (9.0, 25.0));
        assert_eq!(scale.map(Some(-5.0)), 9.0);
        assert_eq!(scale.map(Some(50.0)), 25.0);
    }

    #[test]
    fn degree_metric_uses_filtered_edges() {
        let snapshot = snapshot();
        assert_eq!(
            metric_values(&snapshot, DEGREE_METRIC),
            vec![Some(2.0), Some(1.0), Some(1.0), Some(0.0)]
        );
    }

    #[test]
    fn encode_resolves_both_metrics() {
        let snapshot = snapshot();
        let encoded = encode(&snapshot, &EncodingSpec::default());

        assert_eq!(encoded.radii.len(), 4);
        assert_eq!(encoded.radii[0], 9.0);
        assert_eq!(encoded.radii[2], 25.0);
        assert_eq!(encoded.colors[0], COLOR_LOW);
        assert_eq!(encoded.colors[3], COLOR_HIGH);
        assert_eq!(encoded.color_scale.scale().domain(), Some((1.0, 5.0)));
    }

    #[test]
    fn color_endpoints_match_gradient() {
        assert_eq!(lerp_color(COLOR_LOW, COLOR_HIGH, 0.0), COLOR_LOW);
        assert_eq!(lerp_color(COLOR_LOW, COLOR_HIGH, 1.0), COLOR_HIGH);
    }

    proptest! {
        #[test]
        fn scale_is_monotonic(
            values in prop::collection::vec(-1_000.0f64..1_000.0, 1..40),
            a in -2_000.0f64..2_000.0,
            b in -2_000.0f64..2_000.0,
        ) {
            let scale = Scale::from_values(values.iter().copied().map(Some), RADIUS_RANGE);
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scale.map(Some(low)) <= scale.map(Some(high)));

            let colors = ColorScale::new(scale, COLOR_LOW, COLOR_HIGH);
            prop_assert!(
                colors.scale().map(Some(low)) <= colors.scale().map(Some(high))
            );
        }
    }
}

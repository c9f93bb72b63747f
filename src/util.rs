use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::Value;

/// Renders a metric or weight without trailing noise: `2.0` prints as `2`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Renders a raw attribute the way it reads in a tooltip.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    }
}

pub fn short_label(id: &str, max_chars: usize) -> String {
    if id.chars().count() <= max_chars {
        return id.to_owned();
    }

    let mut shortened = id.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    shortened.push('…');
    shortened
}

/// Deterministic pseudo-random pair in `[-1, 1]` derived from an id.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_numbers_drop_the_fraction() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.42), "0.42");
        assert_eq!(format_number(-3.5), "-3.5");
    }

    #[test]
    fn strings_render_without_quotes() {
        assert_eq!(format_value(&json!("Reuters")), "Reuters");
        assert_eq!(format_value(&json!(5)), "5");
        assert_eq!(format_value(&json!(0.42)), "0.42");
    }

    #[test]
    fn long_labels_are_truncated() {
        assert_eq!(short_label("Acme", 8), "Acme");
        assert_eq!(short_label("International Widgets", 8), "Interna…");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x, y) = stable_pair("node-a");
        assert_eq!((x, y), stable_pair("node-a"));
        assert!((-1.0..=1.0).contains(&x));
        assert!((-1.0..=1.0).contains(&y));
    }
}

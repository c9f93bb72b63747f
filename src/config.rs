//! Viewer configuration read from an optional JSON file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::encoding::EncodingSpec;
use crate::filter::FilterSpec;
use crate::interaction::ReleasePolicy;
use crate::layout::LayoutConfig;

/// Everything a config file may set. Absent sections keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub layout: LayoutConfig,
    pub release_policy: ReleasePolicy,
    pub encoding: EncodingSpec,
    /// Predicates applied to every dataset on load.
    pub filters: FilterSpec,
}

impl ViewerConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
    }
}

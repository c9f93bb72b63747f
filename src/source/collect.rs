use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use super::parse::load_payload;
use crate::model::Normalized;

#[derive(Clone, Debug)]
pub struct LoadedDataset {
    pub name: String,
    pub normalized: Normalized,
}

/// Anything that can list and fetch named datasets. Fetches run on a
/// worker thread.
pub trait GraphSource: Send + Sync + 'static {
    fn datasets(&self) -> Result<Vec<String>>;
    fn fetch(&self, dataset: &str) -> Result<LoadedDataset>;
}

/// Datasets stored as `<root>/<name>.json`.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, dataset: &str) -> Result<PathBuf> {
        if dataset.is_empty()
            || dataset.contains(['/', '\\'])
            || dataset.starts_with('.')
        {
            bail!("invalid dataset name {dataset:?}");
        }

        Ok(self.root.join(format!("{dataset}.json")))
    }
}

impl GraphSource for DirectorySource {
    fn datasets(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("failed to list datasets in {}", self.root.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to read entry in {}", self.root.display()))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_owned());
            }
        }

        names.sort();
        Ok(names)
    }

    fn fetch(&self, dataset: &str) -> Result<LoadedDataset> {
        let path = self.path_for(dataset)?;
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        let normalized = load_payload(&raw)
            .with_context(|| format!("dataset {dataset} has an invalid shape"))?;

        info!(
            dataset,
            nodes = normalized.snapshot.node_count(),
            edges = normalized.snapshot.edge_count(),
            dropped_edges = normalized.dropped_edges,
            "loaded dataset"
        );

        Ok(LoadedDataset {
            name: dataset.to_owned(),
            normalized,
        })
    }
}

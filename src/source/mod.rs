//! Where graphs come from: JSON dataset files and the background loader
//! that fetches them off the UI thread.

mod collect;
mod loader;
mod parse;

pub use collect::{DirectorySource, GraphSource, LoadedDataset};
pub use loader::{GraphLoader, LoadEvent};
pub use parse::{EDGE_KEYS, RawGraph, load_payload, parse_payload};

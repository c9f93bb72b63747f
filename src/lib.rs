//! Force-directed layout and filtering engine for entity graphs.
//!
//! Raw node/edge payloads are normalized into a [`model::GraphSnapshot`],
//! narrowed by a [`filter::FilterSpec`], encoded into radii and colors by
//! [`encoding::encode`] and laid out by a [`layout::LayoutSimulator`] that the
//! caller ticks once per frame. Pointer handling lives in
//! [`interaction::InteractionController`].

pub mod config;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod source;
pub mod util;

pub use config::ViewerConfig;
pub use error::ValidationError;
pub use model::{Edge, GraphSnapshot, Node, Normalized, normalize};

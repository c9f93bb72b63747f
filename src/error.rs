use thiserror::Error;

/// Raised when a raw graph payload does not have the expected shape.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("graph payload must be a JSON object")]
    PayloadNotObject,

    #[error("graph payload has no `nodes` field")]
    MissingNodes,

    #[error("`nodes` must be an array of objects")]
    NodesNotArray,

    #[error("node at index {index} is not an object")]
    NodeNotObject { index: usize },

    #[error("node at index {index} has no `id` field")]
    MissingId { index: usize },

    #[error("node at index {index} has an `id` that is neither a string nor an integer")]
    InvalidId { index: usize },

    #[error("duplicate node id `{id}`")]
    DuplicateId { id: String },

    #[error("edges must be an array of objects")]
    EdgesNotArray,

    #[error("edge at index {index} is not an object")]
    EdgeNotObject { index: usize },
}

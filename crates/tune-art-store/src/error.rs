/// Error types for patch application and patch-producing store mutations.
use thiserror::Error;

use crate::patch::PatchOp;

/// A patch could not be applied to a snapshot.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("path {path:?} does not exist")]
    PathNotFound { path: String },

    #[error("index {index} is out of bounds at {path:?} (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("value at {path:?} cannot hold children")]
    NotAContainer { path: String },

    #[error("{op} patch at {path:?} carries no value")]
    MissingValue { op: PatchOp, path: String },

    #[error("the document root cannot be removed")]
    RemoveRoot,
}

/// A store mutation that goes through the serde representation failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode state snapshot")]
    Encode(#[source] serde_json::Error),

    #[error("patched state does not decode back into the store type")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

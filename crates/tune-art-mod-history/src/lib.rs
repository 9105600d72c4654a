/// Undo/redo history for snapshot stores.
///
/// Provides a [`History`] that keeps edits as forward/inverse patch records
/// on bounded undo and redo stacks, and a classifier that tells listeners
/// whether a history change was a push, an undo or a redo so they can
/// replay the right patches onto the edited store.
pub mod classifier;
pub mod config;
pub mod engine;
pub mod record;

pub use classifier::{classify, patch_listener, PatchListener, Transition, TransitionKind};
pub use config::{resolve_max_undo_depth, HistoryConfig};
pub use engine::History;
pub use record::{ChangeRecord, HistoryState};

// Re-exports from tune-art-mod-history and the recording bridge.
// Domain edits that belong in history go through `record_edit`, which pairs
// a patch-producing store update with a push onto the shared history.
pub use tune_art_mod_history::{
    ChangeRecord, History, HistoryConfig, HistoryState, PatchListener, TransitionKind,
};

use anyhow::{Context, Result};
use serde::Serialize;
use tune_art_store::Store;

/// Applies `edit` to `store` and pushes the resulting patches onto `history`.
///
/// A no-op edit changes nothing and records nothing.
///
/// # Errors
///
/// Returns an error if the store's snapshot cannot be encoded for patching.
pub fn record_edit<S, F>(store: &Store<S>, history: &History, edit: F) -> Result<()>
where
    S: Clone + PartialEq + Serialize + 'static,
    F: FnOnce(&mut S),
{
    store
        .update_with_patches(edit, history.recorder())
        .with_context(|| format!("Failed to record edit on store '{}'", store.name()))
}

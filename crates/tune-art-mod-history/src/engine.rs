/// Bounded undo/redo stacks kept in an observable store.
///
/// The history is itself a [`Store`], so anything that wants to react to
/// undo or redo subscribes to it like any other state domain. Records move
/// between the two stacks by identity; nothing here knows what the patches
/// inside a record touch.
use std::rc::Rc;

use tune_art_store::{Patch, Store, Subscription, Watch};

use crate::config::HistoryConfig;
use crate::record::{ChangeRecord, HistoryState};

/// Shared undo/redo history. Cloning yields another handle to the same
/// stacks.
#[derive(Clone)]
pub struct History {
    store: Store<HistoryState>,
    config: HistoryConfig,
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("undo_depth", &self.undo_depth())
            .field("redo_depth", &self.redo_depth())
            .field("max_undo_depth", &self.config.max_undo_depth)
            .finish()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl History {
    pub fn new(mut config: HistoryConfig) -> Self {
        config.sanitize();
        Self {
            store: Store::new("history", HistoryState::default()),
            config,
        }
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    /// The underlying store, for subscribers that need raw transitions.
    pub fn store(&self) -> &Store<HistoryState> {
        &self.store
    }

    /// Current stacks.
    pub fn state(&self) -> Rc<HistoryState> {
        self.store.get_state()
    }

    /// Records an edit.
    ///
    /// A record without forward patches is ignored. Otherwise the oldest
    /// record is evicted if the undo stack is full, the record is pushed,
    /// and the redo stack is cleared.
    pub fn push_change(&self, record: ChangeRecord) {
        if record.is_empty() {
            tracing::trace!("ignoring empty change record");
            return;
        }

        // A fresh Rc per push keeps every record distinct by identity.
        let record = Rc::new(record);
        let max = self.config.max_undo_depth;
        self.store.update(move |state| {
            if state.prev.len() >= max {
                let excess = state.prev.len() + 1 - max;
                state.prev.drain(..excess);
                tracing::debug!(evicted = excess, "undo stack full, evicted oldest records");
            }
            state.prev.push(record);
            state.next.clear();
        });
        tracing::debug!(undo_depth = self.undo_depth(), "pushed change record");
    }

    /// Moves the newest record from the undo stack to the redo stack.
    ///
    /// Returns false, without notifying anyone, when there is nothing to undo.
    pub fn undo_change(&self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.store.update(|state| {
            if let Some(record) = state.prev.pop() {
                state.next.push(record);
            }
        });
        tracing::debug!(
            undo_depth = self.undo_depth(),
            redo_depth = self.redo_depth(),
            "undo"
        );
        true
    }

    /// Moves the newest record from the redo stack back to the undo stack.
    ///
    /// Returns false, without notifying anyone, when there is nothing to redo.
    pub fn redo_change(&self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.store.update(|state| {
            if let Some(record) = state.next.pop() {
                state.prev.push(record);
            }
        });
        tracing::debug!(
            undo_depth = self.undo_depth(),
            redo_depth = self.redo_depth(),
            "redo"
        );
        true
    }

    /// Empties both stacks. Clearing an empty history notifies nobody.
    pub fn clear_changes(&self) {
        self.store.update(|state| {
            state.prev.clear();
            state.next.clear();
        });
        tracing::debug!("history cleared");
    }

    pub fn undo_depth(&self) -> usize {
        self.store.get_state().undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.store.get_state().redo_depth()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_depth() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.redo_depth() > 0
    }

    /// Registers a raw `(new, old)` listener on the stacks.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&HistoryState, &HistoryState) + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Live undo depth, for enabling an undo control.
    pub fn watch_undo_depth(&self) -> Watch<usize> {
        self.store.watch(HistoryState::undo_depth)
    }

    /// Live redo depth, for enabling a redo control.
    pub fn watch_redo_depth(&self) -> Watch<usize> {
        self.store.watch(HistoryState::redo_depth)
    }

    /// Returns an `on_patches` callback that pushes the reported patches as
    /// one record.
    ///
    /// ```ignore
    /// stage.update_with_patches(|s| s.width = 8, history.recorder())?;
    /// ```
    pub fn recorder(&self) -> impl FnOnce(Vec<Patch>, Vec<Patch>) + 'static {
        let history = self.clone();
        move |patches: Vec<Patch>, inverse_patches: Vec<Patch>| {
            history.push_change(ChangeRecord::new(patches, inverse_patches));
        }
    }
}

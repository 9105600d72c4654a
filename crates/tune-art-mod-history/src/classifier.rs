/// Infers what caused a history transition and what to replay for it.
///
/// Callers never tag history changes. A listener on the history store
/// receives `(new, old)` stacks and works out from record identity alone
/// whether the change was a push, an undo or a redo.
use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tune_art_store::{Patch, Store, Subscription};

use crate::engine::History;
use crate::record::{same_record, ChangeRecord, HistoryState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Push,
    Undo,
    Redo,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Undo => write!(f, "undo"),
            Self::Redo => write!(f, "redo"),
        }
    }
}

/// A classified history transition and the record it moved.
#[derive(Debug, Clone)]
pub struct Transition {
    pub kind: TransitionKind,
    pub record: Rc<ChangeRecord>,
}

impl Transition {
    /// The patches to replay onto the edited store: inverse patches for an
    /// undo, forward patches otherwise.
    pub fn patches(&self) -> &[Patch] {
        match self.kind {
            TransitionKind::Undo => &self.record.inverse_patches,
            TransitionKind::Push | TransitionKind::Redo => &self.record.patches,
        }
    }
}

/// Classifies the step from `old` to `new`.
///
/// Returns `None` for transitions that match no rule, such as clearing the
/// history.
pub fn classify(new: &HistoryState, old: &HistoryState) -> Option<Transition> {
    // Undo: the old undo top now sits on the redo stack.
    if new.next.len() > old.next.len() && same_record(new.top_next(), old.top_prev()) {
        return new.top_next().map(|record| Transition {
            kind: TransitionKind::Undo,
            record: Rc::clone(record),
        });
    }

    // Redo: the old redo top is back on the undo stack.
    if new.prev.len() > old.prev.len() && same_record(new.top_prev(), old.top_next()) {
        return new.top_prev().map(|record| Transition {
            kind: TransitionKind::Redo,
            record: Rc::clone(record),
        });
    }

    // Push: a record nobody has seen before is on top of the undo stack.
    match (new.top_prev(), old.top_prev()) {
        (Some(top), Some(old_top)) if Rc::ptr_eq(top, old_top) => None,
        (Some(top), _) => Some(Transition {
            kind: TransitionKind::Push,
            record: Rc::clone(top),
        }),
        (None, _) => None,
    }
}

/// Adapts `on_patches(patches, kind)` into a history store listener.
pub fn patch_listener<F>(on_patches: F) -> impl Fn(&HistoryState, &HistoryState) + 'static
where
    F: Fn(&[Patch], TransitionKind) + 'static,
{
    move |new: &HistoryState, old: &HistoryState| {
        if let Some(transition) = classify(new, old) {
            tracing::trace!(kind = %transition.kind, "history transition");
            on_patches(transition.patches(), transition.kind);
        }
    }
}

/// Handle returned by [`History::register_patch_listener`] and
/// [`History::bind_store`].
#[derive(Debug)]
pub struct PatchListener {
    subscription: Subscription,
    history: History,
}

impl PatchListener {
    /// Stops listening and clears the history. Used when leaving an
    /// editing context.
    pub fn dispose(&self) {
        self.subscription.unsubscribe();
        self.history.clear_changes();
    }
}

impl History {
    /// Registers `on_patches`, called with the patches to replay and the
    /// inferred kind of every classified transition.
    pub fn register_patch_listener<F>(&self, on_patches: F) -> PatchListener
    where
        F: Fn(&[Patch], TransitionKind) + 'static,
    {
        PatchListener {
            subscription: self.subscribe(patch_listener(on_patches)),
            history: self.clone(),
        }
    }

    /// Keeps `target` in sync with this history: undo and redo replay
    /// their patches onto it, pushes are ignored since the edit already
    /// happened.
    pub fn bind_store<S>(&self, target: &Store<S>) -> PatchListener
    where
        S: PartialEq + Serialize + DeserializeOwned + 'static,
    {
        let target = target.clone();
        self.register_patch_listener(move |patches, kind| {
            if kind == TransitionKind::Push {
                return;
            }
            if let Err(e) = target.apply_patches(patches) {
                tracing::warn!(store = %target.name(), "Failed to replay {kind}: {e}");
            }
        })
    }
}

//! Observable snapshot store.
//!
//! A `Store` owns one immutable snapshot (`Rc<S>`) and an ordered list of
//! listeners. Mutations never touch the current snapshot: they build a new
//! one, swap it in, and notify listeners with `(new, old)`. Everything runs
//! synchronously on the caller's thread.
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::diff::diff_pair;
use crate::error::StoreError;
use crate::patch::Patch;

type Listener<S> = Rc<dyn Fn(&S, &S)>;

/// Identifies one registered listener within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Inner<S> {
    name: String,
    default_state: Rc<S>,
    state: RefCell<Rc<S>>,
    listeners: RefCell<Vec<(ListenerId, Listener<S>)>>,
    next_listener_id: Cell<u64>,
}

impl<S> Inner<S> {
    fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|(lid, _)| *lid == id)
    }
}

/// Type-erased view of a store's listener list, so a `Subscription` does not
/// carry the state type.
trait ListenerRegistry {
    fn remove_listener(&self, id: ListenerId) -> bool;
}

impl<S> ListenerRegistry for Inner<S> {
    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }
}

/// Handle returned by every `subscribe*` call.
///
/// Dropping the handle leaves the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[must_use = "keep the Subscription if the listener ever needs to be removed"]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<dyn ListenerRegistry>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("store_alive", &(self.registry.strong_count() > 0))
            .finish()
    }
}

impl Subscription {
    /// The listener this handle controls.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Removes the listener. Safe to call any number of times.
    ///
    /// Returns `true` only on the call that actually removed it.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove_listener(self.id),
            None => false,
        }
    }
}

/// A cheap-to-clone handle over one state domain.
///
/// Clones share the same snapshot and listeners.
pub struct Store<S> {
    inner: Rc<Inner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<S: 'static> Store<S> {
    /// Creates a store holding `default_state`.
    ///
    /// `name` only shows up in log output.
    pub fn new(name: impl Into<String>, default_state: S) -> Self {
        let default_state = Rc::new(default_state);
        Self {
            inner: Rc::new(Inner {
                name: name.into(),
                state: RefCell::new(Rc::clone(&default_state)),
                default_state,
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the current snapshot.
    pub fn get_state(&self) -> Rc<S> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Returns the snapshot the store was created with.
    pub fn default_state(&self) -> Rc<S> {
        Rc::clone(&self.inner.default_state)
    }

    /// Replaces the snapshot wholesale. No patches are computed.
    ///
    /// Passing the current `Rc` back is a no-op.
    pub fn replace(&self, next: impl Into<Rc<S>>) {
        self.commit(next.into());
    }

    /// Restores the default snapshot.
    pub fn reset(&self) {
        self.commit(self.default_state());
    }

    /// Registers `listener`, called with `(new, old)` after every change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&S, &S) + 'static,
    {
        let id = ListenerId(self.inner.next_listener_id.get());
        self.inner.next_listener_id.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        let weak = Rc::downgrade(&self.inner);
        let registry: Weak<dyn ListenerRegistry> = weak;
        Subscription { id, registry }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Drops every listener. Used when a state domain shuts down.
    pub fn destroy(&self) {
        let removed = std::mem::take(&mut *self.inner.listeners.borrow_mut());
        tracing::debug!(store = %self.inner.name, listeners = removed.len(), "store destroyed");
    }

    /// Swaps in `next` and notifies listeners, unless `next` is the current snapshot.
    fn commit(&self, next: Rc<S>) {
        let prev = self.inner.state.replace(Rc::clone(&next));
        if Rc::ptr_eq(&prev, &next) {
            tracing::trace!(store = %self.inner.name, "snapshot unchanged");
            return;
        }

        // Listeners may subscribe, unsubscribe or mutate this store while we
        // iterate, so work from a copy and re-check registration per call.
        let listeners = self.inner.listeners.borrow().clone();
        tracing::trace!(
            store = %self.inner.name,
            listeners = listeners.len(),
            "notifying listeners"
        );
        for (id, listener) in listeners {
            // A nested commit has already told everyone about a newer
            // snapshot; `next` is stale from here on.
            if !self.is_current(&next) {
                tracing::trace!(store = %self.inner.name, "snapshot superseded during notification");
                break;
            }
            if self.inner.is_registered(id) {
                listener(&*next, &*prev);
            }
        }
    }

    fn is_current(&self, snapshot: &Rc<S>) -> bool {
        Rc::ptr_eq(&*self.inner.state.borrow(), snapshot)
    }
}

impl<S: Clone + PartialEq + 'static> Store<S> {
    /// Edits a copy of the current snapshot in place and commits it.
    ///
    /// If the edited copy equals the current snapshot nothing is committed
    /// and nobody is notified.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut S),
    {
        let prev = self.get_state();
        let mut draft = S::clone(&prev);
        mutate(&mut draft);
        if draft == *prev {
            tracing::trace!(store = %self.inner.name, "update left state unchanged");
            return;
        }
        self.commit(Rc::new(draft));
    }
}

impl<S: Clone + PartialEq + Serialize + 'static> Store<S> {
    /// Like [`update`](Self::update), and also reports the forward and
    /// inverse patches describing the edit.
    ///
    /// `on_patches(patches, inverse_patches)` runs before listeners are
    /// notified. It is not called for a no-op edit.
    ///
    /// # Errors
    ///
    /// Returns an error if either snapshot fails to serialize; the store is
    /// left unchanged in that case.
    pub fn update_with_patches<F, P>(&self, mutate: F, on_patches: P) -> Result<(), StoreError>
    where
        F: FnOnce(&mut S),
        P: FnOnce(Vec<Patch>, Vec<Patch>),
    {
        let prev = self.get_state();
        let mut draft = S::clone(&prev);
        mutate(&mut draft);
        if draft == *prev {
            tracing::trace!(store = %self.inner.name, "update left state unchanged");
            return Ok(());
        }

        let before = serde_json::to_value(&*prev).map_err(StoreError::Encode)?;
        let after = serde_json::to_value(&draft).map_err(StoreError::Encode)?;
        let (patches, inverse_patches) = diff_pair(&before, &after);
        tracing::trace!(
            store = %self.inner.name,
            patches = patches.len(),
            inverse = inverse_patches.len(),
            "computed patches"
        );
        on_patches(patches, inverse_patches);
        self.commit(Rc::new(draft));
        Ok(())
    }
}

impl<S: PartialEq + Serialize + DeserializeOwned + 'static> Store<S> {
    /// Replays `patches` onto the current snapshot and commits the result.
    ///
    /// This is the undo/redo mutator: it never produces patches of its own.
    ///
    /// # Errors
    ///
    /// Returns an error if a patch does not fit the snapshot or the patched
    /// value no longer decodes as `S`. The store is unchanged on error.
    pub fn apply_patches(&self, patches: &[Patch]) -> Result<(), StoreError> {
        if patches.is_empty() {
            return Ok(());
        }
        let prev = self.get_state();
        let mut value = serde_json::to_value(&*prev).map_err(StoreError::Encode)?;
        crate::patch::apply_patches(&mut value, patches)?;
        let next: S = serde_json::from_value(value).map_err(StoreError::Decode)?;
        if next == *prev {
            return Ok(());
        }
        self.commit(Rc::new(next));
        Ok(())
    }
}

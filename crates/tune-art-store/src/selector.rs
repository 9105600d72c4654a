//! Selector subscriptions: watch a projection of the state instead of the
//! whole snapshot.
//!
//! Each subscription keeps its own memo of the last selected slice. A store
//! notification re-runs the selector and the change callback fires only
//! when the new slice differs from the memo under the subscription's
//! equality function. Nothing is shared between subscriptions.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::store::{Store, Subscription};

type EqualityFn<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Tuning for a selector subscription.
///
/// The default compares slices with `PartialEq`. For `Rc` slices,
/// `SelectorOptions::with_equality(Rc::ptr_eq)` compares by identity instead.
pub struct SelectorOptions<T> {
    equality: EqualityFn<T>,
    fire_immediately: bool,
}

impl<T> Clone for SelectorOptions<T> {
    fn clone(&self) -> Self {
        Self {
            equality: Rc::clone(&self.equality),
            fire_immediately: self.fire_immediately,
        }
    }
}

impl<T: PartialEq + 'static> Default for SelectorOptions<T> {
    fn default() -> Self {
        Self::with_equality(|a: &T, b: &T| a == b)
    }
}

impl<T: 'static> SelectorOptions<T> {
    /// Options using `equality` to decide whether two slices are the same.
    ///
    /// Pass `Rc::ptr_eq` for identity semantics on `Rc` slices.
    pub fn with_equality<F>(equality: F) -> Self
    where
        F: Fn(&T, &T) -> bool + 'static,
    {
        Self {
            equality: Rc::new(equality),
            fire_immediately: false,
        }
    }

    /// Invoke the change callback once at subscription time with `(slice, slice)`.
    pub fn fire_immediately(mut self, fire: bool) -> Self {
        self.fire_immediately = fire;
        self
    }
}

impl<S: 'static> Store<S> {
    /// Subscribes to `selector(state)`, calling `on_change(new, old)` only
    /// when the slice changes.
    pub fn subscribe_with_selector<T, Sel, F>(
        &self,
        selector: Sel,
        on_change: F,
        options: SelectorOptions<T>,
    ) -> Subscription
    where
        T: 'static,
        Sel: Fn(&S) -> T + 'static,
        F: Fn(&T, &T) + 'static,
    {
        let initial = Rc::new(selector(&self.get_state()));
        if options.fire_immediately {
            on_change(&*initial, &*initial);
        }

        let current = RefCell::new(initial);
        let equality = options.equality;
        self.subscribe(move |state, _| {
            let next = Rc::new(selector(state));
            let same = equality(&**current.borrow(), &*next);
            if same {
                return;
            }
            // Update the memo before calling out, so re-entrant
            // notifications compare against the new slice.
            let prev = current.replace(Rc::clone(&next));
            on_change(&*next, &*prev);
        })
    }

    /// Shorthand for [`subscribe_with_selector`](Self::subscribe_with_selector)
    /// with default options.
    pub fn select<T, Sel, F>(&self, selector: Sel, on_change: F) -> Subscription
    where
        T: PartialEq + 'static,
        Sel: Fn(&S) -> T + 'static,
        F: Fn(&T, &T) + 'static,
    {
        self.subscribe_with_selector(selector, on_change, SelectorOptions::default())
    }

    /// Selector subscription for selectors that can fail.
    ///
    /// A failure is handed to `on_error` and marks the subscription as
    /// errored. The memoized slice is not trusted after that: the next
    /// successful evaluation always reaches `on_change`, even if it equals
    /// the memo. If the very first evaluation fails, `on_error` runs during
    /// this call.
    pub fn try_subscribe_with_selector<T, E, Sel, F, OnErr>(
        &self,
        selector: Sel,
        on_change: F,
        on_error: OnErr,
        options: SelectorOptions<T>,
    ) -> Subscription
    where
        T: 'static,
        E: 'static,
        Sel: Fn(&S) -> Result<T, E> + 'static,
        F: Fn(&T, &T) + 'static,
        OnErr: Fn(E) + 'static,
    {
        let errored = Cell::new(false);
        let current: RefCell<Option<Rc<T>>> = RefCell::new(None);

        match selector(&self.get_state()) {
            Ok(slice) => {
                let slice = Rc::new(slice);
                if options.fire_immediately {
                    on_change(&*slice, &*slice);
                }
                *current.borrow_mut() = Some(slice);
            }
            Err(err) => {
                errored.set(true);
                on_error(err);
            }
        }

        let equality = options.equality;
        self.subscribe(move |state, _| {
            let next = match selector(state) {
                Ok(slice) => Rc::new(slice),
                Err(err) => {
                    errored.set(true);
                    on_error(err);
                    return;
                }
            };
            let was_errored = errored.replace(false);
            let prev = current.borrow().clone();
            match prev {
                Some(prev) if !was_errored && equality(&*prev, &*next) => {}
                Some(prev) => {
                    *current.borrow_mut() = Some(Rc::clone(&next));
                    on_change(&*next, &*prev);
                }
                None => {
                    *current.borrow_mut() = Some(Rc::clone(&next));
                    on_change(&*next, &*next);
                }
            }
        })
    }

    /// Returns a live, memoized view of `selector(state)`.
    pub fn watch<T, Sel>(&self, selector: Sel) -> Watch<T>
    where
        T: PartialEq + 'static,
        Sel: Fn(&S) -> T + 'static,
    {
        let value = Rc::new(RefCell::new(Rc::new(selector(&self.get_state()))));
        let changes = Rc::new(Cell::new(0));

        let memo = Rc::clone(&value);
        let counter = Rc::clone(&changes);
        let subscription = self.subscribe(move |state, _| {
            let next = selector(state);
            if **memo.borrow() == next {
                return;
            }
            *memo.borrow_mut() = Rc::new(next);
            counter.set(counter.get() + 1);
        });
        Watch {
            value,
            changes,
            subscription,
        }
    }
}

/// Memoized view over a selected slice; the analogue of a UI component
/// reading a store through a selector hook.
///
/// Unsubscribes when dropped.
pub struct Watch<T> {
    value: Rc<RefCell<Rc<T>>>,
    changes: Rc<Cell<u64>>,
    subscription: Subscription,
}

impl<T> Watch<T> {
    /// The latest selected slice.
    pub fn get(&self) -> Rc<T> {
        Rc::clone(&self.value.borrow())
    }

    /// How many real changes the view has observed.
    pub fn changes(&self) -> u64 {
        self.changes.get()
    }
}

impl<T> Drop for Watch<T> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Editor {
        grid_color: String,
        pointer: (i32, i32),
    }

    fn editor_store() -> Store<Editor> {
        Store::new(
            "editor",
            Editor {
                grid_color: "#af3eee".to_string(),
                pointer: (0, 0),
            },
        )
    }

    fn collect<T: Clone + 'static>() -> (Rc<RefCell<Vec<(T, T)>>>, impl Fn(&T, &T)) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        (calls, move |new: &T, old: &T| {
            sink.borrow_mut().push((new.clone(), old.clone()))
        })
    }

    #[test]
    fn test_reentrant_listener_keeps_selector_and_watch_current() {
        let store = editor_store();
        let inner = store.clone();
        // Clamps the pointer back onto the grid from inside a notification.
        let _ = store.subscribe(move |new, _| {
            if new.pointer.0 < 0 {
                inner.update(|s| s.pointer.0 = 0);
            }
        });
        let (calls, on_change) = collect::<(i32, i32)>();
        let _ = store.select(|s| s.pointer, on_change);
        let pointer = store.watch(|s| s.pointer);

        store.update(|s| s.pointer = (-3, 2));

        assert_eq!(store.get_state().pointer, (0, 2));
        assert_eq!(*calls.borrow(), vec![((0, 2), (0, 0))]);
        assert_eq!(*pointer.get(), store.get_state().pointer);
        assert_eq!(pointer.changes(), 1);
    }

    #[test]
    fn test_unrelated_change_does_not_fire() {
        let store = editor_store();
        let (calls, on_change) = collect::<String>();
        let _ = store.select(|s| s.grid_color.clone(), on_change);

        store.update(|s| s.pointer = (4, 2));
        assert!(calls.borrow().is_empty());

        store.update(|s| s.grid_color = "#fbe64d".to_string());
        assert_eq!(
            *calls.borrow(),
            vec![("#fbe64d".to_string(), "#af3eee".to_string())]
        );
    }

    #[test]
    fn test_two_selectors_are_independent() {
        let store = editor_store();
        let (colors, on_color) = collect::<String>();
        let (pointers, on_pointer) = collect::<(i32, i32)>();
        let _ = store.select(|s| s.grid_color.clone(), on_color);
        let _ = store.select(|s| s.pointer, on_pointer);

        store.update(|s| s.pointer = (1, 1));
        store.update(|s| s.pointer = (2, 1));
        store.update(|s| s.grid_color = "#000000".to_string());

        assert_eq!(colors.borrow().len(), 1);
        assert_eq!(
            *pointers.borrow(),
            vec![((1, 1), (0, 0)), ((2, 1), (1, 1))]
        );
    }

    #[test]
    fn test_fire_immediately_passes_slice_twice() {
        let store = editor_store();
        let (calls, on_change) = collect::<(i32, i32)>();
        let _ = store.subscribe_with_selector(
            |s| s.pointer,
            on_change,
            SelectorOptions::default().fire_immediately(true),
        );
        assert_eq!(*calls.borrow(), vec![((0, 0), (0, 0))]);
    }

    #[test]
    fn test_custom_equality_suppresses_changes() {
        let store = editor_store();
        let (calls, on_change) = collect::<(i32, i32)>();
        // Only react when the pointer moves to another row.
        let _ = store.subscribe_with_selector(
            |s| s.pointer,
            on_change,
            SelectorOptions::with_equality(|a: &(i32, i32), b: &(i32, i32)| a.1 == b.1),
        );

        store.update(|s| s.pointer = (5, 0));
        assert!(calls.borrow().is_empty());
        store.update(|s| s.pointer = (5, 3));
        assert_eq!(*calls.borrow(), vec![((5, 3), (0, 0))]);
    }

    #[test]
    fn test_identity_equality_on_rc_slices() {
        #[derive(Debug, Clone, PartialEq)]
        struct Layer {
            title: Rc<String>,
            opacity: u8,
        }

        let store = Store::new(
            "layer",
            Layer {
                title: Rc::new("base".to_string()),
                opacity: 255,
            },
        );
        let (calls, on_change) = collect::<Rc<String>>();
        let _ = store.subscribe_with_selector(
            |s| Rc::clone(&s.title),
            on_change,
            SelectorOptions::with_equality(|a: &Rc<String>, b: &Rc<String>| Rc::ptr_eq(a, b)),
        );

        store.update(|s| s.opacity = 128);
        assert!(calls.borrow().is_empty());

        // Same text, new allocation: identity sees a change.
        store.update(|s| {
            s.title = Rc::new("base".to_string());
            s.opacity = 64;
        });
        assert_eq!(calls.borrow().len(), 1);
        assert!(Rc::ptr_eq(&calls.borrow()[0].0, &store.get_state().title));
    }

    #[test]
    fn test_memo_not_updated_on_equal_slice() {
        let store = editor_store();
        let (calls, on_change) = collect::<i32>();
        // Equality treats values within 10 as equal; the memo must stay at 0
        // so drifting in small steps eventually fires against the first slice.
        let _ = store.subscribe_with_selector(
            |s| s.pointer.0,
            on_change,
            SelectorOptions::with_equality(|a: &i32, b: &i32| (a - b).abs() < 10),
        );
        for x in [4, 8, 12] {
            store.update(|s| s.pointer.0 = x);
        }
        assert_eq!(*calls.borrow(), vec![(12, 0)]);
    }

    #[test]
    fn test_unsubscribe_selector() {
        let store = editor_store();
        let (calls, on_change) = collect::<(i32, i32)>();
        let sub = store.select(|s| s.pointer, on_change);
        assert!(sub.unsubscribe());
        store.update(|s| s.pointer = (9, 9));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_failing_selector_surfaces_error_and_refires() {
        let store = editor_store();
        let (calls, on_change) = collect::<i32>();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let e = Rc::clone(&errors);

        let _ = store.try_subscribe_with_selector(
            |s: &Editor| {
                if s.pointer.0 < 0 {
                    Err(format!("negative x {}", s.pointer.0))
                } else {
                    Ok(s.pointer.0)
                }
            },
            on_change,
            move |err| e.borrow_mut().push(err),
            SelectorOptions::default(),
        );

        store.update(|s| s.pointer.0 = -1);
        assert_eq!(*errors.borrow(), vec!["negative x -1".to_string()]);
        assert!(calls.borrow().is_empty());

        // Back to the memoized value: the errored flag forces a notification.
        store.update(|s| s.pointer.0 = 0);
        assert_eq!(*calls.borrow(), vec![(0, 0)]);

        // Healthy again: equal slices are suppressed as usual.
        store.update(|s| s.pointer.1 = 7);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_failing_initial_selection() {
        let store = editor_store();
        let (calls, on_change) = collect::<i32>();
        let errors = Rc::new(Cell::new(0));
        let e = Rc::clone(&errors);

        let _ = store.try_subscribe_with_selector(
            |s: &Editor| {
                if s.pointer == (0, 0) {
                    Err(())
                } else {
                    Ok(s.pointer.0)
                }
            },
            on_change,
            move |()| e.set(e.get() + 1),
            SelectorOptions::default().fire_immediately(true),
        );
        assert_eq!(errors.get(), 1);

        store.update(|s| s.pointer = (3, 3));
        assert_eq!(*calls.borrow(), vec![(3, 3)]);
    }

    #[test]
    fn test_watch_tracks_latest_slice() {
        let store = editor_store();
        let watch = store.watch(|s| s.grid_color.clone());
        assert_eq!(*watch.get(), "#af3eee");

        store.update(|s| s.pointer = (1, 2));
        assert_eq!(watch.changes(), 0);

        store.update(|s| s.grid_color = "#123456".to_string());
        assert_eq!(*watch.get(), "#123456");
        assert_eq!(watch.changes(), 1);

        drop(watch);
        assert_eq!(store.listener_count(), 0);
    }
}

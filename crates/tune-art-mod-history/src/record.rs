/// Core types for change records and the undo/redo stacks.
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tune_art_store::Patch;

/// One undoable edit: the patches that perform it and the patches that
/// revert it.
///
/// History stacks hold records as `Rc<ChangeRecord>` and compare them by
/// pointer identity, never by value. Two edits that happen to produce the
/// same patches are still two different records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Forward patches, in application order.
    pub patches: Vec<Patch>,
    /// Patches that turn the post-edit snapshot back into the pre-edit one.
    pub inverse_patches: Vec<Patch>,
}

impl ChangeRecord {
    pub fn new(patches: Vec<Patch>, inverse_patches: Vec<Patch>) -> Self {
        Self {
            patches,
            inverse_patches,
        }
    }

    /// A record without forward patches describes no change at all.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

/// The two history stacks. Both are ordered oldest first, so the top of
/// each stack is its last element.
#[derive(Debug, Clone, Default)]
pub struct HistoryState {
    /// Undo stack.
    pub prev: Vec<Rc<ChangeRecord>>,
    /// Redo stack, emptied by every new edit.
    pub next: Vec<Rc<ChangeRecord>>,
}

impl HistoryState {
    pub fn undo_depth(&self) -> usize {
        self.prev.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.next.len()
    }

    /// The record an undo would revert.
    pub fn top_prev(&self) -> Option<&Rc<ChangeRecord>> {
        self.prev.last()
    }

    /// The record a redo would re-apply.
    pub fn top_next(&self) -> Option<&Rc<ChangeRecord>> {
        self.next.last()
    }
}

/// Stacks are equal when they hold the very same records in the same order.
impl PartialEq for HistoryState {
    fn eq(&self, other: &Self) -> bool {
        same_records(&self.prev, &other.prev) && same_records(&self.next, &other.next)
    }
}

fn same_records(a: &[Rc<ChangeRecord>], b: &[Rc<ChangeRecord>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Rc::ptr_eq(x, y))
}

/// Identity comparison of two optional stack tops.
pub(crate) fn same_record(a: Option<&Rc<ChangeRecord>>, b: Option<&Rc<ChangeRecord>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> ChangeRecord {
        ChangeRecord::new(
            vec![Patch::replace(vec!["width".into()], json!(3))],
            vec![Patch::replace(vec!["width".into()], json!(2))],
        )
    }

    #[test]
    fn test_record_is_empty() {
        assert!(ChangeRecord::default().is_empty());
        assert!(!sample_record().is_empty());
    }

    #[test]
    fn test_record_serde_shape() {
        let encoded = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "patches": [{"op": "replace", "path": ["width"], "value": 3}],
                "inverse_patches": [{"op": "replace", "path": ["width"], "value": 2}],
            })
        );
        let decoded: ChangeRecord = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, sample_record());
    }

    #[test]
    fn test_history_state_equality_is_identity() {
        let a = Rc::new(sample_record());
        let b = Rc::new(sample_record());
        assert_eq!(*a, *b);

        let left = HistoryState {
            prev: vec![Rc::clone(&a)],
            next: Vec::new(),
        };
        let same = HistoryState {
            prev: vec![Rc::clone(&a)],
            next: Vec::new(),
        };
        let lookalike = HistoryState {
            prev: vec![b],
            next: Vec::new(),
        };
        assert_eq!(left, same);
        assert_ne!(left, lookalike);
    }

    #[test]
    fn test_depths_and_tops() {
        let a = Rc::new(sample_record());
        let state = HistoryState {
            prev: vec![Rc::clone(&a)],
            next: Vec::new(),
        };
        assert_eq!(state.undo_depth(), 1);
        assert_eq!(state.redo_depth(), 0);
        assert!(same_record(state.top_prev(), Some(&a)));
        assert!(!same_record(state.top_next(), Some(&a)));
        assert!(!same_record(None, None));
    }
}

//! Structural diff between two serde value trees.
//!
//! Produces the minimal-ish patch list that turns `old` into `new`:
//! objects are compared key by key, arrays index by index over their common
//! prefix (growth appends, shrinkage removes from the tail), and anything
//! else is replaced wholesale at its path.
use serde_json::Value;

use crate::patch::{Patch, PathSegment};

/// Computes the patches that turn `old` into `new`.
///
/// The inverse list is simply `diff(new, old)`.
pub fn diff(old: &Value, new: &Value) -> Vec<Patch> {
    let mut patches = Vec::new();
    let mut path = Vec::new();
    diff_inner(old, new, &mut path, &mut patches);
    patches
}

/// Computes forward and inverse patches in one call.
pub fn diff_pair(old: &Value, new: &Value) -> (Vec<Patch>, Vec<Patch>) {
    (diff(old, new), diff(new, old))
}

fn diff_inner(old: &Value, new: &Value, path: &mut Vec<PathSegment>, out: &mut Vec<Patch>) {
    if old == new {
        return;
    }

    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            for (key, old_value) in old_map {
                path.push(PathSegment::Key(key.clone()));
                match new_map.get(key) {
                    Some(new_value) => diff_inner(old_value, new_value, path, out),
                    None => out.push(Patch::remove(path.clone())),
                }
                path.pop();
            }
            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    path.push(PathSegment::Key(key.clone()));
                    out.push(Patch::add(path.clone(), new_value.clone()));
                    path.pop();
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            let common = old_items.len().min(new_items.len());
            for index in 0..common {
                path.push(PathSegment::Index(index));
                diff_inner(&old_items[index], &new_items[index], path, out);
                path.pop();
            }
            for (index, item) in new_items.iter().enumerate().skip(common) {
                path.push(PathSegment::Index(index));
                out.push(Patch::add(path.clone(), item.clone()));
                path.pop();
            }
            // Highest index first so earlier removals don't shift later ones.
            for index in (common..old_items.len()).rev() {
                path.push(PathSegment::Index(index));
                out.push(Patch::remove(path.clone()));
                path.pop();
            }
        }
        _ => out.push(Patch::replace(path.clone(), new.clone())),
    }
}

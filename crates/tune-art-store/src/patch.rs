//! Patch model and the patch-application half of the diff primitive.
//!
//! A [`Patch`] is one elementary structural edit against the serde
//! representation of a snapshot. Paths are ordered key/index segments, so
//! `["data", 3, "color"]` addresses the color of the fourth grid cell.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::PatchError;

/// Kind of elementary edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

impl std::fmt::Display for PatchOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PatchOp::Add => "add",
            PatchOp::Replace => "replace",
            PatchOp::Remove => "remove",
        };
        f.write_str(s)
    }
}

/// One step of a patch path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// A single structural change between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub op: PatchOp,
    pub path: Vec<PathSegment>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub value: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only an absent field is `None`.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl Patch {
    pub fn add(path: Vec<PathSegment>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path,
            value: Some(value),
        }
    }

    pub fn replace(path: Vec<PathSegment>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path,
            value: Some(value),
        }
    }

    pub fn remove(path: Vec<PathSegment>) -> Self {
        Self {
            op: PatchOp::Remove,
            path,
            value: None,
        }
    }

    /// The patch path as an RFC 6901 JSON pointer.
    pub fn pointer(&self) -> String {
        pointer(&self.path)
    }
}

fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Renders a path as a JSON pointer (`""` for the document root).
pub fn pointer(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        out.push('/');
        match segment {
            PathSegment::Key(key) => out.push_str(&escape_pointer_segment(key)),
            PathSegment::Index(index) => out.push_str(&index.to_string()),
        }
    }
    out
}

/// Applies `patches` to `target` in order.
///
/// Stops at the first failing patch; earlier patches stay applied, so
/// callers that need atomicity should work on a copy.
///
/// # Errors
///
/// Returns an error if a path does not resolve, an index is out of range,
/// or an `add`/`replace` patch carries no value.
pub fn apply_patches(target: &mut Value, patches: &[Patch]) -> Result<(), PatchError> {
    for patch in patches {
        apply_patch(target, patch)?;
    }
    Ok(())
}

/// Applies a single patch to `target`.
pub fn apply_patch(target: &mut Value, patch: &Patch) -> Result<(), PatchError> {
    let Some((last, parents)) = patch.path.split_last() else {
        return match patch.op {
            PatchOp::Remove => Err(PatchError::RemoveRoot),
            PatchOp::Add | PatchOp::Replace => {
                *target = value_of(patch)?;
                Ok(())
            }
        };
    };

    let parent = resolve_mut(target, parents)?;
    match (parent, last) {
        (Value::Object(map), PathSegment::Key(key)) => match patch.op {
            PatchOp::Add => {
                map.insert(key.clone(), value_of(patch)?);
                Ok(())
            }
            PatchOp::Replace => {
                let value = value_of(patch)?;
                let slot = map.get_mut(key).ok_or_else(|| PatchError::PathNotFound {
                    path: patch.pointer(),
                })?;
                *slot = value;
                Ok(())
            }
            PatchOp::Remove => map.remove(key).map(|_| ()).ok_or_else(|| {
                PatchError::PathNotFound {
                    path: patch.pointer(),
                }
            }),
        },
        (Value::Array(items), PathSegment::Index(index)) => {
            let index = *index;
            let len = items.len();
            let in_bounds = match patch.op {
                PatchOp::Add => index <= len,
                PatchOp::Replace | PatchOp::Remove => index < len,
            };
            if !in_bounds {
                return Err(PatchError::IndexOutOfBounds {
                    path: patch.pointer(),
                    index,
                    len,
                });
            }
            match patch.op {
                PatchOp::Add => items.insert(index, value_of(patch)?),
                PatchOp::Replace => items[index] = value_of(patch)?,
                PatchOp::Remove => {
                    items.remove(index);
                }
            }
            Ok(())
        }
        _ => Err(PatchError::NotAContainer {
            path: pointer(parents),
        }),
    }
}

fn value_of(patch: &Patch) -> Result<Value, PatchError> {
    patch.value.clone().ok_or_else(|| PatchError::MissingValue {
        op: patch.op,
        path: patch.pointer(),
    })
}

fn resolve_mut<'a>(
    mut current: &'a mut Value,
    path: &[PathSegment],
) -> Result<&'a mut Value, PatchError> {
    for (depth, segment) in path.iter().enumerate() {
        let next = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
            (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
            _ => None,
        };
        current = next.ok_or_else(|| PatchError::PathNotFound {
            path: pointer(&path[..=depth]),
        })?;
    }
    Ok(current)
}

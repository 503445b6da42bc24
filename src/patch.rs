//! Structural patches (RFC 6902 subset: add, remove, replace)
//!
//! Patches address documents with JSON pointers. [`apply_patch`] replays
//! operations against a raw document; [`diff`] produces the operations that
//! turn one exported document into another.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Patch application errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("Invalid pointer: '{0}'")]
    InvalidPointer(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Index {index} out of bounds at {path} (length {len})")]
    IndexOutOfBounds { path: String, index: usize, len: usize },

    #[error("Invalid array index at {0}")]
    InvalidIndex(String),

    #[error("Cannot address into a scalar at {0}")]
    NotAContainer(String),
}

/// A single patch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            PatchOp::Add { path, .. }
            | PatchOp::Remove { path }
            | PatchOp::Replace { path, .. } => path,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, PatchOp::Add { .. })
    }
}

/// An ordered list of operations applied as one edit
pub type Patch = Vec<PatchOp>;

/// Apply `patch` to `doc`
///
/// Operations run in order against a working copy; `doc` is only replaced
/// once every operation succeeded.
pub fn apply_patch(doc: &mut Value, patch: &[PatchOp]) -> Result<(), PatchError> {
    let mut working = doc.clone();
    for op in patch {
        apply_op(&mut working, op)?;
    }
    *doc = working;
    Ok(())
}

fn apply_op(doc: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    let path = op.path();
    let tokens = parse_pointer(path)?;

    let Some((last, parents)) = tokens.split_last() else {
        // Whole-document target
        return match op {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => {
                *doc = value.clone();
                Ok(())
            }
            PatchOp::Remove { .. } => Err(PatchError::InvalidPointer(path.to_string())),
        };
    };

    let parent = resolve_mut(doc, parents, path)?;
    match (op, parent) {
        (PatchOp::Add { value, .. }, Value::Object(map)) => {
            map.insert(last.clone(), value.clone());
        }
        (PatchOp::Add { value, .. }, Value::Array(items)) => {
            if last == "-" {
                items.push(value.clone());
            } else {
                let index = parse_index(last, path)?;
                if index > items.len() {
                    return Err(PatchError::IndexOutOfBounds {
                        path: path.to_string(),
                        index,
                        len: items.len(),
                    });
                }
                items.insert(index, value.clone());
            }
        }
        (PatchOp::Remove { .. }, Value::Object(map)) => {
            if map.remove(last).is_none() {
                return Err(PatchError::PathNotFound(path.to_string()));
            }
        }
        (PatchOp::Remove { .. }, Value::Array(items)) => {
            let index = existing_index(last, items.len(), path)?;
            items.remove(index);
        }
        (PatchOp::Replace { value, .. }, Value::Object(map)) => match map.get_mut(last) {
            Some(slot) => *slot = value.clone(),
            None => return Err(PatchError::PathNotFound(path.to_string())),
        },
        (PatchOp::Replace { value, .. }, Value::Array(items)) => {
            let index = existing_index(last, items.len(), path)?;
            items[index] = value.clone();
        }
        _ => return Err(PatchError::NotAContainer(path.to_string())),
    }
    Ok(())
}

fn resolve_mut<'v>(
    doc: &'v mut Value,
    tokens: &[String],
    path: &str,
) -> Result<&'v mut Value, PatchError> {
    let mut current = doc;
    for token in tokens {
        current = match current {
            Value::Object(map) => map
                .get_mut(token)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?,
            Value::Array(items) => {
                let index = existing_index(token, items.len(), path)?;
                &mut items[index]
            }
            _ => return Err(PatchError::NotAContainer(path.to_string())),
        };
    }
    Ok(current)
}

fn parse_index(token: &str, path: &str) -> Result<usize, PatchError> {
    // RFC 6901: no leading zeros, no sign
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return Err(PatchError::InvalidIndex(path.to_string()));
    }
    token
        .parse::<usize>()
        .map_err(|_| PatchError::InvalidIndex(path.to_string()))
}

fn existing_index(token: &str, len: usize, path: &str) -> Result<usize, PatchError> {
    let index = parse_index(token, path)?;
    if index >= len {
        return Err(PatchError::IndexOutOfBounds {
            path: path.to_string(),
            index,
            len,
        });
    }
    Ok(index)
}

/// Split a JSON pointer into unescaped reference tokens
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer(pointer.to_string()));
    };
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn push_token(pointer: &str, token: &str) -> String {
    format!("{}/{}", pointer, token.replace('~', "~0").replace('/', "~1"))
}

/// Operations turning `from` into `to`
///
/// Objects are compared key by key, arrays index by index (surplus elements
/// are added, or removed from the back), anything else that differs is
/// replaced.
pub fn diff(from: &Value, to: &Value) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff_into(from, to, "", &mut ops);
    ops
}

fn diff_into(from: &Value, to: &Value, pointer: &str, ops: &mut Vec<PatchOp>) {
    match (from, to) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                let path = push_token(pointer, key);
                match new.get(key) {
                    Some(new_value) => diff_into(old_value, new_value, &path, ops),
                    None => ops.push(PatchOp::Remove { path }),
                }
            }
            for (key, new_value) in new {
                if !old.contains_key(key) {
                    ops.push(PatchOp::Add {
                        path: push_token(pointer, key),
                        value: new_value.clone(),
                    });
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            let common = old.len().min(new.len());
            for index in 0..common {
                let path = format!("{}/{}", pointer, index);
                diff_into(&old[index], &new[index], &path, ops);
            }
            for (index, value) in new.iter().enumerate().skip(common) {
                ops.push(PatchOp::Add {
                    path: format!("{}/{}", pointer, index),
                    value: value.clone(),
                });
            }
            for index in (common..old.len()).rev() {
                ops.push(PatchOp::Remove {
                    path: format!("{}/{}", pointer, index),
                });
            }
        }
        _ if from == to => {}
        _ => ops.push(PatchOp::Replace {
            path: pointer.to_string(),
            value: to.clone(),
        }),
    }
}

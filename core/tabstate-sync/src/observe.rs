//! Change detection over a shared JSON state.
//!
//! An [`Observed`] is a cursor into a [`StateCell`]: the cell holds the whole
//! state, the cursor holds a path from the root to one container (object or
//! array). Reads through a cursor are plain reads. Writes go through one of
//! three mutating operations, each of which reports at most one change to the
//! cursor's hook:
//!
//! - [`Observed::set`] reports only when the new value differs from the
//!   current one, so writing an unchanged value is a no-op.
//! - [`Observed::delete`] always reports.
//! - [`Observed::call`] runs an arbitrary in-place operation and reports only
//!   when the receiver's serialized form changed.
//!
//! Nested containers are reached with [`Observed::at`], which builds a fresh
//! cursor on every call and never visits anything below the requested path.
//! Primitives and `null` end the descent; read them with [`Observed::get`].
//!
//! The hook runs after the cell's lock is released, so it may read the state.

use crate::error::{SyncError, SyncResult};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// Callback invoked once per effective mutation.
pub type ChangeHook = Arc<dyn Fn() + Send + Sync>;

/// One step of a path into the state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "key `{key}`"),
            Self::Index(index) => write!(f, "index {index}"),
        }
    }
}

/// Shared, subscribable holder of a state value.
///
/// Cloning yields another handle to the same value.
#[derive(Debug, Clone)]
pub struct StateCell {
    tx: Arc<watch::Sender<Value>>,
}

impl StateCell {
    /// Creates a cell holding `value`.
    pub fn new(value: Value) -> Self {
        let (tx, _) = watch::channel(value);
        Self { tx: Arc::new(tx) }
    }

    /// Returns a copy of the current value.
    pub fn snapshot(&self) -> Value {
        self.tx.borrow().clone()
    }

    /// Runs `f` against the current value without copying it.
    pub fn read<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Replaces the value, returning the previous one.
    pub fn replace(&self, value: Value) -> Value {
        self.tx.send_replace(value)
    }

    /// Replaces the value unless it is already equal. Returns whether it
    /// changed.
    pub fn replace_if_changed(&self, value: Value) -> bool {
        self.tx.send_if_modified(move |current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Mutates the value in place. `f` returns whether it changed anything;
    /// subscribers are woken only on change. The value stays locked for the
    /// duration of `f`.
    pub fn modify(&self, f: impl FnOnce(&mut Value) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    /// Subscribes to value changes.
    pub fn subscribe(&self) -> watch::Receiver<Value> {
        self.tx.subscribe()
    }
}

/// Wraps `value` in a new cell and returns a root cursor reporting to
/// `on_change`.
pub fn observe(value: Value, on_change: impl Fn() + Send + Sync + 'static) -> Observed {
    Observed::over(StateCell::new(value), Arc::new(on_change))
}

/// A change-reporting cursor into a [`StateCell`].
#[derive(Clone)]
pub struct Observed {
    cell: StateCell,
    path: Vec<PathSegment>,
    on_change: ChangeHook,
}

impl Observed {
    /// Creates a root cursor over an existing cell.
    pub fn over(cell: StateCell, on_change: ChangeHook) -> Self {
        Self {
            cell,
            path: Vec::new(),
            on_change,
        }
    }

    /// The cell this cursor reads and writes.
    pub fn cell(&self) -> &StateCell {
        &self.cell
    }

    /// The cursor's path, rendered as `$.a.b[0]`.
    pub fn path(&self) -> String {
        render_path(&self.path)
    }

    // ── Reads ────────────────────────────────────────────────────

    /// A copy of the value under the cursor, or `None` if the path no longer
    /// resolves.
    pub fn value(&self) -> Option<Value> {
        self.cell.read(|root| resolve(root, &self.path).cloned())
    }

    /// A copy of one member of the value under the cursor.
    pub fn get(&self, key: impl Into<PathSegment>) -> Option<Value> {
        let key = key.into();
        self.cell.read(|root| {
            resolve(root, &self.path)
                .and_then(|target| child(target, &key))
                .cloned()
        })
    }

    /// Whether the value under the cursor has the given member.
    pub fn contains(&self, key: impl Into<PathSegment>) -> bool {
        let key = key.into();
        self.cell.read(|root| {
            resolve(root, &self.path)
                .and_then(|target| child(target, &key))
                .is_some()
        })
    }

    /// A fresh cursor on a nested container, or `None` when the member is
    /// missing, a primitive or `null`.
    pub fn at(&self, key: impl Into<PathSegment>) -> Option<Observed> {
        let key = key.into();
        let nested = self.cell.read(|root| {
            resolve(root, &self.path)
                .and_then(|target| child(target, &key))
                .is_some_and(is_container)
        });
        nested.then(|| {
            let mut path = self.path.clone();
            path.push(key);
            Observed {
                cell: self.cell.clone(),
                path,
                on_change: Arc::clone(&self.on_change),
            }
        })
    }

    /// Member names when the cursor is on an object, otherwise empty.
    pub fn keys(&self) -> Vec<String> {
        self.cell.read(|root| match resolve(root, &self.path) {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        })
    }

    /// Number of members or elements under the cursor.
    pub fn len(&self) -> usize {
        self.cell.read(|root| match resolve(root, &self.path) {
            Some(Value::Object(map)) => map.len(),
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        })
    }

    /// Whether the container under the cursor is empty (or gone).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Sets a member. Reports a change only if the value differs from the
    /// current one. Returns whether it changed.
    ///
    /// On arrays, an index equal to the length appends.
    pub fn set(&self, key: impl Into<PathSegment>, value: impl Into<Value>) -> SyncResult<bool> {
        let key = key.into();
        let value = value.into();
        self.mutate(move |target| match (target, &key) {
            (Value::Object(map), PathSegment::Key(k)) => {
                if map.get(k) == Some(&value) {
                    return Ok((false, false));
                }
                map.insert(k.clone(), value);
                Ok((true, true))
            }
            (Value::Array(items), PathSegment::Index(index)) => {
                let index = *index;
                if index < items.len() {
                    if items[index] == value {
                        return Ok((false, false));
                    }
                    items[index] = value;
                    Ok((true, true))
                } else if index == items.len() {
                    items.push(value);
                    Ok((true, true))
                } else {
                    Err(SyncError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    })
                }
            }
            (target, key) => Err(invalid_segment(target, key)),
        })
    }

    /// Removes a member, returning it. Always reports a change, even when
    /// the member was absent.
    pub fn delete(&self, key: impl Into<PathSegment>) -> SyncResult<Option<Value>> {
        let key = key.into();
        self.mutate(move |target| match (target, &key) {
            (Value::Object(map), PathSegment::Key(k)) => Ok((true, map.remove(k))),
            (Value::Array(items), PathSegment::Index(index)) => {
                let removed = (*index < items.len()).then(|| items.remove(*index));
                Ok((true, removed))
            }
            (target, key) => Err(invalid_segment(target, key)),
        })
    }

    /// Runs an in-place operation on the value under the cursor. Reports a
    /// change only if the value's serialized form differs afterwards.
    ///
    /// The state is locked while `f` runs; `f` must not go through another
    /// cursor or handle of the same state.
    pub fn call<R>(&self, f: impl FnOnce(&mut Value) -> R) -> SyncResult<R> {
        self.mutate(|target| {
            let before = serde_json::to_string(target)?;
            let result = f(target);
            let after = serde_json::to_string(target)?;
            Ok((before != after, result))
        })
    }

    /// Appends to the array under the cursor.
    pub fn push(&self, value: impl Into<Value>) -> SyncResult<()> {
        let value = value.into();
        let path = self.path();
        self.call(move |target| match target {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(SyncError::InvalidSegment {
                container: kind_name(other),
                segment: format!("push at `{path}`"),
            }),
        })?
    }

    /// Resolves the cursor, applies `op` to the container it points at and
    /// fires the hook if `op` reported a change.
    fn mutate<R>(
        &self,
        op: impl FnOnce(&mut Value) -> SyncResult<(bool, R)>,
    ) -> SyncResult<R> {
        let path = &self.path;
        let mut outcome = Err(SyncError::DetachedPath {
            path: render_path(path),
        });
        let changed = self.cell.modify(|root| match resolve_mut(root, path) {
            Some(target) if is_container(&*target) => match op(target) {
                Ok((changed, result)) => {
                    outcome = Ok(result);
                    changed
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            },
            _ => false,
        });
        let result = outcome?;
        if changed {
            trace!(path = %render_path(path), "State mutated");
            (self.on_change)();
        }
        Ok(result)
    }
}

impl fmt::Debug for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observed")
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

fn child<'v>(value: &'v Value, segment: &PathSegment) -> Option<&'v Value> {
    match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn child_mut<'v>(value: &'v mut Value, segment: &PathSegment) -> Option<&'v mut Value> {
    match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
        (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
        _ => None,
    }
}

fn resolve<'v>(root: &'v Value, path: &[PathSegment]) -> Option<&'v Value> {
    path.iter().try_fold(root, |value, segment| child(value, segment))
}

fn resolve_mut<'v>(root: &'v mut Value, path: &[PathSegment]) -> Option<&'v mut Value> {
    let mut current = root;
    for segment in path {
        current = child_mut(current, segment)?;
    }
    Some(current)
}

fn render_path(path: &[PathSegment]) -> String {
    let mut rendered = String::from("$");
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                rendered.push('.');
                rendered.push_str(key);
            }
            PathSegment::Index(index) => rendered.push_str(&format!("[{index}]")),
        }
    }
    rendered
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid_segment(target: &Value, segment: &PathSegment) -> SyncError {
    SyncError::InvalidSegment {
        container: kind_name(target),
        segment: segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_path_formats_segments() {
        let path = vec![
            PathSegment::from("a"),
            PathSegment::from(0_usize),
            PathSegment::from("b"),
        ];
        assert_eq!(render_path(&path), "$.a[0].b");
        assert_eq!(render_path(&[]), "$");
    }

    #[test]
    fn resolve_walks_objects_and_arrays() {
        let root = json!({"a": [{"b": 1}]});
        let path = [PathSegment::from("a"), PathSegment::from(0_usize)];
        assert_eq!(resolve(&root, &path), Some(&json!({"b": 1})));
        assert_eq!(resolve(&root, &[PathSegment::from(1_usize)]), None);
    }
}

//! Immutable state snapshots.
//!
//! A [`Snapshot`] is the full state tree at a single point in time: a map
//! from slice name to an `Arc`'d slice value. Snapshots are cheap to clone
//! (one `Arc` bump per slice) and never mutated in place; every committed
//! dispatch produces a new snapshot. When an action is unknown to every
//! slice, the produced snapshot shares each slice `Arc` with its input, so
//! "unchanged by reference" is observable via [`Arc::ptr_eq`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

/// Object-safe view over a slice's value.
///
/// Implemented blanketly for any `Clone + Debug + Serialize` owned type, so
/// slice state structs need no manual impl.
pub trait SliceValue: Any + Send + Sync {
    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Serialize for observability (logging middleware, demo output).
    fn to_json(&self) -> Value;

    /// Debug-format the underlying value.
    ///
    /// # Errors
    ///
    /// Propagates formatter errors.
    fn debug_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T> SliceValue for T
where
    T: Any + Send + Sync + fmt::Debug + Serialize,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn debug_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The full state tree at a single point in time.
///
/// Keys are fixed at composition time; insertion order is irrelevant.
#[derive(Clone, Default)]
pub struct Snapshot {
    slices: BTreeMap<&'static str, Arc<dyn SliceValue>>,
}

impl Snapshot {
    /// Typed read access to a slice's value.
    ///
    /// Returns `None` if the slice does not exist or holds a different
    /// type than requested.
    #[must_use]
    pub fn slice<T: 'static>(&self, name: &str) -> Option<&T> {
        self.slices
            .get(name)
            .and_then(|value| value.as_any().downcast_ref::<T>())
    }

    /// The erased slice value, useful for identity checks.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&Arc<dyn SliceValue>> {
        self.slices.get(name)
    }

    /// Names of all slices in this snapshot.
    pub fn slice_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slices.keys().copied()
    }

    /// Number of slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether the snapshot has no slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Render the whole tree as a JSON object keyed by slice name.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.slices
                .iter()
                .map(|(name, value)| ((*name).to_owned(), value.to_json()))
                .collect(),
        )
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: Arc<dyn SliceValue>) {
        self.slices.insert(name, value);
    }
}

impl fmt::Debug for dyn SliceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.debug_fmt(f)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.slices.iter()).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone, Debug, Serialize, PartialEq, Eq)]
    struct Pantry {
        cakes: i64,
    }

    fn snapshot_with(cakes: i64) -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.insert("pantry", Arc::new(Pantry { cakes }));
        snapshot
    }

    #[test]
    fn typed_access_downcasts() {
        let snapshot = snapshot_with(10);
        assert_eq!(snapshot.slice::<Pantry>("pantry"), Some(&Pantry { cakes: 10 }));
        assert_eq!(snapshot.slice::<i64>("pantry"), None);
        assert_eq!(snapshot.slice::<Pantry>("missing"), None);
    }

    #[test]
    fn clone_shares_slice_arcs() {
        let snapshot = snapshot_with(10);
        let copy = snapshot.clone();
        let a = snapshot.raw("pantry").expect("slice present");
        let b = copy.raw("pantry").expect("slice present");
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn erased_values_are_debuggable() {
        let snapshot = snapshot_with(10);
        let value = snapshot.raw("pantry").expect("slice present");
        assert_eq!(format!("{value:?}"), "Pantry { cakes: 10 }");
        assert!(format!("{snapshot:?}").contains("pantry"));
    }

    #[test]
    fn renders_json_tree() {
        let snapshot = snapshot_with(7);
        assert_eq!(snapshot.to_json(), json!({ "pantry": { "cakes": 7 } }));
    }
}

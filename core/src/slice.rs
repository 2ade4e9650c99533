//! Typed slice builders and their erased form.
//!
//! A slice owns an initial value, a set of named update operations, and
//! optionally reactions to action kinds defined by other slices. The typed
//! [`SliceBuilder`] erases handlers behind `dyn` closures so slices with
//! different state types compose into one snapshot.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::action::{Action, ActionKind};
use crate::error::ReducerFault;
use crate::lifecycle::AsyncLifecycle;
use crate::snapshot::SliceValue;

pub(crate) type ErasedHandler = Arc<
    dyn Fn(&dyn SliceValue, &Action) -> Result<Arc<dyn SliceValue>, ReducerFault> + Send + Sync,
>;

pub(crate) struct HandlerEntry {
    pub(crate) kind: ActionKind,
    pub(crate) handler: ErasedHandler,
}

/// A composed, type-erased slice ready for registration on a store.
///
/// Built with [`SliceBuilder`]; consumed by
/// [`Composition`](crate::Composition).
pub struct Slice {
    pub(crate) name: &'static str,
    pub(crate) initial: Arc<dyn SliceValue>,
    pub(crate) operations: Vec<HandlerEntry>,
    pub(crate) reactions: Vec<HandlerEntry>,
}

impl Slice {
    /// The slice's name, which prefixes all of its operation kinds.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Kinds of the operations this slice owns.
    pub fn operation_kinds(&self) -> impl Iterator<Item = &ActionKind> + '_ {
        self.operations.iter().map(|entry| &entry.kind)
    }

    /// Kinds of other slices' actions this slice reacts to.
    pub fn reaction_kinds(&self) -> impl Iterator<Item = &ActionKind> + '_ {
        self.reactions.iter().map(|entry| &entry.kind)
    }
}

fn erase<T, F>(slice: &'static str, f: F) -> ErasedHandler
where
    T: Clone + Send + Sync + std::fmt::Debug + Serialize + 'static,
    F: Fn(&T, &Action) -> Result<T, ReducerFault> + Send + Sync + 'static,
{
    Arc::new(move |value: &dyn SliceValue, action: &Action| {
        let state = value.as_any().downcast_ref::<T>().ok_or_else(|| ReducerFault {
            slice,
            kind: action.kind().clone(),
            message: "slice value has an unexpected type".to_owned(),
        })?;
        let next = f(state, action)?;
        Ok(Arc::new(next) as Arc<dyn SliceValue>)
    })
}

/// Builder for a named slice over a concrete state type `T`.
///
/// Operation kinds are derived as `"<slice>/<operation>"`, the convention
/// the rest of the system routes and validates on.
pub struct SliceBuilder<T> {
    name: &'static str,
    initial: T,
    operations: Vec<HandlerEntry>,
    reactions: Vec<HandlerEntry>,
}

impl<T> SliceBuilder<T>
where
    T: Clone + Send + Sync + std::fmt::Debug + Serialize + 'static,
{
    /// Start a slice with its name and initial value.
    #[must_use]
    pub const fn new(name: &'static str, initial: T) -> Self {
        Self {
            name,
            initial,
            operations: Vec::new(),
            reactions: Vec::new(),
        }
    }

    /// Register a named update operation with a typed optional payload.
    ///
    /// The action's JSON payload is decoded to `P`; a present payload that
    /// fails to decode is a [`ReducerFault`] for that dispatch. Absent
    /// payloads arrive as `None`, which is where default magnitudes (e.g.
    /// "order one cake") belong.
    #[must_use]
    pub fn operation<P, F>(mut self, name: &str, f: F) -> Self
    where
        P: DeserializeOwned,
        F: Fn(&T, Option<P>) -> T + Send + Sync + 'static,
    {
        let kind = ActionKind::new(format!("{}/{name}", self.name));
        let slice = self.name;
        let handler = erase(slice, move |state: &T, action: &Action| {
            let payload = match action.payload() {
                Some(value) => Some(P::deserialize(value).map_err(|e| ReducerFault {
                    slice,
                    kind: action.kind().clone(),
                    message: format!("payload decode failed: {e}"),
                })?),
                None => None,
            };
            Ok(f(state, payload))
        });
        self.operations.push(HandlerEntry { kind, handler });
        self
    }

    /// Register a raw handler with access to the whole action, including
    /// its error field. Useful when an operation is fallible.
    #[must_use]
    pub fn handler<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&T, &Action) -> Result<T, ReducerFault> + Send + Sync + 'static,
    {
        let kind = ActionKind::new(format!("{}/{name}", self.name));
        self.operations.push(HandlerEntry {
            kind,
            handler: erase(self.name, f),
        });
        self
    }

    /// React to an action kind defined by another slice.
    ///
    /// Reactions are one-way: this slice may depend on the source slice,
    /// never the reverse. The composition validates the resulting
    /// dependency graph is acyclic.
    #[must_use]
    pub fn reaction<F>(mut self, kind: impl Into<ActionKind>, f: F) -> Self
    where
        F: Fn(&T, &Action) -> T + Send + Sync + 'static,
    {
        self.reactions.push(HandlerEntry {
            kind: kind.into(),
            handler: erase(self.name, move |state: &T, action: &Action| {
                Ok(f(state, action))
            }),
        });
        self
    }

    /// Handle the requested leg of an async lifecycle owned by this slice.
    #[must_use]
    pub fn on_pending<F>(mut self, lifecycle: &AsyncLifecycle, f: F) -> Self
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.operations.push(HandlerEntry {
            kind: lifecycle.pending(),
            handler: erase(self.name, move |state: &T, _action: &Action| Ok(f(state))),
        });
        self
    }

    /// Handle the succeeded leg of an async lifecycle owned by this slice.
    ///
    /// The fulfilled payload is required; a missing or undecodable payload
    /// is a [`ReducerFault`].
    #[must_use]
    pub fn on_fulfilled<P, F>(mut self, lifecycle: &AsyncLifecycle, f: F) -> Self
    where
        P: DeserializeOwned,
        F: Fn(&T, P) -> T + Send + Sync + 'static,
    {
        let slice = self.name;
        self.operations.push(HandlerEntry {
            kind: lifecycle.fulfilled(),
            handler: erase(slice, move |state: &T, action: &Action| {
                let value = action.payload().ok_or_else(|| ReducerFault {
                    slice,
                    kind: action.kind().clone(),
                    message: "fulfilled action carries no payload".to_owned(),
                })?;
                let payload = P::deserialize(value).map_err(|e| ReducerFault {
                    slice,
                    kind: action.kind().clone(),
                    message: format!("payload decode failed: {e}"),
                })?;
                Ok(f(state, payload))
            }),
        });
        self
    }

    /// Handle the failed leg of an async lifecycle owned by this slice.
    #[must_use]
    pub fn on_rejected<F>(mut self, lifecycle: &AsyncLifecycle, f: F) -> Self
    where
        F: Fn(&T, &str) -> T + Send + Sync + 'static,
    {
        self.operations.push(HandlerEntry {
            kind: lifecycle.rejected(),
            handler: erase(self.name, move |state: &T, action: &Action| {
                Ok(f(state, action.error().unwrap_or("unknown error")))
            }),
        });
        self
    }

    /// Finish the slice.
    #[must_use]
    pub fn build(self) -> Slice {
        Slice {
            name: self.name,
            initial: Arc::new(self.initial),
            operations: self.operations,
            reactions: self.reactions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
    struct Counter {
        count: i64,
    }

    fn counter_slice() -> Slice {
        SliceBuilder::new("counter", Counter::default())
            .operation("add", |state: &Counter, by: Option<i64>| Counter {
                count: state.count + by.unwrap_or(1),
            })
            .reaction("other/reset", |_state: &Counter, _action| Counter::default())
            .build()
    }

    #[test]
    fn derives_prefixed_operation_kinds() {
        let slice = counter_slice();
        let kinds: Vec<_> = slice.operation_kinds().map(ActionKind::as_str).collect();
        assert_eq!(kinds, vec!["counter/add"]);
        let reactions: Vec<_> = slice.reaction_kinds().map(ActionKind::as_str).collect();
        assert_eq!(reactions, vec!["other/reset"]);
    }

    #[test]
    fn operation_decodes_payload() {
        let slice = counter_slice();
        let handler = &slice.operations[0].handler;
        let state = Counter { count: 1 };

        let next = handler(&state, &Action::new("counter/add").with_payload(json!(4)))
            .expect("handler succeeds");
        assert_eq!(next.as_any().downcast_ref::<Counter>(), Some(&Counter { count: 5 }));

        // Absent payload means default magnitude.
        let next = handler(&state, &Action::new("counter/add")).expect("handler succeeds");
        assert_eq!(next.as_any().downcast_ref::<Counter>(), Some(&Counter { count: 2 }));
    }

    #[test]
    fn undecodable_payload_is_a_fault() {
        let slice = counter_slice();
        let handler = &slice.operations[0].handler;
        let state = Counter { count: 1 };

        let fault = handler(&state, &Action::new("counter/add").with_payload(json!("three")))
            .expect_err("decode must fail");
        assert_eq!(fault.slice, "counter");
        assert!(fault.message.contains("payload decode failed"));
    }

    #[test]
    fn lifecycle_sugar_registers_all_three_legs() {
        let lifecycle = AsyncLifecycle::new("counter/refresh");
        let slice = SliceBuilder::new("counter", Counter::default())
            .on_pending(&lifecycle, |state: &Counter| state.clone())
            .on_fulfilled(&lifecycle, |_state: &Counter, count: i64| Counter { count })
            .on_rejected(&lifecycle, |state: &Counter, _message| state.clone())
            .build();

        let kinds: Vec<_> = slice.operation_kinds().map(ActionKind::as_str).collect();
        assert_eq!(
            kinds,
            vec![
                "counter/refresh/pending",
                "counter/refresh/fulfilled",
                "counter/refresh/rejected"
            ]
        );
    }
}

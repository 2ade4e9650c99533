//! # Uniflow Testing
//!
//! Testing utilities and helpers for Uniflow stores and slices.
//!
//! This crate provides:
//! - [`ChainProbe`]: a recording middleware factory for asserting chain
//!   ordering and interception
//! - [`StoreTest`]: a fluent Given-When-Then harness for slice behavior
//! - [`counting_listener`]: a subscriber that counts its invocations
//!
//! ## Example
//!
//! ```
//! use uniflow_core::{Action, SliceBuilder};
//! use uniflow_testing::StoreTest;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Default, Serialize, Deserialize)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! StoreTest::new()
//!     .given_slice(
//!         SliceBuilder::new("counter", CounterState::default())
//!             .operation("add", |state: &CounterState, by: Option<i64>| CounterState {
//!                 count: state.count + by.unwrap_or(1),
//!             })
//!             .build(),
//!     )
//!     .when(Action::new("counter/add"))
//!     .then(|snapshot| {
//!         assert_eq!(snapshot.slice::<CounterState>("counter").unwrap().count, 1);
//!     })
//!     .run();
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use uniflow_core::{
    Action, DispatchOutcome, Dispatchable, Middleware, Next, Slice, Snapshot, StoreApi,
    StoreError,
};
use uniflow_runtime::Store;

/// One dispatch observed by a [`ChainProbe`] middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEntry {
    /// The tag of the probe middleware that saw the dispatch.
    pub tag: &'static str,
    /// The action kind, or the effect label for effect inputs.
    pub kind: String,
}

/// Shared log for one or more [`ProbeMiddleware`] instances.
///
/// Register several probes with distinct tags at different chain positions
/// to assert that middlewares execute in registration order on the way in,
/// and that nested dispatches re-enter from the outermost.
#[derive(Debug, Default, Clone)]
pub struct ChainProbe {
    log: Arc<Mutex<Vec<ProbeEntry>>>,
}

impl ChainProbe {
    /// Create an empty probe log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A middleware that records every input under `tag`, then forwards.
    #[must_use]
    pub fn middleware(&self, tag: &'static str) -> ProbeMiddleware {
        ProbeMiddleware {
            tag,
            log: Arc::clone(&self.log),
        }
    }

    /// Everything recorded so far, in observation order.
    #[must_use]
    pub fn entries(&self) -> Vec<ProbeEntry> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The recorded `"tag:kind"` pairs, convenient for assertions.
    #[must_use]
    pub fn trace(&self) -> Vec<String> {
        self.entries()
            .iter()
            .map(|entry| format!("{}:{}", entry.tag, entry.kind))
            .collect()
    }
}

/// Recording middleware produced by [`ChainProbe::middleware`].
#[derive(Debug)]
pub struct ProbeMiddleware {
    tag: &'static str,
    log: Arc<Mutex<Vec<ProbeEntry>>>,
}

impl Middleware for ProbeMiddleware {
    fn apply(
        &self,
        _api: &Arc<dyn StoreApi>,
        input: Dispatchable,
        next: Next<'_>,
    ) -> Result<DispatchOutcome, StoreError> {
        let kind = match &input {
            Dispatchable::Plain(action) => action.kind().as_str().to_owned(),
            Dispatchable::Effect(effect) => effect.label().to_owned(),
        };
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ProbeEntry { tag: self.tag, kind });
        next(input)
    }
}

/// A listener that counts how many times it has been notified.
///
/// Returns the shared counter and the closure to pass to
/// `Store::subscribe`.
#[must_use]
pub fn counting_listener() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let listener_count = Arc::clone(&count);
    (count, move || {
        listener_count.fetch_add(1, Ordering::SeqCst);
    })
}

type SnapshotAssertion = Box<dyn FnOnce(&Snapshot)>;

/// Fluent Given-When-Then harness for slice behavior.
///
/// Builds a store from the given slices (no middleware), dispatches the
/// `when` actions in order, then runs every assertion against the final
/// snapshot.
#[derive(Default)]
pub struct StoreTest {
    slices: Vec<Slice>,
    actions: Vec<Action>,
    assertions: Vec<SnapshotAssertion>,
}

impl StoreTest {
    /// Create an empty harness.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slice (Given).
    #[must_use]
    pub fn given_slice(mut self, slice: Slice) -> Self {
        self.slices.push(slice);
        self
    }

    /// Queue an action to dispatch (When). May be called repeatedly.
    #[must_use]
    pub fn when(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the final snapshot (Then).
    #[must_use]
    pub fn then<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Snapshot) + 'static,
    {
        self.assertions.push(Box::new(assertion));
        self
    }

    /// Build the store, dispatch, and run all assertions.
    ///
    /// # Panics
    ///
    /// Panics if the composition is invalid, a dispatch fails, or an
    /// assertion fails.
    #[allow(clippy::expect_used, clippy::panic)] // Test code can use expect
    pub fn run(self) {
        let mut builder = Store::builder();
        for slice in self.slices {
            builder = builder.slice(slice);
        }
        let store = builder.build().expect("composition must be valid");

        for action in self.actions {
            let kind = action.kind().clone();
            store
                .dispatch(action)
                .unwrap_or_else(|e| panic!("dispatch of '{kind}' failed: {e}"));
        }

        let snapshot = store.snapshot();
        for assertion in self.assertions {
            assertion(&snapshot);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use uniflow_core::SliceBuilder;

    #[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
    struct Tally {
        total: i64,
    }

    fn tally_slice() -> Slice {
        SliceBuilder::new("tally", Tally::default())
            .operation("add", |state: &Tally, by: Option<i64>| Tally {
                total: state.total + by.unwrap_or(1),
            })
            .build()
    }

    #[test]
    fn harness_folds_actions_in_order() {
        StoreTest::new()
            .given_slice(tally_slice())
            .when(Action::new("tally/add"))
            .when(Action::new("tally/add").with_payload(json!(10)))
            .then(|snapshot| {
                assert_eq!(snapshot.slice::<Tally>("tally"), Some(&Tally { total: 11 }));
            })
            .run();
    }

    #[test]
    fn probe_records_tag_and_kind() {
        let probe = ChainProbe::new();
        let store = Store::builder()
            .slice(tally_slice())
            .middleware(probe.middleware("outer"))
            .build()
            .expect("composition must be valid");

        store.dispatch(Action::new("tally/add")).expect("dispatch");
        assert_eq!(probe.trace(), vec!["outer:tally/add".to_owned()]);
    }

    #[test]
    fn counting_listener_counts() {
        let (count, listener) = counting_listener();
        let store = Store::builder()
            .slice(tally_slice())
            .build()
            .expect("composition must be valid");
        let subscription = store.subscribe(listener);

        store.dispatch(Action::new("tally/add")).expect("dispatch");
        store.dispatch(Action::new("tally/add")).expect("dispatch");
        assert_eq!(count.load(Ordering::SeqCst), 2);

        subscription.unsubscribe();
        store.dispatch(Action::new("tally/add")).expect("dispatch");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}

//! # Uniflow Runtime
//!
//! The [`Store`]: state container and dispatcher for the Uniflow
//! architecture.
//!
//! ## Core Components
//!
//! - **Store**: owns the current snapshot, the middleware chain, and the
//!   subscriber set
//! - **Middleware chain**: first-registered-outermost interceptors; the
//!   canonical effect and logging middlewares live in this crate
//! - **Commit**: root reduction, snapshot swap, synchronous subscriber
//!   notification
//!
//! ## Control Flow
//!
//! `dispatch` feeds the input through the middleware chain in registration
//! order. Unintercepted plain actions reach the commit: the root reducer
//! computes the next snapshot, the store swaps it in, and every current
//! subscriber is notified synchronously in registration order. A handler
//! fault aborts the commit and preserves the prior snapshot.
//!
//! ## Concurrency
//!
//! Dispatch is synchronous and atomic from the caller's perspective. The
//! commit phase is guarded: a dispatch issued from within an in-progress
//! commit on the same thread (a subscriber dispatching from its callback)
//! fails with [`StoreError::ReentrantDispatch`], while dispatches from
//! other threads (overlapping async resolutions) serialize on the commit
//! gate and are applied in completion order. Effect closures run during
//! the middleware phase, so their synchronous dispatches legally re-enter
//! the full chain.
//!
//! ## Example
//!
//! ```
//! use uniflow_core::{Action, SliceBuilder};
//! use uniflow_runtime::Store;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Default, Serialize, Deserialize)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! let store = Store::builder()
//!     .slice(
//!         SliceBuilder::new("counter", CounterState::default())
//!             .operation("add", |state: &CounterState, by: Option<i64>| CounterState {
//!                 count: state.count + by.unwrap_or(1),
//!             })
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! store.dispatch(Action::new("counter/add")).unwrap();
//! let count = store.snapshot().slice::<CounterState>("counter").unwrap().count;
//! assert_eq!(count, 1);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::ThreadId;

use uniflow_core::{
    Composition, CompositionBuilder, CompositionError, DispatchOutcome, Dispatchable, Middleware,
    Slice, Snapshot, StoreApi, StoreError,
};

/// Effect (thunk-style) middleware
pub mod effect_middleware;

/// Logging middleware
pub mod logger;

pub use effect_middleware::EffectMiddleware;
pub use logger::LoggingMiddleware;
pub use uniflow_core::{ReducerFault, StoreError as Error};

type Listener = Arc<dyn Fn() + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct SubscriberSet {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

impl SubscriberSet {
    fn add(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    fn remove(&mut self, id: u64) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    fn current(&self) -> Vec<Listener> {
        self.listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

struct StoreInner {
    composition: Composition,
    middleware: Vec<Arc<dyn Middleware>>,
    state: Mutex<Arc<Snapshot>>,
    subscribers: Mutex<SubscriberSet>,
    commit_gate: Mutex<()>,
    committer: Mutex<Option<ThreadId>>,
}

/// Clears the committing-thread marker even if a listener panics.
struct CommitterGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for CommitterGuard<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

/// The state container and dispatcher.
///
/// Stores are owned, constructible objects: build one at startup with
/// [`Store::builder`] and hand out clones (cheap `Arc` bumps) to every
/// consumer. Multiple independent stores coexist freely, which is how the
/// tests isolate state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Start building a store.
    #[must_use]
    pub fn builder() -> StoreBuilder {
        StoreBuilder {
            composition: Composition::builder(),
            middleware: Vec::new(),
        }
    }

    /// The current immutable snapshot. O(1) per slice; never blocks
    /// beyond a short state lock.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = lock(&self.inner.state);
        Snapshot::clone(&state)
    }

    /// Dispatch a plain action or an effect action.
    ///
    /// Runs the input through the middleware chain in registration order
    /// (first-registered outermost), then through the root reducer,
    /// replaces the snapshot, and synchronously notifies all current
    /// subscribers in registration order.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ReentrantDispatch`] when called from within an
    ///   in-progress commit on this store (e.g. from a subscriber)
    /// - [`StoreError::Reducer`] when a slice handler faults; the prior
    ///   snapshot is preserved and nobody is notified
    /// - [`StoreError::UnhandledEffect`] when an effect action reaches the
    ///   reducer because no effect middleware is registered
    pub fn dispatch(
        &self,
        input: impl Into<Dispatchable>,
    ) -> Result<DispatchOutcome, StoreError> {
        metrics::counter!("store.dispatch").increment(1);
        self.run_chain(0, input.into())
    }

    /// Register a listener notified after every committed transition.
    ///
    /// The returned [`Subscription`] revokes the listener exactly once;
    /// dropping it without calling [`Subscription::unsubscribe`] leaves
    /// the listener registered for the life of the store.
    #[must_use]
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = lock(&self.inner.subscribers).add(Arc::new(listener));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
            revoked: AtomicBool::new(false),
        }
    }

    fn run_chain(&self, index: usize, input: Dispatchable) -> Result<DispatchOutcome, StoreError> {
        match self.inner.middleware.get(index) {
            Some(middleware) => {
                let api: Arc<dyn StoreApi> = Arc::new(self.clone());
                let next = |input: Dispatchable| self.run_chain(index + 1, input);
                middleware.apply(&api, input, &next)
            }
            None => self.commit(input),
        }
    }

    fn commit(&self, input: Dispatchable) -> Result<DispatchOutcome, StoreError> {
        let action = match input {
            Dispatchable::Plain(action) => action,
            Dispatchable::Effect(effect) => {
                return Err(StoreError::UnhandledEffect {
                    label: effect.label().to_owned(),
                });
            }
        };

        let current_thread = std::thread::current().id();
        if *lock(&self.inner.committer) == Some(current_thread) {
            metrics::counter!("store.reentrant_dispatch").increment(1);
            return Err(StoreError::ReentrantDispatch);
        }

        // Cross-thread dispatches (overlapping async resolutions) wait
        // their turn here; same-thread re-entry was rejected above.
        let _gate = lock(&self.inner.commit_gate);
        *lock(&self.inner.committer) = Some(current_thread);
        let _guard = CommitterGuard(&self.inner.committer);

        let previous = {
            let state = lock(&self.inner.state);
            Arc::clone(&state)
        };

        let next = self
            .inner
            .composition
            .reduce(&previous, &action)
            .map_err(|fault| {
                metrics::counter!("store.reducer_fault").increment(1);
                tracing::warn!(
                    slice = fault.slice,
                    kind = %fault.kind,
                    "reducer fault, prior snapshot preserved"
                );
                StoreError::Reducer(fault)
            })?;

        *lock(&self.inner.state) = Arc::new(next);
        self.notify();

        Ok(DispatchOutcome::Committed(action))
    }

    fn notify(&self) {
        // Snapshot the listener list so callbacks can unsubscribe without
        // deadlocking on the subscriber lock.
        let listeners = lock(&self.inner.subscribers).current();
        for listener in listeners {
            listener();
        }
    }
}

impl StoreApi for Store {
    fn snapshot(&self) -> Snapshot {
        Store::snapshot(self)
    }

    fn dispatch(&self, input: Dispatchable) -> Result<DispatchOutcome, StoreError> {
        Store::dispatch(self, input)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.snapshot())
            .field("middleware", &self.inner.middleware.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Store`]: slices plus an ordered middleware chain.
pub struct StoreBuilder {
    composition: CompositionBuilder,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl StoreBuilder {
    /// Register a slice.
    #[must_use]
    pub fn slice(mut self, slice: Slice) -> Self {
        self.composition = self.composition.slice(slice);
        self
    }

    /// Append a middleware. The first registered is outermost.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Validate the composition and construct the store with the declared
    /// initial values.
    ///
    /// # Errors
    ///
    /// Returns the [`CompositionError`] from combining the slices.
    pub fn build(self) -> Result<Store, CompositionError> {
        let composition = self.composition.build()?;
        let initial = Arc::new(composition.initial());
        Ok(Store {
            inner: Arc::new(StoreInner {
                composition,
                middleware: self.middleware,
                state: Mutex::new(initial),
                subscribers: Mutex::new(SubscriberSet::default()),
                commit_gate: Mutex::new(()),
                committer: Mutex::new(None),
            }),
        })
    }
}

/// Opaque revocation handle returned by [`Store::subscribe`].
///
/// Revocable exactly once: the second and later `unsubscribe` calls are
/// no-ops, not errors.
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
    revoked: AtomicBool,
}

impl Subscription {
    /// Remove the listener. After this returns the listener is never
    /// invoked again, regardless of how many dispatches follow.
    pub fn unsubscribe(&self) {
        if self.revoked.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(inner) = self.store.upgrade() {
            lock(&inner.subscribers).remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("revoked", &self.revoked.load(Ordering::SeqCst))
            .finish()
    }
}

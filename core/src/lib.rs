//! # Uniflow Core
//!
//! Core types and composition for the Uniflow unidirectional state
//! container.
//!
//! ## Core Concepts
//!
//! - **Snapshot**: the full state tree at a point in time, immutable once
//!   produced; a map from slice name to slice value
//! - **Action**: plain data record describing an intent (`{kind, payload?,
//!   error?}`)
//! - **Slice**: an independently-owned named sub-tree of state with its own
//!   initial value and update operations
//! - **Composition**: the root reducer; routes actions to slice handlers
//!   through a registry built at composition time
//! - **Middleware**: a composable interceptor between dispatch and the
//!   reducer
//! - **Effect action**: a deferred, callable action used to sequence
//!   asynchronous side effects through the same dispatch pathway
//!
//! ## Architecture Principles
//!
//! - Unidirectional data flow: caller → dispatcher → middleware chain →
//!   root reducer → new snapshot → subscribers
//! - State changes only through pure slice handlers; every update produces
//!   a new value
//! - Side effects only through effect actions, never inside handlers
//! - Stores are owned, constructible objects, never implicit singletons
//!
//! ## Example
//!
//! ```
//! use uniflow_core::{Action, Composition, SliceBuilder};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Clone, Debug, Default, Serialize, Deserialize)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! let slice = SliceBuilder::new("counter", CounterState::default())
//!     .operation("add", |state: &CounterState, by: Option<i64>| CounterState {
//!         count: state.count + by.unwrap_or(1),
//!     })
//!     .build();
//!
//! let composition = Composition::builder().slice(slice).build().unwrap();
//! let initial = composition.initial();
//! let next = composition
//!     .reduce(&initial, &Action::new("counter/add").with_payload(json!(3)))
//!     .unwrap();
//! assert_eq!(next.slice::<CounterState>("counter").unwrap().count, 3);
//! ```

/// Actions, action kinds, and the plain/effect tagged union
pub mod action;

/// Root reducer composition and the action routing registry
pub mod composition;

/// Error taxonomy for dispatch and reduction
pub mod error;

/// Requested/succeeded/failed lifecycle for asynchronous operations
pub mod lifecycle;

/// Middleware trait and the store surface it sees
pub mod middleware;

/// Typed slice builders and their erased form
pub mod slice;

/// Immutable state snapshots and erased slice values
pub mod snapshot;

pub use action::{Action, ActionKind, Dispatchable, EffectAction};
pub use composition::{Composition, CompositionBuilder, CompositionError};
pub use error::{ReducerFault, StoreError};
pub use lifecycle::AsyncLifecycle;
pub use middleware::{DispatchOutcome, Middleware, Next, StoreApi};
pub use slice::{Slice, SliceBuilder};
pub use snapshot::{SliceValue, Snapshot};

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};
pub use serde_json::Value;

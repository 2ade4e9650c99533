//! The middleware seam between dispatch and the root reducer.
//!
//! Middlewares form an ordered chain: the first-registered middleware is
//! outermost, and each one decides whether to call `next`, dispatch further
//! actions through the store surface, or consume the input entirely. The
//! two canonical implementations (effect execution and logging) live in the
//! runtime crate.

use std::sync::Arc;

use crate::action::{Action, Dispatchable};
use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// What a dispatch produced.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The action passed the whole chain, was reduced, and the new
    /// snapshot was committed.
    Committed(Action),
    /// A middleware consumed the input before it reached the reducer
    /// (e.g. the effect middleware running a deferred action).
    Intercepted,
}

impl DispatchOutcome {
    /// The committed action, if the input reached the reducer.
    #[must_use]
    pub fn into_action(self) -> Option<Action> {
        match self {
            Self::Committed(action) => Some(action),
            Self::Intercepted => None,
        }
    }

    /// Whether a middleware consumed the input.
    #[must_use]
    pub const fn is_intercepted(&self) -> bool {
        matches!(self, Self::Intercepted)
    }
}

/// Object-safe store surface available to middleware and effect closures.
///
/// Effects hold this as `Arc<dyn StoreApi>` so spawned tasks can dispatch
/// follow-up actions after the originating dispatch has returned.
pub trait StoreApi: Send + Sync {
    /// The current immutable snapshot.
    fn snapshot(&self) -> Snapshot;

    /// Dispatch through the full middleware chain, outermost first.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the chain or the commit.
    fn dispatch(&self, input: Dispatchable) -> Result<DispatchOutcome, StoreError>;
}

/// Continuation to the next interceptor, or to the reducer at the end of
/// the chain.
pub type Next<'a> = &'a dyn Fn(Dispatchable) -> Result<DispatchOutcome, StoreError>;

/// A composable interceptor sitting between dispatch and the reducer.
pub trait Middleware: Send + Sync {
    /// Observe, transform, forward, or consume a dispatch input.
    ///
    /// Calling `next` hands the input to the rest of the chain; not
    /// calling it short-circuits the dispatch. Dispatching through `api`
    /// re-enters the chain from the outermost middleware.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from `next` or from `api` dispatches.
    fn apply(
        &self,
        api: &Arc<dyn StoreApi>,
        input: Dispatchable,
        next: Next<'_>,
    ) -> Result<DispatchOutcome, StoreError>;
}

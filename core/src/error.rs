//! Error taxonomy for dispatch and reduction.
//!
//! An async collaborator failing is deliberately absent from this
//! taxonomy: that case is recovered locally by translating the failure
//! into a rejected action and never crosses the dispatch boundary as an
//! error. Unknown action kinds are likewise not errors; every slice
//! passes them through unchanged.

use thiserror::Error;

use crate::action::ActionKind;

/// A slice handler failed while processing a routed action.
///
/// Fatal to that dispatch: the store's prior snapshot is preserved, no
/// partial update is committed, and no subscribers are notified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("reducer for slice '{slice}' failed on '{kind}': {message}")]
pub struct ReducerFault {
    /// The slice whose handler failed.
    pub slice: &'static str,
    /// The action kind being processed.
    pub kind: ActionKind,
    /// What went wrong (payload decode failure, explicit handler error).
    pub message: String,
}

/// Errors surfaced by `dispatch`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Dispatch was invoked from within an in-progress commit on the same
    /// container, typically a subscriber dispatching synchronously from
    /// its notification callback.
    #[error("dispatch re-entered while a commit was in progress on this store")]
    ReentrantDispatch,

    /// A slice handler failed; the prior snapshot was preserved.
    #[error(transparent)]
    Reducer(#[from] ReducerFault),

    /// An effect action reached the root reducer. Effects are only
    /// meaningful when an effect middleware is registered.
    #[error("no middleware handled effect action '{label}'")]
    UnhandledEffect {
        /// The label the effect was created with.
        label: String,
    },
}

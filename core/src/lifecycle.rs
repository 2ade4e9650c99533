//! Requested/succeeded/failed lifecycle for asynchronous operations.
//!
//! Any side-effecting operation is modeled as three plain actions derived
//! from one `"<slice>/<operation>"` prefix: `pending`, `fulfilled(result)`
//! and `rejected(error)`. [`AsyncLifecycle::run`] builds the effect action
//! that drives them: it dispatches `pending` synchronously, awaits the
//! provided future on a spawned task, and dispatches exactly one of
//! `fulfilled`/`rejected` when it resolves. Collaborator failures never
//! cross the dispatch boundary as errors; they become the rejected
//! action's message.
//!
//! Overlapping invocations are not sequenced and cannot be cancelled: if a
//! second request is issued before the first resolves, both resolutions
//! are applied in whichever order they complete (last-resolved-wins). This
//! is a documented hazard of the pattern, not a guarantee.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::action::{Action, ActionKind, Dispatchable, EffectAction};

/// Action kinds and effect constructor for one async operation.
#[derive(Clone, Debug)]
pub struct AsyncLifecycle {
    prefix: String,
}

impl AsyncLifecycle {
    /// Create a lifecycle from a `"<slice>/<operation>"` prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The shared kind prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Kind dispatched when the operation is requested.
    #[must_use]
    pub fn pending(&self) -> ActionKind {
        ActionKind::new(format!("{}/pending", self.prefix))
    }

    /// Kind dispatched when the operation succeeds.
    #[must_use]
    pub fn fulfilled(&self) -> ActionKind {
        ActionKind::new(format!("{}/fulfilled", self.prefix))
    }

    /// Kind dispatched when the operation fails.
    #[must_use]
    pub fn rejected(&self) -> ActionKind {
        ActionKind::new(format!("{}/rejected", self.prefix))
    }

    /// The requested action.
    #[must_use]
    pub fn pending_action(&self) -> Action {
        Action::new(self.pending())
    }

    /// The succeeded action carrying the result payload.
    #[must_use]
    pub fn fulfilled_action(&self, payload: Value) -> Action {
        Action::new(self.fulfilled()).with_payload(payload)
    }

    /// The failed action carrying a human-readable message.
    #[must_use]
    pub fn rejected_action(&self, error: impl Into<String>) -> Action {
        Action::new(self.rejected()).with_error(error)
    }

    /// Build the request effect for one invocation.
    ///
    /// Dispatching the returned effect through an effect middleware:
    /// 1. dispatches `pending` synchronously,
    /// 2. spawns `future` on the tokio runtime,
    /// 3. dispatches `fulfilled(result)` or `rejected(message)`, at most
    ///    one of the two, when the future resolves.
    ///
    /// Between (1) and (3) arbitrary other dispatches may interleave and
    /// are fully applied; see the module docs for the overlap hazard.
    pub fn run<F, P, E>(&self, future: F) -> EffectAction
    where
        F: Future<Output = Result<P, E>> + Send + 'static,
        P: Serialize,
        E: Display,
    {
        let lifecycle = self.clone();
        EffectAction::new(self.prefix.clone(), move |api| {
            if let Err(error) = api.dispatch(Dispatchable::Plain(lifecycle.pending_action())) {
                tracing::warn!(prefix = %lifecycle.prefix, %error, "pending dispatch failed");
                return;
            }

            tokio::spawn(async move {
                let resolution = match future.await {
                    Ok(payload) => match serde_json::to_value(&payload) {
                        Ok(value) => lifecycle.fulfilled_action(value),
                        Err(e) => lifecycle
                            .rejected_action(format!("result serialization failed: {e}")),
                    },
                    Err(e) => lifecycle.rejected_action(e.to_string()),
                };
                dispatch_resolution(&lifecycle, &api, resolution);
            });
        })
    }
}

fn dispatch_resolution(
    lifecycle: &AsyncLifecycle,
    api: &Arc<dyn crate::middleware::StoreApi>,
    resolution: Action,
) {
    if let Err(error) = api.dispatch(Dispatchable::Plain(resolution)) {
        tracing::warn!(prefix = %lifecycle.prefix, %error, "resolution dispatch failed");
    }
}

//! Logging middleware.
//!
//! Records every dispatch with the action kind and the before/after
//! snapshot trees. Observability only: it never mutates the input or the
//! state, and always calls `next`. Register it outermost (first) so it
//! sees the state change produced by the whole rest of the chain.

use std::sync::Arc;

use uniflow_core::{DispatchOutcome, Dispatchable, Middleware, Next, StoreApi, StoreError};

/// Logs actions and before/after snapshots through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn apply(
        &self,
        api: &Arc<dyn StoreApi>,
        input: Dispatchable,
        next: Next<'_>,
    ) -> Result<DispatchOutcome, StoreError> {
        match input {
            Dispatchable::Plain(action) => {
                let kind = action.kind().clone();
                let before = api.snapshot().to_json();
                let result = next(Dispatchable::Plain(action));
                let after = api.snapshot().to_json();
                match &result {
                    Ok(_) => {
                        tracing::info!(action = %kind, %before, %after, "dispatch");
                    }
                    Err(error) => {
                        tracing::warn!(action = %kind, %before, %error, "dispatch failed");
                    }
                }
                result
            }
            Dispatchable::Effect(effect) => {
                tracing::info!(effect = effect.label(), "dispatching effect action");
                next(Dispatchable::Effect(effect))
            }
        }
    }
}

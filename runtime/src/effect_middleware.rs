//! Effect (thunk-style) middleware.
//!
//! The only supported mechanism for side effects: when the dispatched
//! input carries the `Effect` tag, this middleware runs the deferred
//! closure with an owned store handle and short-circuits the chain; plain
//! actions pass through untouched. Register it innermost (last) so outer
//! middlewares still observe effect dispatches.

use std::sync::Arc;

use uniflow_core::{DispatchOutcome, Dispatchable, Middleware, Next, StoreApi, StoreError};

/// Runs effect actions instead of forwarding them to the reducer.
#[derive(Debug, Default, Clone, Copy)]
pub struct EffectMiddleware;

impl Middleware for EffectMiddleware {
    fn apply(
        &self,
        api: &Arc<dyn StoreApi>,
        input: Dispatchable,
        next: Next<'_>,
    ) -> Result<DispatchOutcome, StoreError> {
        match input {
            Dispatchable::Effect(effect) => {
                tracing::debug!(label = effect.label(), "running effect action");
                effect.run(Arc::clone(api));
                Ok(DispatchOutcome::Intercepted)
            }
            plain @ Dispatchable::Plain(_) => next(plain),
        }
    }
}

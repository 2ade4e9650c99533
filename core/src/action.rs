//! Actions and the plain/effect tagged union.
//!
//! An [`Action`] is an immutable data record describing an intent to change
//! state: a routing kind, an optional JSON payload, and an optional error
//! message (set on the failed leg of an async lifecycle).
//!
//! Dispatch inputs are an explicit tagged union, [`Dispatchable`]: either a
//! plain action destined for the reducer, or an [`EffectAction`], a
//! deferred closure that the effect middleware runs instead. Resolution is
//! by pattern matching on the tag, never by runtime type inspection.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::middleware::StoreApi;

/// Interned action type string.
///
/// Kinds follow the `"<slice>/<operation>"` convention, e.g.
/// `"cake/orderCake"`. The slice prefix is what the composition registry
/// uses to validate ownership and cross-slice reaction sources.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ActionKind(Arc<str>);

impl ActionKind {
    /// Create a kind from any string-like value.
    #[must_use]
    pub fn new(kind: impl AsRef<str>) -> Self {
        Self(Arc::from(kind.as_ref()))
    }

    /// The full kind string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The slice name before the first `/`, if the kind has one.
    #[must_use]
    pub fn slice_prefix(&self) -> Option<&str> {
        self.0.split_once('/').map(|(slice, _)| slice)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionKind({})", self.0)
    }
}

impl From<&str> for ActionKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl From<String> for ActionKind {
    fn from(kind: String) -> Self {
        Self(Arc::from(kind))
    }
}

impl From<&ActionKind> for ActionKind {
    fn from(kind: &ActionKind) -> Self {
        kind.clone()
    }
}

/// An immutable intent record.
///
/// Unknown kinds are not errors: every slice passes them through unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    kind: ActionKind,
    payload: Option<Value>,
    error: Option<String>,
}

impl Action {
    /// Create an action with no payload.
    #[must_use]
    pub fn new(kind: impl Into<ActionKind>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
            error: None,
        }
    }

    /// Attach a JSON payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach a human-readable error message (rejected lifecycle actions).
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// The routing kind.
    #[must_use]
    pub const fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The payload, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// The error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

type EffectFn = Box<dyn FnOnce(Arc<dyn StoreApi>) + Send>;

/// A deferred, callable action.
///
/// Effect actions are the only supported mechanism for side effects. The
/// effect middleware runs the closure with an owned handle to the store;
/// the closure may read state, dispatch follow-up actions synchronously,
/// or spawn async work that dispatches on completion. Every dispatch a
/// closure issues re-enters the full middleware chain from the outermost
/// interceptor.
pub struct EffectAction {
    label: Cow<'static, str>,
    run: EffectFn,
}

impl EffectAction {
    /// Create an effect action with a label used for logging and errors.
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        run: impl FnOnce(Arc<dyn StoreApi>) + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            run: Box::new(run),
        }
    }

    /// The label this effect was created with.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Consume the effect and run its closure.
    pub fn run(self, api: Arc<dyn StoreApi>) {
        (self.run)(api);
    }
}

impl fmt::Debug for EffectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Dispatch input: a plain record or a deferred effect.
#[derive(Debug)]
pub enum Dispatchable {
    /// A plain action destined for the root reducer.
    Plain(Action),
    /// A deferred effect consumed by the effect middleware.
    Effect(EffectAction),
}

impl From<Action> for Dispatchable {
    fn from(action: Action) -> Self {
        Self::Plain(action)
    }
}

impl From<EffectAction> for Dispatchable {
    fn from(effect: EffectAction) -> Self {
        Self::Effect(effect)
    }
}

//! Root reducer composition.
//!
//! A [`Composition`] combines slices into one root reducer. The routing
//! registry is built once at composition time: each action kind maps to its
//! owning slice's handler first, then to cross-slice reactors in
//! registration order. Building validates slice names, kind ownership, and
//! that cross-slice reactions form an acyclic dependency graph.

use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;
use thiserror::Error;

use crate::action::{Action, ActionKind};
use crate::error::ReducerFault;
use crate::slice::{ErasedHandler, Slice};
use crate::snapshot::Snapshot;

/// Errors detected while combining slices into a root reducer.
#[derive(Debug, Error)]
pub enum CompositionError {
    /// Two slices share the same name.
    #[error("duplicate slice name '{0}'")]
    DuplicateSlice(&'static str),

    /// One kind is registered more than once as an owned operation.
    #[error("duplicate handler for action kind '{0}'")]
    DuplicateKind(ActionKind),

    /// An operation kind is not prefixed by its owning slice's name.
    #[error("operation kind '{kind}' is not prefixed by its slice '{slice}'")]
    ForeignOperation {
        /// The slice registering the operation.
        slice: &'static str,
        /// The offending kind.
        kind: ActionKind,
    },

    /// A reaction references a source slice that is not registered.
    #[error("reaction in slice '{slice}' references unknown source slice '{source_slice}'")]
    UnknownReactionSource {
        /// The reacting slice.
        slice: &'static str,
        /// The slice prefix the reaction kind names.
        source_slice: String,
    },

    /// Cross-slice reactions form a dependency cycle.
    #[error("cross-slice reactions form a cycle involving slice '{0}'")]
    CyclicReactions(&'static str),
}

struct RoutedHandler {
    slice: &'static str,
    handler: ErasedHandler,
}

/// The root reducer: routes actions to slice handlers by kind.
pub struct Composition {
    initial: Snapshot,
    routes: HashMap<ActionKind, SmallVec<[RoutedHandler; 2]>>,
}

impl Composition {
    /// Start combining slices.
    #[must_use]
    pub fn builder() -> CompositionBuilder {
        CompositionBuilder { slices: Vec::new() }
    }

    /// The snapshot of declared initial values.
    #[must_use]
    pub fn initial(&self) -> Snapshot {
        self.initial.clone()
    }

    /// Whether any handler is registered for a kind.
    #[must_use]
    pub fn handles(&self, kind: &ActionKind) -> bool {
        self.routes.contains_key(kind)
    }

    /// Compute the next snapshot for one action.
    ///
    /// Unknown kinds are a no-op: the returned snapshot shares every slice
    /// `Arc` with the input. A handler fault aborts the whole reduction:
    /// no slice of the returned `Err` dispatch is applied.
    ///
    /// # Errors
    ///
    /// Returns the [`ReducerFault`] of the first failing handler.
    pub fn reduce(&self, snapshot: &Snapshot, action: &Action) -> Result<Snapshot, ReducerFault> {
        let Some(handlers) = self.routes.get(action.kind()) else {
            return Ok(snapshot.clone());
        };

        let mut next = snapshot.clone();
        for routed in handlers {
            let updated = {
                let current = next.raw(routed.slice).ok_or_else(|| ReducerFault {
                    slice: routed.slice,
                    kind: action.kind().clone(),
                    message: "slice missing from snapshot".to_owned(),
                })?;
                (routed.handler)(current.as_ref(), action)?
            };
            next.insert(routed.slice, updated);
        }
        Ok(next)
    }
}

impl std::fmt::Debug for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composition")
            .field("initial", &self.initial)
            .field("routes", &self.routes.len())
            .finish()
    }
}

/// Builder combining slices into a [`Composition`].
pub struct CompositionBuilder {
    slices: Vec<Slice>,
}

impl CompositionBuilder {
    /// Register a slice. Registration order fixes reactor ordering.
    #[must_use]
    pub fn slice(mut self, slice: Slice) -> Self {
        self.slices.push(slice);
        self
    }

    /// Validate and build the root reducer.
    ///
    /// # Errors
    ///
    /// Returns a [`CompositionError`] when slice names or operation kinds
    /// collide, an operation kind is not prefixed by its slice, a reaction
    /// names an unknown source slice, or reactions form a cycle.
    pub fn build(self) -> Result<Composition, CompositionError> {
        let mut names: HashSet<&'static str> = HashSet::new();
        for slice in &self.slices {
            if !names.insert(slice.name) {
                return Err(CompositionError::DuplicateSlice(slice.name));
            }
        }

        let mut initial = Snapshot::default();
        let mut routes: HashMap<ActionKind, SmallVec<[RoutedHandler; 2]>> = HashMap::new();

        // Owners first.
        for slice in &self.slices {
            initial.insert(slice.name, slice.initial.clone());
            for entry in &slice.operations {
                if entry.kind.slice_prefix() != Some(slice.name) {
                    return Err(CompositionError::ForeignOperation {
                        slice: slice.name,
                        kind: entry.kind.clone(),
                    });
                }
                let handlers = routes.entry(entry.kind.clone()).or_default();
                if !handlers.is_empty() {
                    return Err(CompositionError::DuplicateKind(entry.kind.clone()));
                }
                handlers.push(RoutedHandler {
                    slice: slice.name,
                    handler: entry.handler.clone(),
                });
            }
        }

        // Then reactors, in slice registration order.
        let mut edges: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        for slice in &self.slices {
            for entry in &slice.reactions {
                let source = entry.kind.slice_prefix().unwrap_or(entry.kind.as_str());
                let Some(source) = names.get(source).copied() else {
                    return Err(CompositionError::UnknownReactionSource {
                        slice: slice.name,
                        source_slice: source.to_owned(),
                    });
                };
                edges.entry(slice.name).or_default().insert(source);
                routes
                    .entry(entry.kind.clone())
                    .or_default()
                    .push(RoutedHandler {
                        slice: slice.name,
                        handler: entry.handler.clone(),
                    });
            }
        }

        if let Some(offender) = find_cycle(&names, &edges) {
            return Err(CompositionError::CyclicReactions(offender));
        }

        Ok(Composition { initial, routes })
    }
}

/// Depth-first search for a cycle in the reaction dependency graph.
/// Edges point from a reacting slice to the slice it depends on.
fn find_cycle(
    names: &HashSet<&'static str>,
    edges: &HashMap<&'static str, HashSet<&'static str>>,
) -> Option<&'static str> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        node: &'static str,
        edges: &HashMap<&'static str, HashSet<&'static str>>,
        marks: &mut HashMap<&'static str, Mark>,
    ) -> Option<&'static str> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => return Some(node),
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        if let Some(targets) = edges.get(node) {
            for &target in targets {
                if let Some(offender) = visit(target, edges, marks) {
                    return Some(offender);
                }
            }
        }
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    let mut sorted: Vec<_> = names.iter().copied().collect();
    sorted.sort_unstable();
    for name in sorted {
        if let Some(offender) = visit(name, edges, &mut marks) {
            return Some(offender);
        }
    }
    None
}

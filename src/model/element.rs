//! Identifiers and element kinds for the model tree.
//!
//! The model is stored as an arena owned by the [`StateMachine`]; these
//! `Copy` indices are the public handles into it. They are serializable so
//! that host applications can persist instance state keyed by region.
//!
//! [`StateMachine`]: crate::model::StateMachine

use serde::{Deserialize, Serialize};

/// Identifies a vertex (a state, final state, or pseudostate) within its
/// owning machine.
///
/// Handles are only meaningful for the machine that produced them; using a
/// handle against another machine yields unspecified (but memory-safe)
/// results.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct VertexId(pub(crate) usize);

/// Identifies a region within its owning machine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct RegionId(pub(crate) usize);

/// Identifies a transition within its owning machine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TransitionId(pub(crate) usize);

/// The kinds of pseudostate recognized by the runtime.
///
/// Pseudostates are transient vertices: the traversal never rests on one.
/// Entering an `Initial`, `ShallowHistory`, or `DeepHistory` pseudostate
/// immediately follows its single outgoing transition (or restores recorded
/// state, for the history kinds); `Choice` and `Junction` immediately
/// re-enter selection; `Terminate` stops the instance for good.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PseudoStateKind {
    /// Default entry point of a region.
    Initial,
    /// Restores the region's last-known direct child, then descends through
    /// the children's own initial pseudostates.
    ShallowHistory,
    /// Restores the region's last-known child and everything below it.
    DeepHistory,
    /// Dynamic branch: guards are evaluated when the choice is reached.
    Choice,
    /// Static branch: exactly one guard may be satisfied.
    Junction,
    /// Entering this pseudostate terminates the instance.
    Terminate,
}

impl PseudoStateKind {
    /// `true` for the kinds that act as a region's entry point
    /// (`Initial`, `ShallowHistory`, `DeepHistory`).
    ///
    /// A region may own at most one pseudostate of these kinds.
    pub fn is_initial_family(self) -> bool {
        matches!(
            self,
            Self::Initial | Self::ShallowHistory | Self::DeepHistory
        )
    }

    /// `true` for `ShallowHistory` and `DeepHistory`.
    pub fn is_history(self) -> bool {
        matches!(self, Self::ShallowHistory | Self::DeepHistory)
    }
}

/// A reference to any element of the model, used by APIs that range over
/// every element kind (notably the [`Visitor`] fallback handler).
///
/// [`Visitor`]: crate::model::Visitor
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ElementRef {
    /// A state, final state, or pseudostate.
    Vertex(VertexId),
    /// A region.
    Region(RegionId),
    /// A transition.
    Transition(TransitionId),
}

impl From<VertexId> for ElementRef {
    fn from(id: VertexId) -> Self {
        Self::Vertex(id)
    }
}

impl From<RegionId> for ElementRef {
    fn from(id: RegionId) -> Self {
        Self::Region(id)
    }
}

impl From<TransitionId> for ElementRef {
    fn from(id: TransitionId) -> Self {
        Self::Transition(id)
    }
}

//! Construction-time well-formedness errors.

use thiserror::Error;

/// Errors raised while building a model, or by the bootstrap pass for
/// defects that are statically detectable.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A region may own at most one `Initial`/`ShallowHistory`/`DeepHistory`
    /// pseudostate.
    #[error("region '{region}' already has an initial pseudostate")]
    DuplicateInitial { region: String },

    /// Final states have no outgoing transitions.
    #[error("final state '{state}' cannot have outgoing transitions")]
    TransitionFromFinal { state: String },

    /// Terminate pseudostates have no outgoing transitions.
    #[error("terminate pseudostate '{vertex}' cannot have outgoing transitions")]
    TransitionFromTerminate { vertex: String },

    /// Only plain states (and the root machine) can own regions and child
    /// vertices; final states and pseudostates cannot.
    #[error("'{vertex}' cannot own child regions or vertices")]
    InvalidParent { vertex: String },

    /// Entry and exit actions belong to states; pseudostates are transient.
    #[error("pseudostate '{vertex}' cannot carry entry or exit actions")]
    ActionsOnPseudoState { vertex: String },

    /// A transition is either guarded or marked as the else branch, never
    /// both.
    #[error("else transition from '{vertex}' cannot also carry a guard")]
    GuardedElse { vertex: String },

    /// Initial and history pseudostates lead somewhere unconditionally, so
    /// they carry exactly one outgoing transition. Raised at bootstrap.
    #[error(
        "pseudostate '{vertex}' must have exactly one outgoing transition, found {found}"
    )]
    InitialTransitionCount { vertex: String, found: usize },

    /// A choice or junction with nothing outgoing can never be traversed.
    /// Raised at bootstrap.
    #[error("choice or junction '{vertex}' has no outgoing transitions")]
    NoOutgoingTransition { vertex: String },
}

//! Evaluation-time errors.

use thiserror::Error;

use crate::model::error::ModelError;

/// Errors raised while initialising or evaluating an instance.
///
/// A message delivered to a terminated instance is not an error;
/// `evaluate` returns `Ok(false)` quietly. Panics in user guards and
/// actions propagate out of the engine uninterpreted, leaving the instance
/// in whatever partial configuration it had reached.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The model failed bootstrap (lazy bootstrap runs inside
    /// `initialise`/`evaluate`).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// `evaluate` was called before `initialise`.
    #[error("instance has not been initialised against this machine")]
    NotInitialised,

    /// A region was default-entered with no initial pseudostate and no
    /// recorded state to restore.
    #[error("region '{region}' has no initial pseudostate and no recorded state")]
    NoInitial { region: String },

    /// A choice was reached with no satisfied guard and no else branch.
    #[error("choice '{vertex}' has no satisfied guard and no else transition")]
    ChoiceNoMatch { vertex: String },

    /// A junction was reached with no satisfied guard and no else branch.
    #[error("junction '{vertex}' has no satisfied guard and no else transition")]
    JunctionNoMatch { vertex: String },

    /// A junction requires exactly one satisfied guard; more is ill-formed
    /// even when an else branch exists.
    #[error("junction '{vertex}' has {found} satisfied guards; exactly one is required")]
    JunctionAmbiguous { vertex: String, found: usize },
}

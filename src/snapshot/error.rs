//! Snapshot error types.

use thiserror::Error;

/// Errors raised while restoring a snapshot against a model.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The snapshot names a region the model does not have.
    #[error("snapshot references unknown region '{name}'")]
    UnknownRegion { name: String },

    /// The snapshot names a state the model does not have.
    #[error("snapshot references unknown state '{name}'")]
    UnknownState { name: String },

    /// The named state exists but does not live in the named region.
    #[error("state '{state}' does not belong to region '{region}'")]
    MismatchedState { region: String, state: String },
}

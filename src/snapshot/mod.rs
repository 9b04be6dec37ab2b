//! Snapshot and restore for instance state.
//!
//! A [`Snapshot`] captures an instance's configuration (the terminated
//! flag and the last-known state of every region) keyed by *qualified
//! name* rather than by arena index, so it survives process restarts and
//! model rebuilds as long as element names are stable. The model itself is
//! never serialized; restoring requires the same (or a compatibly named)
//! model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::machine::StateMachine;
use crate::runtime::instance::Instance;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for the snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable capture of one instance's configuration.
///
/// # Example
///
/// ```rust
/// use statechart::{InMemoryInstance, PseudoStateKind, Snapshot, StateMachine};
///
/// let mut machine: StateMachine<&str> = StateMachine::new("m");
/// let root = machine.root();
/// let initial = machine
///     .add_pseudo_state("initial", PseudoStateKind::Initial, root)
///     .unwrap();
/// let idle = machine.add_state("Idle", root).unwrap();
/// machine.transition(initial).to(idle).build().unwrap();
///
/// let mut instance = InMemoryInstance::new();
/// machine.initialise(&mut instance).unwrap();
///
/// let snapshot = Snapshot::capture(&machine, &instance);
/// let mut restored = InMemoryInstance::new();
/// snapshot.restore(&machine, &mut restored).unwrap();
/// assert_eq!(instance, restored);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version.
    pub version: u32,
    /// Whether the instance had entered a terminate pseudostate.
    pub terminated: bool,
    /// Region qualified name → state qualified name, for every region the
    /// instance has ever entered.
    pub current: BTreeMap<String, String>,
}

impl Snapshot {
    /// Capture the configuration of `instance` against `machine`.
    pub fn capture<M>(machine: &StateMachine<M>, instance: &dyn Instance) -> Self {
        let mut current = BTreeMap::new();
        for region in 0..machine.regions.len() {
            let region = crate::model::RegionId(region);
            if let Some(state) = instance.current(region) {
                current.insert(
                    machine.region_qualified_name(region).to_string(),
                    machine.vertex_qualified_name(state).to_string(),
                );
            }
        }
        Self {
            version: SNAPSHOT_VERSION,
            terminated: instance.is_terminated(),
            current,
        }
    }

    /// Write this configuration into `instance`, resolving names against
    /// `machine`.
    ///
    /// Entries are validated before anything is written: a bad snapshot
    /// leaves the instance untouched.
    pub fn restore<M>(
        &self,
        machine: &StateMachine<M>,
        instance: &mut dyn Instance,
    ) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }

        let mut resolved = Vec::with_capacity(self.current.len());
        for (region_name, state_name) in &self.current {
            let region = machine.find_region(region_name).ok_or_else(|| {
                SnapshotError::UnknownRegion { name: region_name.clone() }
            })?;
            let state = machine.find_vertex(state_name).ok_or_else(|| {
                SnapshotError::UnknownState { name: state_name.clone() }
            })?;
            if machine.parent_region(state) != Some(region) {
                return Err(SnapshotError::MismatchedState {
                    region: region_name.clone(),
                    state: state_name.clone(),
                });
            }
            resolved.push((region, state));
        }

        for (region, state) in resolved {
            instance.set_current(region, state);
        }
        instance.set_terminated(self.terminated);
        Ok(())
    }
}

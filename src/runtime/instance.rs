//! Instance state: the mutable side of a running state machine.
//!
//! The model is shared and read-only during evaluation; everything that
//! changes per message lives behind the [`Instance`] trait. The engine only
//! needs a terminated flag and a last-known-state map keyed by region.
//! That map is both the active configuration and the memory that history
//! pseudostates restore from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::element::{RegionId, VertexId};

/// Host-supplied backing store for one machine instance.
///
/// The engine writes `set_current` at the moment a state is entered and
/// reads `current` for delegation, completion checks, and history
/// restoration. Exiting a state deliberately does not erase its region's
/// entry; that is what makes shallow and deep history work.
pub trait Instance {
    /// `true` once a terminate pseudostate has been entered.
    fn is_terminated(&self) -> bool;

    /// Set or clear the terminated flag.
    fn set_terminated(&mut self, terminated: bool);

    /// Record `state` as the last-known state of `region`.
    fn set_current(&mut self, region: RegionId, state: VertexId);

    /// The last-known state of `region`, if it was ever entered.
    fn current(&self, region: RegionId) -> Option<VertexId>;
}

/// The default in-memory instance store.
///
/// Serializable, so hosts can persist a configuration between processes,
/// though [`Snapshot`](crate::snapshot::Snapshot) is the stable,
/// name-keyed format meant for that.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryInstance {
    terminated: bool,
    current: HashMap<RegionId, VertexId>,
}

impl InMemoryInstance {
    /// Create an empty instance; `initialise` populates it.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Instance for InMemoryInstance {
    fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn set_terminated(&mut self, terminated: bool) {
        self.terminated = terminated;
    }

    fn set_current(&mut self, region: RegionId, state: VertexId) {
        self.current.insert(region, state);
    }

    fn current(&self, region: RegionId) -> Option<VertexId> {
        self.current.get(&region).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_instance_is_empty_and_live() {
        let instance = InMemoryInstance::new();
        assert!(!instance.is_terminated());
        assert_eq!(instance.current(RegionId(0)), None);
    }

    #[test]
    fn set_current_overwrites_per_region() {
        let mut instance = InMemoryInstance::new();
        instance.set_current(RegionId(0), VertexId(1));
        instance.set_current(RegionId(0), VertexId(2));
        instance.set_current(RegionId(1), VertexId(3));

        assert_eq!(instance.current(RegionId(0)), Some(VertexId(2)));
        assert_eq!(instance.current(RegionId(1)), Some(VertexId(3)));
    }

    #[test]
    fn terminated_flag_round_trips() {
        let mut instance = InMemoryInstance::new();
        instance.set_terminated(true);
        assert!(instance.is_terminated());
        instance.set_terminated(false);
        assert!(!instance.is_terminated());
    }

    #[test]
    fn instance_serializes_correctly() {
        let mut instance = InMemoryInstance::new();
        instance.set_current(RegionId(0), VertexId(4));
        instance.set_terminated(true);

        let json = serde_json::to_string(&instance).unwrap();
        let back: InMemoryInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(instance, back);
    }
}

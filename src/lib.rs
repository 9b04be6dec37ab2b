//! Hierarchical, orthogonal finite state machines with UML 2 semantics.
//!
//! A [`StateMachine`] is a tree of regions, states, pseudostates, and
//! transitions, built once and then driven by delivering messages to
//! independent instances. For each message the runtime evaluates guards,
//! selects a transition, and executes the precompiled sequence of exit
//! actions, transition effects, and entry actions, honoring history,
//! completion transitions, choice and junction branching, terminate
//! semantics, and traversal across orthogonal regions.
//!
//! # Core Concepts
//!
//! - **Model**: the immutable tree, owned by the machine, addressed by
//!   `Copy` handles ([`VertexId`], [`RegionId`], [`TransitionId`])
//! - **Instance**: the mutable side, a region-to-last-known-state map and a
//!   terminated flag, behind the [`Instance`] trait
//! - **Bootstrap**: the one-time pass that compiles every transition into
//!   an ordered step list, so side-effect order is fixed before the first
//!   message arrives
//!
//! # Example
//!
//! ```rust
//! use statechart::{InMemoryInstance, PseudoStateKind, StateMachine};
//!
//! let mut machine: StateMachine<&str> = StateMachine::new("player");
//! let root = machine.root();
//! let initial = machine
//!     .add_pseudo_state("initial", PseudoStateKind::Initial, root)
//!     .unwrap();
//! let stopped = machine.add_state("Stopped", root).unwrap();
//! let playing = machine.add_state("Playing", root).unwrap();
//!
//! machine.transition(initial).to(stopped).build().unwrap();
//! machine
//!     .transition(stopped)
//!     .to(playing)
//!     .when(|m, _| *m == "play")
//!     .build()
//!     .unwrap();
//! machine
//!     .transition(playing)
//!     .to(stopped)
//!     .when(|m, _| *m == "stop")
//!     .build()
//!     .unwrap();
//!
//! let mut instance = InMemoryInstance::new();
//! machine.initialise(&mut instance).unwrap();
//! assert!(machine.evaluate(&"play", &mut instance).unwrap());
//! assert!(!machine.evaluate(&"play", &mut instance).unwrap());
//! assert!(machine.evaluate(&"stop", &mut instance).unwrap());
//! ```
//!
//! Many instances may share one model; the engine is synchronous and
//! single-threaded, and messages to one instance must be serialized by the
//! host.

pub mod model;
pub mod runtime;
pub mod snapshot;
pub mod validate;

// Re-export commonly used types
pub use model::{
    Action, ElementRef, Guard, ModelError, PseudoStateKind, RegionId, StateMachine,
    TransitionBuilder, TransitionId, TransitionKind, VertexId, Visitor,
};
pub use runtime::{InMemoryInstance, Instance, RuntimeError};
pub use snapshot::{Snapshot, SnapshotError, SNAPSHOT_VERSION};
pub use validate::{validate, ModelViolation, ViolationKind};

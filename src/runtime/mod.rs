//! The runtime: instance state, the bootstrap compiler, and the evaluator.
//!
//! The split mirrors the lifecycle: [`instance`] holds what changes per
//! message, the bootstrap pass turns model structure into step lists once,
//! and the evaluator replays those lists as messages arrive.

pub(crate) mod ancestry;
pub(crate) mod bootstrap;
pub mod error;
mod evaluate;
pub mod instance;

pub use error::RuntimeError;
pub use instance::{InMemoryInstance, Instance};

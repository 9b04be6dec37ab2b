//! Transitions and the fluent builder that creates them.
//!
//! A transition's classification (internal / local / external) is derived
//! from the model tree at bootstrap, never declared. Guards and effects are
//! opaque host callbacks; the engine only calls them.

use crate::model::element::{PseudoStateKind, TransitionId, VertexId};
use crate::model::error::ModelError;
use crate::model::machine::{StateMachine, VertexKind};
use crate::runtime::bootstrap::Step;
use crate::runtime::instance::Instance;

/// Boxed action callback: `(message, instance, deep-history flag)`.
///
/// `message` is `None` when the action runs as part of a completion
/// traversal (no triggering message). The return value, if any, is ignored
/// by the engine.
pub type Action<M> = Box<dyn Fn(Option<&M>, &mut dyn Instance, bool) + Send + Sync>;

/// Boxed guard callback: `(message, instance) -> bool`.
pub type Guard<M> = Box<dyn Fn(&M, &dyn Instance) -> bool + Send + Sync>;

/// How a transition is guarded.
pub(crate) enum GuardSlot<M> {
    /// No guard: satisfied by every message and by completion.
    Always,
    /// Satisfied when the guard accepts the message. Never satisfied by
    /// completion (there is no message to offer).
    When(Guard<M>),
    /// The else branch, taken when nothing else matched.
    Else,
}

/// Derived classification of a transition, available after bootstrap.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransitionKind {
    /// No target: effects run without exiting or entering anything.
    Internal,
    /// Source and target are in ancestor/descendant relation; the outer one
    /// is not exited.
    Local,
    /// Everything else: exit up to the least common ancestor region, then
    /// enter down to the target.
    External,
}

pub(crate) struct TransitionNode<M> {
    pub(crate) source: VertexId,
    pub(crate) target: Option<VertexId>,
    pub(crate) guard: GuardSlot<M>,
    pub(crate) effects: Vec<Action<M>>,
    /// Set by bootstrap.
    pub(crate) kind: Option<TransitionKind>,
    /// Compiled traversal, set by bootstrap.
    pub(crate) steps: Vec<Step>,
}

/// Fluent builder for one transition; obtained from
/// [`StateMachine::transition`].
///
/// Omitting [`to`](Self::to) yields an internal transition. The transition
/// is appended to its source's outgoing set by [`build`](Self::build), in
/// call order; selection tries transitions in that order.
pub struct TransitionBuilder<'a, M> {
    machine: &'a mut StateMachine<M>,
    source: VertexId,
    target: Option<VertexId>,
    guard: Option<Guard<M>>,
    is_else: bool,
    effects: Vec<Action<M>>,
}

impl<M> StateMachine<M> {
    /// Start building a transition out of `source`.
    pub fn transition(&mut self, source: VertexId) -> TransitionBuilder<'_, M> {
        TransitionBuilder {
            machine: self,
            source,
            target: None,
            guard: None,
            is_else: false,
            effects: Vec::new(),
        }
    }

    /// Derived classification of a transition; `None` before bootstrap.
    pub fn transition_kind(&self, transition: TransitionId) -> Option<TransitionKind> {
        self.transitions[transition.0].kind
    }

    /// Outgoing transitions of a vertex, in insertion order.
    pub fn outgoing(&self, vertex: VertexId) -> &[TransitionId] {
        &self.vertices[vertex.0].outgoing
    }

    /// Source vertex of a transition.
    pub fn source_of(&self, transition: TransitionId) -> VertexId {
        self.transitions[transition.0].source
    }

    /// Target vertex of a transition (`None` for internal transitions).
    pub fn target_of(&self, transition: TransitionId) -> Option<VertexId> {
        self.transitions[transition.0].target
    }
}

impl<M> TransitionBuilder<'_, M> {
    /// Set the target vertex. Without a target the transition is internal.
    pub fn to(mut self, target: VertexId) -> Self {
        self.target = Some(target);
        self
    }

    /// Guard the transition with a predicate over the message and instance.
    pub fn when<F>(mut self, guard: F) -> Self
    where
        F: Fn(&M, &dyn Instance) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Mark this as the else branch of its source vertex: taken when no
    /// other transition's guard is satisfied.
    pub fn otherwise(mut self) -> Self {
        self.is_else = true;
        self
    }

    /// Append a transition effect. Effects run in insertion order, after
    /// exit actions and before entry actions.
    pub fn effect<F>(mut self, action: F) -> Self
    where
        F: Fn(Option<&M>, &mut dyn Instance, bool) + Send + Sync + 'static,
    {
        self.effects.push(Box::new(action));
        self
    }

    /// Validate and append the transition to the model.
    pub fn build(self) -> Result<TransitionId, ModelError> {
        let machine = self.machine;
        let source_name = || machine.vertices[self.source.0].qualified_name.clone();

        match machine.vertices[self.source.0].kind {
            VertexKind::Final => {
                return Err(ModelError::TransitionFromFinal { state: source_name() })
            }
            VertexKind::Pseudo(PseudoStateKind::Terminate) => {
                return Err(ModelError::TransitionFromTerminate { vertex: source_name() })
            }
            _ => {}
        }
        if self.is_else && self.guard.is_some() {
            return Err(ModelError::GuardedElse { vertex: source_name() });
        }

        let guard = if self.is_else {
            GuardSlot::Else
        } else {
            match self.guard {
                Some(guard) => GuardSlot::When(guard),
                None => GuardSlot::Always,
            }
        };

        let id = TransitionId(machine.transitions.len());
        machine.transitions.push(TransitionNode {
            source: self.source,
            target: self.target,
            guard,
            effects: self.effects,
            kind: None,
            steps: Vec::new(),
        });
        machine.vertices[self.source.0].outgoing.push(id);
        machine.mark_dirty();
        Ok(id)
    }
}

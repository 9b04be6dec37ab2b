//! Whole-model well-formedness sweep.
//!
//! The builder API rejects hard defects eagerly (a second initial
//! pseudostate, transitions out of final states) and bootstrap rejects the
//! statically fatal remainder. This module is the advisory layer on top:
//! it walks the model with the [`Visitor`] and accumulates *every*
//! violation it can find instead of stopping at the first, so a model
//! author gets the full list in one pass.

use thiserror::Error;

use crate::model::element::{PseudoStateKind, RegionId, VertexId};
use crate::model::machine::StateMachine;
use crate::model::transition::GuardSlot;
use crate::model::visitor::Visitor;

/// One defect found by [`validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelViolation {
    /// Qualified name of the offending element.
    pub element: String,
    /// What is wrong with it.
    pub kind: ViolationKind,
}

/// The kinds of defect [`validate`] reports.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum ViolationKind {
    /// The region cannot be default-entered; entering it at run time fails
    /// unless history applies.
    #[error("region has vertices but no initial pseudostate")]
    RegionWithoutInitial,

    /// The choice or junction can never be traversed.
    #[error("choice or junction has no outgoing transitions")]
    BranchWithoutOutgoing,

    /// Only the first else branch can ever be selected.
    #[error("vertex has more than one else transition")]
    MultipleElseTransitions,

    /// An else on a plain state fires on every completion evaluation,
    /// which is rarely what the author meant.
    #[error("else transition on a vertex that is not a choice or junction")]
    ElseOutsideBranch,
}

/// Collect every well-formedness violation in the model.
///
/// An empty result means the model passes; order follows the visitor walk
/// (depth-first from the root).
pub fn validate<M>(machine: &StateMachine<M>) -> Vec<ModelViolation> {
    let mut sweep = Sweep { violations: Vec::new() };
    machine.accept(&mut sweep);
    sweep.violations
}

struct Sweep {
    violations: Vec<ModelViolation>,
}

impl Sweep {
    fn flag(&mut self, element: &str, kind: ViolationKind) {
        self.violations.push(ModelViolation {
            element: element.to_string(),
            kind,
        });
    }

    fn check_else_usage<M>(&mut self, machine: &StateMachine<M>, vertex: VertexId) {
        let else_count = machine
            .outgoing(vertex)
            .iter()
            .filter(|&&t| matches!(machine.transitions[t.0].guard, GuardSlot::Else))
            .count();
        if else_count > 1 {
            self.flag(
                machine.vertex_qualified_name(vertex),
                ViolationKind::MultipleElseTransitions,
            );
        }
        let branches = matches!(
            machine.pseudo_kind(vertex),
            Some(PseudoStateKind::Choice | PseudoStateKind::Junction)
        );
        if else_count > 0 && !branches {
            self.flag(
                machine.vertex_qualified_name(vertex),
                ViolationKind::ElseOutsideBranch,
            );
        }
    }
}

impl<M> Visitor<M> for Sweep {
    fn visit_state(&mut self, machine: &StateMachine<M>, vertex: VertexId) {
        self.check_else_usage(machine, vertex);
    }

    fn visit_state_machine(&mut self, machine: &StateMachine<M>, vertex: VertexId) {
        self.check_else_usage(machine, vertex);
    }

    fn visit_pseudo_state(&mut self, machine: &StateMachine<M>, vertex: VertexId) {
        if matches!(
            machine.pseudo_kind(vertex),
            Some(PseudoStateKind::Choice | PseudoStateKind::Junction)
        ) && machine.outgoing(vertex).is_empty()
        {
            self.flag(
                machine.vertex_qualified_name(vertex),
                ViolationKind::BranchWithoutOutgoing,
            );
        }
        self.check_else_usage(machine, vertex);
    }

    fn visit_region(&mut self, machine: &StateMachine<M>, region: RegionId) {
        if machine.initial_of(region).is_none() && !machine.vertices_in(region).is_empty() {
            self.flag(
                machine.region_qualified_name(region),
                ViolationKind::RegionWithoutInitial,
            );
        }
    }
}

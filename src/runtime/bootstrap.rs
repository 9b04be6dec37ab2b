//! The bootstrap pass: compile model structure into traversal steps.
//!
//! Bootstrap walks the model once and attaches to every transition the
//! exact ordered list of steps its traversal performs. The static shape
//! (which vertices are exited and entered, and in what order) is resolved
//! here; only the parts that depend on the live configuration (which child
//! of a region is active, history restoration, completion) read the
//! instance at run time. Step lists are never recomputed during
//! evaluation, so the side-effect order of any traversal is fixed at
//! bootstrap.

use tracing::debug;

use crate::model::element::{PseudoStateKind, RegionId, TransitionId, VertexId};
use crate::model::error::ModelError;
use crate::model::machine::{StateMachine, VertexKind};
use crate::model::transition::TransitionKind;
use crate::runtime::ancestry::{ancestry, first_divergence, Ancestor};

/// A single precomputed traversal step.
///
/// `Effect` refers to the owning transition's effect list; the other
/// variants name model elements directly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Step {
    /// Recursively leave a vertex: active children bottom-up, then its own
    /// exit actions.
    Exit(VertexId),
    /// Recursively leave whatever is currently active in a region.
    ExitCurrent(RegionId),
    /// Run the owning transition's effects in insertion order.
    Effect,
    /// Run a vertex's entry actions and record it as its region's current
    /// state.
    Enter(VertexId),
    /// Enter a region through its initial/history rules.
    EnterRegion(RegionId),
    /// Enter every child region of a vertex except the one already on the
    /// entry path.
    EnterSiblings(VertexId, RegionId),
    /// Finish entering a vertex: descend into child regions (or dispatch a
    /// pseudostate), then evaluate completion.
    Cascade(VertexId),
}

impl<M> StateMachine<M> {
    /// Compile the model: classify every transition and attach its step
    /// list. Idempotent: a clean model returns immediately, and
    /// recompiling a dirty one rebuilds every list from scratch.
    ///
    /// Statically detectable well-formedness defects are raised here:
    /// initial and history pseudostates must have exactly one outgoing
    /// transition, and a choice or junction must have at least one.
    pub fn initialise_model(&mut self) -> Result<(), ModelError> {
        if self.clean {
            return Ok(());
        }
        self.check_pseudostate_outgoing()?;

        let compiled: Vec<_> = (0..self.transitions.len())
            .map(|t| self.compile_transition(TransitionId(t)))
            .collect();
        for (t, (kind, steps)) in compiled.into_iter().enumerate() {
            self.transitions[t].kind = Some(kind);
            self.transitions[t].steps = steps;
        }

        self.init_steps = vec![Step::Enter(self.root()), Step::Cascade(self.root())];
        self.clean = true;
        debug!(
            machine = self.name(),
            transitions = self.transitions.len(),
            "model bootstrapped"
        );
        Ok(())
    }

    fn check_pseudostate_outgoing(&self) -> Result<(), ModelError> {
        for vertex in &self.vertices {
            let kind = match vertex.kind {
                VertexKind::Pseudo(kind) => kind,
                _ => continue,
            };
            match kind {
                PseudoStateKind::Initial
                | PseudoStateKind::ShallowHistory
                | PseudoStateKind::DeepHistory => {
                    if vertex.outgoing.len() != 1 {
                        return Err(ModelError::InitialTransitionCount {
                            vertex: vertex.qualified_name.clone(),
                            found: vertex.outgoing.len(),
                        });
                    }
                }
                PseudoStateKind::Choice | PseudoStateKind::Junction => {
                    if vertex.outgoing.is_empty() {
                        return Err(ModelError::NoOutgoingTransition {
                            vertex: vertex.qualified_name.clone(),
                        });
                    }
                }
                PseudoStateKind::Terminate => {}
            }
        }
        Ok(())
    }

    fn compile_transition(&self, transition: TransitionId) -> (TransitionKind, Vec<Step>) {
        let node = &self.transitions[transition.0];
        let target = match node.target {
            None => return (TransitionKind::Internal, vec![Step::Effect]),
            Some(target) => target,
        };
        let source = node.source;

        let source_chain = ancestry(self, source);
        let target_chain = ancestry(self, target);

        match first_divergence(&source_chain, &target_chain) {
            // Chains are identical: a self transition, which is external.
            // The source is exited and re-entered.
            None if source_chain.len() == target_chain.len() => {
                let top = target_chain.len() - 1;
                let steps = self.external_steps(&source_chain, &target_chain, top);
                (TransitionKind::External, steps)
            }
            // Target below source: local. The source stays active; whatever
            // is live in the path region is exited, then the path enters.
            None if target_chain.len() > source_chain.len() => {
                let path_region = region_slot(&target_chain, source_chain.len());
                let mut steps = vec![Step::ExitCurrent(path_region), Step::Effect];
                self.push_entry_chain(&mut steps, &target_chain[source_chain.len() + 1..]);
                (TransitionKind::Local, steps)
            }
            // Target above source: local. The active chain inside the
            // target's affected region is exited and the region re-enters
            // through its initial rules.
            None => {
                let path_region = region_slot(&source_chain, target_chain.len());
                let steps = vec![
                    Step::ExitCurrent(path_region),
                    Step::Effect,
                    Step::EnterRegion(path_region),
                ];
                (TransitionKind::Local, steps)
            }
            Some(at) => {
                // Divergence on a region slot means source and target sit
                // in sibling regions of one orthogonal state; that state is
                // exited wholesale and re-entered down to the target.
                let top = if matches!(target_chain[at], Ancestor::Region(_)) {
                    at - 1
                } else {
                    at
                };
                let steps = self.external_steps(&source_chain, &target_chain, top);
                (TransitionKind::External, steps)
            }
        }
    }

    /// External traversal: exit the source-side vertex at `top`, run
    /// effects, then enter the target-side chain from `top` downward.
    fn external_steps(
        &self,
        source_chain: &[Ancestor],
        target_chain: &[Ancestor],
        top: usize,
    ) -> Vec<Step> {
        let mut steps = vec![Step::Exit(vertex_slot(source_chain, top)), Step::Effect];
        self.push_entry_chain(&mut steps, &target_chain[top..]);
        steps
    }

    /// Emit `Enter` steps for a `[vertex, region, vertex, …, vertex]` slot
    /// run, entering off-path regions of orthogonal states along the way,
    /// and finishing with the last vertex's cascade.
    fn push_entry_chain(&self, steps: &mut Vec<Step>, slots: &[Ancestor]) {
        for pair in slots.chunks(2) {
            match *pair {
                [Ancestor::Vertex(vertex), Ancestor::Region(path)] => {
                    steps.push(Step::Enter(vertex));
                    if self.vertices[vertex.0].regions.len() > 1 {
                        steps.push(Step::EnterSiblings(vertex, path));
                    }
                }
                [Ancestor::Vertex(vertex)] => {
                    steps.push(Step::Enter(vertex));
                    steps.push(Step::Cascade(vertex));
                }
                _ => unreachable!("ancestry chains alternate"),
            }
        }
    }
}

fn region_slot(chain: &[Ancestor], index: usize) -> RegionId {
    match chain[index] {
        Ancestor::Region(region) => region,
        Ancestor::Vertex(_) => unreachable!("ancestry chains alternate"),
    }
}

fn vertex_slot(chain: &[Ancestor], index: usize) -> VertexId {
    match chain[index] {
        Ancestor::Vertex(vertex) => vertex,
        Ancestor::Region(_) => unreachable!("ancestry chains alternate"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Root with Initial → A, A --"go"→ B, plus a composite C holding C1.
    fn sample() -> (StateMachine<&'static str>, TransitionId, TransitionId, TransitionId) {
        let mut machine: StateMachine<&'static str> = StateMachine::new("m");
        let root = machine.root();
        let initial = machine
            .add_pseudo_state("initial", PseudoStateKind::Initial, root)
            .unwrap();
        let a = machine.add_state("A", root).unwrap();
        let b = machine.add_state("B", root).unwrap();
        let c = machine.add_state("C", root).unwrap();
        let c1 = machine.add_state("C1", c).unwrap();

        let t_init = machine.transition(initial).to(a).build().unwrap();
        let t_ext = machine.transition(a).to(b).when(|m, _| *m == "go").build().unwrap();
        let t_local = machine.transition(c).to(c1).when(|m, _| *m == "dive").build().unwrap();
        (machine, t_init, t_ext, t_local)
    }

    #[test]
    fn classification_matches_topology() {
        let (mut machine, _, t_ext, t_local) = sample();
        let a = machine.find_vertex("m.default.A").unwrap();
        let t_internal = machine
            .transition(a)
            .when(|m, _| *m == "tick")
            .build()
            .unwrap();
        let t_self = machine.transition(a).to(a).when(|m, _| *m == "again").build().unwrap();
        machine.initialise_model().unwrap();

        assert_eq!(machine.transition_kind(t_ext), Some(TransitionKind::External));
        assert_eq!(machine.transition_kind(t_local), Some(TransitionKind::Local));
        assert_eq!(machine.transition_kind(t_internal), Some(TransitionKind::Internal));
        assert_eq!(machine.transition_kind(t_self), Some(TransitionKind::External));
    }

    #[test]
    fn external_steps_exit_then_effect_then_enter() {
        let (mut machine, _, t_ext, _) = sample();
        machine.initialise_model().unwrap();

        let a = machine.find_vertex("m.default.A").unwrap();
        let b = machine.find_vertex("m.default.B").unwrap();
        assert_eq!(
            machine.transitions[t_ext.0].steps,
            vec![Step::Exit(a), Step::Effect, Step::Enter(b), Step::Cascade(b)]
        );
    }

    #[test]
    fn local_steps_do_not_exit_the_source() {
        let (mut machine, _, _, t_local) = sample();
        machine.initialise_model().unwrap();

        let c = machine.find_vertex("m.default.C").unwrap();
        let c1 = machine.find_vertex("m.default.C.default.C1").unwrap();
        let region = machine.regions_of(c)[0];
        assert_eq!(
            machine.transitions[t_local.0].steps,
            vec![
                Step::ExitCurrent(region),
                Step::Effect,
                Step::Enter(c1),
                Step::Cascade(c1),
            ]
        );
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let (mut machine, t_init, t_ext, t_local) = sample();
        machine.initialise_model().unwrap();
        let before: Vec<Vec<Step>> = [t_init, t_ext, t_local]
            .iter()
            .map(|t| machine.transitions[t.0].steps.clone())
            .collect();

        // A second clean pass is a no-op; a forced recompile rebuilds the
        // same lists.
        machine.initialise_model().unwrap();
        machine.mark_dirty();
        machine.initialise_model().unwrap();

        let after: Vec<Vec<Step>> = [t_init, t_ext, t_local]
            .iter()
            .map(|t| machine.transitions[t.0].steps.clone())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn initial_pseudostate_must_have_one_outgoing_transition() {
        let mut machine: StateMachine<()> = StateMachine::new("m");
        let root = machine.root();
        machine
            .add_pseudo_state("initial", PseudoStateKind::Initial, root)
            .unwrap();
        machine.add_state("A", root).unwrap();

        let result = machine.initialise_model();
        assert!(matches!(
            result,
            Err(ModelError::InitialTransitionCount { found: 0, .. })
        ));
    }

    #[test]
    fn choice_without_outgoing_transitions_is_rejected() {
        let mut machine: StateMachine<()> = StateMachine::new("m");
        let root = machine.root();
        let initial = machine
            .add_pseudo_state("initial", PseudoStateKind::Initial, root)
            .unwrap();
        let a = machine.add_state("A", root).unwrap();
        machine.transition(initial).to(a).build().unwrap();
        machine
            .add_pseudo_state("c", PseudoStateKind::Choice, root)
            .unwrap();

        let result = machine.initialise_model();
        assert!(matches!(result, Err(ModelError::NoOutgoingTransition { .. })));
    }
}

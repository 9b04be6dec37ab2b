//! The evaluator: message delivery, transition selection, and execution of
//! compiled traversals.
//!
//! Everything here is synchronous. One `evaluate` call selects at most one
//! transition per delivered message, runs its precompiled steps, and then
//! lets completion transitions cascade until the configuration quiesces.
//! Guards and actions run inline; a panic in either unwinds through the
//! engine and leaves the instance in its partial configuration.

use tracing::{debug, trace};

use crate::model::element::{PseudoStateKind, RegionId, TransitionId, VertexId};
use crate::model::machine::{StateMachine, VertexKind};
use crate::model::transition::GuardSlot;
use crate::runtime::bootstrap::Step;
use crate::runtime::error::RuntimeError;
use crate::runtime::instance::Instance;

impl<M> StateMachine<M> {
    /// Enter the root of the machine, bootstrapping first if the model is
    /// dirty. Must be called before [`evaluate`](Self::evaluate).
    ///
    /// Re-initialising an instance re-enters the root; region entries are
    /// overwritten as states are entered again.
    pub fn initialise(&mut self, instance: &mut dyn Instance) -> Result<(), RuntimeError> {
        self.initialise_model()?;
        debug!(machine = self.name(), "initialising instance");
        self.run_steps(&self.init_steps, None, None, instance)
    }

    /// Deliver a message to an instance.
    ///
    /// Returns `Ok(true)` when some transition consumed the message,
    /// `Ok(false)` when nothing was satisfied by it, or, quietly, when the
    /// instance is terminated. Delivering to an instance that was never
    /// initialised is an error.
    pub fn evaluate(
        &mut self,
        message: &M,
        instance: &mut dyn Instance,
    ) -> Result<bool, RuntimeError> {
        self.initialise_model()?;
        if instance.is_terminated() {
            return Ok(false);
        }
        let root = self.root();
        for &region in &self.vertices[root.0].regions {
            if !self.regions[region.0].vertices.is_empty() && instance.current(region).is_none() {
                return Err(RuntimeError::NotInitialised);
            }
        }
        self.evaluate_vertex(root, message, instance)
    }

    /// Offer the message to the active configuration below `vertex` first
    /// (regions in declared order, innermost states first), then attempt
    /// selection at `vertex` itself.
    fn evaluate_vertex(
        &self,
        vertex: VertexId,
        message: &M,
        instance: &mut dyn Instance,
    ) -> Result<bool, RuntimeError> {
        for &region in &self.vertices[vertex.0].regions {
            if let Some(current) = instance.current(region) {
                if self.evaluate_vertex(current, message, instance)? {
                    return Ok(true);
                }
            }
        }
        match self.select(vertex, Some(message), instance)? {
            Some(transition) => {
                self.traverse(transition, Some(message), instance)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ── Selection ──────────────────────────────────────────────────────

    fn select(
        &self,
        vertex: VertexId,
        message: Option<&M>,
        instance: &dyn Instance,
    ) -> Result<Option<TransitionId>, RuntimeError> {
        match self.vertices[vertex.0].kind {
            VertexKind::Pseudo(kind) => self.select_at_pseudo(vertex, kind, message, instance),
            _ => Ok(self.select_at_state(vertex, message, instance)),
        }
    }

    /// First satisfied non-else transition in insertion order; the else
    /// branch is the fallback when nothing matched.
    fn select_at_state(
        &self,
        vertex: VertexId,
        message: Option<&M>,
        instance: &dyn Instance,
    ) -> Option<TransitionId> {
        let mut fallback = None;
        for &t in &self.vertices[vertex.0].outgoing {
            match &self.transitions[t.0].guard {
                GuardSlot::Always => return Some(t),
                GuardSlot::When(guard) => {
                    if let Some(m) = message {
                        if guard(m, instance) {
                            return Some(t);
                        }
                    }
                }
                GuardSlot::Else => {
                    if fallback.is_none() {
                        fallback = Some(t);
                    }
                }
            }
        }
        fallback
    }

    fn select_at_pseudo(
        &self,
        vertex: VertexId,
        kind: PseudoStateKind,
        message: Option<&M>,
        instance: &dyn Instance,
    ) -> Result<Option<TransitionId>, RuntimeError> {
        let outgoing = &self.vertices[vertex.0].outgoing;
        match kind {
            // Exactly one outgoing transition (checked at bootstrap),
            // traversed unconditionally.
            PseudoStateKind::Initial
            | PseudoStateKind::ShallowHistory
            | PseudoStateKind::DeepHistory => Ok(outgoing.first().copied()),
            PseudoStateKind::Choice => {
                let satisfied = self.satisfied(outgoing, message, instance);
                match satisfied.first() {
                    Some(&first) => Ok(Some(first)),
                    None => self
                        .else_of(outgoing)
                        .map(Some)
                        .ok_or_else(|| RuntimeError::ChoiceNoMatch {
                            vertex: self.vertices[vertex.0].qualified_name.clone(),
                        }),
                }
            }
            PseudoStateKind::Junction => {
                let satisfied = self.satisfied(outgoing, message, instance);
                match satisfied.len() {
                    1 => Ok(Some(satisfied[0])),
                    0 => self
                        .else_of(outgoing)
                        .map(Some)
                        .ok_or_else(|| RuntimeError::JunctionNoMatch {
                            vertex: self.vertices[vertex.0].qualified_name.clone(),
                        }),
                    found => Err(RuntimeError::JunctionAmbiguous {
                        vertex: self.vertices[vertex.0].qualified_name.clone(),
                        found,
                    }),
                }
            }
            PseudoStateKind::Terminate => Ok(None),
        }
    }

    /// Non-else transitions whose guard accepts `message`, in insertion
    /// order.
    fn satisfied(
        &self,
        outgoing: &[TransitionId],
        message: Option<&M>,
        instance: &dyn Instance,
    ) -> Vec<TransitionId> {
        outgoing
            .iter()
            .copied()
            .filter(|&t| match &self.transitions[t.0].guard {
                GuardSlot::Always => true,
                GuardSlot::When(guard) => {
                    message.map(|m| guard(m, instance)).unwrap_or(false)
                }
                GuardSlot::Else => false,
            })
            .collect()
    }

    fn else_of(&self, outgoing: &[TransitionId]) -> Option<TransitionId> {
        outgoing
            .iter()
            .copied()
            .find(|&t| matches!(self.transitions[t.0].guard, GuardSlot::Else))
    }

    // ── Execution ──────────────────────────────────────────────────────

    fn traverse(
        &self,
        transition: TransitionId,
        message: Option<&M>,
        instance: &mut dyn Instance,
    ) -> Result<(), RuntimeError> {
        let node = &self.transitions[transition.0];
        debug!(
            source = self.vertices[node.source.0].qualified_name.as_str(),
            target = node
                .target
                .map(|t| self.vertices[t.0].qualified_name.as_str()),
            "traversing"
        );
        self.run_steps(&node.steps, Some(transition), message, instance)
    }

    /// Execute a compiled step list. Checks the terminated flag between
    /// steps: once a terminate pseudostate has been entered, nothing else
    /// runs.
    fn run_steps(
        &self,
        steps: &[Step],
        owner: Option<TransitionId>,
        message: Option<&M>,
        instance: &mut dyn Instance,
    ) -> Result<(), RuntimeError> {
        for step in steps {
            if instance.is_terminated() {
                return Ok(());
            }
            match *step {
                Step::Exit(vertex) => self.leave(vertex, message, instance),
                Step::ExitCurrent(region) => {
                    if let Some(current) = instance.current(region) {
                        self.leave(current, message, instance);
                    }
                }
                Step::Effect => {
                    if let Some(transition) = owner {
                        for effect in &self.transitions[transition.0].effects {
                            effect(message, instance, false);
                        }
                    }
                }
                Step::Enter(vertex) => self.enter(vertex, message, instance, false),
                Step::EnterRegion(region) => {
                    self.enter_region(region, false, message, instance)?
                }
                Step::EnterSiblings(vertex, path) => {
                    for &region in &self.vertices[vertex.0].regions {
                        if instance.is_terminated() {
                            return Ok(());
                        }
                        if region != path {
                            self.enter_region(region, false, message, instance)?;
                        }
                    }
                }
                Step::Cascade(vertex) => self.cascade(vertex, false, message, instance)?,
            }
        }
        Ok(())
    }

    /// Leave a vertex: active children bottom-up (regions in reverse
    /// declaration order), then its own exit actions. Region entries are
    /// not erased; history needs them.
    fn leave(&self, vertex: VertexId, message: Option<&M>, instance: &mut dyn Instance) {
        let node = &self.vertices[vertex.0];
        for &region in node.regions.iter().rev() {
            if let Some(current) = instance.current(region) {
                self.leave(current, message, instance);
            }
        }
        trace!(state = node.qualified_name.as_str(), "leaving");
        for action in &node.exit {
            action(message, instance, false);
        }
    }

    /// Enter a vertex: entry actions in insertion order, then record it as
    /// its region's current state. Terminate pseudostates flip the
    /// instance's flag instead; other pseudostates are transient and leave
    /// no record.
    fn enter(
        &self,
        vertex: VertexId,
        message: Option<&M>,
        instance: &mut dyn Instance,
        deep: bool,
    ) {
        let node = &self.vertices[vertex.0];
        trace!(state = node.qualified_name.as_str(), "entering");
        match node.kind {
            VertexKind::Pseudo(PseudoStateKind::Terminate) => instance.set_terminated(true),
            VertexKind::Pseudo(_) => {}
            VertexKind::State | VertexKind::Final => {
                for action in &node.entry {
                    action(message, instance, deep);
                }
                if let Some(region) = node.parent {
                    instance.set_current(region, vertex);
                }
            }
        }
    }

    /// Finish entering a vertex after [`enter`](Self::enter): descend into
    /// child regions, dispatch pseudostate behavior, and evaluate
    /// completion.
    fn cascade(
        &self,
        vertex: VertexId,
        deep: bool,
        message: Option<&M>,
        instance: &mut dyn Instance,
    ) -> Result<(), RuntimeError> {
        match self.vertices[vertex.0].kind {
            VertexKind::State => {
                for &region in &self.vertices[vertex.0].regions {
                    self.enter_region(region, deep, message, instance)?;
                    if instance.is_terminated() {
                        return Ok(());
                    }
                }
                if self.is_complete(vertex, instance) {
                    self.completion(vertex, instance)?;
                }
                Ok(())
            }
            // Reaching a final state may complete the enclosing state.
            VertexKind::Final => {
                if let Some(region) = self.vertices[vertex.0].parent {
                    let parent = self.regions[region.0].parent;
                    if self.is_complete(parent, instance) {
                        self.completion(parent, instance)?;
                    }
                }
                Ok(())
            }
            VertexKind::Pseudo(kind) => self.cascade_pseudo(vertex, kind, deep, message, instance),
        }
    }

    fn cascade_pseudo(
        &self,
        vertex: VertexId,
        kind: PseudoStateKind,
        deep: bool,
        message: Option<&M>,
        instance: &mut dyn Instance,
    ) -> Result<(), RuntimeError> {
        if kind == PseudoStateKind::Terminate {
            return Ok(());
        }
        if kind.is_history() {
            // A history pseudostate entered as a transition target restores
            // its region's last-known state; with nothing recorded it falls
            // through to its outgoing transition like an initial.
            if let Some(region) = self.vertices[vertex.0].parent {
                if let Some(current) = instance.current(region) {
                    let deep = deep || kind == PseudoStateKind::DeepHistory;
                    self.enter(current, message, instance, deep);
                    return self.cascade(current, deep, message, instance);
                }
            }
        }
        match self.select_at_pseudo(vertex, kind, message, instance)? {
            Some(transition) => self.traverse(transition, message, instance),
            None => Ok(()),
        }
    }

    /// Enter a region: restore history where it applies, otherwise start
    /// from the initial pseudostate.
    fn enter_region(
        &self,
        region: RegionId,
        deep: bool,
        message: Option<&M>,
        instance: &mut dyn Instance,
    ) -> Result<(), RuntimeError> {
        let initial = self.regions[region.0].initial;
        let initial_kind = initial.and_then(|i| self.pseudo_kind(i));
        let history = deep || initial_kind.is_some_and(PseudoStateKind::is_history);
        if history {
            if let Some(current) = instance.current(region) {
                let deep = deep || initial_kind == Some(PseudoStateKind::DeepHistory);
                self.enter(current, message, instance, deep);
                return self.cascade(current, deep, message, instance);
            }
        }
        match initial {
            Some(initial) => {
                self.enter(initial, message, instance, deep);
                self.cascade(initial, deep, message, instance)
            }
            None => Err(RuntimeError::NoInitial {
                region: self.regions[region.0].qualified_name.clone(),
            }),
        }
    }

    /// Fire a completion transition out of a just-completed state, if the
    /// no-message event satisfies one.
    fn completion(&self, vertex: VertexId, instance: &mut dyn Instance) -> Result<(), RuntimeError> {
        if instance.is_terminated() {
            return Ok(());
        }
        if let Some(transition) = self.select(vertex, None, instance)? {
            debug!(
                state = self.vertices[vertex.0].qualified_name.as_str(),
                "completion"
            );
            self.traverse(transition, None, instance)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::instance::InMemoryInstance;

    fn toggle() -> (StateMachine<&'static str>, VertexId, VertexId, RegionId) {
        let mut machine: StateMachine<&'static str> = StateMachine::new("toggle");
        let root = machine.root();
        let initial = machine
            .add_pseudo_state("initial", PseudoStateKind::Initial, root)
            .unwrap();
        let off = machine.add_state("Off", root).unwrap();
        let on = machine.add_state("On", root).unwrap();
        machine.transition(initial).to(off).build().unwrap();
        machine.transition(off).to(on).when(|m, _| *m == "on").build().unwrap();
        machine.transition(on).to(off).when(|m, _| *m == "off").build().unwrap();
        let region = machine.regions_of(root)[0];
        (machine, off, on, region)
    }

    #[test]
    fn initialise_enters_the_initial_state() {
        let (mut machine, off, _, region) = toggle();
        let mut instance = InMemoryInstance::new();
        machine.initialise(&mut instance).unwrap();
        assert_eq!(instance.current(region), Some(off));
    }

    #[test]
    fn unmatched_message_is_not_consumed() {
        let (mut machine, off, _, region) = toggle();
        let mut instance = InMemoryInstance::new();
        machine.initialise(&mut instance).unwrap();

        assert!(!machine.evaluate(&"off", &mut instance).unwrap());
        assert_eq!(instance.current(region), Some(off));
    }

    #[test]
    fn evaluate_without_initialise_is_an_error() {
        let (mut machine, _, _, _) = toggle();
        let mut instance = InMemoryInstance::new();

        let result = machine.evaluate(&"on", &mut instance);
        assert!(matches!(result, Err(RuntimeError::NotInitialised)));
    }

    #[test]
    fn internal_transition_runs_effects_without_exit_or_entry() {
        use std::sync::{Arc, Mutex};

        let mut machine: StateMachine<&'static str> = StateMachine::new("m");
        let root = machine.root();
        let initial = machine
            .add_pseudo_state("initial", PseudoStateKind::Initial, root)
            .unwrap();
        let a = machine.add_state("A", root).unwrap();
        machine.transition(initial).to(a).build().unwrap();

        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let entry_log = Arc::clone(&log);
        machine
            .on_entry(a, move |_, _, _| entry_log.lock().unwrap().push("enter A".into()))
            .unwrap();
        let exit_log = Arc::clone(&log);
        machine
            .on_exit(a, move |_, _, _| exit_log.lock().unwrap().push("exit A".into()))
            .unwrap();
        let effect_log = Arc::clone(&log);
        machine
            .transition(a)
            .when(|m, _| *m == "tick")
            .effect(move |_, _, _| effect_log.lock().unwrap().push("tick".into()))
            .build()
            .unwrap();

        let mut instance = InMemoryInstance::new();
        machine.initialise(&mut instance).unwrap();
        assert!(machine.evaluate(&"tick", &mut instance).unwrap());

        assert_eq!(*log.lock().unwrap(), vec!["enter A", "tick"]);
    }

    #[test]
    fn completion_transition_fires_on_entry_of_a_complete_state() {
        let mut machine: StateMachine<&'static str> = StateMachine::new("m");
        let root = machine.root();
        let initial = machine
            .add_pseudo_state("initial", PseudoStateKind::Initial, root)
            .unwrap();
        let a = machine.add_state("A", root).unwrap();
        let b = machine.add_state("B", root).unwrap();
        let c = machine.add_state("C", root).unwrap();
        machine.transition(initial).to(a).build().unwrap();
        machine.transition(a).to(b).when(|m, _| *m == "go").build().unwrap();
        // B is simple, hence complete on entry; its unguarded transition
        // cascades straight to C.
        machine.transition(b).to(c).build().unwrap();

        let mut instance = InMemoryInstance::new();
        machine.initialise(&mut instance).unwrap();
        assert!(machine.evaluate(&"go", &mut instance).unwrap());

        let region = machine.regions_of(root)[0];
        assert_eq!(instance.current(region), Some(c));
    }

    #[test]
    fn terminated_instance_swallows_messages() {
        let (mut machine, _, _, region) = toggle();
        let mut instance = InMemoryInstance::new();
        machine.initialise(&mut instance).unwrap();
        let before = instance.current(region);

        instance.set_terminated(true);
        assert!(!machine.evaluate(&"on", &mut instance).unwrap());
        assert_eq!(instance.current(region), before);
    }
}

//! Generic model traversal for external tooling.
//!
//! Diagram generators and validators walk the tree through [`Visitor`];
//! the evaluator never does. The arena's tagged vertex kind collapses
//! double dispatch into the single `match` in [`StateMachine::accept`].

use crate::model::element::{ElementRef, RegionId, TransitionId, VertexId};
use crate::model::machine::{StateMachine, VertexKind};

/// Handler set for one walk over a model.
///
/// Every kind-specific handler defaults to the generic
/// [`visit_element`](Self::visit_element) fallback, so an implementation
/// only overrides what it cares about.
pub trait Visitor<M> {
    /// Generic fallback, invoked by every default handler.
    fn visit_element(&mut self, machine: &StateMachine<M>, element: ElementRef) {
        let _ = (machine, element);
    }

    /// The root state.
    fn visit_state_machine(&mut self, machine: &StateMachine<M>, vertex: VertexId) {
        self.visit_element(machine, ElementRef::Vertex(vertex));
    }

    /// A plain state (simple, composite, or orthogonal).
    fn visit_state(&mut self, machine: &StateMachine<M>, vertex: VertexId) {
        self.visit_element(machine, ElementRef::Vertex(vertex));
    }

    /// A final state.
    fn visit_final_state(&mut self, machine: &StateMachine<M>, vertex: VertexId) {
        self.visit_element(machine, ElementRef::Vertex(vertex));
    }

    /// A pseudostate of any kind; query the kind through
    /// [`StateMachine::pseudo_kind`].
    fn visit_pseudo_state(&mut self, machine: &StateMachine<M>, vertex: VertexId) {
        self.visit_element(machine, ElementRef::Vertex(vertex));
    }

    /// A region.
    fn visit_region(&mut self, machine: &StateMachine<M>, region: RegionId) {
        self.visit_element(machine, ElementRef::Region(region));
    }

    /// A transition, visited right after its source vertex.
    fn visit_transition(&mut self, machine: &StateMachine<M>, transition: TransitionId) {
        self.visit_element(machine, ElementRef::Transition(transition));
    }
}

impl<M> StateMachine<M> {
    /// Walk the whole model depth-first: each vertex, then its outgoing
    /// transitions, then its child regions and their vertices.
    pub fn accept<V>(&self, visitor: &mut V)
    where
        V: Visitor<M> + ?Sized,
    {
        self.accept_vertex(self.root(), visitor);
    }

    fn accept_vertex<V>(&self, vertex: VertexId, visitor: &mut V)
    where
        V: Visitor<M> + ?Sized,
    {
        match self.vertices[vertex.0].kind {
            VertexKind::State if vertex == self.root() => {
                visitor.visit_state_machine(self, vertex)
            }
            VertexKind::State => visitor.visit_state(self, vertex),
            VertexKind::Final => visitor.visit_final_state(self, vertex),
            VertexKind::Pseudo(_) => visitor.visit_pseudo_state(self, vertex),
        }
        for &transition in &self.vertices[vertex.0].outgoing {
            visitor.visit_transition(self, transition);
        }
        for &region in &self.vertices[vertex.0].regions {
            visitor.visit_region(self, region);
            for &child in &self.regions[region.0].vertices {
                self.accept_vertex(child, visitor);
            }
        }
    }
}

//! The machine arena: element construction and structural queries.
//!
//! A [`StateMachine`] owns every element of one model (vertices, regions,
//! and transitions) in flat arenas, handing out `Copy` index handles. The
//! machine itself is the root state of the tree (vertex 0). Any mutation
//! marks the model dirty; the bootstrap pass recompiles it lazily on the
//! next `initialise`/`evaluate`.

use std::fmt;

use crate::model::element::{PseudoStateKind, RegionId, TransitionId, VertexId};
use crate::model::error::ModelError;
use crate::model::transition::{Action, TransitionNode};
use crate::runtime::bootstrap::Step;
use crate::runtime::instance::Instance;

/// Default separator for qualified names.
pub const DEFAULT_SEPARATOR: &str = ".";

/// Default name for auto-created regions.
pub const DEFAULT_REGION_NAME: &str = "default";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum VertexKind {
    State,
    Final,
    Pseudo(PseudoStateKind),
}

pub(crate) struct VertexNode<M> {
    pub(crate) name: String,
    pub(crate) qualified_name: String,
    /// `None` only for the root.
    pub(crate) parent: Option<RegionId>,
    pub(crate) kind: VertexKind,
    pub(crate) outgoing: Vec<TransitionId>,
    pub(crate) regions: Vec<RegionId>,
    pub(crate) entry: Vec<Action<M>>,
    pub(crate) exit: Vec<Action<M>>,
}

pub(crate) struct RegionNode {
    pub(crate) name: String,
    pub(crate) qualified_name: String,
    pub(crate) parent: VertexId,
    pub(crate) vertices: Vec<VertexId>,
    /// Set when an initial-family pseudostate is added to the region.
    pub(crate) initial: Option<VertexId>,
}

/// A hierarchical state machine model, generic over the message type `M`.
///
/// The machine doubles as the root state of its own tree. Build the model
/// with [`add_state`](Self::add_state) and friends, wire vertices together
/// with [`transition`](Self::transition), then drive instances through
/// [`initialise`](Self::initialise) and [`evaluate`](Self::evaluate).
///
/// # Example
///
/// ```rust
/// use statechart::{InMemoryInstance, PseudoStateKind, StateMachine};
///
/// let mut machine: StateMachine<&str> = StateMachine::new("lamp");
/// let root = machine.root();
/// let initial = machine
///     .add_pseudo_state("initial", PseudoStateKind::Initial, root)
///     .unwrap();
/// let off = machine.add_state("Off", root).unwrap();
/// let on = machine.add_state("On", root).unwrap();
/// machine.transition(initial).to(off).build().unwrap();
/// machine
///     .transition(off)
///     .to(on)
///     .when(|m, _| *m == "power")
///     .build()
///     .unwrap();
///
/// let mut instance = InMemoryInstance::new();
/// machine.initialise(&mut instance).unwrap();
/// assert!(machine.evaluate(&"power", &mut instance).unwrap());
/// ```
pub struct StateMachine<M> {
    separator: String,
    default_region_name: String,
    pub(crate) vertices: Vec<VertexNode<M>>,
    pub(crate) regions: Vec<RegionNode>,
    pub(crate) transitions: Vec<TransitionNode<M>>,
    /// Steps that enter the root, compiled by bootstrap.
    pub(crate) init_steps: Vec<Step>,
    /// Cleared by any model mutation; set by bootstrap.
    pub(crate) clean: bool,
}

impl<M> StateMachine<M> {
    /// Create an empty machine whose root state carries `name`.
    pub fn new(name: &str) -> Self {
        Self::with_separator(name, DEFAULT_SEPARATOR)
    }

    /// Create an empty machine with a custom qualified-name separator.
    ///
    /// The separator is baked into qualified names as elements are added,
    /// so choose it before building the model.
    pub fn with_separator(name: &str, separator: &str) -> Self {
        let root = VertexNode {
            name: name.to_string(),
            qualified_name: name.to_string(),
            parent: None,
            kind: VertexKind::State,
            outgoing: Vec::new(),
            regions: Vec::new(),
            entry: Vec::new(),
            exit: Vec::new(),
        };
        Self {
            separator: separator.to_string(),
            default_region_name: DEFAULT_REGION_NAME.to_string(),
            vertices: vec![root],
            regions: Vec::new(),
            transitions: Vec::new(),
            init_steps: Vec::new(),
            clean: false,
        }
    }

    /// Override the name given to auto-created default regions.
    pub fn set_default_region_name(&mut self, name: &str) {
        name.clone_into(&mut self.default_region_name);
    }

    /// Handle of the root state (the machine itself).
    pub fn root(&self) -> VertexId {
        VertexId(0)
    }

    /// The machine's name.
    pub fn name(&self) -> &str {
        &self.vertices[0].name
    }

    // ── Construction ───────────────────────────────────────────────────

    /// Add an explicit region to a state.
    ///
    /// States with two or more regions are orthogonal: every region is
    /// active whenever the state is.
    pub fn add_region(&mut self, name: &str, parent: VertexId) -> Result<RegionId, ModelError> {
        self.ensure_composite_parent(parent)?;
        Ok(self.push_region(name, parent))
    }

    /// Add a plain state under `parent`, auto-creating the parent's default
    /// region on first use.
    pub fn add_state(&mut self, name: &str, parent: VertexId) -> Result<VertexId, ModelError> {
        let region = self.default_region(parent)?;
        Ok(self.push_vertex(name, region, VertexKind::State))
    }

    /// Add a plain state to an explicit region.
    pub fn add_state_in(&mut self, name: &str, region: RegionId) -> VertexId {
        self.push_vertex(name, region, VertexKind::State)
    }

    /// Add a final state under `parent`. Reaching it completes the region.
    pub fn add_final_state(&mut self, name: &str, parent: VertexId) -> Result<VertexId, ModelError> {
        let region = self.default_region(parent)?;
        Ok(self.push_vertex(name, region, VertexKind::Final))
    }

    /// Add a final state to an explicit region.
    pub fn add_final_state_in(&mut self, name: &str, region: RegionId) -> VertexId {
        self.push_vertex(name, region, VertexKind::Final)
    }

    /// Add a pseudostate under `parent`, auto-creating the parent's default
    /// region on first use.
    ///
    /// Adding a second `Initial`/`ShallowHistory`/`DeepHistory` pseudostate
    /// to one region is an error.
    pub fn add_pseudo_state(
        &mut self,
        name: &str,
        kind: PseudoStateKind,
        parent: VertexId,
    ) -> Result<VertexId, ModelError> {
        let region = self.default_region(parent)?;
        self.add_pseudo_state_in(name, kind, region)
    }

    /// Add a pseudostate to an explicit region.
    pub fn add_pseudo_state_in(
        &mut self,
        name: &str,
        kind: PseudoStateKind,
        region: RegionId,
    ) -> Result<VertexId, ModelError> {
        if kind.is_initial_family() && self.regions[region.0].initial.is_some() {
            return Err(ModelError::DuplicateInitial {
                region: self.regions[region.0].qualified_name.clone(),
            });
        }
        let id = self.push_vertex(name, region, VertexKind::Pseudo(kind));
        if kind.is_initial_family() {
            self.regions[region.0].initial = Some(id);
        }
        Ok(id)
    }

    /// Append an entry action to a state. Actions run in insertion order.
    pub fn on_entry<F>(&mut self, state: VertexId, action: F) -> Result<(), ModelError>
    where
        F: Fn(Option<&M>, &mut dyn Instance, bool) + Send + Sync + 'static,
    {
        self.ensure_actionable(state)?;
        self.vertices[state.0].entry.push(Box::new(action));
        self.mark_dirty();
        Ok(())
    }

    /// Append an exit action to a state. Actions run in insertion order.
    pub fn on_exit<F>(&mut self, state: VertexId, action: F) -> Result<(), ModelError>
    where
        F: Fn(Option<&M>, &mut dyn Instance, bool) + Send + Sync + 'static,
    {
        self.ensure_actionable(state)?;
        self.vertices[state.0].exit.push(Box::new(action));
        self.mark_dirty();
        Ok(())
    }

    /// The default region of `state`, created on first use.
    pub fn default_region(&mut self, state: VertexId) -> Result<RegionId, ModelError> {
        self.ensure_composite_parent(state)?;
        let existing = self.vertices[state.0]
            .regions
            .iter()
            .copied()
            .find(|r| self.regions[r.0].name == self.default_region_name);
        match existing {
            Some(region) => Ok(region),
            None => {
                let name = self.default_region_name.clone();
                Ok(self.push_region(&name, state))
            }
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Short name of a vertex.
    pub fn vertex_name(&self, vertex: VertexId) -> &str {
        &self.vertices[vertex.0].name
    }

    /// Short name of a region.
    pub fn region_name(&self, region: RegionId) -> &str {
        &self.regions[region.0].name
    }

    /// Qualified name of a vertex: ancestor names joined by the separator.
    pub fn vertex_qualified_name(&self, vertex: VertexId) -> &str {
        &self.vertices[vertex.0].qualified_name
    }

    /// Qualified name of a region.
    pub fn region_qualified_name(&self, region: RegionId) -> &str {
        &self.regions[region.0].qualified_name
    }

    /// Child regions of a vertex, in declaration order.
    pub fn regions_of(&self, vertex: VertexId) -> &[RegionId] {
        &self.vertices[vertex.0].regions
    }

    /// Vertices of a region, in declaration order.
    pub fn vertices_in(&self, region: RegionId) -> &[VertexId] {
        &self.regions[region.0].vertices
    }

    /// The region's entry pseudostate, if one has been added.
    pub fn initial_of(&self, region: RegionId) -> Option<VertexId> {
        self.regions[region.0].initial
    }

    /// The region a vertex lives in (`None` for the root).
    pub fn parent_region(&self, vertex: VertexId) -> Option<RegionId> {
        self.vertices[vertex.0].parent
    }

    /// The state that owns a region.
    pub fn parent_state(&self, region: RegionId) -> VertexId {
        self.regions[region.0].parent
    }

    /// `true` if the vertex is a final state.
    pub fn is_final(&self, vertex: VertexId) -> bool {
        self.vertices[vertex.0].kind == VertexKind::Final
    }

    /// The pseudostate kind of a vertex, if it is a pseudostate.
    pub fn pseudo_kind(&self, vertex: VertexId) -> Option<PseudoStateKind> {
        match self.vertices[vertex.0].kind {
            VertexKind::Pseudo(kind) => Some(kind),
            _ => None,
        }
    }

    /// `true` for a state with no child regions.
    pub fn is_simple(&self, vertex: VertexId) -> bool {
        matches!(self.vertices[vertex.0].kind, VertexKind::State | VertexKind::Final)
            && self.vertices[vertex.0].regions.is_empty()
    }

    /// `true` for a state with exactly one child region.
    pub fn is_composite(&self, vertex: VertexId) -> bool {
        self.vertices[vertex.0].regions.len() == 1
    }

    /// `true` for a state with two or more child regions.
    pub fn is_orthogonal(&self, vertex: VertexId) -> bool {
        self.vertices[vertex.0].regions.len() >= 2
    }

    /// Look up a vertex by qualified name.
    pub fn find_vertex(&self, qualified_name: &str) -> Option<VertexId> {
        self.vertices
            .iter()
            .position(|v| v.qualified_name == qualified_name)
            .map(VertexId)
    }

    /// Look up a region by qualified name.
    pub fn find_region(&self, qualified_name: &str) -> Option<RegionId> {
        self.regions
            .iter()
            .position(|r| r.qualified_name == qualified_name)
            .map(RegionId)
    }

    /// A region is complete in `instance` iff its current state is final.
    pub fn region_is_complete(&self, region: RegionId, instance: &dyn Instance) -> bool {
        instance
            .current(region)
            .is_some_and(|current| self.is_final(current))
    }

    /// A state is complete in `instance` iff every child region is complete.
    /// States without regions are vacuously complete.
    pub fn is_complete(&self, vertex: VertexId, instance: &dyn Instance) -> bool {
        self.vertices[vertex.0]
            .regions
            .iter()
            .all(|&r| self.region_is_complete(r, instance))
    }

    /// `true` once the model has been bootstrapped and not mutated since.
    pub fn is_clean(&self) -> bool {
        self.clean
    }

    // ── Internals ──────────────────────────────────────────────────────

    pub(crate) fn mark_dirty(&mut self) {
        self.clean = false;
    }

    fn ensure_composite_parent(&self, vertex: VertexId) -> Result<(), ModelError> {
        match self.vertices[vertex.0].kind {
            VertexKind::State => Ok(()),
            _ => Err(ModelError::InvalidParent {
                vertex: self.vertices[vertex.0].qualified_name.clone(),
            }),
        }
    }

    fn ensure_actionable(&self, vertex: VertexId) -> Result<(), ModelError> {
        match self.vertices[vertex.0].kind {
            VertexKind::State | VertexKind::Final => Ok(()),
            VertexKind::Pseudo(_) => Err(ModelError::ActionsOnPseudoState {
                vertex: self.vertices[vertex.0].qualified_name.clone(),
            }),
        }
    }

    fn push_region(&mut self, name: &str, parent: VertexId) -> RegionId {
        let qualified_name = format!(
            "{}{}{}",
            self.vertices[parent.0].qualified_name, self.separator, name
        );
        let id = RegionId(self.regions.len());
        self.regions.push(RegionNode {
            name: name.to_string(),
            qualified_name,
            parent,
            vertices: Vec::new(),
            initial: None,
        });
        self.vertices[parent.0].regions.push(id);
        self.mark_dirty();
        id
    }

    fn push_vertex(&mut self, name: &str, region: RegionId, kind: VertexKind) -> VertexId {
        let qualified_name = format!(
            "{}{}{}",
            self.regions[region.0].qualified_name, self.separator, name
        );
        let id = VertexId(self.vertices.len());
        self.vertices.push(VertexNode {
            name: name.to_string(),
            qualified_name,
            parent: Some(region),
            kind,
            outgoing: Vec::new(),
            regions: Vec::new(),
            entry: Vec::new(),
            exit: Vec::new(),
        });
        self.regions[region.0].vertices.push(id);
        self.mark_dirty();
        id
    }
}

impl<M> fmt::Debug for StateMachine<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.vertices[0].name)
            .field("vertices", &self.vertices.len())
            .field("regions", &self.regions.len())
            .field("transitions", &self.transitions.len())
            .field("clean", &self.clean)
            .finish()
    }
}

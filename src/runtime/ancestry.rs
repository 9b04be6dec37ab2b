//! Ancestry chains and least-common-ancestor computation.
//!
//! A chain runs from the root down to a vertex, alternating vertex and
//! region slots (the root is a vertex, its regions come next, and so on).
//! Transition classification and step compilation both reduce to comparing
//! two chains.

use crate::model::element::{RegionId, VertexId};
use crate::model::machine::StateMachine;

/// One slot of an ancestry chain.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Ancestor {
    Vertex(VertexId),
    Region(RegionId),
}

/// The chain from the root state machine down to `vertex`, inclusive.
///
/// Slots at even indices are vertices, odd indices regions.
pub(crate) fn ancestry<M>(machine: &StateMachine<M>, vertex: VertexId) -> Vec<Ancestor> {
    let mut chain = vec![Ancestor::Vertex(vertex)];
    let mut cursor = vertex;
    while let Some(region) = machine.vertices[cursor.0].parent {
        chain.push(Ancestor::Region(region));
        cursor = machine.regions[region.0].parent;
        chain.push(Ancestor::Vertex(cursor));
    }
    chain.reverse();
    chain
}

/// Index of the first slot where two chains differ, or `None` when one is
/// a prefix of the other (including equal chains).
pub(crate) fn first_divergence(a: &[Ancestor], b: &[Ancestor]) -> Option<usize> {
    a.iter().zip(b.iter()).position(|(x, y)| x != y)
}

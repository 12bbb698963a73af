//! Mixin graph - which targets each module has been mixed into.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: `TypeId` of every type that took part in a mixin
//! - Edges: target -> module, labelled with the mixin role
//!
//! A proxy chain is a snapshot of the mixed-in module's ancestors, so when a
//! module's own mixins change, every target reachable through incoming edges
//! has to re-splice its segment for that module.

use corundum_core::TypeId;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

use crate::ProxyRole;

#[derive(Debug, Default)]
pub(crate) struct MixinGraph {
    graph: DiGraph<TypeId, ProxyRole>,
    nodes: FxHashMap<TypeId, NodeIndex>,
}

impl MixinGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, ty: TypeId) -> NodeIndex {
        if let Some(&node) = self.nodes.get(&ty) {
            return node;
        }
        let node = self.graph.add_node(ty);
        self.nodes.insert(ty, node);
        node
    }

    /// Record that `module` was mixed into `target`. Recording the same edge
    /// twice is a no-op.
    pub(crate) fn record(&mut self, target: TypeId, module: TypeId, role: ProxyRole) {
        let from = self.node(target);
        let to = self.node(module);
        let exists = self
            .graph
            .edges_connecting(from, to)
            .any(|edge| *edge.weight() == role);
        if !exists {
            self.graph.add_edge(from, to, role);
        }
    }

    /// Every target `module` was directly mixed into, with the role used.
    pub(crate) fn dependents(&self, module: TypeId) -> Vec<(TypeId, ProxyRole)> {
        let Some(&node) = self.nodes.get(&module) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| (self.graph[edge.source()], *edge.weight()))
            .collect()
    }

    /// Every module directly mixed into `target`, with the role used.
    pub(crate) fn mixins_of(&self, target: TypeId) -> Vec<(TypeId, ProxyRole)> {
        let Some(&node) = self.nodes.get(&target) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (self.graph[edge.target()], *edge.weight()))
            .collect()
    }

    #[cfg(test)]
    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

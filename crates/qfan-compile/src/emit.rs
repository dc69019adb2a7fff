//! Flattening packed layers back into an operation sequence.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use qfan_ir::Operation;

use crate::config::EmitOrder;
use crate::layer::Layer;
use crate::merge::PackedOperation;

/// Serializes layers into a flat sequence.
///
/// With [`EmitOrder::Program`], operations are emitted in a topological order
/// of the dependency graph whose edges join every pair of overlapping
/// operations from an earlier and a later layer; among ready operations the
/// one standing for the earliest input position goes first. Any such order is
/// equivalent to executing the layers one after another.
///
/// Edges cover commuting pairs too. An operation never overtakes anything it
/// shares a qubit with in an earlier layer, so packing the emitted sequence
/// again reproduces the same layers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Emitter {
    order: EmitOrder,
}

impl Emitter {
    /// Create an emitter.
    pub fn new(order: EmitOrder) -> Self {
        Self { order }
    }

    /// The flattening order in use.
    pub fn order(&self) -> EmitOrder {
        self.order
    }

    /// Flatten `layers` into a sequence of operations.
    pub fn emit(&self, layers: &[Layer]) -> Vec<Operation> {
        let ops: Vec<Operation> = match self.order {
            EmitOrder::Layer => layers
                .iter()
                .flat_map(|layer| {
                    let mut packed: Vec<&PackedOperation> = layer.packed().iter().collect();
                    packed.sort_by_key(|p| p.first_source());
                    packed
                })
                .map(|p| p.operation().clone())
                .collect(),
            EmitOrder::Program => self.emit_program_order(layers),
        };
        debug!("Emitted {} operations from {} layers", ops.len(), layers.len());
        ops
    }

    fn emit_program_order(&self, layers: &[Layer]) -> Vec<Operation> {
        let mut graph: DiGraph<(usize, &PackedOperation), ()> = DiGraph::new();
        let mut by_layer: Vec<Vec<NodeIndex>> = Vec::with_capacity(layers.len());

        for (layer_idx, layer) in layers.iter().enumerate() {
            let mut nodes = Vec::with_capacity(layer.len());
            for packed in layer.packed() {
                let node = graph.add_node((layer_idx, packed));
                for earlier in by_layer.iter().flatten() {
                    let (_, prev) = graph[*earlier];
                    if prev.operation().overlaps(packed.operation()) {
                        graph.add_edge(*earlier, node, ());
                    }
                }
                nodes.push(node);
            }
            by_layer.push(nodes);
        }

        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let key = |n: NodeIndex| {
            let (layer_idx, packed) = graph[n];
            Reverse((packed.first_source(), layer_idx, n.index()))
        };

        let mut ready: BinaryHeap<_> = graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(key)
            .collect();

        let mut out = Vec::with_capacity(graph.node_count());
        while let Some(Reverse((_, _, idx))) = ready.pop() {
            let node = NodeIndex::new(idx);
            out.push(graph[node].1.operation().clone());
            for succ in graph.neighbors_directed(node, Direction::Outgoing) {
                in_degree[succ.index()] -= 1;
                if in_degree[succ.index()] == 0 {
                    ready.push(key(succ));
                }
            }
        }

        out
    }
}

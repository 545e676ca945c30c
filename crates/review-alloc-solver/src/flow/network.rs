// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use review_alloc_core::prelude::Cost;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Handle to a forward arc, valid for the network it was created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArcId(usize);

#[derive(Debug, Clone, Copy)]
struct ResidualArc {
    to: usize,
    capacity: i64,
    cost: Cost,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSummary {
    pub value: i64,
    pub cost: Cost,
}

/// Capacitated min-cost-flow network solved by successive shortest
/// augmenting paths. Arc costs may be negative as long as the initial graph
/// is free of negative cycles, which holds for the layered assignment
/// networks built by the solvers.
#[derive(Debug, Clone, Default)]
pub struct FlowNetwork {
    num_nodes: usize,
    // Forward arc at even index, its residual twin at the following odd
    // index.
    arcs: Vec<ResidualArc>,
    adjacency: Vec<Vec<usize>>,
}

impl FlowNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self) -> NodeId {
        self.adjacency.push(Vec::new());
        self.num_nodes += 1;
        NodeId(self.num_nodes - 1)
    }

    pub fn add_arc(&mut self, from: NodeId, to: NodeId, capacity: i64, cost: Cost) -> ArcId {
        debug_assert!(from.0 < self.num_nodes && to.0 < self.num_nodes);
        debug_assert!(capacity >= 0);
        let index = self.arcs.len();
        self.arcs.push(ResidualArc {
            to: to.0,
            capacity,
            cost,
        });
        self.arcs.push(ResidualArc {
            to: from.0,
            capacity: 0,
            cost: -cost,
        });
        self.adjacency[from.0].push(index);
        self.adjacency[to.0].push(index + 1);
        ArcId(index)
    }

    /// Flow currently carried by a forward arc.
    #[inline]
    pub fn flow(&self, arc: ArcId) -> i64 {
        self.arcs[arc.0 + 1].capacity
    }

    /// Repeatedly augments along a cheapest residual path until the sink is
    /// unreachable, yielding a minimum-cost maximum flow.
    pub fn solve(&mut self, source: NodeId, sink: NodeId) -> FlowSummary {
        let mut total_flow = 0_i64;
        let mut total_cost = 0.0_f64;

        while let Some((path, bottleneck, path_cost)) = self.cheapest_path(source.0, sink.0) {
            for &arc_index in &path {
                self.arcs[arc_index].capacity -= bottleneck;
                self.arcs[arc_index ^ 1].capacity += bottleneck;
            }
            total_flow += bottleneck;
            total_cost += path_cost * bottleneck as f64;
        }

        FlowSummary {
            value: total_flow,
            cost: total_cost,
        }
    }

    /// Bellman-Ford over the residual graph (queue-based). Returns the arc
    /// indices of a cheapest source-to-sink path, its bottleneck capacity
    /// and its per-unit cost.
    fn cheapest_path(&self, source: usize, sink: usize) -> Option<(Vec<usize>, i64, Cost)> {
        let mut distance = vec![f64::INFINITY; self.num_nodes];
        let mut parent_arc: Vec<Option<usize>> = vec![None; self.num_nodes];
        let mut in_queue = vec![false; self.num_nodes];
        let mut queue = VecDeque::new();

        distance[source] = 0.0;
        queue.push_back(source);
        in_queue[source] = true;

        while let Some(node) = queue.pop_front() {
            in_queue[node] = false;
            for &arc_index in &self.adjacency[node] {
                let arc = self.arcs[arc_index];
                if arc.capacity <= 0 {
                    continue;
                }
                let candidate = distance[node] + arc.cost;
                if candidate + 1e-12 < distance[arc.to] {
                    distance[arc.to] = candidate;
                    parent_arc[arc.to] = Some(arc_index);
                    if !in_queue[arc.to] {
                        queue.push_back(arc.to);
                        in_queue[arc.to] = true;
                    }
                }
            }
        }

        if distance[sink].is_infinite() {
            return None;
        }

        let mut path = Vec::new();
        let mut bottleneck = i64::MAX;
        let mut node = sink;
        while node != source {
            let arc_index = parent_arc[node]?;
            path.push(arc_index);
            bottleneck = bottleneck.min(self.arcs[arc_index].capacity);
            node = self.arcs[arc_index ^ 1].to;
        }
        path.reverse();
        Some((path, bottleneck, distance[sink]))
    }
}

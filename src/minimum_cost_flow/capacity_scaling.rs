use crate::error::{FlowError, Result};
use crate::graph::Graph;
use crate::heap::{BinaryHeap, MinHeap};
use crate::minimum_cost_flow::residual_network::ResidualNetwork;
use num_traits::{CheckedAdd, NumAssign};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::ops::Neg;

// Capacity scaling over the residual multigraph. H is the priority queue used
// by the shortest path searches.
pub struct CapacityScaling<Flow, H = BinaryHeap<usize, Flow>> {
    residual: ResidualNetwork<Flow>,
    heap: PhantomData<fn() -> H>,
}

impl<Flow, H> Default for CapacityScaling<Flow, H>
where
    Flow: Default,
{
    fn default() -> Self {
        Self { residual: ResidualNetwork::default(), heap: PhantomData }
    }
}

impl<Flow, H> CapacityScaling<Flow, H>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
    H: MinHeap<usize, Flow>,
{
    // returns the cost and the flow on every input edge, indexed by edge id
    pub fn solve(&mut self, graph: &Graph<Flow>) -> Result<(Flow, Vec<Flow>)> {
        self.residual = ResidualNetwork::build(graph)?;

        // negative self loops are saturated from the start
        let mut flow_cost = graph
            .edges()
            .filter(|e| e.from == e.to && e.weight < Flow::zero())
            .filter_map(|e| e.capacity.filter(|&c| c > Flow::zero()).map(|c| c * e.weight))
            .fold(Flow::zero(), |sum, c| sum + c);

        let Some(wmax) = self.residual.arcs().map(|arc| arc.capacity).max() else {
            // no arcs left, only the self loops matter
            if self.residual.excesses.iter().any(|&e| e != Flow::zero()) {
                return Err(Self::infeasible());
            }
            return Ok((flow_cost, self.edge_flows(graph)));
        };

        // largest power of two not above wmax
        let two = Flow::one() + Flow::one();
        let mut delta = Flow::one();
        while delta <= wmax / two {
            delta *= two;
        }

        while delta >= Flow::one() {
            log::debug!("capacity scaling: delta = {:?}", delta);
            self.saturate_negative_arcs(delta);

            let mut sources = BTreeSet::new();
            let mut sinks = BTreeSet::new();
            for (u, &excess) in self.residual.excesses.iter().enumerate() {
                if excess >= delta {
                    sources.insert(u);
                } else if excess <= -delta {
                    sinks.insert(u);
                }
            }

            while !sinks.is_empty() {
                let Some(&s) = sources.first() else {
                    break;
                };
                match self.shortest_path(s, &sinks, delta) {
                    Some((t, settled, prev)) => {
                        self.augment(s, t, &prev, delta);
                        if self.residual.excesses[s] < delta {
                            sources.remove(&s);
                        }
                        if self.residual.excesses[t] > -delta {
                            sinks.remove(&t);
                        }

                        // update potentials
                        let d_t = settled.last().map_or(Flow::zero(), |&(_, d)| d);
                        for (u, d_u) in settled {
                            self.residual.potentials[u] -= d_u - d_t;
                        }
                    }
                    None => {
                        sources.remove(&s);
                    }
                }
            }
            delta /= two;
        }

        if self.residual.excesses.iter().any(|&e| e != Flow::zero()) {
            return Err(Self::infeasible());
        }

        flow_cost += self.residual.arcs().filter(|arc| arc.flow > Flow::zero()).fold(Flow::zero(), |sum, arc| sum + arc.flow * arc.weight);
        log::debug!("capacity scaling: minimum cost {:?}", flow_cost);
        Ok((flow_cost, self.edge_flows(graph)))
    }

    fn infeasible() -> FlowError {
        FlowError::Infeasible("no flow satisfying all demands".to_string())
    }

    // saturate delta-residual arcs with negative reduced cost
    fn saturate_negative_arcs(&mut self, delta: Flow) {
        for u in 0..self.residual.num_nodes {
            for arc_id in self.residual.start[u]..self.residual.start[u + 1] {
                let arc = &self.residual.arcs[arc_id];
                let flow = arc.residual_capacity();
                if self.residual.reduced_cost(u, arc) < Flow::zero() && flow >= delta {
                    self.residual.push_flow(u, arc_id, flow);
                }
            }
        }
    }

    // Dijkstra on reduced costs from s through arcs with residual capacity at
    // least delta, stopping at the first settled node in sinks.
    // returns (t, settled nodes with their distances in settling order, prev arc)
    #[allow(clippy::type_complexity)]
    fn shortest_path(&self, s: usize, sinks: &BTreeSet<usize>, delta: Flow) -> Option<(usize, Vec<(usize, Flow)>, Vec<Option<usize>>)> {
        let n = self.residual.num_nodes;
        let mut prev = vec![None; n];
        let mut visited = vec![false; n];
        let mut settled = Vec::new();

        let mut heap = H::default();
        heap.insert(s, Flow::zero(), false);
        while let Some((u, d_u)) = heap.pop() {
            visited[u] = true;
            settled.push((u, d_u));
            if sinks.contains(&u) {
                return Some((u, settled, prev));
            }

            for arc_id in self.residual.start[u]..self.residual.start[u + 1] {
                let arc = &self.residual.arcs[arc_id];
                if visited[arc.to] || arc.residual_capacity() < delta {
                    continue;
                }
                // among parallel arcs the first one of minimum weight wins
                if heap.insert(arc.to, d_u + self.residual.reduced_cost(u, arc), false) {
                    prev[arc.to] = Some(arc_id);
                }
            }
        }
        None
    }

    fn augment(&mut self, s: usize, t: usize, prev: &[Option<usize>], delta: Flow) {
        let mut v = t;
        while let Some(arc_id) = prev[v] {
            let u = self.residual.tail(arc_id);
            self.residual.push_flow(u, arc_id, delta);
            v = u;
        }
        debug_assert_eq!(v, s);
    }

    fn edge_flows(&self, graph: &Graph<Flow>) -> Vec<Flow> {
        graph
            .edges()
            .enumerate()
            .map(|(edge_id, e)| {
                if e.from == e.to {
                    match e.capacity {
                        Some(c) if c > Flow::zero() && e.weight < Flow::zero() => c,
                        _ => Flow::zero(),
                    }
                } else {
                    self.residual.edge_flow(edge_id).unwrap_or(Flow::zero())
                }
            })
            .collect()
    }
}

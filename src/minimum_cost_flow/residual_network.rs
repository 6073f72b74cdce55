use crate::error::{FlowError, Result};
use crate::graph::Graph;
use num_traits::{CheckedAdd, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;

#[derive(Default, Debug, Clone, PartialEq)]
pub struct ResidualArc<Flow> {
    pub to: usize,
    pub flow: Flow,
    pub capacity: Flow,
    pub weight: Flow,
    pub rev: usize,
    // whether the arc points the same way as its input edge
    pub forward: bool,
}

impl<Flow> ResidualArc<Flow>
where
    Flow: NumAssign + Copy,
{
    #[inline]
    pub fn residual_capacity(&self) -> Flow {
        self.capacity - self.flow
    }
}

// Residual multigraph: every input edge becomes a forward arc (capacity c,
// weight w) and a backward arc (capacity 0, weight -w).
#[derive(Default, Debug, Clone)]
pub struct ResidualNetwork<Flow> {
    pub num_nodes: usize,
    pub inf: Flow,
    pub excesses: Vec<Flow>,
    pub potentials: Vec<Flow>,

    pub(crate) start: Vec<usize>,
    pub(crate) arcs: Vec<ResidualArc<Flow>>,
    // forward arc of each input edge, usize::MAX for edges left out
    pub(crate) edge_index_to_arc_index: Vec<usize>,
}

impl<Flow> ResidualNetwork<Flow>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
{
    pub fn build(graph: &Graph<Flow>) -> Result<Self> {
        if !graph.is_directed() {
            return Err(FlowError::NotImplementedForGraphType("not implemented for undirected type".to_string()));
        }
        let overflow = || FlowError::Overflow("capacities or demands too large for the flow type".to_string());
        if graph.demands.iter().try_fold(Flow::zero(), |sum, d| sum.checked_add(d)).ok_or_else(overflow)? != Flow::zero() {
            return Err(FlowError::Infeasible("sum of the demands should be 0".to_string()));
        }

        let num_nodes = graph.num_nodes();
        let excesses: Vec<Flow> = graph.demands.iter().map(|&d| -d).collect();

        // self loops with infinite capacity and negative weight
        if graph.edges().any(|e| e.from == e.to && e.capacity.is_none() && e.weight < Flow::zero()) {
            return Err(Self::unbounded());
        }

        // self loops and zero capacity edges are left out
        let edge_list: Vec<(usize, _)> = graph.edges().enumerate().filter(|(_, e)| e.from != e.to && e.capacity.map_or(true, |c| c > Flow::zero())).collect();

        // Infinity is simulated with the larger of the total imbalance and twice
        // the sum of the finite capacities. Without infinite edges inf only has
        // to bound the finite capacities.
        let total_excess = excesses.iter().try_fold(Flow::zero(), |sum, &e| sum.checked_add(&if e < Flow::zero() { -e } else { e })).ok_or_else(overflow)?;
        let finite_sum = edge_list.iter().filter_map(|(_, e)| e.capacity).try_fold(Flow::zero(), |sum, c| sum.checked_add(&c)).ok_or_else(overflow)?;
        let num_infinite = edge_list.iter().filter(|(_, e)| e.capacity.is_none()).count();
        let inf = match finite_sum.checked_add(&finite_sum) {
            Some(twice) => total_excess.max(twice),
            None if num_infinite == 0 => total_excess.max(finite_sum),
            None => return Err(overflow()),
        };
        let inf = if inf == Flow::zero() { Flow::one() } else { inf };
        // every excess stays below this bound
        (0..num_infinite)
            .fold(total_excess.checked_add(&finite_sum), |sum, _| sum.and_then(|sum| sum.checked_add(&inf)))
            .ok_or_else(overflow)?;

        let mut start = vec![0; num_nodes + 1];
        let mut degree = vec![0; num_nodes];
        for (_, e) in edge_list.iter() {
            degree[e.from] += 1;
            degree[e.to] += 1;
        }
        for i in 1..=num_nodes {
            start[i] += start[i - 1] + degree[i - 1];
        }

        let mut arcs: Vec<ResidualArc<Flow>> = (0..2 * edge_list.len())
            .map(|_| ResidualArc { to: 0, flow: Flow::zero(), capacity: Flow::zero(), weight: Flow::zero(), rev: 0, forward: true })
            .collect();
        let mut edge_index_to_arc_index = vec![usize::MAX; graph.num_edges()];
        let mut counter = vec![0; num_nodes];
        for &(edge_id, e) in edge_list.iter() {
            let (u, v) = (e.from, e.to);
            let arc_u = start[u] + counter[u];
            counter[u] += 1;
            let arc_v = start[v] + counter[v];
            counter[v] += 1;
            edge_index_to_arc_index[edge_id] = arc_u;

            let r = e.capacity.unwrap_or(inf).min(inf);
            // u -> v
            arcs[arc_u] = ResidualArc { to: v, flow: Flow::zero(), capacity: r, weight: e.weight, rev: arc_v, forward: true };
            // v -> u
            arcs[arc_v] = ResidualArc { to: u, flow: Flow::zero(), capacity: Flow::zero(), weight: -e.weight, rev: arc_u, forward: false };
        }

        let residual = Self { num_nodes, inf, excesses, potentials: vec![Flow::zero(); num_nodes], start, arcs, edge_index_to_arc_index };
        if num_infinite > 0 {
            residual.detect_unboundedness()?;
        }
        log::debug!("built min cost residual network with {} nodes, {} arcs, inf = {:?}", num_nodes, residual.arcs.len(), inf);
        Ok(residual)
    }

    fn unbounded() -> FlowError {
        FlowError::Unbounded("negative cost cycle of infinite capacity found, min cost flow may be unbounded below".to_string())
    }

    #[inline]
    pub fn neighbors(&self, u: usize) -> std::slice::Iter<ResidualArc<Flow>> {
        self.arcs[self.start[u]..self.start[u + 1]].iter()
    }

    #[inline]
    pub fn arcs(&self) -> std::slice::Iter<ResidualArc<Flow>> {
        self.arcs.iter()
    }

    // flow on the forward arc of an input edge
    pub fn edge_flow(&self, edge_id: usize) -> Option<Flow> {
        self.edge_index_to_arc_index.get(edge_id).and_then(|&i| self.arcs.get(i)).map(|arc| arc.flow)
    }

    #[inline]
    pub fn tail(&self, arc_id: usize) -> usize {
        self.arcs[self.arcs[arc_id].rev].to
    }

    #[inline]
    pub fn push_flow(&mut self, u: usize, arc_id: usize, flow: Flow) {
        let rev = self.arcs[arc_id].rev;
        let to = self.arcs[arc_id].to;
        self.arcs[arc_id].flow += flow;
        self.arcs[rev].flow -= flow;
        self.excesses[u] -= flow;
        self.excesses[to] += flow;
    }

    #[inline]
    pub fn reduced_cost(&self, u: usize, arc: &ResidualArc<Flow>) -> Flow {
        arc.weight - self.potentials[u] + self.potentials[arc.to]
    }

    // Negative cycles made of infinite capacity arcs only. Parallel arcs are
    // reduced to the one with the smallest weight.
    fn detect_unboundedness(&self) -> Result<()> {
        let mut infinite_edges: Vec<(usize, usize, Flow)> = Vec::new();
        for u in 0..self.num_nodes {
            let mut cheapest: Vec<(usize, Flow)> = Vec::new();
            for arc in self.neighbors(u).filter(|arc| arc.capacity == self.inf) {
                match cheapest.iter_mut().find(|(v, _)| *v == arc.to) {
                    Some((_, w)) => *w = (*w).min(arc.weight),
                    None => cheapest.push((arc.to, arc.weight)),
                }
            }
            infinite_edges.extend(cheapest.into_iter().map(|(v, w)| (u, v, w)));
        }

        if Self::has_negative_cycle(self.num_nodes, &infinite_edges) {
            return Err(Self::unbounded());
        }
        Ok(())
    }

    // Bellman-Ford from a virtual source connected to every node
    fn has_negative_cycle(num_nodes: usize, edges: &[(usize, usize, Flow)]) -> bool {
        let mut dist = vec![Flow::zero(); num_nodes];
        for _ in 0..num_nodes {
            let mut updated = false;
            for &(u, v, w) in edges {
                if dist[u] + w < dist[v] {
                    dist[v] = dist[u] + w;
                    updated = true;
                }
            }
            if !updated {
                return false;
            }
        }
        num_nodes > 0
    }
}

use crate::error::{FlowError, Result};
use crate::graph::Graph;
use crate::maximum_flow::boykov_kolmogorov::SearchTrees;
use num_traits::{CheckedAdd, NumAssign};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt::Debug;
use std::ops::{Neg, Sub};

pub type FlowDict<Flow> = BTreeMap<usize, BTreeMap<usize, Flow>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    PreflowPush,
    BoykovKolmogorov,
}

#[derive(Default, PartialEq, Debug, Clone)]
pub struct ResidualArc<Flow> {
    pub to: usize,
    pub flow: Flow,
    pub capacity: Flow,
    pub rev: usize,
}

impl<Flow> ResidualArc<Flow>
where
    Flow: Sub<Output = Flow> + Copy,
{
    #[inline]
    pub fn residual_capacity(&self) -> Flow {
        self.capacity - self.flow
    }
}

// Paired-arc residual network in CSR form. For every arc u -> v there is a
// mirror v -> u at index `rev`, and flow(u, v) == -flow(v, u) always holds.
#[derive(Default, Debug, Clone)]
pub struct ResidualNetwork<Flow> {
    pub(crate) num_nodes: usize,
    pub(crate) start: Vec<usize>,
    pub(crate) arcs: Vec<ResidualArc<Flow>>,
    pub(crate) inf: Flow,
    pub(crate) has_infinite_arcs: bool,

    pub(crate) flow_value: Option<Flow>,
    pub(crate) algorithm: Option<Algorithm>,
    pub(crate) excesses: Vec<Flow>,
    pub(crate) heights: Vec<usize>,
    pub(crate) trees: Option<SearchTrees>,
}

impl<Flow> ResidualNetwork<Flow>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
{
    pub fn build(graph: &Graph<Flow>) -> Result<Self> {
        if graph.is_multigraph() {
            return Err(FlowError::NotImplementedForGraphType("MultiGraph and MultiDiGraph not supported (yet)".to_string()));
        }

        // self loops and zero capacity edges never carry flow
        let edge_list: Vec<_> = graph.edges().filter(|e| e.from != e.to && e.capacity.map_or(true, |c| c > Flow::zero())).collect();

        let num_infinite = edge_list.iter().filter(|e| e.capacity.is_none()).count();
        let inf = Self::infinity(edge_list.iter().filter_map(|e| e.capacity), num_infinite)?;

        // (u, v, capacity of u -> v, capacity of v -> u)
        let mut pairs: Vec<(usize, usize, Flow, Flow)> = Vec::new();
        let mut pair_index: HashMap<(usize, usize), usize> = HashMap::new();
        for e in edge_list {
            let r = e.capacity.unwrap_or(inf).min(inf);
            let key = (e.from.min(e.to), e.from.max(e.to));
            match pair_index.get(&key) {
                Some(&i) => {
                    // the pair was created by the opposite edge
                    if pairs[i].0 == e.from {
                        pairs[i].2 = r;
                    } else {
                        pairs[i].3 = r;
                    }
                    if !graph.is_directed() {
                        pairs[i].2 = r;
                        pairs[i].3 = r;
                    }
                }
                None => {
                    pair_index.insert(key, pairs.len());
                    let reverse = if graph.is_directed() { Flow::zero() } else { r };
                    pairs.push((e.from, e.to, r, reverse));
                }
            }
        }

        let num_nodes = graph.num_nodes();
        let mut start = vec![0; num_nodes + 1];
        let mut degree = vec![0; num_nodes];
        for &(u, v, _, _) in pairs.iter() {
            degree[u] += 1;
            degree[v] += 1;
        }
        for i in 1..=num_nodes {
            start[i] += start[i - 1] + degree[i - 1];
        }

        let mut arcs: Vec<ResidualArc<Flow>> = (0..2 * pairs.len()).map(|_| ResidualArc { to: 0, flow: Flow::zero(), capacity: Flow::zero(), rev: 0 }).collect();
        let mut counter = vec![0; num_nodes];
        for &(u, v, capacity_uv, capacity_vu) in pairs.iter() {
            let arc_u = start[u] + counter[u];
            counter[u] += 1;
            let arc_v = start[v] + counter[v];
            counter[v] += 1;

            arcs[arc_u] = ResidualArc { to: v, flow: Flow::zero(), capacity: capacity_uv, rev: arc_v };
            arcs[arc_v] = ResidualArc { to: u, flow: Flow::zero(), capacity: capacity_vu, rev: arc_u };
        }

        log::debug!("built residual network with {} nodes, {} arcs, inf = {:?}", num_nodes, arcs.len(), inf);

        Ok(Self {
            num_nodes,
            start,
            arcs,
            inf,
            flow_value: None,
            algorithm: None,
            has_infinite_arcs: num_infinite > 0,
            excesses: vec![Flow::zero(); num_nodes],
            heights: Vec::new(),
            trees: None,
        })
    }

    // Infinity is simulated with three times the sum of the finite capacities.
    // An infinite arc keeps at least 2/3 of inf as residual capacity while a
    // finite one has at most 1/3 of it, so the two stay distinguishable.
    // Excesses never exceed the finite sum plus inf per infinite edge, which
    // has to fit in Flow as well.
    fn infinity(mut capacities: impl Iterator<Item = Flow>, num_infinite: usize) -> Result<Flow> {
        let overflow = || FlowError::Overflow("capacities too large for the flow type".to_string());
        let finite_sum = capacities.try_fold(Flow::zero(), |sum, c| sum.checked_add(&c)).ok_or_else(overflow)?;
        if finite_sum == Flow::zero() {
            return Ok(Flow::one());
        }
        let inf = finite_sum.checked_add(&finite_sum).and_then(|sum| sum.checked_add(&finite_sum));
        match inf {
            // no arc is infinite, so inf only has to bound the finite capacities
            None if num_infinite == 0 => Ok(finite_sum),
            None => Err(overflow()),
            Some(inf) => {
                (0..num_infinite).try_fold(finite_sum, |sum, _| sum.checked_add(&inf)).ok_or_else(overflow)?;
                Ok(inf)
            }
        }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    #[inline]
    pub fn contains_node(&self, u: usize) -> bool {
        u < self.num_nodes
    }

    #[inline]
    pub fn inf(&self) -> Flow {
        self.inf
    }

    #[inline]
    pub fn has_infinite_arcs(&self) -> bool {
        self.has_infinite_arcs
    }

    #[inline]
    pub fn flow_value(&self) -> Option<Flow> {
        self.flow_value
    }

    #[inline]
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    pub fn excess(&self, u: usize) -> Option<Flow> {
        self.excesses.get(u).copied()
    }

    pub fn trees(&self) -> Option<&SearchTrees> {
        self.trees.as_ref()
    }

    #[inline]
    pub fn neighbors(&self, u: usize) -> std::slice::Iter<ResidualArc<Flow>> {
        self.arcs[self.start[u]..self.start[u + 1]].iter()
    }

    #[inline]
    pub fn arc(&self, arc_id: usize) -> &ResidualArc<Flow> {
        &self.arcs[arc_id]
    }

    #[inline]
    pub fn tail(&self, arc_id: usize) -> usize {
        self.arcs[self.arcs[arc_id].rev].to
    }

    pub fn find_arc(&self, u: usize, v: usize) -> Option<usize> {
        if u >= self.num_nodes {
            return None;
        }
        (self.start[u]..self.start[u + 1]).find(|&i| self.arcs[i].to == v)
    }

    pub fn flow(&self, u: usize, v: usize) -> Option<Flow> {
        self.find_arc(u, v).map(|i| self.arcs[i].flow)
    }

    pub fn capacity(&self, u: usize, v: usize) -> Option<Flow> {
        self.find_arc(u, v).map(|i| self.arcs[i].capacity)
    }

    // iterate (u, v, arc) over all arcs
    pub fn arcs(&self) -> impl Iterator<Item = (usize, usize, &ResidualArc<Flow>)> + '_ {
        (0..self.num_nodes).flat_map(move |u| self.neighbors(u).map(move |arc| (u, arc.to, arc)))
    }

    #[inline]
    pub(crate) fn push_flow(&mut self, arc_id: usize, flow: Flow) {
        let rev = self.arcs[arc_id].rev;
        self.arcs[arc_id].flow += flow;
        self.arcs[rev].flow -= flow;
    }

    // clear everything a previous run left behind
    pub fn reset(&mut self) {
        self.arcs.iter_mut().for_each(|arc| arc.flow = Flow::zero());
        self.excesses.clear();
        self.excesses.resize(self.num_nodes, Flow::zero());
        self.heights.clear();
        self.flow_value = None;
        self.algorithm = None;
        self.trees = None;
    }

    pub(crate) fn check_endpoints(&self, source: usize, sink: usize) -> Result<()> {
        if !self.contains_node(source) {
            return Err(FlowError::BadEndpoint(format!("node {} not in graph", source)));
        }
        if !self.contains_node(sink) {
            return Err(FlowError::BadEndpoint(format!("node {} not in graph", sink)));
        }
        if source == sink {
            return Err(FlowError::BadEndpoint("source and sink are the same node".to_string()));
        }
        Ok(())
    }

    // an s-t path made only of infinite arcs makes the flow unbounded
    pub fn detect_unboundedness(&self, source: usize, sink: usize) -> Result<()> {
        if !self.has_infinite_arcs {
            return Ok(());
        }
        let mut seen = vec![false; self.num_nodes];
        let mut que = VecDeque::from([source]);
        seen[source] = true;
        while let Some(u) = que.pop_front() {
            for arc in self.neighbors(u) {
                if arc.capacity == self.inf && !seen[arc.to] {
                    if arc.to == sink {
                        return Err(FlowError::Unbounded("infinite capacity path, flow unbounded above".to_string()));
                    }
                    seen[arc.to] = true;
                    que.push_back(arc.to);
                }
            }
        }
        Ok(())
    }

    // nodes reachable from source through arcs with flow < capacity
    pub fn source_side(&self, source: usize) -> BTreeSet<usize> {
        let mut reachable = BTreeSet::from([source]);
        let mut que = VecDeque::from([source]);
        while let Some(u) = que.pop_front() {
            for arc in self.neighbors(u) {
                if arc.flow < arc.capacity && reachable.insert(arc.to) {
                    que.push_back(arc.to);
                }
            }
        }
        reachable
    }

    // flow on every edge of the input graph, zero where nothing moves
    pub fn flow_dict(&self, graph: &Graph<Flow>) -> FlowDict<Flow> {
        let mut flow_dict: FlowDict<Flow> = (0..graph.num_nodes()).map(|u| (u, BTreeMap::new())).collect();
        for e in graph.edges() {
            flow_dict.entry(e.from).or_default().insert(e.to, Flow::zero());
            if !graph.is_directed() {
                flow_dict.entry(e.to).or_default().insert(e.from, Flow::zero());
            }
        }
        for (u, flows) in flow_dict.iter_mut().filter(|(&u, _)| u < self.num_nodes) {
            flows.extend(self.neighbors(*u).filter(|arc| arc.flow > Flow::zero()).map(|arc| (arc.to, arc.flow)));
        }
        flow_dict
    }
}

use num_traits::NumAssign;
use std::collections::HashMap;
use std::fmt::Debug;

#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct GraphKind {
    pub directed: bool,
    pub multigraph: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Edge<Flow> {
    pub from: usize,
    pub to: usize,
    // None means the capacity attribute is missing, i.e. infinite
    pub capacity: Option<Flow>,
    pub weight: Flow,
}

#[derive(Default, Clone)]
pub struct Graph<Flow> {
    kind: GraphKind,
    num_nodes: usize,
    pub(crate) edges: Vec<Edge<Flow>>,
    pub(crate) demands: Vec<Flow>,
    edge_index: HashMap<(usize, usize), usize>,
}

impl<Flow> Graph<Flow>
where
    Flow: NumAssign + Ord + Copy,
{
    pub fn new(kind: GraphKind) -> Self {
        Self { kind, num_nodes: 0, edges: Vec::new(), demands: Vec::new(), edge_index: HashMap::new() }
    }

    pub fn directed() -> Self {
        Self::new(GraphKind { directed: true, multigraph: false })
    }

    pub fn undirected() -> Self {
        Self::new(GraphKind { directed: false, multigraph: false })
    }

    pub fn multi_directed() -> Self {
        Self::new(GraphKind { directed: true, multigraph: true })
    }

    pub fn multi_undirected() -> Self {
        Self::new(GraphKind { directed: false, multigraph: true })
    }

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.kind.directed
    }

    #[inline]
    pub fn is_multigraph(&self) -> bool {
        self.kind.multigraph
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn contains_node(&self, u: usize) -> bool {
        u < self.num_nodes
    }

    pub fn add_node(&mut self) -> usize {
        self.demands.push(Flow::zero());
        self.num_nodes += 1;
        self.num_nodes - 1
    }

    pub fn add_nodes(&mut self, num_nodes: usize) -> Vec<usize> {
        self.demands.extend(vec![Flow::zero(); num_nodes]);
        self.num_nodes += num_nodes;
        ((self.num_nodes - num_nodes)..self.num_nodes).collect()
    }

    // negative demand: the node sends flow, positive demand: the node receives flow
    pub fn set_demand(&mut self, u: usize, demand: Flow) -> Option<()> {
        *self.demands.get_mut(u)? = demand;
        Some(())
    }

    pub fn demand(&self, u: usize) -> Option<Flow> {
        self.demands.get(u).copied()
    }

    // return edge index
    // on a simple graph an existing edge is updated in place
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: Option<Flow>, weight: Flow) -> Option<usize> {
        if from >= self.num_nodes || to >= self.num_nodes {
            return None;
        }

        if !self.kind.multigraph {
            let key = self.key(from, to);
            if let Some(&edge_id) = self.edge_index.get(&key) {
                let edge = &mut self.edges[edge_id];
                edge.capacity = capacity;
                edge.weight = weight;
                return Some(edge_id);
            }
            self.edge_index.insert(key, self.edges.len());
        }

        self.edges.push(Edge { from, to, capacity, weight });
        Some(self.edges.len() - 1)
    }

    pub fn edge(&self, edge_id: usize) -> Option<&Edge<Flow>> {
        self.edges.get(edge_id)
    }

    pub fn edges(&self) -> std::slice::Iter<Edge<Flow>> {
        self.edges.iter()
    }

    // neighbors of u, both endpoints count for undirected edges
    pub fn neighbors(&self, u: usize) -> impl Iterator<Item = usize> + '_ {
        let directed = self.kind.directed;
        self.edges.iter().filter_map(move |e| {
            if e.from == u {
                Some(e.to)
            } else if !directed && e.to == u {
                Some(e.from)
            } else {
                None
            }
        })
    }

    fn key(&self, from: usize, to: usize) -> (usize, usize) {
        if self.kind.directed {
            (from, to)
        } else {
            (from.min(to), from.max(to))
        }
    }
}

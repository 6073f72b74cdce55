use crate::error::{FlowError, Result};
use crate::maximum_flow::residual_network::{Algorithm, ResidualNetwork};
use num_traits::{CheckedAdd, NumAssign};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Debug;
use std::ops::Neg;

// Search trees left behind by the algorithm, node -> parent (roots map to None).
// The source tree is the source side of a minimum cut.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SearchTrees {
    pub source: BTreeMap<usize, Option<usize>>,
    pub target: BTreeMap<usize, Option<usize>>,
}

impl SearchTrees {
    pub fn partition(&self, num_nodes: usize) -> (BTreeSet<usize>, BTreeSet<usize>) {
        (0..num_nodes).partition(|u| self.source.contains_key(u))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tree {
    Source,
    Target,
}

// Boykov-Kolmogorov: grow two search trees from s and t, augment along the
// connecting path, then repair the trees by adopting orphans.
#[derive(Default)]
pub struct BoykovKolmogorov<Flow> {
    cutoff: Option<Flow>,

    source: usize,
    sink: usize,
    tree: Vec<Option<Tree>>,
    parent: Vec<Option<usize>>,
    // arc between a node and its parent, oriented towards t
    parent_arc: Vec<usize>,
    active: VecDeque<usize>,
    is_active: Vec<bool>,
    orphans: VecDeque<usize>,

    // marking heuristic
    time: usize,
    dist: Vec<usize>,
    timestamp: Vec<usize>,
}

impl<Flow> BoykovKolmogorov<Flow>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    // stop as soon as the flow value reaches cutoff
    pub fn cutoff(mut self, cutoff: Flow) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub(crate) fn has_cutoff(&self) -> bool {
        self.cutoff.is_some()
    }

    pub fn solve(&mut self, residual: &mut ResidualNetwork<Flow>, source: usize, sink: usize) -> Result<Flow> {
        residual.check_endpoints(source, sink)?;

        residual.reset();
        residual.algorithm = Some(Algorithm::BoykovKolmogorov);
        self.initialize(residual.num_nodes(), source, sink);

        let inf = residual.inf();
        let cutoff = self.cutoff.unwrap_or(inf);
        let mut flow_value = Flow::zero();
        while flow_value < cutoff {
            // growth stage
            let Some(arc_id) = self.grow(residual) else {
                break;
            };
            self.time += 1;
            // augmentation stage
            flow_value += self.augment(residual, arc_id);
            // adoption stage
            self.adopt(residual);
        }

        // 2 * flow_value > inf
        if residual.has_infinite_arcs() && flow_value > inf - flow_value {
            return Err(FlowError::Unbounded("infinite capacity path, flow unbounded above".to_string()));
        }

        log::debug!("boykov kolmogorov: maximum flow value {:?} after {} augmentations", flow_value, self.time - 1);
        residual.trees = Some(self.search_trees());
        residual.flow_value = Some(flow_value);
        Ok(flow_value)
    }

    fn initialize(&mut self, num_nodes: usize, source: usize, sink: usize) {
        self.source = source;
        self.sink = sink;
        self.tree = vec![None; num_nodes];
        self.parent = vec![None; num_nodes];
        self.parent_arc = vec![usize::MAX; num_nodes];
        self.is_active = vec![false; num_nodes];
        self.dist = vec![0; num_nodes];
        self.timestamp = vec![0; num_nodes];
        self.active.clear();
        self.orphans.clear();

        self.tree[source] = Some(Tree::Source);
        self.tree[sink] = Some(Tree::Target);
        self.active.extend([source, sink]);
        self.is_active[source] = true;
        self.is_active[sink] = true;
        self.time = 1;
        self.timestamp[source] = self.time;
        self.timestamp[sink] = self.time;
    }

    // Bidirectional breadth-first search. Returns a connecting arc, oriented
    // from a source tree node to a target tree node.
    fn grow(&mut self, residual: &ResidualNetwork<Flow>) -> Option<usize> {
        while let Some(&u) = self.active.front() {
            let Some(this_tree) = self.tree[u] else {
                self.active.pop_front();
                self.is_active[u] = false;
                continue;
            };

            for arc_id in residual.start[u]..residual.start[u + 1] {
                let v = residual.arc(arc_id).to;
                // u -> v in the source tree, v -> u in the target tree
                let tree_arc = match this_tree {
                    Tree::Source => arc_id,
                    Tree::Target => residual.arc(arc_id).rev,
                };
                if residual.arc(tree_arc).residual_capacity() <= Flow::zero() {
                    continue;
                }

                match self.tree[v] {
                    Some(other) if other != this_tree => return Some(tree_arc),
                    Some(_) => {
                        if self.is_closer(u, v) {
                            self.attach(v, u, tree_arc);
                        }
                    }
                    None => {
                        self.tree[v] = Some(this_tree);
                        self.attach(v, u, tree_arc);
                        self.active.push_back(v);
                        self.is_active[v] = true;
                    }
                }
            }
            self.active.pop_front();
            self.is_active[u] = false;
        }
        None
    }

    fn attach(&mut self, v: usize, parent: usize, arc_id: usize) {
        self.parent[v] = Some(parent);
        self.parent_arc[v] = arc_id;
        self.dist[v] = self.dist[parent] + 1;
        self.timestamp[v] = self.timestamp[parent];
    }

    // push the bottleneck along s -> ... -> u -> v -> ... -> t and orphan the
    // tree children of saturated arcs
    fn augment(&mut self, residual: &mut ResidualNetwork<Flow>, connecting_arc: usize) -> Flow {
        let mut flow = residual.inf().min(residual.arc(connecting_arc).residual_capacity());

        let mut path = Vec::new();
        let mut w = residual.tail(connecting_arc);
        while let Some(p) = self.parent[w] {
            let arc_id = self.parent_arc[w];
            flow = flow.min(residual.arc(arc_id).residual_capacity());
            path.push(arc_id);
            w = p;
        }
        debug_assert_eq!(w, self.source);
        path.reverse();
        path.push(connecting_arc);

        let mut w = residual.arc(connecting_arc).to;
        while let Some(p) = self.parent[w] {
            let arc_id = self.parent_arc[w];
            flow = flow.min(residual.arc(arc_id).residual_capacity());
            path.push(arc_id);
            w = p;
        }
        debug_assert_eq!(w, self.sink);

        let mut these_orphans = Vec::new();
        for arc_id in path {
            residual.push_flow(arc_id, flow);
            if residual.arc(arc_id).residual_capacity() == Flow::zero() {
                let (u, v) = (residual.tail(arc_id), residual.arc(arc_id).to);
                if self.tree[v] == Some(Tree::Source) {
                    self.parent[v] = None;
                    these_orphans.push(v);
                }
                if self.tree[u] == Some(Tree::Target) {
                    self.parent[u] = None;
                    these_orphans.push(u);
                }
            }
        }
        these_orphans.sort_by_key(|&u| self.dist[u]);
        self.orphans.extend(these_orphans);
        log::trace!("augment {:?} units, {} orphans", flow, self.orphans.len());
        flow
    }

    // same-tree neighbors of u with the arc between them oriented towards t, nearest first
    fn tree_neighbors(&self, residual: &ResidualNetwork<Flow>, u: usize, tree: Tree) -> Vec<(usize, usize)> {
        let mut neighbors: Vec<(usize, usize)> = residual
            .neighbors(u)
            .enumerate()
            .filter(|(_, arc)| self.tree[arc.to] == Some(tree))
            .map(|(i, arc)| {
                let arc_id = residual.start[u] + i;
                match tree {
                    Tree::Source => (arc.to, arc.rev),
                    Tree::Target => (arc.to, arc_id),
                }
            })
            .collect();
        neighbors.sort_by_key(|&(v, _)| self.dist[v]);
        neighbors
    }

    // rebuild both trees by adopting or discarding orphans
    fn adopt(&mut self, residual: &ResidualNetwork<Flow>) {
        while let Some(u) = self.orphans.pop_front() {
            let Some(tree) = self.tree[u] else {
                continue;
            };

            let mut adopted = false;
            for (v, arc_id) in self.tree_neighbors(residual, u, tree) {
                if residual.arc(arc_id).residual_capacity() > Flow::zero() && self.has_valid_root(v) {
                    self.parent[u] = Some(v);
                    self.parent_arc[u] = arc_id;
                    self.dist[u] = self.dist[v] + 1;
                    self.timestamp[u] = self.time;
                    adopted = true;
                    break;
                }
            }
            if adopted {
                continue;
            }

            for (v, arc_id) in self.tree_neighbors(residual, u, tree) {
                if residual.arc(arc_id).residual_capacity() > Flow::zero() && !self.is_active[v] {
                    self.active.push_back(v);
                    self.is_active[v] = true;
                }
                if self.parent[v] == Some(u) {
                    self.parent[v] = None;
                    self.orphans.push_front(v);
                }
            }
            if self.is_active[u] {
                if let Some(i) = self.active.iter().position(|&w| w == u) {
                    self.active.remove(i);
                }
                self.is_active[u] = false;
            }
            self.tree[u] = None;
            self.parent[u] = None;
        }
    }

    // Walk up from v to a root or to a node already validated at this time,
    // refreshing dist and timestamp along the way.
    fn has_valid_root(&mut self, v: usize) -> bool {
        let mut path = Vec::new();
        let mut current = Some(v);
        let base_dist = loop {
            let Some(w) = current else {
                return false;
            };
            path.push(w);
            if w == self.source || w == self.sink {
                break 0;
            }
            if self.timestamp[w] == self.time {
                break self.dist[w];
            }
            current = self.parent[w];
        };

        let length = path.len();
        for (i, &u) in path.iter().enumerate() {
            self.dist[u] = base_dist + length - i - 1;
            self.timestamp[u] = self.time;
        }
        true
    }

    fn is_closer(&self, u: usize, v: usize) -> bool {
        self.timestamp[v] <= self.timestamp[u] && self.dist[v] > self.dist[u] + 1
    }

    fn search_trees(&self) -> SearchTrees {
        let mut trees = SearchTrees::default();
        for (u, tree) in self.tree.iter().enumerate() {
            match tree {
                Some(Tree::Source) => {
                    trees.source.insert(u, self.parent[u]);
                }
                Some(Tree::Target) => {
                    trees.target.insert(u, self.parent[u]);
                }
                None => {}
            }
        }
        trees
    }
}

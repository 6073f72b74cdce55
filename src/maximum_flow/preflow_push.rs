use crate::error::{FlowError, Result};
use crate::maximum_flow::residual_network::{Algorithm, ResidualNetwork};
use num_traits::{CheckedAdd, NumAssign};
use std::collections::{BTreeSet, VecDeque};
use std::fmt::Debug;
use std::ops::Neg;

// active and inactive nodes at one height
#[derive(Default, Debug, Clone)]
struct Level {
    active: BTreeSet<usize>,
    inactive: BTreeSet<usize>,
}

// amount of relabeling work after which heights are recomputed exactly
#[derive(Debug, Clone)]
struct GlobalRelabelThreshold {
    threshold: f64,
    work: f64,
}

impl Default for GlobalRelabelThreshold {
    fn default() -> Self {
        Self { threshold: f64::INFINITY, work: 0.0 }
    }
}

impl GlobalRelabelThreshold {
    fn new(num_nodes: usize, num_arcs: usize, freq: f64) -> Self {
        let threshold = if freq > 0.0 { (num_nodes + num_arcs) as f64 / freq } else { f64::INFINITY };
        Self { threshold, work: 0.0 }
    }

    fn add_work(&mut self, work: usize) {
        self.work += work as f64;
    }

    fn is_reached(&self) -> bool {
        self.work >= self.threshold
    }

    fn clear_work(&mut self) {
        self.work = 0.0;
    }
}

// Highest-label preflow-push with the gap and global relabeling heuristics.
// O(n^2 sqrt(m))
pub struct PreflowPush {
    global_relabel_freq: f64,
    value_only: bool,

    source: usize,
    sink: usize,
    levels: Vec<Level>,
    current_edge: Vec<usize>,
    grt: GlobalRelabelThreshold,
    que: VecDeque<usize>,
}

impl Default for PreflowPush {
    fn default() -> Self {
        Self {
            global_relabel_freq: 1.0,
            value_only: false,
            source: 0,
            sink: 0,
            levels: Vec::new(),
            current_edge: Vec::new(),
            grt: GlobalRelabelThreshold::default(),
            que: VecDeque::new(),
        }
    }
}

impl PreflowPush {
    // relative frequency of global relabeling, 0 disables it
    pub fn global_relabel_freq(mut self, freq: f64) -> Self {
        self.global_relabel_freq = freq;
        self
    }

    // stop after the maximum preflow, which already fixes the flow value
    pub fn value_only(mut self, value_only: bool) -> Self {
        self.value_only = value_only;
        self
    }

    pub fn solve<Flow>(&mut self, residual: &mut ResidualNetwork<Flow>, source: usize, sink: usize) -> Result<Flow>
    where
        Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        residual.check_endpoints(source, sink)?;
        if self.global_relabel_freq.is_nan() || self.global_relabel_freq < 0.0 {
            return Err(FlowError::InvalidParameter("global_relabel_freq must be nonnegative".to_string()));
        }
        residual.detect_unboundedness(source, sink)?;

        residual.reset();
        residual.algorithm = Some(Algorithm::PreflowPush);
        self.source = source;
        self.sink = sink;
        let n = residual.num_nodes();

        let heights = self.reverse_bfs(residual, sink);
        if heights[source].is_none() {
            // t is not reachable from s
            log::debug!("preflow push: sink {} unreachable from source {}", sink, source);
            residual.heights = heights.iter().map(|h| h.unwrap_or(n + 1)).collect();
            residual.flow_value = Some(Flow::zero());
            return Ok(Flow::zero());
        }

        // highest level below n with at least one active node
        let mut max_height = heights.iter().enumerate().filter(|&(u, _)| u != source).filter_map(|(_, &h)| h).max().unwrap_or(0);
        residual.heights = heights.iter().map(|h| h.unwrap_or(n + 1)).collect();
        residual.heights[source] = n;

        self.grt = GlobalRelabelThreshold::new(n, residual.num_arcs(), self.global_relabel_freq);
        self.current_edge = (0..n).map(|u| residual.start[u]).collect();

        // the maximum flow is nonzero now, saturate every arc out of s
        for arc_id in residual.start[source]..residual.start[source + 1] {
            let flow = residual.arcs[arc_id].capacity;
            if flow > Flow::zero() {
                Self::push(residual, arc_id, flow);
            }
        }

        self.levels = vec![Level::default(); 2 * n];
        for u in 0..n {
            if u == source || u == sink {
                continue;
            }
            let level = &mut self.levels[residual.heights[u]];
            if residual.excesses[u] > Flow::zero() {
                level.active.insert(u);
            } else {
                level.inactive.insert(u);
            }
        }

        // phase 1: find a maximum preflow by pushing as much flow as possible to t
        log::debug!("preflow push: phase 1 from height {}", max_height);
        let mut height = max_height;
        while height > 0 {
            loop {
                let Some(&u) = self.levels[height].active.first() else {
                    height = height.saturating_sub(1);
                    break;
                };

                let old_height = height;
                height = self.discharge(residual, u, true);
                if self.grt.is_reached() {
                    height = self.global_relabel(residual, true);
                    max_height = height;
                    self.grt.clear_work();
                } else if self.levels[old_height].active.is_empty() && self.levels[old_height].inactive.is_empty() {
                    // a gap: every node above old_height is cut off from t
                    self.gap_heuristic(residual, old_height, max_height);
                    height = old_height - 1;
                    max_height = height;
                } else {
                    max_height = max_height.max(height);
                }
            }
        }

        // the excess at t is the maximum flow value
        if self.value_only {
            let flow_value = residual.excesses[sink];
            log::debug!("preflow push: maximum preflow value {:?}", flow_value);
            residual.flow_value = Some(flow_value);
            return Ok(flow_value);
        }

        // phase 2: convert the maximum preflow into a maximum flow by returning the excess to s
        let mut height = self.global_relabel(residual, false);
        self.grt.clear_work();
        log::debug!("preflow push: phase 2 from height {}", height);
        while height > n {
            loop {
                let Some(&u) = self.levels[height].active.first() else {
                    height = height.saturating_sub(1);
                    break;
                };

                height = self.discharge(residual, u, false);
                if self.grt.is_reached() {
                    height = self.global_relabel(residual, false);
                    self.grt.clear_work();
                }
            }
        }

        let flow_value = residual.excesses[sink];
        log::debug!("preflow push: maximum flow value {:?}", flow_value);
        residual.flow_value = Some(flow_value);
        Ok(flow_value)
    }

    // heights by breadth-first search from src over reversed, unsaturated arcs
    fn reverse_bfs<Flow>(&mut self, residual: &ResidualNetwork<Flow>, src: usize) -> Vec<Option<usize>>
    where
        Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        let mut heights = vec![None; residual.num_nodes()];
        heights[src] = Some(0);
        self.que.clear();
        self.que.push_back(src);
        while let Some(u) = self.que.pop_front() {
            let height = heights[u].map_or(0, |h| h + 1);
            for arc in residual.neighbors(u) {
                // arc.to -> u
                let rev = residual.arc(arc.rev);
                if heights[arc.to].is_none() && rev.flow < rev.capacity {
                    heights[arc.to] = Some(height);
                    self.que.push_back(arc.to);
                }
            }
        }
        heights
    }

    #[inline]
    fn push<Flow>(residual: &mut ResidualNetwork<Flow>, arc_id: usize, flow: Flow)
    where
        Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        let (u, v) = (residual.tail(arc_id), residual.arcs[arc_id].to);
        residual.push_flow(arc_id, flow);
        residual.excesses[u] -= flow;
        residual.excesses[v] += flow;
    }

    // move a node from the inactive set to the active set of its level
    fn activate<Flow>(&mut self, residual: &ResidualNetwork<Flow>, v: usize) {
        if v == self.source || v == self.sink {
            return;
        }
        let level = &mut self.levels[residual.heights[v]];
        if level.inactive.remove(&v) {
            level.active.insert(v);
        }
    }

    // advance the current edge of u, wrapping around at the end of its adjacency
    // returns false on wraparound
    fn move_to_next<Flow>(&mut self, residual: &ResidualNetwork<Flow>, u: usize) -> bool {
        self.current_edge[u] += 1;
        if self.current_edge[u] >= residual.start[u + 1] {
            self.current_edge[u] = residual.start[u];
            return false;
        }
        true
    }

    // new height of u that creates an admissible arc
    fn relabel<Flow>(&mut self, residual: &ResidualNetwork<Flow>, u: usize) -> usize
    where
        Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        self.grt.add_work(residual.start[u + 1] - residual.start[u]);
        let new_height = residual.neighbors(u).filter(|arc| arc.flow < arc.capacity).map(|arc| residual.heights[arc.to] + 1).min();
        debug_assert!(new_height.is_some(), "node {} has excess but no residual arc", u);
        new_height.unwrap_or(residual.num_nodes() + 1)
    }

    // Discharge u until it becomes inactive or, during phase 1, its height
    // reaches n - 1. u has the largest height among active nodes.
    // returns the next height to examine
    fn discharge<Flow>(&mut self, residual: &mut ResidualNetwork<Flow>, u: usize, is_phase1: bool) -> usize
    where
        Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        let n = residual.num_nodes();
        let mut height = residual.heights[u];
        // capped below n during phase 1
        let mut next_height = height;
        self.levels[height].active.remove(&u);
        loop {
            let arc_id = self.current_edge[u];
            let arc = residual.arc(arc_id);
            let v = arc.to;
            if height == residual.heights[v] + 1 && arc.flow < arc.capacity {
                let flow = residual.excesses[u].min(arc.residual_capacity());
                Self::push(residual, arc_id, flow);
                self.activate(residual, v);
                if residual.excesses[u] == Flow::zero() {
                    self.levels[height].inactive.insert(u);
                    break;
                }
            }

            if !self.move_to_next(residual, u) {
                // no admissible arc is left
                height = self.relabel(residual, u);
                log::trace!("relabel {} to height {}", u, height);
                if is_phase1 && height >= n - 1 {
                    // u is on the s side of the minimum cut, park it until phase 2
                    self.levels[height].active.insert(u);
                    break;
                }
                // The first relabel after a global relabel may not raise the
                // height since the current edge is not rewound.
                next_height = height;
            }
        }
        residual.heights[u] = height;
        next_height
    }

    // move every node in levels (height, max_height] to level n + 1
    fn gap_heuristic<Flow>(&mut self, residual: &mut ResidualNetwork<Flow>, height: usize, max_height: usize)
    where
        Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        let n = residual.num_nodes();
        log::trace!("gap at height {}", height);
        for h in (height + 1)..=max_height {
            let active = std::mem::take(&mut self.levels[h].active);
            let inactive = std::mem::take(&mut self.levels[h].inactive);
            for &u in active.iter().chain(inactive.iter()) {
                residual.heights[u] = n + 1;
            }
            self.levels[n + 1].active.extend(active);
            self.levels[n + 1].inactive.extend(inactive);
        }
    }

    // recompute exact heights, from t in phase 1 or from s in phase 2
    // returns the largest recomputed height
    fn global_relabel<Flow>(&mut self, residual: &mut ResidualNetwork<Flow>, from_sink: bool) -> usize
    where
        Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug,
    {
        let n = residual.num_nodes();
        let src = if from_sink { self.sink } else { self.source };
        let mut heights = self.reverse_bfs(residual, src);
        if !from_sink {
            // s must be reachable from t, drop t explicitly
            heights[self.sink] = None;
        }
        let mut max_height = heights.iter().flatten().copied().max().unwrap_or(0);
        if from_sink {
            // nodes that cannot reach t are relabeled like in the gap heuristic
            for u in 0..n {
                if heights[u].is_none() && residual.heights[u] < n {
                    heights[u] = Some(n + 1);
                }
            }
        } else {
            // the height of s is n
            heights.iter_mut().flatten().for_each(|h| *h += n);
            max_height += n;
        }
        heights[src] = None;

        for u in 0..n {
            if u == self.source || u == self.sink {
                continue;
            }
            let Some(new_height) = heights[u] else {
                continue;
            };
            let old_height = residual.heights[u];
            if new_height != old_height {
                if self.levels[old_height].active.remove(&u) {
                    self.levels[new_height].active.insert(u);
                } else {
                    self.levels[old_height].inactive.remove(&u);
                    self.levels[new_height].inactive.insert(u);
                }
                residual.heights[u] = new_height;
            }
        }
        log::trace!("global relabel from {}, max height {}", src, max_height);
        max_height
    }
}

pub mod capacity_scaling;
pub mod residual_network;

use crate::error::{FlowError, Result};
use crate::graph::Graph;
use crate::heap::BinaryHeap;
use crate::maximum_flow::{maximum_flow_value, FlowAlgorithm};
use capacity_scaling::CapacityScaling;
use num_traits::{CheckedAdd, NumAssign};
use std::fmt::Debug;
use std::ops::Neg;

// cost of a minimum cost flow and the flow on every edge, indexed by edge id
pub fn min_cost_flow<Flow>(graph: &Graph<Flow>) -> Result<(Flow, Vec<Flow>)>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    CapacityScaling::<Flow, BinaryHeap<usize, Flow>>::default().solve(graph)
}

pub fn min_cost_flow_cost<Flow>(graph: &Graph<Flow>) -> Result<Flow>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    min_cost_flow(graph).map(|(cost, _)| cost)
}

// edges without an entry in flows carry nothing
pub fn cost_of_flow<Flow>(graph: &Graph<Flow>, flows: &[Flow]) -> Flow
where
    Flow: NumAssign + Ord + Copy,
{
    graph.edges().zip(flows.iter()).fold(Flow::zero(), |sum, (e, &flow)| sum + flow * e.weight)
}

// Maximum s-t flow of minimum cost. The other demands of the graph are kept.
pub fn max_flow_min_cost<Flow>(graph: &Graph<Flow>, source: usize, sink: usize) -> Result<(Flow, Vec<Flow>)>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    let flow_value = maximum_flow_value(graph, source, sink, FlowAlgorithm::default())?;
    let mut graph = graph.clone();
    graph.set_demand(source, -flow_value).ok_or_else(|| FlowError::BadEndpoint(format!("node {} not in graph", source)))?;
    graph.set_demand(sink, flow_value).ok_or_else(|| FlowError::BadEndpoint(format!("node {} not in graph", sink)))?;
    min_cost_flow(&graph)
}

pub mod boykov_kolmogorov;
pub mod preflow_push;
pub mod residual_network;

use crate::error::{FlowError, Result};
use crate::graph::Graph;
use boykov_kolmogorov::BoykovKolmogorov;
use num_traits::{CheckedAdd, NumAssign};
use preflow_push::PreflowPush;
use residual_network::{FlowDict, ResidualNetwork};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::ops::Neg;

pub enum FlowAlgorithm<Flow> {
    PreflowPush(PreflowPush),
    BoykovKolmogorov(BoykovKolmogorov<Flow>),
}

impl<Flow> Default for FlowAlgorithm<Flow> {
    fn default() -> Self {
        FlowAlgorithm::PreflowPush(PreflowPush::default())
    }
}

impl<Flow> FlowAlgorithm<Flow>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    pub fn solve(&mut self, residual: &mut ResidualNetwork<Flow>, source: usize, sink: usize) -> Result<Flow> {
        match self {
            FlowAlgorithm::PreflowPush(engine) => engine.solve(residual, source, sink),
            FlowAlgorithm::BoykovKolmogorov(engine) => engine.solve(residual, source, sink),
        }
    }

    // a cut is only known once the flow is maximum
    fn reject_cutoff(&self) -> Result<()> {
        match self {
            FlowAlgorithm::BoykovKolmogorov(engine) if engine.has_cutoff() => Err(FlowError::InvalidParameter("cutoff should not be specified".to_string())),
            _ => Ok(()),
        }
    }

    fn with_value_only(self, value_only: bool) -> Self {
        match self {
            FlowAlgorithm::PreflowPush(engine) => FlowAlgorithm::PreflowPush(engine.value_only(value_only)),
            other => other,
        }
    }
}

// Run a maximum flow engine and return the residual network it leaves behind.
// A residual network from an earlier call on the same graph can be passed in
// and is reset before use.
pub fn maxflow<Flow>(graph: &Graph<Flow>, source: usize, sink: usize, algorithm: &mut FlowAlgorithm<Flow>, residual: Option<ResidualNetwork<Flow>>) -> Result<ResidualNetwork<Flow>>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    for u in [source, sink] {
        if !graph.contains_node(u) {
            return Err(FlowError::BadEndpoint(format!("node {} not in graph", u)));
        }
    }
    let mut residual = match residual {
        Some(residual) if residual.num_nodes() != graph.num_nodes() => {
            return Err(FlowError::InvalidParameter(format!("residual network has {} nodes but the graph has {}", residual.num_nodes(), graph.num_nodes())));
        }
        Some(residual) => residual,
        None => ResidualNetwork::build(graph)?,
    };
    algorithm.solve(&mut residual, source, sink)?;
    Ok(residual)
}

// flow value and the flow on every edge of the graph
pub fn maximum_flow<Flow>(graph: &Graph<Flow>, source: usize, sink: usize, algorithm: FlowAlgorithm<Flow>) -> Result<(Flow, FlowDict<Flow>)>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    let mut algorithm = algorithm.with_value_only(false);
    let residual = maxflow(graph, source, sink, &mut algorithm, None)?;
    let flow_value = residual.flow_value().unwrap_or(Flow::zero());
    Ok((flow_value, residual.flow_dict(graph)))
}

pub fn maximum_flow_value<Flow>(graph: &Graph<Flow>, source: usize, sink: usize, algorithm: FlowAlgorithm<Flow>) -> Result<Flow>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    let mut algorithm = algorithm.with_value_only(true);
    let residual = maxflow(graph, source, sink, &mut algorithm, None)?;
    Ok(residual.flow_value().unwrap_or(Flow::zero()))
}

// Cut value and the node partition (source side, sink side). The source side
// is everything reachable from the source in the residual network.
pub fn minimum_cut<Flow>(graph: &Graph<Flow>, source: usize, sink: usize, algorithm: FlowAlgorithm<Flow>) -> Result<(Flow, (BTreeSet<usize>, BTreeSet<usize>))>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    algorithm.reject_cutoff()?;

    let mut algorithm = algorithm.with_value_only(false);
    let residual = maxflow(graph, source, sink, &mut algorithm, None)?;
    let reachable = residual.source_side(source);
    let non_reachable = (0..graph.num_nodes()).filter(|u| !reachable.contains(u)).collect();
    Ok((residual.flow_value().unwrap_or(Flow::zero()), (reachable, non_reachable)))
}

pub fn minimum_cut_value<Flow>(graph: &Graph<Flow>, source: usize, sink: usize, algorithm: FlowAlgorithm<Flow>) -> Result<Flow>
where
    Flow: NumAssign + CheckedAdd + Neg<Output = Flow> + Ord + Copy + Debug + Default,
{
    algorithm.reject_cutoff()?;
    maximum_flow_value(graph, source, sink, algorithm)
}

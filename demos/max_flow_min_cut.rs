use flow_engines::graph::Graph;
use flow_engines::maximum_flow::boykov_kolmogorov::BoykovKolmogorov;
use flow_engines::maximum_flow::preflow_push::PreflowPush;
use flow_engines::maximum_flow::{maximum_flow, minimum_cut, FlowAlgorithm};
use flow_engines::minimum_cost_flow::min_cost_flow;

fn main() -> flow_engines::Result<()> {
    env_logger::init();

    let mut graph = Graph::directed();
    graph.add_nodes(6);

    let edges = vec![
        graph.add_edge(0, 1, Some(10), 2).unwrap(),
        graph.add_edge(0, 2, Some(10), 4).unwrap(),
        graph.add_edge(1, 3, Some(4), 1).unwrap(),
        graph.add_edge(1, 4, Some(8), 3).unwrap(),
        graph.add_edge(1, 2, Some(2), 1).unwrap(),
        graph.add_edge(2, 4, Some(9), 2).unwrap(),
        graph.add_edge(3, 5, Some(10), 1).unwrap(),
        graph.add_edge(4, 3, Some(6), 1).unwrap(),
        graph.add_edge(4, 5, Some(10), 2).unwrap(),
    ];

    let (flow_value, flow_dict) = maximum_flow(&graph, 0, 5, FlowAlgorithm::PreflowPush(PreflowPush::default().global_relabel_freq(2.0)))?;
    println!("maximum flow:{}", flow_value);
    for (u, flows) in flow_dict.iter() {
        println!("{} {:?}", u, flows);
    }

    let (cut_value, (reachable, non_reachable)) = minimum_cut(&graph, 0, 5, FlowAlgorithm::BoykovKolmogorov(BoykovKolmogorov::default()))?;
    println!("minimum cut:{} {:?} {:?}", cut_value, reachable, non_reachable);

    graph.set_demand(0, -flow_value);
    graph.set_demand(5, flow_value);
    let (cost, flows) = min_cost_flow(&graph)?;
    println!("minimum cost:{}", cost);
    for edge_id in edges {
        println!("{:?} flow:{}", graph.edge(edge_id).unwrap(), flows[edge_id]);
    }
    Ok(())
}

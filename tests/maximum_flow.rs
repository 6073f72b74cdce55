use flow_engines::graph::Graph;
use flow_engines::maximum_flow::boykov_kolmogorov::BoykovKolmogorov;
use flow_engines::maximum_flow::preflow_push::PreflowPush;
use flow_engines::maximum_flow::residual_network::{Algorithm, FlowDict, ResidualNetwork};
use flow_engines::maximum_flow::{maxflow, maximum_flow, maximum_flow_value, minimum_cut, minimum_cut_value, FlowAlgorithm};
use flow_engines::FlowError;
use rstest::{fixture, rstest};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug)]
enum Engine {
    PreflowPush,
    BoykovKolmogorov,
}

impl Engine {
    fn algorithm<Flow: Default>(self) -> FlowAlgorithm<Flow> {
        match self {
            Engine::PreflowPush => FlowAlgorithm::PreflowPush(PreflowPush::default()),
            Engine::BoykovKolmogorov => FlowAlgorithm::BoykovKolmogorov(BoykovKolmogorov::default()),
        }
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn build(mut graph: Graph<i64>, num_nodes: usize, edges: &[(usize, usize, Option<i64>)]) -> Graph<i64> {
    graph.add_nodes(num_nodes);
    for &(u, v, capacity) in edges {
        graph.add_edge(u, v, capacity, 0);
    }
    graph
}

fn directed(num_nodes: usize, edges: &[(usize, usize, Option<i64>)]) -> Graph<i64> {
    build(Graph::directed(), num_nodes, edges)
}

fn undirected(num_nodes: usize, edges: &[(usize, usize, Option<i64>)]) -> Graph<i64> {
    build(Graph::undirected(), num_nodes, edges)
}

// x=0, a=1, b=2, c=3, d=4, e=5, y=6
const TOPCODER: [(usize, usize, Option<i64>); 8] = [(0, 1, Some(3)), (0, 2, Some(1)), (1, 3, Some(3)), (2, 3, Some(5)), (2, 4, Some(4)), (4, 5, Some(2)), (3, 6, Some(2)), (5, 6, Some(3))];

fn graph1() -> Graph<i64> {
    undirected(2, &[(0, 1, Some(1))])
}

fn graph2() -> Graph<i64> {
    undirected(7, &TOPCODER)
}

fn digraph1() -> Graph<i64> {
    directed(4, &[(0, 1, Some(1000)), (0, 2, Some(1000)), (1, 2, Some(1)), (1, 3, Some(1000)), (2, 3, Some(1000))])
}

// some edges end up with zero flow
fn digraph2() -> Graph<i64> {
    directed(6, &[(0, 1, Some(2)), (0, 2, Some(1)), (2, 3, Some(1)), (3, 4, Some(1)), (1, 4, Some(2)), (4, 5, Some(2))])
}

// Cormen et al.
fn digraph3() -> Graph<i64> {
    directed(
        6,
        &[(0, 1, Some(16)), (0, 2, Some(13)), (1, 2, Some(10)), (2, 1, Some(4)), (1, 3, Some(12)), (3, 2, Some(9)), (2, 4, Some(14)), (4, 3, Some(7)), (3, 5, Some(20)), (4, 5, Some(4))],
    )
}

fn digraph4() -> Graph<i64> {
    directed(7, &TOPCODER)
}

fn digraph5() -> Graph<i64> {
    directed(4, &[(0, 1, Some(2)), (0, 2, Some(2)), (1, 2, Some(5)), (1, 3, Some(1)), (2, 1, Some(1)), (2, 3, Some(3))])
}

fn dinitz() -> Graph<i64> {
    directed(6, &[(0, 1, Some(10)), (0, 2, Some(10)), (1, 3, Some(4)), (1, 4, Some(8)), (1, 2, Some(2)), (2, 4, Some(9)), (3, 5, Some(10)), (4, 3, Some(6)), (4, 5, Some(10))])
}

// s=0, a=1, b=2, c=3, t=4
fn digraph_infcap_edges() -> Graph<i64> {
    directed(5, &[(0, 1, None), (0, 2, Some(30)), (1, 3, Some(25)), (2, 3, Some(12)), (1, 4, Some(60)), (3, 4, None)])
}

fn digraph_infcap_digon() -> Graph<i64> {
    directed(5, &[(0, 1, Some(85)), (0, 2, Some(30)), (1, 3, None), (3, 1, None), (2, 3, Some(12)), (1, 4, Some(60)), (3, 4, Some(37))])
}

fn graph_infcap_edges() -> Graph<i64> {
    undirected(5, &[(0, 1, None), (0, 2, Some(30)), (1, 3, Some(25)), (2, 3, Some(12)), (1, 4, Some(60)), (3, 4, None)])
}

fn path() -> Graph<i64> {
    directed(5, &[(0, 1, Some(1)), (1, 2, Some(1)), (2, 3, Some(1)), (3, 4, Some(1))])
}

// node 1 has no edges left
fn disconnected() -> Graph<i64> {
    undirected(4, &[(2, 3, Some(1))])
}

fn makes_enough_space() -> Graph<i64> {
    directed(4, &[(0, 1, Some(1)), (1, 3, Some(1)), (1, 2, Some(1)), (2, 3, Some(1))])
}

#[fixture]
fn interface_graph() -> Graph<i64> {
    digraph4()
}

fn validate_flows(graph: &Graph<i64>, source: usize, sink: usize, flow_dict: &FlowDict<i64>, flow_value: i64) {
    assert_eq!(flow_dict.keys().copied().collect::<Vec<_>>(), (0..graph.num_nodes()).collect::<Vec<_>>());
    let mut excess = vec![0; graph.num_nodes()];
    for (&u, flows) in flow_dict.iter() {
        assert_eq!(flows.keys().copied().collect::<BTreeSet<_>>(), graph.neighbors(u).collect::<BTreeSet<_>>());
        for (&v, &flow) in flows.iter() {
            assert!(flow >= 0);
            let edge = graph.edges().find(|e| (e.from == u && e.to == v) || (!graph.is_directed() && e.from == v && e.to == u)).unwrap();
            if let Some(capacity) = edge.capacity {
                assert!(flow <= capacity);
            }
            excess[u] -= flow;
            excess[v] += flow;
        }
    }
    for (u, &e) in excess.iter().enumerate() {
        if u == source {
            assert_eq!(e, -flow_value);
        } else if u == sink {
            assert_eq!(e, flow_value);
        } else {
            assert_eq!(e, 0);
        }
    }
}

fn validate_cut(graph: &Graph<i64>, source: usize, sink: usize, cut_value: i64, (reachable, non_reachable): &(BTreeSet<usize>, BTreeSet<usize>)) {
    assert!(reachable.contains(&source));
    assert!(non_reachable.contains(&sink));
    assert!(reachable.is_disjoint(non_reachable));
    assert_eq!(reachable.len() + non_reachable.len(), graph.num_nodes());

    let mut cut_capacity = 0;
    for e in graph.edges() {
        let crosses = (reachable.contains(&e.from) && non_reachable.contains(&e.to)) || (!graph.is_directed() && reachable.contains(&e.to) && non_reachable.contains(&e.from));
        if crosses {
            cut_capacity += e.capacity.unwrap();
        }
    }
    assert_eq!(cut_capacity, cut_value);
}

fn check_residual_invariants(residual: &ResidualNetwork<i64>) {
    for (u, v, arc) in residual.arcs() {
        assert!(arc.flow <= arc.capacity, "arc ({}, {}) over capacity", u, v);
        assert_eq!(arc.flow, -residual.arc(arc.rev).flow);
        assert_eq!(residual.tail(arc.rev), v);
    }
}

#[rstest]
#[case::graph1(graph1(), 0, 1, 1)]
#[case::graph2(graph2(), 0, 6, 4)]
#[case::digraph1(digraph1(), 0, 3, 2000)]
#[case::digraph2(digraph2(), 0, 5, 2)]
#[case::digraph3(digraph3(), 0, 5, 23)]
#[case::digraph4(digraph4(), 0, 6, 3)]
#[case::digraph5(digraph5(), 0, 3, 4)]
#[case::wikipedia_dinitz(dinitz(), 0, 5, 19)]
#[case::digraph_infcap_edges(digraph_infcap_edges(), 0, 4, 97)]
#[case::digraph_infcap_digon(digraph_infcap_digon(), 0, 4, 97)]
#[case::graph_infcap_edges(graph_infcap_edges(), 0, 4, 97)]
#[case::disconnected(disconnected(), 0, 3, 0)]
#[case::makes_enough_space(makes_enough_space(), 0, 3, 1)]
#[case::path(path(), 0, 4, 1)]
fn flows_and_cuts(#[case] graph: Graph<i64>, #[case] source: usize, #[case] sink: usize, #[case] expected: i64, #[values(Engine::PreflowPush, Engine::BoykovKolmogorov)] engine: Engine) {
    init_logger();

    let residual = maxflow(&graph, source, sink, &mut engine.algorithm(), None).unwrap();
    assert_eq!(residual.flow_value(), Some(expected));
    check_residual_invariants(&residual);
    validate_flows(&graph, source, sink, &residual.flow_dict(&graph), expected);

    let (flow_value, flow_dict) = maximum_flow(&graph, source, sink, engine.algorithm()).unwrap();
    assert_eq!(flow_value, expected);
    validate_flows(&graph, source, sink, &flow_dict, expected);

    let (cut_value, partition) = minimum_cut(&graph, source, sink, engine.algorithm()).unwrap();
    assert_eq!(cut_value, expected);
    validate_cut(&graph, source, sink, cut_value, &partition);

    assert_eq!(maximum_flow_value(&graph, source, sink, engine.algorithm()).unwrap(), expected);
    assert_eq!(minimum_cut_value(&graph, source, sink, engine.algorithm()).unwrap(), expected);
}

#[rstest]
fn preflow_leaves_sink_excess(#[values(false, true)] value_only: bool) {
    init_logger();
    let graph = dinitz();
    let mut algorithm = FlowAlgorithm::PreflowPush(PreflowPush::default().value_only(value_only));
    let residual = maxflow(&graph, 0, 5, &mut algorithm, None).unwrap();
    assert_eq!(residual.algorithm(), Some(Algorithm::PreflowPush));
    assert_eq!(residual.flow_value(), Some(19));
    assert_eq!(residual.excess(5), Some(19));
    check_residual_invariants(&residual);
    if !value_only {
        for u in 1..5 {
            assert_eq!(residual.excess(u), Some(0));
        }
    }
}

#[rstest]
fn boykov_kolmogorov_trees_give_minimum_cut(#[values(digraph1(), digraph3(), digraph4(), dinitz(), digraph_infcap_digon())] graph: Graph<i64>) {
    init_logger();
    let sink = graph.num_nodes() - 1;
    let mut algorithm = FlowAlgorithm::BoykovKolmogorov(BoykovKolmogorov::default());
    let residual = maxflow(&graph, 0, sink, &mut algorithm, None).unwrap();
    assert_eq!(residual.algorithm(), Some(Algorithm::BoykovKolmogorov));

    let trees = residual.trees().unwrap();
    assert_eq!(trees.source.get(&0), Some(&None));
    assert!(!trees.source.contains_key(&sink));
    let partition = trees.partition(graph.num_nodes());
    assert_eq!(partition.0, residual.source_side(0));
    validate_cut(&graph, 0, sink, residual.flow_value().unwrap(), &partition);
}

#[rstest]
fn infinite_capacity_path_is_unbounded(#[values(Engine::PreflowPush, Engine::BoykovKolmogorov)] engine: Engine) {
    let graph = directed(5, &[(0, 1, None), (0, 2, Some(30)), (1, 3, None), (2, 3, Some(12)), (1, 4, Some(60)), (3, 4, None)]);
    assert!(matches!(maxflow(&graph, 0, 4, &mut engine.algorithm(), None), Err(FlowError::Unbounded(_))));
    assert!(matches!(maximum_flow(&graph, 0, 4, engine.algorithm()), Err(FlowError::Unbounded(_))));
    assert!(matches!(minimum_cut(&graph, 0, 4, engine.algorithm()), Err(FlowError::Unbounded(_))));
}

#[rstest]
#[case::source_missing(9, 3)]
#[case::sink_missing(0, 9)]
#[case::coincide(2, 2)]
fn bad_endpoints(#[case] source: usize, #[case] sink: usize, #[values(Engine::PreflowPush, Engine::BoykovKolmogorov)] engine: Engine) {
    let graph = undirected(4, &[(0, 1, Some(1)), (1, 2, Some(1)), (2, 3, Some(1))]);
    assert!(matches!(maxflow(&graph, source, sink, &mut engine.algorithm(), None), Err(FlowError::BadEndpoint(_))));
    assert!(matches!(maximum_flow_value(&graph, source, sink, engine.algorithm()), Err(FlowError::BadEndpoint(_))));
    assert!(matches!(minimum_cut_value(&graph, source, sink, engine.algorithm()), Err(FlowError::BadEndpoint(_))));
}

#[rstest]
fn multigraphs_raise(#[values(Graph::multi_undirected(), Graph::multi_directed())] graph: Graph<i64>, #[values(Engine::PreflowPush, Engine::BoykovKolmogorov)] engine: Engine) {
    let graph = build(graph, 2, &[(0, 1, Some(1)), (1, 0, Some(1))]);
    assert!(matches!(maximum_flow(&graph, 0, 1, engine.algorithm()), Err(FlowError::NotImplementedForGraphType(_))));
}

#[rstest]
fn minimum_cut_rejects_cutoff(interface_graph: Graph<i64>) {
    let algorithm = || FlowAlgorithm::BoykovKolmogorov(BoykovKolmogorov::default().cutoff(1));
    assert!(matches!(minimum_cut(&interface_graph, 0, 6, algorithm()), Err(FlowError::InvalidParameter(_))));
    assert!(matches!(minimum_cut_value(&interface_graph, 0, 6, algorithm()), Err(FlowError::InvalidParameter(_))));
}

#[rstest]
fn reusing_residual(interface_graph: Graph<i64>, #[values(Engine::PreflowPush, Engine::BoykovKolmogorov)] engine: Engine) {
    init_logger();
    let mut residual = ResidualNetwork::build(&interface_graph).unwrap();
    let mut algorithm = engine.algorithm();
    for _ in 0..3 {
        residual = maxflow(&interface_graph, 0, 6, &mut algorithm, Some(residual)).unwrap();
        assert_eq!(residual.flow_value(), Some(3));
        check_residual_invariants(&residual);
    }
    // switching engines on the same residual network
    let mut other = match engine {
        Engine::PreflowPush => Engine::BoykovKolmogorov,
        Engine::BoykovKolmogorov => Engine::PreflowPush,
    }
    .algorithm();
    let residual = maxflow(&interface_graph, 0, 6, &mut other, Some(residual)).unwrap();
    assert_eq!(residual.flow_value(), Some(3));
}

#[rstest]
#[case::disabled(0.0)]
#[case::default(1.0)]
#[case::frequent(5.0)]
fn global_relabel_freq(#[case] freq: f64) {
    let graph = directed(2, &[(0, 1, Some(1))]);
    let mut algorithm = FlowAlgorithm::PreflowPush(PreflowPush::default().global_relabel_freq(freq));
    assert_eq!(maxflow(&graph, 0, 1, &mut algorithm, None).unwrap().flow_value(), Some(1));
    assert_eq!(maximum_flow_value(&digraph3(), 0, 5, FlowAlgorithm::PreflowPush(PreflowPush::default().global_relabel_freq(freq))).unwrap(), 23);
}

#[rstest]
#[case::negative(-1.0)]
#[case::nan(f64::NAN)]
fn invalid_global_relabel_freq(#[case] freq: f64) {
    let graph = directed(2, &[(0, 1, Some(1))]);
    let mut algorithm = FlowAlgorithm::PreflowPush(PreflowPush::default().global_relabel_freq(freq));
    assert!(matches!(maxflow(&graph, 0, 1, &mut algorithm, None), Err(FlowError::InvalidParameter(_))));
}

// k disjoint paths of p nodes with capacity 2
fn parallel_paths(k: usize, p: usize) -> Graph<i64> {
    let mut graph = Graph::directed();
    let s = graph.add_node();
    let t = graph.add_node();
    for _ in 0..k {
        let path = graph.add_nodes(p);
        graph.add_edge(s, path[0], Some(2), 0);
        for w in path.windows(2) {
            graph.add_edge(w[0], w[1], Some(2), 0);
        }
        graph.add_edge(path[p - 1], t, Some(2), 0);
    }
    graph
}

#[rstest]
fn boykov_kolmogorov_cutoff() {
    init_logger();
    let k = 5;
    let graph = parallel_paths(k, 100);
    let algorithm = FlowAlgorithm::BoykovKolmogorov(BoykovKolmogorov::default().cutoff(k as i64));
    let flow_value = maximum_flow_value(&graph, 0, 1, algorithm).unwrap();
    assert!(k as i64 <= flow_value && flow_value <= 2 * k as i64);
    assert_eq!(maximum_flow_value(&graph, 0, 1, FlowAlgorithm::default()).unwrap(), 2 * k as i64);
}

#[rstest]
#[case(3)]
#[case(2)]
#[case(1)]
fn complete_graph_cutoff(#[case] cutoff: i64) {
    let mut graph = Graph::undirected();
    graph.add_nodes(5);
    for u in 0..5 {
        for v in (u + 1)..5 {
            graph.add_edge(u, v, Some(1), 0);
        }
    }
    let algorithm = FlowAlgorithm::BoykovKolmogorov(BoykovKolmogorov::default().cutoff(cutoff));
    assert_eq!(maximum_flow_value(&graph, 0, 4, algorithm).unwrap(), cutoff);
}

#[rstest]
fn residual_network_layout() {
    let graph = directed(3, &[(0, 1, Some(4)), (1, 0, Some(2)), (1, 2, Some(0)), (2, 2, Some(7)), (1, 2, None)]);
    let residual = ResidualNetwork::build(&graph).unwrap();
    // (1, 2) was overwritten with an infinite capacity, the self loop is skipped
    assert_eq!(residual.inf(), 18);
    assert_eq!(residual.num_arcs(), 4);
    assert_eq!(residual.capacity(0, 1), Some(4));
    assert_eq!(residual.capacity(1, 0), Some(2));
    assert_eq!(residual.capacity(1, 2), Some(18));
    assert_eq!(residual.capacity(2, 1), Some(0));
    assert_eq!(residual.find_arc(2, 2), None);
    assert_eq!(residual.flow_value(), None);

    let empty = ResidualNetwork::build(&directed(2, &[])).unwrap();
    assert_eq!(empty.inf(), 1);
}

#[rstest]
fn residual_network_of_another_graph(interface_graph: Graph<i64>, #[values(Engine::PreflowPush, Engine::BoykovKolmogorov)] engine: Engine) {
    let residual = ResidualNetwork::build(&path()).unwrap();
    assert!(matches!(maxflow(&interface_graph, 0, 6, &mut engine.algorithm(), Some(residual)), Err(FlowError::InvalidParameter(_))));
}

// 800_000_000 * 3 does not fit in i32
fn large_path(infinite_edge: bool) -> Graph<i32> {
    let mut graph = Graph::directed();
    graph.add_nodes(3);
    graph.add_edge(0, 1, Some(800_000_000), 0);
    graph.add_edge(1, 2, Some(800_000_000), 0);
    if infinite_edge {
        graph.add_edge(2, 0, None, 0);
    }
    graph
}

#[rstest]
fn large_capacities(#[values(Engine::PreflowPush, Engine::BoykovKolmogorov)] engine: Engine) {
    init_logger();
    let graph = large_path(false);
    assert_eq!(maximum_flow_value(&graph, 0, 2, engine.algorithm()).unwrap(), 800_000_000);
    let (flow_value, flow_dict) = maximum_flow(&graph, 0, 2, engine.algorithm()).unwrap();
    assert_eq!(flow_value, 800_000_000);
    assert_eq!(flow_dict[&1][&2], 800_000_000);
    let (cut_value, (reachable, _)) = minimum_cut(&graph, 0, 2, engine.algorithm()).unwrap();
    assert_eq!(cut_value, 800_000_000);
    assert!(reachable.contains(&0) && !reachable.contains(&2));

    let half = i32::MAX / 2;
    let mut graph = Graph::undirected();
    graph.add_nodes(3);
    graph.add_edge(0, 1, Some(half), 0);
    graph.add_edge(1, 2, Some(half), 0);
    assert_eq!(maximum_flow_value(&graph, 0, 2, engine.algorithm()).unwrap(), half);
}

#[rstest]
fn infinity_that_does_not_fit(#[values(Engine::PreflowPush, Engine::BoykovKolmogorov)] engine: Engine) {
    let graph = large_path(true);
    assert!(matches!(ResidualNetwork::build(&graph), Err(FlowError::Overflow(_))));
    assert!(matches!(maximum_flow_value(&graph, 0, 2, engine.algorithm()), Err(FlowError::Overflow(_))));

    let mut graph = Graph::<i32>::directed();
    graph.add_nodes(2);
    graph.add_edge(0, 1, Some(i32::MAX), 0);
    graph.add_edge(1, 0, Some(1), 0);
    assert!(matches!(maximum_flow_value(&graph, 0, 1, engine.algorithm()), Err(FlowError::Overflow(_))));
}

// linear congruential generator, enough for reproducible test graphs
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

// about one edge in ten is infinite, zero capacities and self loops included
fn random_graph(seed: u64, is_directed: bool) -> Graph<i64> {
    let mut rng = Lcg(seed);
    let n = 9;
    let mut edges = Vec::new();
    for _ in 0..24 {
        let (u, v) = (rng.next(n) as usize, rng.next(n) as usize);
        let capacity = if rng.next(10) == 0 { None } else { Some(rng.next(9) as i64) };
        edges.push((u, v, capacity));
    }
    if is_directed {
        directed(n as usize, &edges)
    } else {
        undirected(n as usize, &edges)
    }
}

#[rstest]
fn engines_agree_on_random_graphs(#[values(1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16)] seed: u64, #[values(true, false)] is_directed: bool) {
    init_logger();
    let graph = random_graph(seed, is_directed);
    let (source, sink) = (0, graph.num_nodes() - 1);
    let algorithms = || -> [FlowAlgorithm<i64>; 5] {
        [
            FlowAlgorithm::PreflowPush(PreflowPush::default().global_relabel_freq(0.0)),
            FlowAlgorithm::PreflowPush(PreflowPush::default()),
            FlowAlgorithm::PreflowPush(PreflowPush::default().global_relabel_freq(5.0)),
            FlowAlgorithm::PreflowPush(PreflowPush::default().value_only(true)),
            FlowAlgorithm::BoykovKolmogorov(BoykovKolmogorov::default()),
        ]
    };

    // None stands for an unbounded flow
    let mut values = Vec::new();
    // fresh residual networks, then one network reused across all runs
    for reuse in [false, true] {
        let mut residual = None;
        for mut algorithm in algorithms() {
            let given = if reuse { residual.take() } else { None };
            match maxflow(&graph, source, sink, &mut algorithm, given) {
                Ok(result) => {
                    check_residual_invariants(&result);
                    values.push(result.flow_value());
                    residual = Some(result);
                }
                Err(FlowError::Unbounded(_)) => values.push(None),
                Err(err) => panic!("seed {}: {:?}", seed, err),
            }
        }
    }
    assert!(values.windows(2).all(|w| w[0] == w[1]), "seed {}: {:?}", seed, values);

    if let Some(expected) = values[0] {
        for engine in [Engine::PreflowPush, Engine::BoykovKolmogorov] {
            let (flow_value, flow_dict) = maximum_flow(&graph, source, sink, engine.algorithm()).unwrap();
            assert_eq!(flow_value, expected);
            validate_flows(&graph, source, sink, &flow_dict, expected);
            let (cut_value, partition) = minimum_cut(&graph, source, sink, engine.algorithm()).unwrap();
            validate_cut(&graph, source, sink, cut_value, &partition);
        }
    }
}

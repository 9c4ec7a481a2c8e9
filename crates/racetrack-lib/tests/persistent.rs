mod common;

use common::sample_graph;
use racetrack_lib::{find_route_bfs, Adjacency, GraphOp, PersistentGraph, Transaction};

#[test]
fn wrapping_a_built_graph_preserves_every_edge() {
    let built = sample_graph("map_hairpin");
    let persistent = PersistentGraph::from_graph(&built.graph);

    assert_eq!(persistent.node_count(), built.graph.node_count());
    assert_eq!(persistent.edge_count(), built.graph.edge_count());
    for node in built.graph.nodes() {
        assert_eq!(persistent.neighbours(node), built.graph.neighbours(node));
        assert_eq!(persistent.heuristic_of(node), built.graph.heuristic_of(node));
    }
}

#[test]
fn searches_agree_on_both_representations() {
    let built = sample_graph("map_hairpin");
    let persistent = PersistentGraph::from_graph(&built.graph);
    for start in &built.starts {
        assert_eq!(
            find_route_bfs(&persistent, *start, &built.finishes),
            find_route_bfs(&built.graph, *start, &built.finishes)
        );
    }
}

#[test]
fn edits_never_leak_into_earlier_versions() {
    let built = sample_graph("map_sprint");
    let base = PersistentGraph::from_graph(&built.graph);
    let start = built.starts[0];
    let first_edge = base.neighbours(&start)[0];

    let fork = start.with_generation(1);
    let transaction = Transaction::new()
        .add_node(fork)
        .add_edge(fork, first_edge.target, first_edge.weight)
        .set_heuristic(fork, 42)
        .remove_edge(start, first_edge.target);
    assert_eq!(transaction.ops().len(), 4);
    assert_eq!(transaction.ops()[0], GraphOp::AddNode(fork));

    let edited = base.apply(&transaction);

    assert!(!base.contains(&fork));
    assert_eq!(base.edge_weight(&start, &first_edge.target), Some(first_edge.weight));
    assert_eq!(base.node_count(), built.graph.node_count());

    assert!(edited.contains(&fork));
    assert_eq!(edited.heuristic(&fork), 42);
    assert_eq!(edited.edge_weight(&start, &first_edge.target), None);
    assert!(edited.predecessors(&first_edge.target).contains(&fork));
    assert!(!edited.predecessors(&first_edge.target).contains(&start));
    assert_eq!(edited.node_count(), base.node_count() + 1);
    assert_eq!(edited.edge_count(), base.edge_count());
}

#[test]
fn untouched_vertices_share_storage() {
    let built = sample_graph("map_sprint");
    let base = PersistentGraph::from_graph(&built.graph);
    let start = built.starts[0];
    let target = base.neighbours(&start)[0].target;
    let edited = base.remove_edge(start, target);

    assert!(!edited.shares_edges_with(&base, &start));
    assert!(!edited.shares_bucket_with(&base, &start));
    for node in built.graph.nodes().filter(|node| **node != start) {
        assert!(edited.shares_edges_with(&base, node), "{node} was copied");
    }
}

//! Common test utilities and fixture helpers.

use std::path::PathBuf;

use racetrack_lib::{build_circuit_graph, load_track, CircuitGraph, CircuitNode, NoopObserver, Track};

/// Directory holding the sample maps shipped with the repository.
#[allow(dead_code)]
pub fn maps_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/maps")
}

/// Load one of the sample maps by file stem.
#[allow(dead_code)]
pub fn sample_track(stem: &str) -> Track {
    let path = maps_dir().join(format!("{stem}.txt"));
    load_track(&path).unwrap_or_else(|err| panic!("load {}: {err}", path.display()))
}

/// Build the state space of a sample map without progress output.
#[allow(dead_code)]
pub fn sample_graph(stem: &str) -> CircuitGraph {
    build_circuit_graph(&sample_track(stem), &mut NoopObserver)
}

/// Strip collision-resolution generations so a route can be checked against
/// the graph it was originally planned on.
#[allow(dead_code)]
pub fn normalized(nodes: &[CircuitNode]) -> Vec<CircuitNode> {
    nodes.iter().map(|node| node.with_generation(0)).collect()
}

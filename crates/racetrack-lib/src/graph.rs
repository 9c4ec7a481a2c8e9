use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::car::{CarState, Coordinates};
use crate::track::CellKind;

/// Cost of a completed move, including a move that ends on a finish cell.
pub const MOVE_COST: u32 = 1;
/// Cost of driving into a wall or off the grid.
pub const CRASH_COST: u32 = 25;
/// Cost of the transition from a crash back onto the track.
pub const RECOVERY_COST: u32 = 0;

/// Vertex of the state-space graph.
///
/// Equality and hashing are structural over every field. Two nodes that differ
/// only by `generation` are distinct vertices; the collision resolver relies on
/// this to fork a node without touching the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CircuitNode {
    pub car: CarState,
    pub cell: CellKind,
    pub generation: u32,
}

impl CircuitNode {
    pub const fn new(car: CarState, cell: CellKind) -> Self {
        Self {
            car,
            cell,
            generation: 0,
        }
    }

    pub fn with_generation(self, generation: u32) -> Self {
        Self { generation, ..self }
    }

    pub fn pos(&self) -> Coordinates {
        self.car.pos
    }

    pub fn is_finish(&self) -> bool {
        self.cell == CellKind::Finish
    }

    /// Crash vertices sit on a wall (or off the grid).
    pub fn is_crash(&self) -> bool {
        self.cell == CellKind::OutsideTrack
    }
}

impl fmt::Display for CircuitNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:?}", self.car, self.cell)?;
        if self.generation > 0 {
            write!(f, " gen {}", self.generation)?;
        }
        f.write_str("]")
    }
}

/// Weighted edge within the state-space graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub target: CircuitNode,
    pub weight: u32,
}

/// Read access shared by the mutable [`Graph`] and the persistent graph.
///
/// Search algorithms are written against this trait so they run unchanged on
/// either representation.
pub trait Adjacency {
    /// Outgoing edges of `node`, in insertion order. Unknown nodes have none.
    fn neighbours(&self, node: &CircuitNode) -> &[Edge];

    /// Heuristic estimate attached to `node`, if any.
    fn heuristic_of(&self, node: &CircuitNode) -> Option<u32>;

    fn contains(&self, node: &CircuitNode) -> bool;

    /// Heuristic estimate for `node`, zero when none was assigned.
    fn heuristic(&self, node: &CircuitNode) -> u32 {
        self.heuristic_of(node).unwrap_or(0)
    }

    fn edge_weight(&self, from: &CircuitNode, to: &CircuitNode) -> Option<u32> {
        self.neighbours(from)
            .iter()
            .find(|edge| edge.target == *to)
            .map(|edge| edge.weight)
    }

    /// Sum of edge weights along `nodes`, or `None` if two consecutive nodes are
    /// not connected.
    fn path_cost(&self, nodes: &[CircuitNode]) -> Option<u32> {
        nodes
            .windows(2)
            .map(|pair| self.edge_weight(&pair[0], &pair[1]))
            .sum()
    }
}

/// Directed, weighted graph with a heuristic value per vertex.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adjacency: HashMap<CircuitNode, Vec<Edge>>,
    heuristics: HashMap<CircuitNode, u32>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an isolated vertex; existing vertices keep their edges.
    pub fn add_node(&mut self, node: CircuitNode) {
        self.adjacency.entry(node).or_default();
    }

    /// Insert or re-weight the edge `from -> to`. Both ends become vertices.
    pub fn add_edge(&mut self, from: CircuitNode, to: CircuitNode, weight: u32) {
        self.add_node(to);
        let edges = self.adjacency.entry(from).or_default();
        match edges.iter_mut().find(|edge| edge.target == to) {
            Some(existing) => existing.weight = weight,
            None => edges.push(Edge { target: to, weight }),
        }
    }

    pub fn remove_edge(&mut self, from: &CircuitNode, to: &CircuitNode) -> Option<u32> {
        let edges = self.adjacency.get_mut(from)?;
        let index = edges.iter().position(|edge| edge.target == *to)?;
        Some(edges.remove(index).weight)
    }

    pub fn set_heuristic(&mut self, node: CircuitNode, value: u32) {
        self.heuristics.insert(node, value);
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CircuitNode> {
        self.adjacency.keys()
    }

    /// Every edge as `(source, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (&CircuitNode, &Edge)> {
        self.adjacency
            .iter()
            .flat_map(|(from, edges)| edges.iter().map(move |edge| (from, edge)))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }
}

impl Adjacency for Graph {
    fn neighbours(&self, node: &CircuitNode) -> &[Edge] {
        self.adjacency
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn heuristic_of(&self, node: &CircuitNode) -> Option<u32> {
        self.heuristics.get(node).copied()
    }

    fn contains(&self, node: &CircuitNode) -> bool {
        self.adjacency.contains_key(node)
    }
}

use std::fmt::Write;

use serde::Serialize;

use crate::car::Coordinates;
use crate::graph::CircuitNode;
use crate::path::Route;
use crate::routing::{RaceAlgorithm, RacePlan};

/// Route of a single car in a serialisable form.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CarRoute {
    pub car: usize,
    pub moves: usize,
    pub cost: u32,
    pub crashes: usize,
    pub finished: bool,
    /// Cells visited on the board, 1-based, without consecutive repeats.
    pub board_path: Vec<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<CircuitNode>>,
}

impl CarRoute {
    fn from_route(car: usize, route: &Route, include_nodes: bool) -> Self {
        Self {
            car,
            moves: route.hop_count(),
            cost: route.cost,
            crashes: route.nodes.iter().filter(|node| node.is_crash()).count(),
            finished: route.reaches_finish(),
            board_path: board_path(&route.nodes),
            nodes: include_nodes.then(|| route.nodes.clone()),
        }
    }
}

/// Structured representation of a planned race that consumers can serialise.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RaceSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    pub algorithm: RaceAlgorithm,
    pub total_cost: u32,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub cars: Vec<CarRoute>,
}

impl RaceSummary {
    /// Convert a [`RacePlan`] into a summary. Raw graph nodes are only kept
    /// when `include_nodes` is set.
    pub fn from_plan(map: Option<&str>, plan: &RacePlan, include_nodes: bool) -> Self {
        let cars = plan
            .routes
            .iter()
            .enumerate()
            .map(|(car, route)| CarRoute::from_route(car, route, include_nodes))
            .collect();

        Self {
            map: map.map(str::to_string),
            algorithm: plan.algorithm,
            total_cost: plan.total_cost(),
            graph_nodes: plan.graph_nodes,
            graph_edges: plan.graph_edges,
            cars,
        }
    }

    /// One line per car with its board path only.
    pub fn render_basic(&self) -> String {
        let mut buffer = String::new();
        for car in &self.cars {
            let _ = writeln!(buffer, "{}", join_path(&car.board_path));
        }
        buffer
    }
}

/// Board cells visited along `nodes`.
///
/// Consecutive nodes on the same cell (a crash recovering in place, a
/// duplicate from collision resolution) collapse into one entry, and
/// coordinates are shifted to 1-based for display.
pub fn board_path(nodes: &[CircuitNode]) -> Vec<Coordinates> {
    let mut path: Vec<Coordinates> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let pos = node.pos() + Coordinates::new(1, 1);
        if path.last() != Some(&pos) {
            path.push(pos);
        }
    }
    path
}

fn join_path(path: &[Coordinates]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

//! Race planning for one or more cars.
//!
//! This module provides:
//! - [`RaceAlgorithm`] - Supported search algorithms (DFS, BFS, Greedy, A*)
//! - [`RaceRequest`] - High-level race planning request
//! - [`RacePlan`] - Planned routes, one per car
//! - [`plan_race`] - Main entry point for computing routes
//!
//! # Strategy Pattern
//!
//! Each algorithm is encapsulated in a planner implementing [`RoutePlanner`].
//! The same planner is handed to the collision resolver so rerouted cars are
//! searched with the algorithm the caller asked for.
//!
//! # Example
//!
//! ```ignore
//! use racetrack_lib::{load_track, plan_race, RaceAlgorithm, RaceRequest};
//!
//! let track = load_track("docs/maps/map_hairpin.txt".as_ref())?;
//! let plan = plan_race(&track, &RaceRequest::new(RaceAlgorithm::AStar))?;
//! println!("Total cost: {}", plan.total_cost());
//! ```

mod planner;

pub use planner::{
    select_planner, AStarPlanner, BfsPlanner, DfsPlanner, GreedyPlanner, RoutePlanner,
};

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::builder::build_circuit_graph;
use crate::collision::resolve_collisions;
use crate::error::{Error, Result};
use crate::observer::{BuildObserver, TracingObserver};
use crate::path::Route;
use crate::track::Track;

/// Supported search algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RaceAlgorithm {
    /// Depth-first search (first route found).
    Dfs,
    /// Breadth-first search (fewest moves).
    Bfs,
    /// Greedy best-first search (heuristic only).
    Greedy,
    /// A* search (cost plus heuristic).
    #[default]
    #[serde(rename = "a-star")]
    AStar,
}

impl RaceAlgorithm {
    pub const ALL: [RaceAlgorithm; 4] = [
        RaceAlgorithm::Dfs,
        RaceAlgorithm::Bfs,
        RaceAlgorithm::Greedy,
        RaceAlgorithm::AStar,
    ];
}

impl fmt::Display for RaceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RaceAlgorithm::Dfs => "dfs",
            RaceAlgorithm::Bfs => "bfs",
            RaceAlgorithm::Greedy => "greedy",
            RaceAlgorithm::AStar => "a-star",
        };
        f.write_str(value)
    }
}

impl FromStr for RaceAlgorithm {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dfs" => Ok(RaceAlgorithm::Dfs),
            "bfs" => Ok(RaceAlgorithm::Bfs),
            "greedy" => Ok(RaceAlgorithm::Greedy),
            "a-star" | "a_star" | "astar" | "a*" => Ok(RaceAlgorithm::AStar),
            _ => Err(Error::UnknownAlgorithm {
                name: value.to_string(),
            }),
        }
    }
}

/// High-level race planning request.
#[derive(Debug, Clone, Default)]
pub struct RaceRequest {
    pub algorithm: RaceAlgorithm,
    /// Number of cars to race, taken from the track's start cells in order.
    /// `None` races one car per start cell.
    pub cars: Option<usize>,
}

impl RaceRequest {
    pub fn new(algorithm: RaceAlgorithm) -> Self {
        Self {
            algorithm,
            cars: None,
        }
    }

    pub fn with_cars(mut self, cars: usize) -> Self {
        self.cars = Some(cars);
        self
    }

    fn car_count(&self, track: &Track) -> Result<usize> {
        let available = track.starts().len();
        let requested = self.cars.unwrap_or(available);
        if requested == 0 || requested > available {
            return Err(Error::InvalidCarCount {
                requested,
                available,
            });
        }
        Ok(requested)
    }
}

/// Planned race returned by the library.
#[derive(Debug, Clone, Serialize)]
pub struct RacePlan {
    pub algorithm: RaceAlgorithm,
    /// One route per car, in start-cell order.
    pub routes: Vec<Route>,
    pub graph_nodes: usize,
    pub graph_edges: usize,
}

impl RacePlan {
    pub fn car_count(&self) -> usize {
        self.routes.len()
    }

    /// Sum of every car's route cost.
    pub fn total_cost(&self) -> u32 {
        self.routes.iter().map(|route| route.cost).sum()
    }
}

/// Compute routes for every requested car, logging progress through `tracing`.
pub fn plan_race(track: &Track, request: &RaceRequest) -> Result<RacePlan> {
    plan_race_with_observer(track, request, &mut TracingObserver::default())
}

/// Compute routes for every requested car.
///
/// This is the main entry point for race planning. It:
/// 1. Validates the requested car count against the start cells
/// 2. Builds the state-space graph
/// 3. Searches a route for each car independently
/// 4. Resolves same-timestep collisions when more than one car races
pub fn plan_race_with_observer(
    track: &Track,
    request: &RaceRequest,
    observer: &mut dyn BuildObserver,
) -> Result<RacePlan> {
    let cars = request.car_count(track)?;
    let built = build_circuit_graph(track, observer);
    let planner = select_planner(request.algorithm);
    tracing::debug!(
        "planning {} car(s) with {} (heuristic: {})",
        cars,
        planner.algorithm(),
        planner.uses_heuristic()
    );

    let mut routes = Vec::with_capacity(cars);
    for (car, start) in built.starts.iter().take(cars).enumerate() {
        let route = planner
            .find_path(&built.graph, *start, &built.finishes)
            .ok_or(Error::RouteNotFound { car })?;
        tracing::debug!(
            "car {} route: {} moves, cost {}",
            car,
            route.hop_count(),
            route.cost
        );
        routes.push(route);
    }

    if routes.len() > 1 {
        routes = resolve_collisions(
            &built.graph,
            routes,
            &built.finishes,
            planner.as_ref(),
            observer,
        );
    }

    Ok(RacePlan {
        algorithm: request.algorithm,
        routes,
        graph_nodes: built.graph.node_count(),
        graph_edges: built.graph.edge_count(),
    })
}

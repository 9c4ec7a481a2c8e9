//! Route planning strategies implementing the Strategy pattern.
//!
//! This module provides the `RoutePlanner` trait and one implementation per
//! search algorithm (DFS, BFS, Greedy best-first, A*). The collision resolver
//! re-runs whichever planner produced the original routes, so every planner
//! works against any [`Adjacency`] implementation.

use std::collections::HashSet;

use crate::graph::{Adjacency, CircuitNode};
use crate::path::{find_route_a_star, find_route_bfs, find_route_dfs, find_route_greedy, Route};

use super::RaceAlgorithm;

/// Trait for route planning strategies.
pub trait RoutePlanner: Send + Sync {
    /// The algorithm identifier for this planner.
    fn algorithm(&self) -> RaceAlgorithm;

    /// Search `graph` from `start` to any node in `targets`.
    ///
    /// Returns `None` when no target is reachable.
    fn find_path(
        &self,
        graph: &dyn Adjacency,
        start: CircuitNode,
        targets: &HashSet<CircuitNode>,
    ) -> Option<Route>;

    /// Whether the planner ranks its frontier by the graph's heuristic values.
    fn uses_heuristic(&self) -> bool {
        false
    }
}

/// Depth-first search planner. Finds some route quickly, rarely the cheapest.
#[derive(Debug, Clone, Copy, Default)]
pub struct DfsPlanner;

impl RoutePlanner for DfsPlanner {
    fn algorithm(&self) -> RaceAlgorithm {
        RaceAlgorithm::Dfs
    }

    fn find_path(
        &self,
        graph: &dyn Adjacency,
        start: CircuitNode,
        targets: &HashSet<CircuitNode>,
    ) -> Option<Route> {
        find_route_dfs(graph, start, targets)
    }
}

/// Breadth-first search planner.
///
/// BFS finds the route with the fewest moves but does not consider edge
/// weights, so a crash counts the same as a clean move.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfsPlanner;

impl RoutePlanner for BfsPlanner {
    fn algorithm(&self) -> RaceAlgorithm {
        RaceAlgorithm::Bfs
    }

    fn find_path(
        &self,
        graph: &dyn Adjacency,
        start: CircuitNode,
        targets: &HashSet<CircuitNode>,
    ) -> Option<Route> {
        find_route_bfs(graph, start, targets)
    }
}

/// Greedy best-first planner ranked by distance-to-finish alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPlanner;

impl RoutePlanner for GreedyPlanner {
    fn algorithm(&self) -> RaceAlgorithm {
        RaceAlgorithm::Greedy
    }

    fn find_path(
        &self,
        graph: &dyn Adjacency,
        start: CircuitNode,
        targets: &HashSet<CircuitNode>,
    ) -> Option<Route> {
        find_route_greedy(graph, start, targets)
    }

    fn uses_heuristic(&self) -> bool {
        true
    }
}

/// A* planner ranked by accumulated cost plus distance-to-finish.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarPlanner;

impl RoutePlanner for AStarPlanner {
    fn algorithm(&self) -> RaceAlgorithm {
        RaceAlgorithm::AStar
    }

    fn find_path(
        &self,
        graph: &dyn Adjacency,
        start: CircuitNode,
        targets: &HashSet<CircuitNode>,
    ) -> Option<Route> {
        find_route_a_star(graph, start, targets)
    }

    fn uses_heuristic(&self) -> bool {
        true
    }
}

/// Select the planner implementing `algorithm`.
pub fn select_planner(algorithm: RaceAlgorithm) -> Box<dyn RoutePlanner> {
    match algorithm {
        RaceAlgorithm::Dfs => Box::new(DfsPlanner),
        RaceAlgorithm::Bfs => Box::new(BfsPlanner),
        RaceAlgorithm::Greedy => Box::new(GreedyPlanner),
        RaceAlgorithm::AStar => Box::new(AStarPlanner),
    }
}

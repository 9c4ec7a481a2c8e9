//! Racetrack library entry points.
//!
//! This crate parses racetrack maps, expands them into the state space of a
//! car moving under discrete vector physics, searches that space for routes to
//! the finish line, and resolves collisions when several cars race at once.
//! Higher-level consumers (the CLI) should only depend on the functions
//! exported here instead of reimplementing behavior.

pub mod builder;
pub mod car;
pub mod collision;
pub mod error;
pub mod graph;
pub mod observer;
pub mod output;
pub mod path;
pub mod persistent;
pub mod routing;
pub mod track;
pub mod worker;

pub use builder::{build_circuit_graph, build_graph_from_grid, CircuitGraph, CRASH_HEURISTIC};
pub use car::{CarState, Coordinates, Thrust};
pub use collision::resolve_collisions;
pub use error::{Error, Result};
pub use graph::{Adjacency, CircuitNode, Edge, Graph, CRASH_COST, MOVE_COST, RECOVERY_COST};
pub use observer::{BuildObserver, NoopObserver, TracingObserver};
pub use output::{board_path, CarRoute, RaceSummary};
pub use path::{find_route_a_star, find_route_bfs, find_route_dfs, find_route_greedy, Route};
pub use persistent::{GraphOp, PersistentGraph, Transaction};
pub use routing::{
    plan_race, plan_race_with_observer, select_planner, AStarPlanner, BfsPlanner, DfsPlanner,
    GreedyPlanner, RaceAlgorithm, RacePlan, RaceRequest, RoutePlanner,
};
pub use track::{
    list_maps, load_track, parse_track, resolve_map, CellKind, Track, MAP_FILE_PREFIX,
};
pub use worker::{spawn_race, wait_for_race, RaceOutcome};

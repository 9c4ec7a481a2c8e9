//! State-space construction.
//!
//! Expands every car state reachable from the start cells into a directed,
//! weighted [`Graph`]. Each expansion tries the nine [`Thrust`] moves and traces
//! the resulting straight-line movement one cell at a time:
//!
//! - a move that completes on the track costs [`MOVE_COST`];
//! - a move that touches a finish cell stops there, at rest, for [`MOVE_COST`];
//! - a move that leaves the grid or hits a wall costs [`CRASH_COST`] into an
//!   impact vertex, followed by a free ([`RECOVERY_COST`]) edge to the car at
//!   rest on the last in-track cell it reached.

use std::collections::{HashSet, VecDeque};

use crate::car::{CarState, Coordinates, Thrust};
use crate::error::Result;
use crate::graph::{CircuitNode, Graph, CRASH_COST, MOVE_COST, RECOVERY_COST};
use crate::observer::BuildObserver;
use crate::track::{CellKind, Track};

/// Heuristic assigned to crash vertices so informed searches try them last.
pub const CRASH_HEURISTIC: u32 = 1_000_000;

/// Built state-space graph together with its search endpoints.
#[derive(Debug, Clone)]
pub struct CircuitGraph {
    pub graph: Graph,
    /// One resting node per start cell, in track order.
    pub starts: Vec<CircuitNode>,
    /// Resting nodes on every finish cell.
    pub finishes: HashSet<CircuitNode>,
}

/// Result of tracing a single move across the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveOutcome {
    Completed(CircuitNode),
    Finished(CircuitNode),
    Crashed {
        impact: CircuitNode,
        recovery: CircuitNode,
    },
}

impl MoveOutcome {
    /// Vertex the origin connects to.
    fn landing(&self) -> CircuitNode {
        match *self {
            MoveOutcome::Completed(node) | MoveOutcome::Finished(node) => node,
            MoveOutcome::Crashed { impact, .. } => impact,
        }
    }
}

/// Build the state-space graph for a raw grid.
///
/// Fails with a configuration error when the grid is empty or ragged, or when
/// the start or finish lists are empty or reference walls.
pub fn build_graph_from_grid(
    cells: Vec<Vec<CellKind>>,
    starts: Vec<Coordinates>,
    finishes: Vec<Coordinates>,
    observer: &mut dyn BuildObserver,
) -> Result<CircuitGraph> {
    let track = Track::new(cells, starts, finishes)?;
    Ok(build_circuit_graph(&track, observer))
}

/// Build the state-space graph for a validated track.
pub fn build_circuit_graph(track: &Track, observer: &mut dyn BuildObserver) -> CircuitGraph {
    let starts = seed_nodes(track);
    let finishes: HashSet<CircuitNode> = track
        .finishes()
        .iter()
        .map(|&pos| CircuitNode::new(CarState::parked(pos), CellKind::Finish))
        .collect();

    let mut graph = Graph::new();
    let mut discovered: HashSet<CircuitNode> = HashSet::new();
    let mut queue: VecDeque<CircuitNode> = VecDeque::new();
    let mut closed = 0usize;

    for &start in &starts {
        if discovered.insert(start) {
            queue.push_back(start);
        }
    }
    observer.on_build_start(queue.len());

    while let Some(node) = queue.pop_front() {
        graph.add_node(node);
        if node.is_finish() {
            continue;
        }

        let mut landed: HashSet<CircuitNode> = HashSet::with_capacity(Thrust::ALL.len());
        for thrust in Thrust::ALL {
            let outcome = trace_move(track, &node, node.car.accelerate(thrust));
            if !landed.insert(outcome.landing()) {
                continue;
            }

            let next = match outcome {
                MoveOutcome::Completed(next) => {
                    graph.add_edge(node, next, MOVE_COST);
                    next
                }
                MoveOutcome::Finished(next) => {
                    graph.add_edge(node, next, MOVE_COST);
                    continue;
                }
                MoveOutcome::Crashed { impact, recovery } => {
                    graph.add_edge(node, impact, CRASH_COST);
                    graph.add_edge(impact, recovery, RECOVERY_COST);
                    recovery
                }
            };

            if discovered.insert(next) {
                queue.push_back(next);
            }
        }

        closed += 1;
        observer.on_node_expanded(closed, queue.len());
    }

    assign_heuristics(&mut graph, track.finishes());
    observer.on_build_complete(graph.node_count(), graph.edge_count());

    CircuitGraph {
        graph,
        starts,
        finishes,
    }
}

fn seed_nodes(track: &Track) -> Vec<CircuitNode> {
    track
        .starts()
        .iter()
        .map(|&pos| {
            let cell = track.cell(pos).unwrap_or(CellKind::Start);
            CircuitNode::new(CarState::parked(pos), cell)
        })
        .collect()
}

/// Trace `moving` from its current position toward its destination.
///
/// Each iteration advances every axis that has not reached its target by one
/// cell in the direction of the remaining displacement.
fn trace_move(track: &Track, origin: &CircuitNode, moving: CarState) -> MoveOutcome {
    let target = moving.destination();
    let mut current = moving.pos;
    let mut current_cell = origin.cell;

    while current != target {
        let next = current
            + Coordinates::new(target.x - current.x, target.y - current.y).signum();
        match track.cell(next) {
            None | Some(CellKind::OutsideTrack) => {
                return MoveOutcome::Crashed {
                    impact: CircuitNode::new(moving.with_pos(next), CellKind::OutsideTrack),
                    recovery: CircuitNode::new(CarState::parked(current), current_cell),
                };
            }
            Some(CellKind::Finish) => {
                return MoveOutcome::Finished(CircuitNode::new(
                    CarState::parked(next),
                    CellKind::Finish,
                ));
            }
            Some(cell) => {
                current = next;
                current_cell = cell;
            }
        }
    }

    MoveOutcome::Completed(CircuitNode::new(moving.with_pos(target), current_cell))
}

/// Heuristic for one vertex: zero on a finish, [`CRASH_HEURISTIC`] on a wall,
/// otherwise the Manhattan distance to the nearest finish.
pub fn heuristic_for(node: &CircuitNode, finishes: &[Coordinates]) -> u32 {
    match node.cell {
        CellKind::Finish => 0,
        CellKind::OutsideTrack => CRASH_HEURISTIC,
        CellKind::Track | CellKind::Start => finishes
            .iter()
            .map(|&finish| node.pos().manhattan(finish))
            .min()
            .unwrap_or(CRASH_HEURISTIC),
    }
}

fn assign_heuristics(graph: &mut Graph, finishes: &[Coordinates]) {
    let values: Vec<(CircuitNode, u32)> = graph
        .nodes()
        .map(|node| (*node, heuristic_for(node, finishes)))
        .collect();
    for (node, value) in values {
        graph.set_heuristic(node, value);
    }
}

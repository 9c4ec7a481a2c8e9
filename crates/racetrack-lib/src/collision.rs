//! Multi-car collision resolution.
//!
//! Routes are computed independently per car over the shared graph, then
//! replayed one timestep at a time. When two cars would occupy the same cell
//! after the same move, the car listed first keeps the cell and the later one
//! is rerouted from its previous node, or from the move that caused the crash
//! when that node is a crash vertex. Rerouting never edits the shared graph:
//! the contested node is forked (same state, higher `generation`) inside a new
//! [`PersistentGraph`] version in which the fork cannot drive into any cell
//! claimed by another car at that timestep.

use std::collections::{HashMap, HashSet};

use crate::car::Coordinates;
use crate::graph::{Adjacency, CircuitNode, Graph};
use crate::observer::BuildObserver;
use crate::path::Route;
use crate::persistent::{PersistentGraph, Transaction};
use crate::routing::RoutePlanner;

/// Rewrites allowed per car before its remaining collisions are left in place.
const MAX_REWRITES_PER_CAR: usize = 32;

/// Rewrite `routes` so that no two cars share a cell at the same timestep.
///
/// Cars that have reached a finish cell are exempt. A collision that cannot be
/// rerouted is kept and logged at `warn`. The returned routes keep the input
/// order; their costs are recomputed against `base`.
pub fn resolve_collisions<P: RoutePlanner + ?Sized>(
    base: &Graph,
    mut routes: Vec<Route>,
    finishes: &HashSet<CircuitNode>,
    planner: &P,
    observer: &mut dyn BuildObserver,
) -> Vec<Route> {
    let mut current = PersistentGraph::from_graph(base);
    let mut timestep = 0usize;
    let mut rewrites = 0usize;
    let mut budget = vec![MAX_REWRITES_PER_CAR; routes.len()];

    'timesteps: loop {
        let active: Vec<usize> = (0..routes.len())
            .filter(|&car| routes[car].nodes.len() >= timestep + 2)
            .collect();
        if active.is_empty() {
            break;
        }

        let mut claims: HashMap<Coordinates, usize> = HashMap::new();
        for &car in &active {
            let next = routes[car].nodes[timestep + 1];
            if next.is_finish() {
                continue;
            }
            if !claims.contains_key(&next.pos()) {
                claims.insert(next.pos(), car);
                continue;
            }
            if budget[car] == 0 {
                tracing::warn!(
                    "car {} gave up rerouting around {} at timestep {}; keeping its route",
                    car,
                    next.pos(),
                    timestep
                );
                continue;
            }

            // A crash always recovers onto the same cell, so the car is rerouted
            // from the move that caused the crash instead.
            let origin = reroute_index(&routes[car], timestep);
            let avoided = (origin < timestep).then(|| routes[car].nodes[origin + 1]);
            let blocked = claimed_positions(&routes, car, origin + 1);
            let (forked, duplicate) =
                fork_node(&current, routes[car].nodes[origin], &blocked, avoided);

            let Some(continuation) = planner.find_path(&forked, duplicate, finishes) else {
                tracing::warn!(
                    "car {} cannot avoid {} at timestep {}; keeping its route",
                    car,
                    next.pos(),
                    timestep
                );
                continue;
            };

            observer.on_collision(timestep, car, next.pos());
            rewrites += 1;
            budget[car] -= 1;
            current = forked;

            let route = &mut routes[car];
            route.nodes.truncate(origin);
            route.nodes.extend(continuation.nodes);
            if origin < timestep {
                timestep = origin;
                continue 'timesteps;
            }
            if let Some(replacement) = route.nodes.get(timestep + 1) {
                if !replacement.is_finish() {
                    claims.entry(replacement.pos()).or_insert(car);
                }
            }
        }

        timestep += 1;
    }

    for route in &mut routes {
        route.cost = resolved_cost(base, &current, &route.nodes);
    }
    observer.on_resolution_complete(timestep, rewrites);
    routes
}

/// Index of the node a collision at `timestep + 1` is rerouted from: the node
/// at `timestep`, or the nearest earlier node when that one is a crash vertex.
fn reroute_index(route: &Route, timestep: usize) -> usize {
    (0..=timestep)
        .rev()
        .find(|&index| !route.nodes[index].is_crash())
        .unwrap_or(0)
}

/// Positions occupied at `index` by every car other than `car`.
fn claimed_positions(routes: &[Route], car: usize, index: usize) -> HashSet<Coordinates> {
    routes
        .iter()
        .enumerate()
        .filter(|&(other, _)| other != car)
        .filter_map(|(_, route)| route.nodes.get(index))
        .filter(|node| !node.is_finish())
        .map(CircuitNode::pos)
        .collect()
}

/// Fork `original` into a fresh-generation duplicate.
///
/// The duplicate inherits the heuristic and outgoing edges of `original`, and
/// every edge into `original` is redirected to it. Unless the duplicate is a
/// crash vertex, its edges into `blocked` positions are dropped. Edges into any
/// generation of `avoided` are dropped as well.
fn fork_node(
    graph: &PersistentGraph,
    original: CircuitNode,
    blocked: &HashSet<Coordinates>,
    avoided: Option<CircuitNode>,
) -> (PersistentGraph, CircuitNode) {
    let mut generation = original.generation + 1;
    while graph.contains(&original.with_generation(generation)) {
        generation += 1;
    }
    let duplicate = original.with_generation(generation);

    let mut transaction = Transaction::new()
        .add_node(duplicate)
        .set_heuristic(duplicate, graph.heuristic(&original));

    for edge in graph.neighbours(&original) {
        transaction = transaction.add_edge(duplicate, edge.target, edge.weight);
    }

    for source in graph.predecessors(&original) {
        if let Some(weight) = graph.edge_weight(source, &original) {
            transaction = transaction
                .add_edge(*source, duplicate, weight)
                .remove_edge(*source, original);
        }
    }

    if !duplicate.is_crash() {
        for edge in graph.neighbours(&original) {
            if blocked.contains(&edge.target.pos()) {
                transaction = transaction.remove_edge(duplicate, edge.target);
            }
        }
    }

    if let Some(avoided) = avoided.map(|node| node.with_generation(0)) {
        for edge in graph.neighbours(&original) {
            if edge.target.with_generation(0) == avoided {
                transaction = transaction.remove_edge(duplicate, edge.target);
            }
        }
    }

    (graph.apply(&transaction), duplicate)
}

/// Route cost measured on the shared graph, treating forks as their originals.
fn resolved_cost(base: &Graph, forked: &PersistentGraph, nodes: &[CircuitNode]) -> u32 {
    nodes
        .windows(2)
        .map(|pair| {
            base.edge_weight(&pair[0].with_generation(0), &pair[1].with_generation(0))
                .or_else(|| forked.edge_weight(&pair[0], &pair[1]))
                .unwrap_or_else(|| {
                    tracing::warn!(
                        "resolved route uses missing edge {} -> {}; counting it as free",
                        pair[0],
                        pair[1]
                    );
                    0
                })
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::CarState;
    use crate::graph::{CRASH_COST, MOVE_COST};
    use crate::observer::NoopObserver;
    use crate::routing::BfsPlanner;
    use crate::track::CellKind;

    fn at(x: i32, y: i32, cell: CellKind) -> CircuitNode {
        CircuitNode::new(CarState::parked(Coordinates::new(x, y)), cell)
    }

    /// Two cars, one shared middle cell, and a detour for the second car.
    ///
    /// ```text
    /// a0 -> m -> f
    /// b0 -> m
    /// b0 -> d -> f
    /// ```
    fn crossing() -> (Graph, CircuitNode, CircuitNode, CircuitNode, CircuitNode, CircuitNode) {
        let a0 = at(0, 0, CellKind::Start);
        let b0 = at(0, 2, CellKind::Start);
        let m = at(1, 1, CellKind::Track);
        let d = at(1, 2, CellKind::Track);
        let f = at(2, 1, CellKind::Finish);
        let mut graph = Graph::new();
        graph.add_edge(a0, m, MOVE_COST);
        graph.add_edge(b0, m, MOVE_COST);
        graph.add_edge(b0, d, MOVE_COST);
        graph.add_edge(m, f, MOVE_COST);
        graph.add_edge(d, f, MOVE_COST);
        for node in [a0, b0, m, d] {
            graph.set_heuristic(node, 1);
        }
        (graph, a0, b0, m, d, f)
    }

    #[test]
    fn later_car_is_rerouted_around_contested_cell() {
        let (graph, a0, b0, m, d, f) = crossing();
        let routes = vec![
            Route {
                nodes: vec![a0, m, f],
                cost: 2,
            },
            Route {
                nodes: vec![b0, m, f],
                cost: 2,
            },
        ];
        let finishes = HashSet::from([f]);

        let resolved =
            resolve_collisions(&graph, routes, &finishes, &BfsPlanner, &mut NoopObserver);

        assert_eq!(resolved[0].nodes, vec![a0, m, f]);
        assert_eq!(resolved[1].nodes, vec![b0.with_generation(1), d, f]);
        assert_eq!(resolved[1].cost, 2);
        // The shared graph is never edited.
        assert_eq!(graph.edge_weight(&b0, &m), Some(MOVE_COST));
        assert!(!graph.contains(&b0.with_generation(1)));
    }

    #[test]
    fn cars_arriving_on_the_finish_together_are_exempt() {
        let (graph, a0, b0, m, d, f) = crossing();
        let routes = vec![
            Route {
                nodes: vec![a0, m, f],
                cost: 2,
            },
            Route {
                nodes: vec![b0, d, f],
                cost: 2,
            },
        ];
        let finishes = HashSet::from([f]);
        let resolved = resolve_collisions(
            &graph,
            routes.clone(),
            &finishes,
            &BfsPlanner,
            &mut NoopObserver,
        );
        assert_eq!(resolved, routes);
    }

    #[test]
    fn fork_redirects_incoming_edges_and_drops_blocked_moves() {
        let (graph, a0, b0, m, d, _) = crossing();
        let persistent = PersistentGraph::from_graph(&graph);
        let blocked = HashSet::from([m.pos()]);

        let (forked, duplicate) = fork_node(&persistent, b0, &blocked, None);
        assert_eq!(duplicate, b0.with_generation(1));
        assert_eq!(forked.edge_weight(&duplicate, &d), Some(MOVE_COST));
        assert_eq!(forked.edge_weight(&duplicate, &m), None);
        assert_eq!(forked.heuristic(&duplicate), 1);
        // The version that was forked still sees the original edges.
        assert_eq!(persistent.edge_weight(&b0, &m), Some(MOVE_COST));
        assert!(!persistent.contains(&duplicate));

        let (forked_m, dup_m) = fork_node(&forked, m, &HashSet::new(), None);
        assert_eq!(forked_m.edge_weight(&a0, &dup_m), Some(MOVE_COST));
        assert_eq!(forked_m.edge_weight(&a0, &m), None);
        assert!(forked_m.predecessors(&m).is_empty());
    }

    #[test]
    fn crash_forks_keep_every_transition() {
        let wall = at(3, 3, CellKind::OutsideTrack);
        let recovery = at(2, 3, CellKind::Track);
        let mut graph = Graph::new();
        graph.add_edge(at(1, 3, CellKind::Track), wall, CRASH_COST);
        graph.add_edge(wall, recovery, 0);
        let persistent = PersistentGraph::from_graph(&graph);

        let blocked = HashSet::from([recovery.pos()]);
        let (forked, duplicate) = fork_node(&persistent, wall, &blocked, None);
        assert_eq!(forked.edge_weight(&duplicate, &recovery), Some(0));
    }

    #[test]
    fn crash_recovering_onto_a_claimed_cell_is_rerouted_before_the_crash() {
        // Car B crashes into `wall` and recovers on `m`, the cell car A reaches
        // at the same timestep.
        let a0 = at(0, 0, CellKind::Start);
        let a1 = at(1, 0, CellKind::Track);
        let m = at(2, 1, CellKind::Track);
        let f = at(3, 1, CellKind::Finish);
        let b0 = at(0, 2, CellKind::Start);
        let wall = at(0, 3, CellKind::OutsideTrack);
        let d = at(1, 2, CellKind::Track);
        let e = at(2, 2, CellKind::Track);
        let mut graph = Graph::new();
        graph.add_edge(a0, a1, MOVE_COST);
        graph.add_edge(a1, m, MOVE_COST);
        graph.add_edge(m, f, MOVE_COST);
        graph.add_edge(b0, wall, CRASH_COST);
        graph.add_edge(b0, d, MOVE_COST);
        graph.add_edge(wall, m, 0);
        graph.add_edge(d, e, MOVE_COST);
        graph.add_edge(e, f, MOVE_COST);

        let routes = vec![
            Route {
                nodes: vec![a0, a1, m, f],
                cost: 3,
            },
            Route {
                nodes: vec![b0, wall, m, f],
                cost: 26,
            },
        ];
        let finishes = HashSet::from([f]);

        let resolved =
            resolve_collisions(&graph, routes, &finishes, &BfsPlanner, &mut NoopObserver);

        assert_eq!(resolved[0].nodes, vec![a0, a1, m, f]);
        assert_eq!(resolved[1].nodes, vec![b0.with_generation(1), d, e, f]);
        assert_eq!(resolved[1].cost, 3);
    }

    #[test]
    fn fork_drops_every_generation_of_the_avoided_vertex() {
        let wall = at(0, 3, CellKind::OutsideTrack);
        let start = at(0, 2, CellKind::Start);
        let side = at(1, 2, CellKind::Track);
        let mut graph = Graph::new();
        graph.add_edge(start, wall.with_generation(2), CRASH_COST);
        graph.add_edge(start, side, MOVE_COST);
        let persistent = PersistentGraph::from_graph(&graph);

        let (forked, duplicate) =
            fork_node(&persistent, start, &HashSet::new(), Some(wall.with_generation(1)));
        assert_eq!(forked.neighbours(&duplicate).len(), 1);
        assert_eq!(forked.edge_weight(&duplicate, &side), Some(MOVE_COST));
    }

    #[test]
    fn reroute_index_steps_back_over_crash_vertices() {
        let route = Route {
            nodes: vec![
                at(0, 0, CellKind::Start),
                at(0, 3, CellKind::OutsideTrack),
                at(0, 1, CellKind::Track),
            ],
            cost: 25,
        };
        assert_eq!(reroute_index(&route, 0), 0);
        assert_eq!(reroute_index(&route, 1), 0);
        assert_eq!(reroute_index(&route, 2), 2);
    }

    #[test]
    fn generation_skips_existing_forks() {
        let (graph, _, b0, _, _, _) = crossing();
        let persistent = PersistentGraph::from_graph(&graph).add_node(b0.with_generation(1));
        let (_, duplicate) = fork_node(&persistent, b0, &HashSet::new(), None);
        assert_eq!(duplicate.generation, 2);
    }
}

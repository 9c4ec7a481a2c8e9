use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::graph::{Adjacency, CircuitNode};

/// Path through the state-space graph with its accumulated edge weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub nodes: Vec<CircuitNode>,
    pub cost: u32,
}

impl Route {
    /// Number of moves (edges) in the route.
    pub fn hop_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn last(&self) -> Option<&CircuitNode> {
        self.nodes.last()
    }

    pub fn reaches_finish(&self) -> bool {
        self.last().is_some_and(CircuitNode::is_finish)
    }
}

/// Parent pointer: predecessor and the weight of the edge taken from it.
type Parents = HashMap<CircuitNode, (CircuitNode, u32)>;

/// Depth-first search returning the first route that reaches any target.
///
/// Neighbours are explored in adjacency order using an explicit stack, so
/// deep state spaces cannot overflow the call stack. The route is not
/// guaranteed to be cheapest.
pub fn find_route_dfs<A: Adjacency + ?Sized>(
    graph: &A,
    start: CircuitNode,
    targets: &HashSet<CircuitNode>,
) -> Option<Route> {
    let mut visited: HashSet<CircuitNode> = HashSet::new();
    let mut parents: Parents = HashMap::new();
    let mut stack: Vec<(CircuitNode, Option<(CircuitNode, u32)>)> = vec![(start, None)];

    while let Some((node, via)) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        if let Some(via) = via {
            parents.insert(node, via);
        }
        if targets.contains(&node) {
            return Some(reconstruct_route(&parents, start, node));
        }

        // Reverse so the first neighbour is popped first.
        for edge in graph.neighbours(&node).iter().rev() {
            if !visited.contains(&edge.target) {
                stack.push((edge.target, Some((node, edge.weight))));
            }
        }
    }

    None
}

/// Breadth-first search: the returned route has the fewest moves, not
/// necessarily the lowest cost.
pub fn find_route_bfs<A: Adjacency + ?Sized>(
    graph: &A,
    start: CircuitNode,
    targets: &HashSet<CircuitNode>,
) -> Option<Route> {
    if targets.contains(&start) {
        return Some(single_node_route(start));
    }

    let mut parents: Parents = HashMap::new();
    let mut visited: HashSet<CircuitNode> = HashSet::new();
    let mut queue = VecDeque::new();

    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for edge in graph.neighbours(&current) {
            let next = edge.target;
            if !visited.insert(next) {
                continue;
            }

            parents.insert(next, (current, edge.weight));
            if targets.contains(&next) {
                return Some(reconstruct_route(&parents, start, next));
            }
            queue.push_back(next);
        }
    }

    None
}

/// Greedy best-first search ranked by heuristic only.
pub fn find_route_greedy<A: Adjacency + ?Sized>(
    graph: &A,
    start: CircuitNode,
    targets: &HashSet<CircuitNode>,
) -> Option<Route> {
    let mut open_set: HashSet<CircuitNode> = HashSet::new();
    let mut closed_set: HashSet<CircuitNode> = HashSet::new();
    let mut parents: Parents = HashMap::new();
    let mut frontier = Frontier::default();

    open_set.insert(start);
    frontier.push(start, u64::from(graph.heuristic(&start)), 0);

    while let Some(entry) = frontier.pop() {
        let node = entry.node;
        if targets.contains(&node) {
            return Some(reconstruct_route(&parents, start, node));
        }

        open_set.remove(&node);
        closed_set.insert(node);

        for edge in graph.neighbours(&node) {
            let next = edge.target;
            if open_set.contains(&next) || closed_set.contains(&next) {
                continue;
            }
            open_set.insert(next);
            parents.insert(next, (node, edge.weight));
            frontier.push(next, u64::from(graph.heuristic(&next)), 0);
        }
    }

    None
}

/// A* search ranked by accumulated cost plus heuristic.
///
/// The route is cheapest whenever the heuristic never overestimates the
/// remaining cost. The Manhattan heuristic used by the builder can, because a
/// single move may cover several cells; results are then near-optimal.
pub fn find_route_a_star<A: Adjacency + ?Sized>(
    graph: &A,
    start: CircuitNode,
    targets: &HashSet<CircuitNode>,
) -> Option<Route> {
    let mut g_score: HashMap<CircuitNode, u64> = HashMap::new();
    let mut parents: Parents = HashMap::new();
    let mut frontier = Frontier::default();

    g_score.insert(start, 0);
    frontier.push(start, u64::from(graph.heuristic(&start)), 0);

    while let Some(entry) = frontier.pop() {
        let node = entry.node;
        let current_g = match g_score.get(&node) {
            Some(&g) if g < entry.cost => continue,
            Some(&g) => g,
            None => continue,
        };

        if targets.contains(&node) {
            return Some(reconstruct_route(&parents, start, node));
        }

        for edge in graph.neighbours(&node) {
            let next = edge.target;
            let tentative_g = current_g + u64::from(edge.weight);
            if tentative_g < *g_score.get(&next).unwrap_or(&u64::MAX) {
                g_score.insert(next, tentative_g);
                parents.insert(next, (node, edge.weight));
                let estimate = tentative_g + u64::from(graph.heuristic(&next));
                frontier.push(next, estimate, tentative_g);
            }
        }
    }

    None
}

fn single_node_route(node: CircuitNode) -> Route {
    Route {
        nodes: vec![node],
        cost: 0,
    }
}

fn reconstruct_route(parents: &Parents, start: CircuitNode, goal: CircuitNode) -> Route {
    let mut nodes = vec![goal];
    let mut cost = 0u32;
    let mut current = goal;
    while current != start {
        let Some(&(parent, weight)) = parents.get(&current) else {
            break;
        };
        cost += weight;
        nodes.push(parent);
        current = parent;
    }
    nodes.reverse();
    Route { nodes, cost }
}

/// Min-priority queue whose ties pop in insertion order.
#[derive(Debug, Default)]
struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_seq: u64,
}

impl Frontier {
    fn push(&mut self, node: CircuitNode, score: u64, cost: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(FrontierEntry {
            node,
            score,
            cost,
            seq,
        });
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct FrontierEntry {
    node: CircuitNode,
    score: u64,
    cost: u64,
    seq: u64,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by score, then by age.
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::{CarState, Coordinates};
    use crate::graph::Graph;
    use crate::track::CellKind;

    fn node(x: i32) -> CircuitNode {
        CircuitNode::new(CarState::parked(Coordinates::new(x, 0)), CellKind::Track)
    }

    fn finish(x: i32) -> CircuitNode {
        CircuitNode::new(CarState::parked(Coordinates::new(x, 0)), CellKind::Finish)
    }

    /// 0 -> 1 -> 4 (cost 20 via 1) and 0 -> 2 -> 3 -> 4 (cost 3).
    fn diamond() -> (Graph, HashSet<CircuitNode>) {
        let mut graph = Graph::new();
        graph.add_edge(node(0), node(1), 10);
        graph.add_edge(node(0), node(2), 1);
        graph.add_edge(node(1), finish(4), 10);
        graph.add_edge(node(2), node(3), 1);
        graph.add_edge(node(3), finish(4), 1);
        graph.set_heuristic(node(0), 2);
        graph.set_heuristic(node(1), 1);
        graph.set_heuristic(node(2), 2);
        graph.set_heuristic(node(3), 1);
        graph.set_heuristic(finish(4), 0);
        (graph, HashSet::from([finish(4)]))
    }

    #[test]
    fn dfs_follows_first_neighbour() {
        let (graph, targets) = diamond();
        let route = find_route_dfs(&graph, node(0), &targets).expect("route");
        assert_eq!(route.nodes, vec![node(0), node(1), finish(4)]);
        assert_eq!(route.cost, 20);
    }

    #[test]
    fn bfs_minimises_hops() {
        let (graph, targets) = diamond();
        let route = find_route_bfs(&graph, node(0), &targets).expect("route");
        assert_eq!(route.hop_count(), 2);
        assert_eq!(route.cost, 20);
    }

    #[test]
    fn greedy_prefers_lower_heuristic() {
        let (graph, targets) = diamond();
        let route = find_route_greedy(&graph, node(0), &targets).expect("route");
        assert_eq!(route.nodes, vec![node(0), node(1), finish(4)]);
    }

    #[test]
    fn a_star_minimises_cost() {
        let (graph, targets) = diamond();
        let route = find_route_a_star(&graph, node(0), &targets).expect("route");
        assert_eq!(route.nodes, vec![node(0), node(2), node(3), finish(4)]);
        assert_eq!(route.cost, 3);
        assert_eq!(graph.path_cost(&route.nodes), Some(route.cost));
    }

    #[test]
    fn start_on_target_is_a_single_node_route() {
        let (graph, _) = diamond();
        let targets = HashSet::from([node(0)]);
        for route in [
            find_route_dfs(&graph, node(0), &targets),
            find_route_bfs(&graph, node(0), &targets),
            find_route_greedy(&graph, node(0), &targets),
            find_route_a_star(&graph, node(0), &targets),
        ] {
            let route = route.expect("route");
            assert_eq!(route.nodes, vec![node(0)]);
            assert_eq!(route.cost, 0);
        }
    }

    #[test]
    fn unreachable_targets_report_no_route() {
        let (graph, _) = diamond();
        let targets = HashSet::from([finish(9)]);
        assert!(find_route_dfs(&graph, node(0), &targets).is_none());
        assert!(find_route_bfs(&graph, node(0), &targets).is_none());
        assert!(find_route_greedy(&graph, node(0), &targets).is_none());
        assert!(find_route_a_star(&graph, node(0), &targets).is_none());
    }

    #[test]
    fn equal_scores_pop_in_insertion_order() {
        let mut frontier = Frontier::default();
        frontier.push(node(5), 3, 0);
        frontier.push(node(6), 3, 0);
        frontier.push(node(7), 1, 0);
        let order: Vec<_> = std::iter::from_fn(|| frontier.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec![node(7), node(5), node(6)]);
    }

    #[test]
    fn cycles_do_not_trap_searches() {
        let mut graph = Graph::new();
        graph.add_edge(node(0), node(1), 1);
        graph.add_edge(node(1), node(0), 1);
        graph.add_edge(node(1), node(1), 1);
        let targets = HashSet::from([finish(3)]);
        assert!(find_route_dfs(&graph, node(0), &targets).is_none());
        assert!(find_route_greedy(&graph, node(0), &targets).is_none());
        assert!(find_route_a_star(&graph, node(0), &targets).is_none());
    }
}

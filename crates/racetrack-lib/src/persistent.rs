//! Persistent graph with batched, copy-on-write edits.
//!
//! A [`PersistentGraph`] is never modified in place. Every edit returns a new
//! version that shares all untouched structure with the version it came from.
//! Vertices are spread over a fixed number of hash buckets, and each vertex
//! owns its outgoing edge list behind an [`Arc`]. An edit copies the bucket
//! holding the vertex and that vertex's edge list; everything else stays
//! shared. Applying a [`Transaction`] copies each touched bucket and edge list
//! at most once, however many operations in the batch touch it.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::graph::{Adjacency, CircuitNode, Edge, Graph};

/// Number of copy-on-write buckets per map.
pub const BUCKET_COUNT: usize = 64;

/// One edit recorded in a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphOp {
    AddEdge {
        from: CircuitNode,
        to: CircuitNode,
        weight: u32,
    },
    RemoveEdge {
        from: CircuitNode,
        to: CircuitNode,
    },
    AddNode(CircuitNode),
    SetHeuristic {
        node: CircuitNode,
        value: u32,
    },
}

/// Ordered batch of graph edits, applied together by [`PersistentGraph::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    ops: Vec<GraphOp>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(mut self, from: CircuitNode, to: CircuitNode, weight: u32) -> Self {
        self.ops.push(GraphOp::AddEdge { from, to, weight });
        self
    }

    pub fn remove_edge(mut self, from: CircuitNode, to: CircuitNode) -> Self {
        self.ops.push(GraphOp::RemoveEdge { from, to });
        self
    }

    pub fn add_node(mut self, node: CircuitNode) -> Self {
        self.ops.push(GraphOp::AddNode(node));
        self
    }

    pub fn set_heuristic(mut self, node: CircuitNode, value: u32) -> Self {
        self.ops.push(GraphOp::SetHeuristic { node, value });
        self
    }

    pub fn ops(&self) -> &[GraphOp] {
        &self.ops
    }
}

/// Hash map split into shared buckets; writes copy only the bucket they touch.
#[derive(Debug, Clone)]
struct BucketMap<V> {
    buckets: Vec<Arc<HashMap<CircuitNode, V>>>,
}

impl<V: Clone> BucketMap<V> {
    fn new() -> Self {
        Self {
            buckets: (0..BUCKET_COUNT).map(|_| Arc::new(HashMap::new())).collect(),
        }
    }

    fn index(node: &CircuitNode) -> usize {
        let mut hasher = DefaultHasher::new();
        node.hash(&mut hasher);
        (hasher.finish() % BUCKET_COUNT as u64) as usize
    }

    fn get(&self, node: &CircuitNode) -> Option<&V> {
        self.buckets[Self::index(node)].get(node)
    }

    fn contains(&self, node: &CircuitNode) -> bool {
        self.buckets[Self::index(node)].contains_key(node)
    }

    /// Writable bucket for `node`, copied first if another version shares it.
    fn bucket_mut(&mut self, node: &CircuitNode) -> &mut HashMap<CircuitNode, V> {
        Arc::make_mut(&mut self.buckets[Self::index(node)])
    }

    fn insert(&mut self, node: CircuitNode, value: V) {
        self.bucket_mut(&node).insert(node, value);
    }

    fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }

    fn iter(&self) -> impl Iterator<Item = (&CircuitNode, &V)> {
        self.buckets.iter().flat_map(|bucket| bucket.iter())
    }

    fn bucket_ptr(&self, node: &CircuitNode) -> *const HashMap<CircuitNode, V> {
        Arc::as_ptr(&self.buckets[Self::index(node)])
    }
}

/// Immutable, structurally shared version of a state-space graph.
#[derive(Debug, Clone)]
pub struct PersistentGraph {
    adjacency: BucketMap<Arc<Vec<Edge>>>,
    predecessors: BucketMap<Arc<Vec<CircuitNode>>>,
    heuristics: BucketMap<u32>,
}

impl Default for PersistentGraph {
    fn default() -> Self {
        Self {
            adjacency: BucketMap::new(),
            predecessors: BucketMap::new(),
            heuristics: BucketMap::new(),
        }
    }
}

impl PersistentGraph {
    /// Wrap a built graph, preserving each vertex's edge order.
    pub fn from_graph(graph: &Graph) -> Self {
        let mut persistent = Self::default();
        let mut incoming: HashMap<CircuitNode, Vec<CircuitNode>> = HashMap::new();

        for node in graph.nodes() {
            let edges = graph.neighbours(node).to_vec();
            for edge in &edges {
                incoming.entry(edge.target).or_default().push(*node);
            }
            persistent.adjacency.insert(*node, Arc::new(edges));
            if let Some(value) = graph.heuristic_of(node) {
                persistent.heuristics.insert(*node, value);
            }
        }
        for (node, mut sources) in incoming {
            sources.sort();
            persistent.predecessors.insert(node, Arc::new(sources));
        }

        persistent
    }

    /// Produce a new version with every operation of `transaction` applied in
    /// order. `self` is left untouched.
    pub fn apply(&self, transaction: &Transaction) -> PersistentGraph {
        let mut next = self.clone();
        for op in transaction.ops() {
            next.apply_op(op);
        }
        next
    }

    pub fn add_edge(&self, from: CircuitNode, to: CircuitNode, weight: u32) -> PersistentGraph {
        self.apply(&Transaction::new().add_edge(from, to, weight))
    }

    pub fn remove_edge(&self, from: CircuitNode, to: CircuitNode) -> PersistentGraph {
        self.apply(&Transaction::new().remove_edge(from, to))
    }

    pub fn add_node(&self, node: CircuitNode) -> PersistentGraph {
        self.apply(&Transaction::new().add_node(node))
    }

    pub fn set_heuristic(&self, node: CircuitNode, value: u32) -> PersistentGraph {
        self.apply(&Transaction::new().set_heuristic(node, value))
    }

    /// Sources of every edge pointing at `node`, in node order.
    pub fn predecessors(&self, node: &CircuitNode) -> &[CircuitNode] {
        self.predecessors
            .get(node)
            .map(|sources| sources.as_slice())
            .unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CircuitNode> {
        self.adjacency.iter().map(|(node, _)| node)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|(_, edges)| edges.len()).sum()
    }

    /// Whether `node`'s outgoing edge list is the same allocation in both versions.
    pub fn shares_edges_with(&self, other: &PersistentGraph, node: &CircuitNode) -> bool {
        match (self.adjacency.get(node), other.adjacency.get(node)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether the bucket holding `node` is shared between both versions.
    pub fn shares_bucket_with(&self, other: &PersistentGraph, node: &CircuitNode) -> bool {
        std::ptr::eq(
            self.adjacency.bucket_ptr(node),
            other.adjacency.bucket_ptr(node),
        )
    }

    fn apply_op(&mut self, op: &GraphOp) {
        match *op {
            GraphOp::AddNode(node) => self.insert_node(node),
            GraphOp::AddEdge { from, to, weight } => self.insert_edge(from, to, weight),
            GraphOp::RemoveEdge { from, to } => self.delete_edge(from, to),
            GraphOp::SetHeuristic { node, value } => self.heuristics.insert(node, value),
        }
    }

    fn insert_node(&mut self, node: CircuitNode) {
        if !self.adjacency.contains(&node) {
            self.adjacency.insert(node, Arc::new(Vec::new()));
        }
    }

    fn insert_edge(&mut self, from: CircuitNode, to: CircuitNode, weight: u32) {
        self.insert_node(to);
        let edges = Arc::make_mut(self.adjacency.bucket_mut(&from).entry(from).or_default());
        match edges.iter_mut().find(|edge| edge.target == to) {
            Some(existing) => existing.weight = weight,
            None => {
                edges.push(Edge { target: to, weight });
                let sources =
                    Arc::make_mut(self.predecessors.bucket_mut(&to).entry(to).or_default());
                if let Err(index) = sources.binary_search(&from) {
                    sources.insert(index, from);
                }
            }
        }
    }

    fn delete_edge(&mut self, from: CircuitNode, to: CircuitNode) {
        let present = self
            .adjacency
            .get(&from)
            .is_some_and(|edges| edges.iter().any(|edge| edge.target == to));
        if !present {
            return;
        }

        if let Some(edges) = self.adjacency.bucket_mut(&from).get_mut(&from) {
            Arc::make_mut(edges).retain(|edge| edge.target != to);
        }
        if let Some(sources) = self.predecessors.bucket_mut(&to).get_mut(&to) {
            Arc::make_mut(sources).retain(|source| *source != from);
        }
    }
}

impl Adjacency for PersistentGraph {
    fn neighbours(&self, node: &CircuitNode) -> &[Edge] {
        self.adjacency
            .get(node)
            .map(|edges| edges.as_slice())
            .unwrap_or(&[])
    }

    fn heuristic_of(&self, node: &CircuitNode) -> Option<u32> {
        self.heuristics.get(node).copied()
    }

    fn contains(&self, node: &CircuitNode) -> bool {
        self.adjacency.contains(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::{CarState, Coordinates};
    use crate::track::CellKind;

    fn node(x: i32) -> CircuitNode {
        CircuitNode::new(CarState::parked(Coordinates::new(x, 0)), CellKind::Track)
    }

    fn base() -> PersistentGraph {
        let mut graph = Graph::new();
        for x in 0..200 {
            graph.add_edge(node(x), node(x + 1), 1);
            graph.set_heuristic(node(x), (200 - x) as u32);
        }
        PersistentGraph::from_graph(&graph)
    }

    #[test]
    fn from_graph_keeps_edges_heuristics_and_predecessors() {
        let graph = base();
        assert_eq!(graph.node_count(), 201);
        assert_eq!(graph.edge_count(), 200);
        assert_eq!(graph.edge_weight(&node(3), &node(4)), Some(1));
        assert_eq!(graph.heuristic(&node(3)), 197);
        assert_eq!(graph.predecessors(&node(4)), &[node(3)]);
    }

    #[test]
    fn single_edits_leave_the_receiver_untouched() {
        let graph = base();
        let edited = graph
            .add_edge(node(0), node(5), 3)
            .remove_edge(node(1), node(2))
            .set_heuristic(node(0), 7)
            .add_node(node(-1));

        assert_eq!(graph.edge_weight(&node(0), &node(5)), None);
        assert_eq!(graph.edge_weight(&node(1), &node(2)), Some(1));
        assert_eq!(graph.heuristic(&node(0)), 200);
        assert!(!graph.contains(&node(-1)));

        assert_eq!(edited.edge_weight(&node(0), &node(5)), Some(3));
        assert_eq!(edited.edge_weight(&node(1), &node(2)), None);
        assert_eq!(edited.heuristic(&node(0)), 7);
        assert!(edited.contains(&node(-1)));
        assert_eq!(edited.predecessors(&node(5)), &[node(0), node(4)]);
        assert!(edited.predecessors(&node(2)).is_empty());
    }

    #[test]
    fn untouched_vertices_stay_shared() {
        let graph = base();
        let edited = graph.apply(
            &Transaction::new()
                .add_edge(node(10), node(20), 2)
                .add_edge(node(10), node(30), 2)
                .remove_edge(node(10), node(11)),
        );

        assert!(!edited.shares_edges_with(&graph, &node(10)));
        assert!(edited.shares_edges_with(&graph, &node(50)));
        assert!(edited.shares_edges_with(&graph, &node(150)));
        let targets: Vec<_> = edited.neighbours(&node(10)).iter().map(|e| e.target).collect();
        assert_eq!(targets, vec![node(20), node(30)]);
    }

    #[test]
    fn untouched_buckets_stay_shared() {
        let graph = base();
        let edited = graph.add_edge(node(10), node(20), 2);
        let shared = graph
            .nodes()
            .filter(|n| edited.shares_bucket_with(&graph, n))
            .count();
        // Only the buckets of node(10) (edges) changed; most of the graph is shared.
        assert!(shared > graph.node_count() / 2);
        assert!(!edited.shares_bucket_with(&graph, &node(10)));
    }

    #[test]
    fn removing_a_missing_edge_is_a_no_op() {
        let graph = base();
        let edited = graph.remove_edge(node(0), node(9));
        assert_eq!(edited.edge_count(), graph.edge_count());
        assert!(edited.shares_bucket_with(&graph, &node(0)));
    }

    #[test]
    fn empty_transaction_is_an_equal_version() {
        let graph = base();
        let same = graph.apply(&Transaction::new());
        assert!(same.shares_edges_with(&graph, &node(0)));
        assert_eq!(same.node_count(), graph.node_count());
    }
}

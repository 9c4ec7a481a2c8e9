//! Progress reporting for long-running graph work.
//!
//! The state-space builder and the collision resolver report through a
//! [`BuildObserver`] handed in by the caller. [`TracingObserver`] forwards
//! events to `tracing`; [`NoopObserver`] drops them.

use crate::car::Coordinates;

/// Receives progress events from the builder and the collision resolver.
///
/// Every method has an empty default so implementors only override what they
/// care about.
pub trait BuildObserver {
    /// Called once before expansion starts, with the number of seed nodes.
    fn on_build_start(&mut self, _seeds: usize) {}

    /// Called after a node has been expanded and closed.
    fn on_node_expanded(&mut self, _closed: usize, _queued: usize) {}

    /// Called once the graph and its heuristics are complete.
    fn on_build_complete(&mut self, _nodes: usize, _edges: usize) {}

    /// Called when a car's route is rewritten around a contested cell.
    fn on_collision(&mut self, _timestep: usize, _car: usize, _contested: Coordinates) {}

    /// Called when collision resolution has processed every timestep.
    fn on_resolution_complete(&mut self, _timesteps: usize, _rewrites: usize) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {}

/// Observer that logs progress through `tracing`.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    report_every: usize,
}

impl TracingObserver {
    /// Log expansion progress every `report_every` closed nodes.
    pub fn new(report_every: usize) -> Self {
        Self {
            report_every: report_every.max(1),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl BuildObserver for TracingObserver {
    fn on_build_start(&mut self, seeds: usize) {
        tracing::debug!("expanding state space from {} start node(s)", seeds);
    }

    fn on_node_expanded(&mut self, closed: usize, queued: usize) {
        if closed % self.report_every == 0 {
            tracing::debug!("expanded {} nodes, {} queued", closed, queued);
        }
    }

    fn on_build_complete(&mut self, nodes: usize, edges: usize) {
        tracing::info!("state-space graph built: {} nodes, {} edges", nodes, edges);
    }

    fn on_collision(&mut self, timestep: usize, car: usize, contested: Coordinates) {
        tracing::debug!(
            "car {} rerouted at timestep {} around contested cell {}",
            car,
            timestep,
            contested
        );
    }

    fn on_resolution_complete(&mut self, timesteps: usize, rewrites: usize) {
        tracing::info!(
            "collision resolution finished after {} timestep(s), {} rewrite(s)",
            timesteps,
            rewrites
        );
    }
}

//! Off-thread race planning.
//!
//! Building the state space for a large map can take a while. [`spawn_race`]
//! moves the work onto tokio's blocking pool and hands back a one-shot
//! receiver that resolves once the plan is ready.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::routing::{plan_race, RacePlan, RaceRequest};
use crate::track::Track;

/// Completed race together with the track it was planned on.
#[derive(Debug, Clone)]
pub struct RaceOutcome {
    pub track: Arc<Track>,
    pub plan: RacePlan,
}

/// Plan a race on tokio's blocking pool.
///
/// Must be called from within a tokio runtime. The receiver yields exactly one
/// value; dropping it discards the result without cancelling the computation.
pub fn spawn_race(
    track: Arc<Track>,
    request: RaceRequest,
) -> oneshot::Receiver<Result<RaceOutcome>> {
    let (sender, receiver) = oneshot::channel();
    tokio::task::spawn_blocking(move || {
        let outcome = plan_race(&track, &request).map(|plan| RaceOutcome { track, plan });
        if sender.send(outcome).is_err() {
            tracing::debug!("race result dropped: receiver went away");
        }
    });
    receiver
}

/// Await a receiver returned by [`spawn_race`].
pub async fn wait_for_race(
    receiver: oneshot::Receiver<Result<RaceOutcome>>,
) -> Result<RaceOutcome> {
    receiver.await.map_err(|_| Error::WorkerStopped)?
}

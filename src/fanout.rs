//! Concurrent fan-out of world operations within one request.
//!
//! Every operation is spawned as a detached task up front and its handle is
//! awaited until all have finished, so each operation is observed exactly once
//! whether it succeeds or fails. Dropping the coordinator (a client that goes
//! away mid-request) only detaches the handles; dispatched operations still run
//! to completion. Results are kept in completion order.

use futures::stream::{FuturesUnordered, StreamExt};
use std::{future::Future, sync::Arc};
use tracing::{debug, error};

use crate::{Error, Store, World};

/// Runs `count` instances of `operation` concurrently and collects their worlds.
///
/// The first failure to complete is returned once every operation has finished;
/// later failures are only logged.
pub async fn fan_out<F, Fut>(count: usize, operation: F) -> Result<Vec<World>, Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<World, Error>> + Send + 'static,
{
    let mut pending: FuturesUnordered<_> = (0..count).map(|_| tokio::spawn(operation())).collect();

    let mut worlds = Vec::with_capacity(count);
    let mut failure = None;
    while let Some(joined) = pending.next().await {
        let outcome = joined.unwrap_or_else(|join_error| {
            error!("World operation did not complete: {join_error}");
            Err(Error::Unknown)
        });
        match outcome {
            Ok(world) => worlds.push(world),
            Err(err) if failure.is_none() => failure = Some(err),
            Err(err) => debug!("Dropping additional failure: {err}"),
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(worlds),
    }
}

/// Fetches `count` random worlds.
pub async fn fetch_worlds(store: &Arc<dyn Store>, count: usize) -> Result<Vec<World>, Error> {
    fan_out(count, || fetch_one(Arc::clone(store))).await
}

/// Fetches `count` random worlds and gives each a new random number. Only rows
/// whose fetch and update both succeeded are returned, in their updated state.
pub async fn update_worlds(store: &Arc<dyn Store>, count: usize) -> Result<Vec<World>, Error> {
    fan_out(count, || fetch_and_update(Arc::clone(store))).await
}

async fn fetch_one(store: Arc<dyn Store>) -> Result<World, Error> {
    store.random_world().await
}

async fn fetch_and_update(store: Arc<dyn Store>) -> Result<World, Error> {
    let world = store.random_world().await?;
    store.update_world(world.id).await
}

use crate::{
    DigestStore, Error, HashJobs, IdAllocator, JobObserver, LatencySample, NoopObserver,
    RequestId, Result, ShutdownCoordinator, Snapshot, StatsAggregator, StopOutcome,
};
use bytes::Bytes;
use core::{future::Future, time::Duration};
use std::{sync::Arc, time::Instant};

/// Default delay before a submitted value is hashed.
pub const DEFAULT_HASH_DELAY: Duration = Duration::from_secs(5);

/// An accepted submission and the latency sample recorded for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Accepted {
    pub id: RequestId,
    pub latency: LatencySample,
}

/// Facade over the hashing components.
///
/// Cloning is cheap; every clone shares the same allocator, store, jobs,
/// statistics, and shutdown state.
#[derive(Clone, Debug)]
pub struct HashService {
    ids: Arc<IdAllocator>,
    store: Arc<DigestStore>,
    jobs: HashJobs,
    stats: Arc<StatsAggregator>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl HashService {
    /// Creates a service that hashes submissions after `hash_delay` and
    /// gives shutdown `shutdown_timeout` to drain.
    pub fn new(hash_delay: Duration, shutdown_timeout: Duration) -> Self {
        Self::with_observer(hash_delay, shutdown_timeout, Arc::new(NoopObserver))
    }

    /// Like [`Self::new`], reporting hash job lifecycle events to `observer`.
    pub fn with_observer(
        hash_delay: Duration,
        shutdown_timeout: Duration,
        observer: Arc<dyn JobObserver>,
    ) -> Self {
        let store = Arc::new(DigestStore::new());
        Self {
            ids: Arc::new(IdAllocator::new()),
            jobs: HashJobs::with_observer(Arc::clone(&store), hash_delay, observer),
            store,
            stats: Arc::new(StatsAggregator::new()),
            shutdown: Arc::new(ShutdownCoordinator::new(shutdown_timeout)),
        }
    }

    /// Accepts a password, returning its id immediately and hashing it in the
    /// background. The latency sample starts now; see [`Self::submit_at`].
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceShutdown`] once shutdown has been triggered.
    /// - [`Error::InvalidRequest`] if `password` is empty.
    pub fn submit(&self, password: &str) -> Result<RequestId> {
        self.submit_at(password, Instant::now())
            .map(|accepted| accepted.id)
    }

    /// Accepts a password whose request handling began at `start`.
    ///
    /// Exactly one latency sample, spanning `start` to the moment the job is
    /// scheduled, is recorded per accepted submission. Rejected submissions
    /// allocate no id and record no sample.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit`].
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn submit_at(&self, password: &str, start: Instant) -> Result<Accepted> {
        if !self.shutdown.is_accepting() {
            return Err(Error::ServiceShutdown);
        }
        if password.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "password must not be empty".to_string(),
            });
        }

        // A trigger can land between the check above and the schedule below.
        // Behind the HTTP server this is harmless: `drain` waits for open
        // connections before closing the job set, so the job is tracked.
        // Direct callers racing `drain` may see the job abandoned at exit.
        let id = self.ids.allocate();
        self.jobs
            .submit(Bytes::copy_from_slice(password.as_bytes()), id);

        let latency = LatencySample::since(start);
        self.stats.record(latency);

        tracing::debug!(%id, "Submission accepted");
        Ok(Accepted { id, latency })
    }

    /// Returns the digest for `id`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] while the job is pending or if `id` was never
    /// issued.
    pub fn lookup(&self, id: RequestId) -> Result<String> {
        self.store.get(id).ok_or(Error::NotFound { id })
    }

    pub fn stats(&self) -> Snapshot {
        self.stats.snapshot()
    }

    /// Requests shutdown; see [`ShutdownCoordinator::trigger`].
    pub fn trigger_shutdown(&self) -> bool {
        self.shutdown.trigger()
    }

    /// Resolves once shutdown has been requested.
    pub fn shutdown_triggered(&self) -> impl Future<Output = ()> + Send + use<> {
        self.shutdown.triggered()
    }

    pub fn shutdown_coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    pub fn jobs(&self) -> &HashJobs {
        &self.jobs
    }

    /// Drains `connections` followed by every pending hash job, bounded by
    /// the shutdown timeout. On a forced stop the remaining jobs are
    /// cancelled.
    pub async fn drain<F>(&self, connections: F) -> StopOutcome
    where
        F: Future<Output = ()>,
    {
        let jobs = self.jobs.clone();
        let outcome = self
            .shutdown
            .drain(async move {
                connections.await;
                tracing::info!(pending = jobs.pending(), "Waiting for pending hash jobs");
                jobs.close();
                jobs.wait().await;
            })
            .await;

        if outcome == StopOutcome::Forced {
            tracing::warn!(
                abandoned = self.jobs.pending(),
                "Abandoning pending hash jobs"
            );
            self.jobs.cancel();
        }
        outcome
    }
}

impl Default for HashService {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DELAY, crate::DEFAULT_SHUTDOWN_TIMEOUT)
    }
}

#[cfg(test)]
mod tests;

//! Delayed hash jobs.
//!
//! A submission reserves its id in the [`DigestStore`] and hands the input to
//! [`HashJobs`], which spawns a detached Tokio task per job. The task sleeps
//! for the configured delay, hashes the input with [`digest()`], and records the
//! result. Callers never wait on a job and receive no completion signal.
//!
//! Every job is registered with a [`TaskTracker`] so shutdown can wait for the
//! outstanding ones, and observes a shared [`CancellationToken`] so a forced
//! stop can abandon them. An abandoned job simply never writes its digest.
//!
//! A [`JobObserver`] is told when each job is scheduled and when it finishes,
//! which is how the server keeps its pending-jobs gauge.

use crate::{DigestStore, RequestId, digest};
use bytes::Bytes;
use core::{fmt, time::Duration};
use std::sync::Arc;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::Instrument;

/// How a hash job left the job set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobEnd {
    Completed,
    Abandoned,
}

/// Receives hash job lifecycle events. Every [`scheduled`] call is matched by
/// exactly one [`finished`] call for the same id.
///
/// [`scheduled`]: JobObserver::scheduled
/// [`finished`]: JobObserver::finished
pub trait JobObserver: fmt::Debug + Send + Sync {
    fn scheduled(&self, _id: RequestId) {}
    fn finished(&self, _id: RequestId, _end: JobEnd) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl JobObserver for NoopObserver {}

#[derive(Clone, Debug)]
pub struct HashJobs {
    store: Arc<DigestStore>,
    delay: Duration,
    tracker: TaskTracker,
    cancel: CancellationToken,
    observer: Arc<dyn JobObserver>,
}

impl HashJobs {
    /// Creates a job runner writing into `store`, delaying each job by
    /// `delay`.
    pub fn new(store: Arc<DigestStore>, delay: Duration) -> Self {
        Self::with_observer(store, delay, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        store: Arc<DigestStore>,
        delay: Duration,
        observer: Arc<dyn JobObserver>,
    ) -> Self {
        Self {
            store,
            delay,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            observer,
        }
    }

    /// The delay applied by [`Self::submit`].
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules a job for `id` with the configured delay.
    pub fn submit(&self, input: Bytes, id: RequestId) {
        self.schedule(input, id, self.delay);
    }

    /// Schedules a job that records `digest(input)` under `id` once `delay`
    /// has elapsed.
    ///
    /// The id is reserved as pending before this returns, so a lookup racing
    /// with the job always sees either "pending" or the final digest.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&self, input: Bytes, id: RequestId, delay: Duration) {
        self.store.reserve(id);

        let store = Arc::clone(&self.store);
        let cancel = self.cancel.clone();
        let observer = Arc::clone(&self.observer);
        observer.scheduled(id);

        let fut = async move {
            let end = tokio::select! {
                () = tokio::time::sleep(delay) => {
                    store.put(id, digest(&input));
                    tracing::debug!("Digest recorded");
                    JobEnd::Completed
                }
                () = cancel.cancelled() => {
                    tracing::debug!("Hash job abandoned before completion");
                    JobEnd::Abandoned
                }
            };
            observer.finished(id, end);
        }
        .instrument(tracing::debug_span!("hash_job", %id));

        self.tracker.spawn(fut);
    }

    /// Number of jobs that have not finished yet.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Marks the job set as closed so [`Self::wait`] can resolve once it
    /// empties. Jobs can still be scheduled afterwards.
    pub fn close(&self) {
        self.tracker.close();
    }

    /// Waits until the job set is closed and every job has finished.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }

    /// Abandons every pending job. Digests that were not yet written never
    /// will be.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token observed by every job; cancelling it abandons them all.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    const ANGRY_MONKEY: &str =
        "ZEHhWB65gUlzdVwtDQArEyx+KVLzp/aTaRaPlBzYRIFj6vjFdqEb0Q5B8zVKCZ0vKbZPZklJz0Fd7su2A+gf7Q==";

    fn jobs(delay: Duration) -> (Arc<DigestStore>, HashJobs) {
        let store = Arc::new(DigestStore::new());
        let jobs = HashJobs::new(Arc::clone(&store), delay);
        (store, jobs)
    }

    #[derive(Debug, Default)]
    struct Recorder {
        events: Mutex<Vec<(RequestId, Option<JobEnd>)>>,
    }

    impl JobObserver for Recorder {
        fn scheduled(&self, id: RequestId) {
            self.events.lock().push((id, None));
        }

        fn finished(&self, id: RequestId, end: JobEnd) {
            self.events.lock().push((id, Some(end)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn digest_appears_after_delay() {
        let (store, jobs) = jobs(Duration::from_secs(5));
        assert_eq!(jobs.delay(), Duration::from_secs(5));
        let id = RequestId::new(1);

        jobs.submit(Bytes::from_static(b"angryMonkey"), id);
        assert!(store.is_pending(id));
        assert_eq!(jobs.pending(), 1);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(store.get(id), None);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.get(id).as_deref(), Some(ANGRY_MONKEY));
        assert_eq!(jobs.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_drains_outstanding_jobs() {
        let (store, jobs) = jobs(Duration::from_secs(5));
        for raw in 1..=3 {
            jobs.submit(Bytes::from(format!("secret-{raw}")), RequestId::new(raw));
        }

        jobs.close();
        jobs.wait().await;

        for raw in 1..=3 {
            let expected = digest(format!("secret-{raw}").as_bytes());
            assert_eq!(store.get(RequestId::new(raw)), Some(expected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_jobs_never_write() {
        let (store, jobs) = jobs(Duration::from_secs(5));
        let id = RequestId::new(9);
        jobs.submit(Bytes::from_static(b"angryMonkey"), id);

        jobs.cancel();
        jobs.close();
        jobs.wait().await;

        assert!(store.is_pending(id));
        assert_eq!(store.get(id), None);
    }

    #[tokio::test(start_paused = true)]
    async fn per_job_delay_overrides_default() {
        let (store, jobs) = jobs(Duration::from_secs(60));
        let id = RequestId::new(2);
        jobs.schedule(Bytes::from_static(b"angryMonkey"), id, Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.get(id).as_deref(), Some(ANGRY_MONKEY));
    }

    #[tokio::test(start_paused = true)]
    async fn observer_sees_every_job_start_and_end() {
        let recorder = Arc::new(Recorder::default());
        let store = Arc::new(DigestStore::new());
        let jobs = HashJobs::with_observer(
            Arc::clone(&store),
            Duration::from_secs(5),
            Arc::clone(&recorder) as Arc<dyn JobObserver>,
        );

        jobs.schedule(Bytes::from_static(b"a"), RequestId::new(1), Duration::from_secs(1));
        jobs.schedule(Bytes::from_static(b"b"), RequestId::new(2), Duration::from_secs(60));
        assert_eq!(
            *recorder.events.lock(),
            [(RequestId::new(1), None), (RequestId::new(2), None)]
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        jobs.cancel();
        jobs.close();
        jobs.wait().await;

        assert_eq!(
            recorder.events.lock()[2..],
            [
                (RequestId::new(1), Some(JobEnd::Completed)),
                (RequestId::new(2), Some(JobEnd::Abandoned)),
            ]
        );
    }
}

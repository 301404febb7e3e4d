//! Shutdown coordination.
//!
//! The service moves through `Accepting -> Draining -> Stopped`. A trigger
//! flips it to `Draining`, after which new submissions are refused while
//! already accepted work is given a bounded amount of time to finish. Once
//! the drain completes or times out the state becomes `Stopped`, which is
//! terminal.

use core::{future::Future, time::Duration};
use portable_atomic::{AtomicBool, AtomicU8, Ordering};
use tokio_util::sync::CancellationToken;

/// Default bound on how long a drain may take before the stop is forced.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Accepting = 0,
    Draining = 1,
    Stopped = 2,
}

impl ServiceState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Accepting,
            1 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// How the service reached [`ServiceState::Stopped`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// All in-flight work finished within the timeout.
    Clean,
    /// The timeout elapsed first; remaining work was abandoned.
    Forced,
}

#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: AtomicU8,
    forced: AtomicBool,
    draining: CancellationToken,
    timeout: Duration,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SHUTDOWN_TIMEOUT)
    }
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: AtomicU8::new(ServiceState::Accepting as u8),
            forced: AtomicBool::new(false),
            draining: CancellationToken::new(),
            timeout,
        }
    }

    pub fn state(&self) -> ServiceState {
        ServiceState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether new work may be started.
    pub fn is_accepting(&self) -> bool {
        self.state() == ServiceState::Accepting
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Requests shutdown.
    ///
    /// Returns `true` for the call that moved the service out of
    /// `Accepting`; every later call is a no-op returning `false`.
    pub fn trigger(&self) -> bool {
        let started = self
            .state
            .compare_exchange(
                ServiceState::Accepting as u8,
                ServiceState::Draining as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if started {
            tracing::info!("Shutdown requested, refusing new work");
            self.draining.cancel();
        } else {
            tracing::debug!(state = ?self.state(), "Shutdown already in progress");
        }
        started
    }

    /// Resolves once shutdown has been triggered.
    ///
    /// The returned future owns its handle, so it can be moved into spawned
    /// tasks or handed to a server's graceful-shutdown hook.
    pub fn triggered(&self) -> impl Future<Output = ()> + Send + use<> {
        self.draining.clone().cancelled_owned()
    }

    /// Waits up to the configured timeout for `work` to finish, then marks
    /// the service `Stopped`.
    ///
    /// A drain implies a trigger, so calling this without one still refuses
    /// new work. Once stopped, further calls return the recorded outcome
    /// without waiting.
    pub async fn drain<F>(&self, work: F) -> StopOutcome
    where
        F: Future<Output = ()>,
    {
        if self.state() == ServiceState::Stopped {
            return self.outcome();
        }
        if self.is_accepting() {
            self.trigger();
        }

        tracing::info!(timeout = ?self.timeout, "Draining in-flight work");

        let outcome = match tokio::time::timeout(self.timeout, work).await {
            Ok(()) => {
                tracing::info!("Service stopped");
                StopOutcome::Clean
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.timeout,
                    "Graceful drain timed out, forcing stop"
                );
                self.forced.store(true, Ordering::Release);
                StopOutcome::Forced
            }
        };

        self.state
            .store(ServiceState::Stopped as u8, Ordering::Release);
        outcome
    }

    fn outcome(&self) -> StopOutcome {
        if self.forced.load(Ordering::Acquire) {
            StopOutcome::Forced
        } else {
            StopOutcome::Clean
        }
    }
}

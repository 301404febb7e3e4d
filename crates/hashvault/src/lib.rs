//! # `hashvault`: delayed digest jobs with drain-aware shutdown
//!
//! `hashvault` is the core of a small password hashing service. A submission
//! is assigned a monotonically increasing [`RequestId`] right away, while the
//! SHA-512 digest of the submitted value is computed by a detached job after a
//! configurable delay and recorded in a shared [`DigestStore`].
//!
//! ## Components
//!
//! - [`digest()`] - SHA-512 rendered as padded standard base64.
//! - [`IdAllocator`] - lock-free, strictly increasing id issuance.
//! - [`DigestStore`] - write-once mapping from id to digest (or pending).
//! - [`HashJobs`] - tracked, cancellable delayed hash jobs.
//! - [`StatsAggregator`] - per-submission latency samples and averages.
//! - [`ShutdownCoordinator`] - `Accepting -> Draining -> Stopped` lifecycle.
//! - [`HashService`] - the facade a transport layer talks to.
//!
//! Each component is synchronized independently; none of them acquires
//! another's lock while holding its own.
//!
//! ## Example
//!
//! ```
//! use core::time::Duration;
//! use hashvault::HashService;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let service = HashService::new(Duration::from_secs(5), Duration::from_secs(10));
//! let id = service.submit("angryMonkey").unwrap();
//! assert_eq!(id.get(), 1);
//! // The digest is not available until the delay has elapsed.
//! assert!(service.lookup(id).is_err());
//! # }
//! ```

mod digest;
mod error;
mod id;
mod job;
mod service;
mod shutdown;
mod stats;
mod store;

pub use crate::digest::*;
pub use crate::error::*;
pub use crate::id::*;
pub use crate::job::*;
pub use crate::service::*;
pub use crate::shutdown::*;
pub use crate::stats::*;
pub use crate::store::*;

//! Error types for the hashing service.
//!
//! ## Error Cases
//! - `InvalidId`: a request id could not be parsed as a positive decimal.
//! - `InvalidRequest`: the submission was malformed or empty.
//! - `NotFound`: no digest is recorded for the id (pending or never issued).
//! - `ServiceShutdown`: work arrived after shutdown began.

use crate::RequestId;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the hashing service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The id segment of a lookup was not a decimal integer.
    #[error("Invalid hash id {raw}")]
    InvalidId { raw: String },

    /// The submission was rejected before any state was touched.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// No digest has been recorded for this id.
    ///
    /// Pending and never-allocated ids are deliberately reported the same way.
    #[error("Hash {id} not found")]
    NotFound { id: RequestId },

    /// The service has stopped accepting new work.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

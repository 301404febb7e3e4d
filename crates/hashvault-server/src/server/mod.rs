//! HTTP surface and process plumbing for the hashing service.
//!
//! ## Structure
//!
//! - [`config`] - CLI/environment configuration.
//! - [`http`] - axum router, handlers, and error mapping.
//! - [`telemetry`] - log subscriber and optional OpenTelemetry export.

pub mod config;
pub mod http;
pub mod telemetry;

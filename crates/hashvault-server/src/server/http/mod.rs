//! HTTP routing for the hashing service.
//!
//! | Path         | Method | Handler                    |
//! | ------------ | ------ | -------------------------- |
//! | `/hash`      | GET    | [`handler::form_page`]     |
//! | `/hash`      | POST   | [`handler::submit_hash`]   |
//! | `/hash/{id}` | GET    | [`handler::get_hash`]      |
//! | `/stats`     | GET    | [`handler::stats`]         |
//! | `/shutdown`  | any    | [`handler::shutdown`]      |
//!
//! Known paths answer unsupported methods with `405`; every other path is
//! `404`. The form page is compiled in; a file path given to [`router`]
//! replaces it.

pub mod error;
pub mod handler;


use axum::{
    Router,
    routing::{MethodRouter, any, get, get_service},
};
use hashvault::HashService;
use std::path::Path;
use tower_http::{services::ServeFile, trace::TraceLayer};

/// Builds the application router around a shared [`HashService`].
pub fn router(service: HashService, form_path: Option<&Path>) -> Router {
    let form: MethodRouter<HashService> = match form_path {
        Some(path) => get_service(ServeFile::new(path)),
        None => get(handler::form_page),
    };

    Router::new()
        .route("/hash", form.post(handler::submit_hash))
        .route("/hash/{id}", get(handler::get_hash))
        .route("/stats", get(handler::stats))
        .route("/shutdown", any(handler::shutdown))
        .fallback(handler::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

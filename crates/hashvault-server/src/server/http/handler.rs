use super::error::ApiError;
use crate::server::telemetry::{
    increment_lookup_misses, increment_lookups, increment_rejected_submissions,
    increment_shutdown_requests, increment_submissions, record_submission_latency,
};
use axum::{
    Form,
    extract::{FromRequest, Path, Request, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};
use hashvault::{Error, HashService, RequestId};
use serde::Deserialize;
use std::time::Instant;

/// Form page served on `GET /hash` unless a file override is configured.
pub const FORM_PAGE: &str = include_str!("../../../static/hash.html");

/// Body of `POST /hash`.
#[derive(Debug, Deserialize)]
pub struct HashForm {
    pub password: String,
}

/// `GET /hash`: the built-in submission form.
pub async fn form_page() -> Html<&'static str> {
    Html(FORM_PAGE)
}

/// `POST /hash`: allocates an id, schedules the delayed hash, and returns the
/// id as plain text.
///
/// The latency sample covers body extraction, so the clock starts before the
/// form is read.
#[tracing::instrument(level = "debug", skip_all)]
pub async fn submit_hash(
    State(service): State<HashService>,
    request: Request,
) -> Result<String, ApiError> {
    let start = Instant::now();
    let result = match Form::<HashForm>::from_request(request, &service).await {
        Ok(Form(form)) => service.submit_at(&form.password, start),
        Err(rejection) => Err(Error::InvalidRequest {
            reason: rejection.body_text(),
        }),
    };

    match result {
        Ok(accepted) => {
            increment_submissions();
            record_submission_latency(accepted.latency);
            Ok(accepted.id.to_string())
        }
        Err(err) => {
            increment_rejected_submissions();
            tracing::debug!(error = %err, "Submission rejected");
            Err(err.into())
        }
    }
}

/// `GET /hash/{id}`: the digest, or `404` while pending or if never issued.
pub async fn get_hash(
    State(service): State<HashService>,
    Path(raw): Path<String>,
) -> Result<String, ApiError> {
    increment_lookups();
    let id: RequestId = raw.parse()?;
    service.lookup(id).map_err(|err| {
        increment_lookup_misses();
        err.into()
    })
}

/// `GET /stats`: submission count and mean latency as JSON.
pub async fn stats(State(service): State<HashService>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        service.stats().to_string(),
    )
}

/// `/shutdown`: starts the drain and acknowledges right away. The drain itself
/// runs in the server's lifecycle task, after this response is written.
pub async fn shutdown(State(service): State<HashService>) -> &'static str {
    increment_shutdown_requests();
    if service.trigger_shutdown() {
        tracing::info!("Shutdown requested over HTTP");
    }
    "shutdown received, shutting down"
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 Not Found")
}

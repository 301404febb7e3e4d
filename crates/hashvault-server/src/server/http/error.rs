use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Maps [`hashvault::Error`] onto an HTTP status and a plain-text body.
///
/// - `InvalidId`, `InvalidRequest` -> `400 Bad Request`
/// - `NotFound` -> `404 Not Found` (pending and unknown ids alike)
/// - `ServiceShutdown` -> `503 Service Unavailable`
#[derive(Debug)]
pub struct ApiError(pub hashvault::Error);

impl From<hashvault::Error> for ApiError {
    fn from(err: hashvault::Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            hashvault::Error::InvalidId { .. } | hashvault::Error::InvalidRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            hashvault::Error::NotFound { .. } => StatusCode::NOT_FOUND,
            hashvault::Error::ServiceShutdown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.0 {
            // Never echo the id back: the response is the same for pending
            // and never-issued ids.
            hashvault::Error::NotFound { .. } => "404 resource not found".to_string(),
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}

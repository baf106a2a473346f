//! Error responses
//!
//! Every failure leaves the server as `{"error": message}` with a status
//! chosen from the error kind.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use djrank_common::api::ErrorResponse;
use djrank_common::Error;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Error from the gateway or domain layer
    Domain(Error),
    /// Body was not valid JSON for the endpoint
    BadBody(String),
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::Domain(Error::NotFound(what.into()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Domain(Error::InvalidInput(message.into()))
    }

    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::BadBody(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Domain(Error::NotFound(message)) => (StatusCode::NOT_FOUND, message),
            ApiError::Domain(Error::InvalidInput(message)) => (StatusCode::BAD_REQUEST, message),
            ApiError::Domain(Error::Conflict(message)) => (StatusCode::CONFLICT, message),
            ApiError::Domain(Error::Forbidden(message)) => (StatusCode::FORBIDDEN, message),
            ApiError::Domain(other) => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(ApiError::not_found("DJ not found")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ApiError::bad_request("No fields to update")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(Error::Conflict("exists".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(Error::Forbidden("read-only".into()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(Error::Gateway("503".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(ApiError::BadBody("bad".into())), StatusCode::BAD_REQUEST);
    }
}

//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use relayhub_domain::error::{BindingError, RelayHubError, ValidationError};

/// JSON error body returned by API endpoints.
///
/// `binding` carries the structured failure of arguments that do not fit,
/// for peers that forward the call.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    binding: Option<BindingError>,
}

/// Maps [`RelayHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(RelayHubError);

impl From<RelayHubError> for ApiError {
    fn from(err: RelayHubError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            RelayHubError::Validation(_) | RelayHubError::Binding(_) => StatusCode::BAD_REQUEST,
            RelayHubError::UnknownAction(_) => StatusCode::NOT_FOUND,
            RelayHubError::DuplicateIdentifier(_) => StatusCode::CONFLICT,
            RelayHubError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayHubError::Work { .. } | RelayHubError::Panicked { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            RelayHubError::Validation(err) => err.to_string(),
            RelayHubError::Binding(err) => err.to_string(),
            err @ (RelayHubError::Work { .. } | RelayHubError::Panicked { .. }) => {
                tracing::error!(error = %err, "action failed");
                err.to_string()
            }
            err => err.to_string(),
        };

        let binding = match self.0 {
            RelayHubError::Binding(err) => Some(err),
            _ => None,
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                binding,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayhub_domain::error::{TimeoutError, UnknownActionError};
    use std::time::Duration;

    fn status_of(err: impl Into<RelayHubError>) -> StatusCode {
        ApiError(err.into()).into_response().status()
    }

    #[test]
    fn should_map_unknown_action_to_not_found() {
        let err = UnknownActionError {
            id: "ghost".parse().unwrap(),
        };
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn should_map_timeout_to_gateway_timeout() {
        let err = TimeoutError {
            action: "fan.run".parse().unwrap(),
            after: Duration::from_secs(1),
        };
        assert_eq!(status_of(err), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn should_map_bad_input_to_bad_request() {
        assert_eq!(status_of(ValidationError::EmptyIdentifier), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(BindingError::TooManyPositional {
                expected: 0,
                given: 1
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn should_map_work_failure_to_internal_error() {
        let err = RelayHubError::work("fan.run".parse().unwrap(), anyhow::anyhow!("stalled"));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

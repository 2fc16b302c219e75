//! Responses for rejected authorizer outcomes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::authorizer::AuthOutcome;

/// Builds the HTTP response for an outcome that does not let the request
/// through. Bodies follow the `{"message": ...}` shape of gateway errors.
pub fn rejection_response(outcome: &AuthOutcome) -> Response {
    let (status, message) = match outcome {
        AuthOutcome::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        AuthOutcome::Deny(_) => (
            StatusCode::FORBIDDEN,
            "User is not authorized to access this resource with an explicit deny",
        ),
        AuthOutcome::Error(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Authorizer error"),
        AuthOutcome::Allow(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected allow"),
    };

    (status, Json(json!({ "message": message }))).into_response()
}

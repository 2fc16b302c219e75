//! Axum handler exposing the authorizer contract.
//!
//! `POST /authorize` with `{"authorizationToken": ..., "methodArn": ...}`
//! answers with the policy document for allow and deny decisions, and with a
//! `{"message": ...}` rejection otherwise.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::authorizer::{AuthOutcome, AuthorizerRequest};
use crate::middleware::{AuthState, rejection_response};

/// Evaluates an authorizer request.
pub async fn authorize_handler(
    State(state): State<AuthState>,
    Json(request): Json<AuthorizerRequest>,
) -> Response {
    match state.authorizer.authorize(&request) {
        AuthOutcome::Allow(response) | AuthOutcome::Deny(response) => {
            (StatusCode::OK, Json(response)).into_response()
        }
        outcome => rejection_response(&outcome),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::authorizer::TokenAuthorizer;

    fn state() -> AuthState {
        AuthState::new(
            Arc::new(TokenAuthorizer::new("s3cret")),
            "arn:aws:execute-api:local:000000000000:staff-alert/dev",
        )
    }

    fn request(token: &str, method_arn: &str) -> Json<AuthorizerRequest> {
        Json(AuthorizerRequest {
            authorization_token: token.to_string(),
            method_arn: method_arn.to_string(),
        })
    }

    #[tokio::test]
    async fn test_allow_returns_policy() {
        let response = authorize_handler(State(state()), request("s3cret", "arn:x/dev/POST/notification")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let response = authorize_handler(State(state()), request("S3CRET", "arn:x/dev/POST/notification")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_resource_is_error() {
        let response = authorize_handler(State(state()), request("s3cret", "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

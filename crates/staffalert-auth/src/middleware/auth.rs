use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::error::rejection_response;
use crate::authorizer::{AuthOutcome, AuthorizerRequest, TokenAuthorizer};
use crate::config::method_arn;

/// Shared state for [`token_authorizer`].
#[derive(Clone)]
pub struct AuthState {
    /// Authorizer evaluating caller tokens.
    pub authorizer: Arc<TokenAuthorizer>,

    /// Prefix of the resource identifiers built for requests.
    pub resource_prefix: Arc<str>,
}

impl AuthState {
    /// Creates a new auth state.
    pub fn new(authorizer: Arc<TokenAuthorizer>, resource_prefix: impl Into<Arc<str>>) -> Self {
        Self {
            authorizer,
            resource_prefix: resource_prefix.into(),
        }
    }
}

/// Authorizes a request with the raw `Authorization` header value.
///
/// The token is passed to the authorizer verbatim; a missing header is an
/// empty token. On `Allow` the policy response is stored in the request
/// extensions and the request proceeds. Every other outcome ends the request:
///
/// - `Unauthorized` → 401
/// - `Deny` → 403
/// - `Error` → 500
pub async fn token_authorizer(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let request = AuthorizerRequest {
        authorization_token: token,
        method_arn: method_arn(&state.resource_prefix, req.method().as_str(), req.uri().path()),
    };

    match state.authorizer.authorize(&request) {
        AuthOutcome::Allow(response) => {
            tracing::debug!(principal_id = %response.principal_id, "Request authorized");
            req.extensions_mut().insert(response);
            next.run(req).await
        }
        outcome => rejection_response(&outcome),
    }
}

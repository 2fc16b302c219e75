//! Static-token authorizer.
//!
//! The authorizer is a pure decision function: it holds no state besides the
//! configured secret and constructs a fresh decision for every call.
//!
//! | Token                         | Outcome                                  |
//! |-------------------------------|------------------------------------------|
//! | equal to the configured secret | `Allow` with a policy for `methodArn`   |
//! | anything else (incl. empty)    | `Unauthorized`                          |
//! | matching, policy build fails   | `Error`                                 |
//!
//! Tokens are compared exactly; `"Allow"` and `"allow"` are different tokens.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::policy::{AuthResponse, Effect};

/// Principal reported for every authorized caller.
pub const PRINCIPAL_ID: &str = "user";

/// Authorizer input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerRequest {
    /// Token supplied by the caller.
    #[serde(default)]
    pub authorization_token: String,

    /// Identifier of the guarded operation.
    #[serde(default)]
    pub method_arn: String,
}

/// Decision for a single authorizer call.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Access granted; carries the allow policy.
    Allow(AuthResponse),
    /// Access explicitly denied; carries the deny policy.
    ///
    /// The token check never produces this, but the HTTP layer renders it
    /// for policies built elsewhere.
    Deny(AuthResponse),
    /// The caller did not present a valid token.
    Unauthorized,
    /// The decision could not be constructed.
    Error(String),
}

impl AuthOutcome {
    /// Returns `true` if access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Authorizer comparing caller tokens with a shared secret.
pub struct TokenAuthorizer {
    secret_digest: Option<[u8; 32]>,
}

impl TokenAuthorizer {
    /// Creates an authorizer for `secret`. An empty secret authorizes nothing.
    pub fn new(secret: &str) -> Self {
        let secret_digest = (!secret.is_empty()).then(|| digest(secret));
        Self { secret_digest }
    }

    /// Evaluates a request.
    pub fn authorize(&self, request: &AuthorizerRequest) -> AuthOutcome {
        debug!(method_arn = %request.method_arn, "Evaluating authorization token");

        if !self.token_matches(&request.authorization_token) {
            info!(method_arn = %request.method_arn, "unauthorized");
            return AuthOutcome::Unauthorized;
        }

        let response = match AuthResponse::generate(PRINCIPAL_ID, Effect::Allow, &request.method_arn)
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Failed to build allow policy");
                return AuthOutcome::Error(e.to_string());
            }
        };

        info!(method_arn = %request.method_arn, "authorized");
        AuthOutcome::Allow(response)
    }

    // Digests have a fixed length, so comparison time does not depend on
    // how much of the token matches.
    fn token_matches(&self, token: &str) -> bool {
        match &self.secret_digest {
            Some(expected) => digest(token) == *expected,
            None => false,
        }
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

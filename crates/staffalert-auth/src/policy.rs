//! Policy documents returned by the authorizer.
//!
//! The document shape follows the access-control layer's authorizer
//! contract:
//!
//! ```json
//! {
//!   "principalId": "user",
//!   "policyDocument": {
//!     "Version": "2012-10-17",
//!     "Statement": [{"Action": "execute-api:Invoke", "Effect": "Allow", "Resource": "..."}]
//!   },
//!   "context": {"stringKey": "stringval", "numberKey": 123, "booleanKey": true}
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// The single action the authorizer grants or denies.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Effect of a policy statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// A single policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

/// Policy document attached to an authorizer response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

/// Authorizer response: principal, policy and auxiliary context claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    pub context: Map<String, Value>,
}

/// Errors raised while building a policy document.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The principal id is empty.
    #[error("policy principal must not be empty")]
    MissingPrincipal,

    /// The guarded resource identifier is empty.
    #[error("policy resource must not be empty")]
    MissingResource,
}

impl AuthResponse {
    /// Builds a single-statement policy for `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if the principal or resource is empty.
    pub fn generate(principal_id: &str, effect: Effect, resource: &str) -> Result<Self, PolicyError> {
        if principal_id.is_empty() {
            return Err(PolicyError::MissingPrincipal);
        }
        if resource.is_empty() {
            return Err(PolicyError::MissingResource);
        }

        Ok(Self {
            principal_id: principal_id.to_string(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: INVOKE_ACTION.to_string(),
                    effect,
                    resource: resource.to_string(),
                }],
            },
            context: context_claims(),
        })
    }

    /// Effect of the first statement.
    pub fn effect(&self) -> Option<Effect> {
        self.policy_document.statement.first().map(|s| s.effect)
    }
}

/// Static claims passed through to the guarded backend.
fn context_claims() -> Map<String, Value> {
    let mut claims = Map::new();
    claims.insert("stringKey".to_string(), json!("stringval"));
    claims.insert("numberKey".to_string(), json!(123));
    claims.insert("booleanKey".to_string(), json!(true));
    claims
}

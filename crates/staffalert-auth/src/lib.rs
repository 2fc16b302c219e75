//! # staffalert-auth
//!
//! Request authorization for the staff alert gateway.
//!
//! Callers present a static shared-secret token. The [`TokenAuthorizer`]
//! compares it with the configured secret and produces an [`AuthOutcome`]:
//! an allow policy document for the requested resource, or a rejection.
//!
//! ## Modules
//!
//! - [`authorizer`] - The token check and its decision type
//! - [`policy`] - Policy documents returned to the access-control layer
//! - [`config`] - Authorizer configuration
//! - [`middleware`] - Axum middleware guarding routes with the authorizer
//! - [`http`] - Axum handler exposing the authorizer contract directly

pub mod authorizer;
pub mod config;
pub mod http;
pub mod middleware;
pub mod policy;

pub use authorizer::{AuthOutcome, AuthorizerRequest, PRINCIPAL_ID, TokenAuthorizer};
pub use config::{AuthConfig, ConfigError};
pub use http::authorize_handler;
pub use middleware::{AuthState, token_authorizer};
pub use policy::{AuthResponse, Effect, PolicyDocument, PolicyError, Statement};

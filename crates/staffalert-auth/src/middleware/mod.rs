//! HTTP middleware guarding routes with the token authorizer.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::post};
//! use staffalert_auth::{AuthState, TokenAuthorizer, token_authorizer};
//!
//! let state = AuthState::new(Arc::new(TokenAuthorizer::new("s3cret")), prefix);
//!
//! let app = Router::new()
//!     .route("/notification", post(handler))
//!     .route_layer(middleware::from_fn_with_state(state, token_authorizer));
//! ```

pub mod auth;
pub mod error;

pub use auth::{AuthState, token_authorizer};
pub use error::rejection_response;

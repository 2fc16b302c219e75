pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use bootstrap::{BootstrapError, Transports};
pub use config::AppConfig;
pub use observability::{init_tracing, init_tracing_with};
pub use server::{AppState, ServerBuilder, StaffAlertServer, build_app};

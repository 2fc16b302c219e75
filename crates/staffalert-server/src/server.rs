use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use staffalert_auth::{AuthState, TokenAuthorizer, authorize_handler, token_authorizer};
use staffalert_notifications::{AlertHandler, InMemoryIdempotencyStore};
use tower_http::trace::TraceLayer;

use crate::{
    bootstrap::{self, BootstrapError, Transports},
    config::AppConfig,
    handlers,
    middleware as app_middleware,
};

/// State shared by the alert routes.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn AlertHandler>,
}

pub struct StaffAlertServer {
    addr: SocketAddr,
    app: Router,
    idempotency_store: Arc<InMemoryIdempotencyStore>,
    sweep_interval: Duration,
}

/// Build the router with the handler chain wired from `cfg`.
pub fn build_app(cfg: &AppConfig, transports: Transports) -> Result<Router, BootstrapError> {
    assemble(cfg, transports).map(|(app, _)| app)
}

fn assemble(
    cfg: &AppConfig,
    transports: Transports,
) -> Result<(Router, Arc<InMemoryIdempotencyStore>), BootstrapError> {
    let (handler, store) = bootstrap::build_handler(cfg, transports)?;
    let auth = AuthState::new(
        Arc::new(TokenAuthorizer::new(cfg.auth.token.as_str())),
        cfg.auth.resource_prefix.as_str(),
    );
    Ok((router(cfg, AppState { handler }, auth), store))
}

fn router(cfg: &AppConfig, state: AppState, auth: AuthState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;

    // Alert routes run only for requests the token authorizer allows
    let alerts = Router::new()
        .route("/notification", post(handlers::send_notification))
        .route("/invoke", post(handlers::invoke))
        .route_layer(middleware::from_fn_with_state(auth.clone(), token_authorizer))
        .with_state(state);

    let authorizer = Router::new()
        .route("/authorize", post(authorize_handler))
        .with_state(auth);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .merge(alerts)
        .merge(authorizer)
        // Middleware stack (order: request id -> trace -> body limit)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record("http.status_code", tracing::field::display(res.status().as_u16()));
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    transports: Option<Transports>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            transports: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Override the transports built from `transport` configuration.
    pub fn with_transports(mut self, transports: Transports) -> Self {
        self.transports = Some(transports);
        self
    }

    pub fn build(self) -> Result<StaffAlertServer, BootstrapError> {
        let transports = match self.transports {
            Some(t) => t,
            None => Transports::from_config(&self.config)?,
        };
        let (app, idempotency_store) = assemble(&self.config, transports)?;

        Ok(StaffAlertServer {
            addr: self.addr,
            app,
            idempotency_store,
            sweep_interval: self.config.idempotency.sweep_interval(),
        })
    }
}

impl StaffAlertServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let sweeper =
            bootstrap::spawn_idempotency_sweeper(self.idempotency_store, self.sweep_interval);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        let served = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        sweeper.abort();
        served?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

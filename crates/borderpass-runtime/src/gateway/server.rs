use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, AuthConfig, AuthError, AuthMiddleware};
use super::routes::{self, AppState};
use super::tracing::tracing_middleware;
use crate::engine::WorkflowEngine;
use crate::store::Repository;

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port to listen on.
    pub port: u16,
    /// Allowed CORS origins; `"*"` allows any.
    pub cors_origins: Vec<String>,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_origins: vec!["*".to_string()],
            auth: AuthConfig::default(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Gateway HTTP server.
pub struct GatewayServer<R> {
    config: GatewayConfig,
    state: AppState<R>,
}

impl<R: Repository> GatewayServer<R> {
    /// Create a new gateway server. Fails if no JWT secret is configured.
    pub fn new(config: GatewayConfig, engine: WorkflowEngine<R>) -> Result<Self, AuthError> {
        let auth = Arc::new(AuthMiddleware::new(config.auth.clone())?);
        Ok(Self {
            config,
            state: AppState { engine, auth },
        })
    }

    /// Token issuer shared with the handlers.
    pub fn auth(&self) -> Arc<AuthMiddleware> {
        self.state.auth.clone()
    }

    /// Build the Axum router.
    pub fn router(&self) -> Router {
        let cors = if self.config.cors_origins.iter().any(|o| o == "*") {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = self
                .config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let api = Router::new()
            .route("/auth/login", post(routes::login::<R>))
            .route("/auth/register", post(routes::register::<R>))
            .route(
                "/processes",
                get(routes::list_processes::<R>).post(routes::submit_process::<R>),
            )
            .route("/processes/{id}", get(routes::get_process::<R>))
            .route("/processes/{id}/decision", post(routes::decide::<R>))
            .route("/processes/{id}/activity", get(routes::list_activity::<R>))
            .route("/notifications", get(routes::list_notifications::<R>))
            .route(
                "/notifications/{id}/read",
                patch(routes::mark_notification_read::<R>),
            )
            .route("/users/{id}/activate", patch(routes::activate_user::<R>))
            .route("/dashboard/stats", get(routes::dashboard_stats::<R>))
            .with_state(self.state.clone());

        Router::new()
            .route("/health", get(health_handler))
            .nest("/api", api)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors)
                    .layer(middleware::from_fn(tracing_middleware))
                    .layer(middleware::from_fn_with_state(
                        self.state.auth.clone(),
                        auth_middleware,
                    )),
            )
    }

    /// Get the socket address to bind to.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.config.port))
    }

    /// Serve until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> std::io::Result<()> {
        let addr = self.addr();
        let router = self.router();

        tracing::info!("Gateway server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Health check handler.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

//! HTTP/JSON binding for the workflow engine.

mod auth;
mod response;
mod routes;
mod server;
mod tracing;

pub use auth::{AuthConfig, AuthError, AuthMiddleware, JwtAlgorithm};
pub use response::{ApiError, ApiResponse};
pub use routes::AppState;
pub use server::{GatewayConfig, GatewayServer, HealthResponse};
pub use tracing::TracingState;

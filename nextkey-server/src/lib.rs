//! HTTP server for NextKey.
//!
//! - `/api/*`: encrypted client routes (login, heartbeat, custom data,
//!   cloud variables, project info, unbind)
//! - `/admin/*`: JSON administration behind bearer JWTs
//! - `/healthz`: liveness
//!
//! Storage and crypto work runs on the blocking pool. Per-IP sliding-window
//! limits guard every route, with a stricter one on both login routes.

pub mod config;
mod error;
mod extract;
pub mod maintenance;
pub mod rate_limit;
mod routes;
mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use rate_limit::SlidingWindowLimiter;
pub use routes::build_router;
pub use state::AppState;

use axum::Router;
use std::net::SocketAddr;

/// Serves `app` on `listener` until `shutdown` resolves, exposing peer
/// addresses to handlers.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

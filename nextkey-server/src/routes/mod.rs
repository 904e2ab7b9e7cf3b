//! HTTP routing.

mod admin;
mod client;

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

async fn generic_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.generic_limiter.allow(&peer.ip().to_string()) {
        tracing::warn!(peer = %peer.ip(), path = %request.uri().path(), "rate limited");
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(request).await)
}

fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(client::login))
        .route("/heartbeat", post(client::heartbeat))
        .route("/card/custom-data", post(client::custom_data))
        .route("/card/unbind", post(client::unbind))
        .route("/cloud-var/{key}", post(client::cloud_var))
        .route("/project/info", post(client::project_info))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin::login))
        .route("/refresh", post(admin::refresh))
        .route("/logout", post(admin::logout))
        .route("/crypto/schemes", get(admin::list_schemes))
        .route(
            "/projects",
            get(admin::list_projects).post(admin::create_project),
        )
        .route(
            "/projects/{id}",
            put(admin::update_project).delete(admin::delete_project),
        )
        .route("/projects/{id}/cipher", put(admin::rotate_cipher))
        .route("/projects/{id}/online", get(admin::online_count))
        .route("/cards", get(admin::list_cards).post(admin::create_cards))
        .route(
            "/cards/batch",
            put(admin::update_cards).delete(admin::delete_cards),
        )
        .route("/cards/batch/freeze", post(admin::freeze_cards))
        .route("/cards/batch/unfreeze", post(admin::unfreeze_cards))
        .route(
            "/cards/{id}",
            get(admin::get_card)
                .put(admin::update_card)
                .delete(admin::delete_card),
        )
        .route("/cards/{id}/freeze", post(admin::freeze_card))
        .route("/cards/{id}/unfreeze", post(admin::unfreeze_card))
        .route(
            "/cloud-vars",
            get(admin::list_cloud_vars).post(admin::set_cloud_var),
        )
        .route("/cloud-vars/{id}", delete(admin::delete_cloud_var))
}

/// Builds the full router. Serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()`, see [`crate::serve`].
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let api = Router::new()
        .nest("/api", client_routes())
        .nest("/admin", admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            generic_rate_limit,
        ));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

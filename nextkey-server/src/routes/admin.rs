//! Administrator routes: plain JSON, bearer JWT except login and refresh.

use crate::error::{ApiError, ApiResult, blocking};
use crate::extract::{AdminAuth, ApiJson};
use crate::state::AppState;
use axum::Json;
use axum::extract::{ConnectInfo, Path, Query, State};
use nextkey_admin::{LoginRequest, RefreshRequest};
use nextkey_envelope::ApiResponse;
use nextkey_license::{
    BatchCardUpdate, CardQuery, CardUpdate, CreateCardsRequest, CreateProjectRequest,
    RotateCipherRequest, SetCloudVarRequest, UpdateProjectRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::net::SocketAddr;

type Reply = ApiResult<Json<ApiResponse>>;

fn ok<T: Serialize>(value: T) -> Reply {
    let data = serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(ApiResponse::success(data)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectFilter {
    project_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdList {
    ids: Vec<i64>,
}

// ── Sessions ─────────────────────────────────────────────────────

pub(crate) async fn login(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Reply {
    if !state.login_limiter.allow(&peer.ip().to_string()) {
        tracing::warn!(peer = %peer.ip(), "admin login rate limited");
        return Err(ApiError::RateLimited);
    }
    let admin = state.admin.clone();
    ok(blocking(move || Ok(admin.login(&request)?)).await?)
}

pub(crate) async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Reply {
    let admin = state.admin.clone();
    ok(blocking(move || Ok(admin.refresh(&request.refresh_token)?)).await?)
}

pub(crate) async fn logout(State(state): State<AppState>, AdminAuth(who): AdminAuth) -> Reply {
    let admin = state.admin.clone();
    blocking(move || Ok(admin.logout(&who)?)).await?;
    ok(Value::Null)
}

pub(crate) async fn list_schemes(State(state): State<AppState>, _auth: AdminAuth) -> Reply {
    ok(state.registry.list())
}

// ── Projects ─────────────────────────────────────────────────────

pub(crate) async fn list_projects(State(state): State<AppState>, _auth: AdminAuth) -> Reply {
    let license = state.license.clone();
    ok(blocking(move || Ok(license.list_projects()?)).await?)
}

pub(crate) async fn create_project(
    State(state): State<AppState>,
    AdminAuth(who): AdminAuth,
    ApiJson(request): ApiJson<CreateProjectRequest>,
) -> Reply {
    let license = state.license.clone();
    let project = blocking(move || Ok(license.create_project(&request)?)).await?;
    tracing::info!(admin_id = who.admin_id, project_id = project.id, "admin created project");
    ok(project)
}

pub(crate) async fn update_project(
    State(state): State<AppState>,
    AdminAuth(who): AdminAuth,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateProjectRequest>,
) -> Reply {
    let license = state.license.clone();
    let project = blocking(move || Ok(license.update_project(id, &request)?)).await?;
    tracing::info!(admin_id = who.admin_id, project_id = id, "admin updated project");
    ok(project)
}

pub(crate) async fn delete_project(
    State(state): State<AppState>,
    AdminAuth(who): AdminAuth,
    Path(id): Path<i64>,
) -> Reply {
    let license = state.license.clone();
    blocking(move || Ok(license.delete_project(id)?)).await?;
    tracing::info!(admin_id = who.admin_id, project_id = id, "admin deleted project");
    ok(Value::Null)
}

pub(crate) async fn rotate_cipher(
    State(state): State<AppState>,
    AdminAuth(who): AdminAuth,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<RotateCipherRequest>,
) -> Reply {
    let license = state.license.clone();
    let project = blocking(move || Ok(license.rotate_cipher(id, &request)?)).await?;
    tracing::info!(admin_id = who.admin_id, project_id = id, "admin rotated cipher");
    ok(project)
}

pub(crate) async fn online_count(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> Reply {
    let license = state.license.clone();
    let online = blocking(move || Ok(license.online_count(id)?)).await?;
    ok(json!({ "project_id": id, "online": online }))
}

// ── Cards ────────────────────────────────────────────────────────

pub(crate) async fn list_cards(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<CardQuery>,
) -> Reply {
    let license = state.license.clone();
    ok(blocking(move || Ok(license.list_cards(&query)?)).await?)
}

pub(crate) async fn create_cards(
    State(state): State<AppState>,
    _auth: AdminAuth,
    ApiJson(request): ApiJson<CreateCardsRequest>,
) -> Reply {
    let license = state.license.clone();
    ok(blocking(move || Ok(license.create_cards(&request)?)).await?)
}

pub(crate) async fn get_card(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> Reply {
    let license = state.license.clone();
    ok(blocking(move || Ok(license.get_card(id)?)).await?)
}

pub(crate) async fn update_card(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<CardUpdate>,
) -> Reply {
    let license = state.license.clone();
    ok(blocking(move || Ok(license.update_card(id, &update)?)).await?)
}

pub(crate) async fn update_cards(
    State(state): State<AppState>,
    _auth: AdminAuth,
    ApiJson(batch): ApiJson<BatchCardUpdate>,
) -> Reply {
    let license = state.license.clone();
    ok(blocking(move || Ok(license.update_cards(&batch.ids, &batch.update)?)).await?)
}

pub(crate) async fn delete_card(
    State(state): State<AppState>,
    AdminAuth(who): AdminAuth,
    Path(id): Path<i64>,
) -> Reply {
    let license = state.license.clone();
    blocking(move || Ok(license.delete_card(id)?)).await?;
    tracing::info!(admin_id = who.admin_id, card_id = id, "admin deleted card");
    ok(Value::Null)
}

pub(crate) async fn delete_cards(
    State(state): State<AppState>,
    AdminAuth(who): AdminAuth,
    ApiJson(body): ApiJson<IdList>,
) -> Reply {
    let license = state.license.clone();
    let deleted = blocking(move || Ok(license.delete_cards(&body.ids)?)).await?;
    tracing::info!(admin_id = who.admin_id, count = deleted, "admin deleted cards");
    ok(json!({ "deleted": deleted }))
}

pub(crate) async fn freeze_card(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> Reply {
    let license = state.license.clone();
    blocking(move || Ok(license.freeze_card(id)?)).await?;
    ok(Value::Null)
}

pub(crate) async fn unfreeze_card(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> Reply {
    let license = state.license.clone();
    blocking(move || Ok(license.unfreeze_card(id)?)).await?;
    ok(Value::Null)
}

pub(crate) async fn freeze_cards(
    State(state): State<AppState>,
    _auth: AdminAuth,
    ApiJson(body): ApiJson<IdList>,
) -> Reply {
    let license = state.license.clone();
    let changed = blocking(move || Ok(license.freeze_cards(&body.ids)?)).await?;
    ok(json!({ "changed": changed }))
}

pub(crate) async fn unfreeze_cards(
    State(state): State<AppState>,
    _auth: AdminAuth,
    ApiJson(body): ApiJson<IdList>,
) -> Reply {
    let license = state.license.clone();
    let changed = blocking(move || Ok(license.unfreeze_cards(&body.ids)?)).await?;
    ok(json!({ "changed": changed }))
}

// ── Cloud variables ──────────────────────────────────────────────

pub(crate) async fn list_cloud_vars(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(filter): Query<ProjectFilter>,
) -> Reply {
    let license = state.license.clone();
    ok(blocking(move || Ok(license.list_cloud_vars(filter.project_id)?)).await?)
}

pub(crate) async fn set_cloud_var(
    State(state): State<AppState>,
    _auth: AdminAuth,
    ApiJson(request): ApiJson<SetCloudVarRequest>,
) -> Reply {
    let license = state.license.clone();
    ok(blocking(move || Ok(license.set_cloud_var(&request)?)).await?)
}

pub(crate) async fn delete_cloud_var(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> Reply {
    let license = state.license.clone();
    blocking(move || Ok(license.delete_cloud_var(id)?)).await?;
    ok(Value::Null)
}

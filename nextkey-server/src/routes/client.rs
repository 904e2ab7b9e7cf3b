//! Encrypted client routes.
//!
//! Failures before a project cipher is known are returned as plain JSON with
//! the matching HTTP status. Once the cipher is resolved, every outcome,
//! including errors, is sealed into a response envelope.

use crate::error::{ApiError, ApiResult, blocking};
use crate::extract::{ApiJson, bearer};
use crate::state::AppState;
use axum::Json;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use nextkey_envelope::{ApiResponse, EnvelopeRequest, EnvelopeResponse, Opened};
use nextkey_license::{LicenseError, LoginRequest, UnbindRequest};
use nextkey_types::{Project, SessionToken};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;

/// A verified request as seen by a route body.
pub(crate) struct Call {
    pub project: Project,
    pub session: Option<SessionToken>,
    pub opened: Opened,
    pub peer_ip: String,
}

impl Call {
    fn session(&self) -> ApiResult<&SessionToken> {
        self.session
            .as_ref()
            .ok_or(ApiError::License(LicenseError::TokenNotFound))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Auth {
    Anonymous,
    Session,
}

async fn encrypted<F>(
    state: AppState,
    headers: &HeaderMap,
    peer: SocketAddr,
    request: EnvelopeRequest,
    auth: Auth,
    handler: F,
) -> ApiResult<Json<EnvelopeResponse>>
where
    F: FnOnce(&AppState, &Call) -> ApiResult<Value> + Send + 'static,
{
    let token = bearer(headers);
    blocking(move || {
        let session = match auth {
            Auth::Session => Some(state.license.authorize_session(token.as_deref())?),
            Auth::Anonymous => None,
        };

        let resolved = state.codec.resolve(&request, token.as_deref())?;
        let project_id = resolved.cipher.project().id;

        let outcome = state
            .codec
            .verify(&resolved, &request)
            .map_err(ApiError::from)
            .and_then(|opened| {
                if session.as_ref().is_some_and(|s| s.project_id != project_id) {
                    return Err(LicenseError::AuthenticationFailed.into());
                }
                let call = Call {
                    project: resolved.cipher.project().clone(),
                    session,
                    opened,
                    peer_ip: peer.ip().to_string(),
                };
                handler(&state, &call)
            });

        let body = match outcome {
            Ok(data) => ApiResponse::success(data),
            Err(err) => err.body(),
        };
        Ok(Json(state.codec.seal(&resolved.cipher, &resolved.nonce, &body)?))
    })
    .await
}

fn to_value<T: serde::Serialize>(value: T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

pub(crate) async fn login(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<EnvelopeRequest>,
) -> ApiResult<Json<EnvelopeResponse>> {
    if !state.login_limiter.allow(&peer.ip().to_string()) {
        tracing::warn!(peer = %peer.ip(), "client login rate limited");
        return Err(ApiError::RateLimited);
    }
    encrypted(state, &headers, peer, request, Auth::Anonymous, |state, call| {
        let login: LoginRequest = call.opened.parse()?;
        let grant = state.license.login(&call.project, &login, &call.peer_ip)?;
        to_value(grant)
    })
    .await
}

pub(crate) async fn heartbeat(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<EnvelopeRequest>,
) -> ApiResult<Json<EnvelopeResponse>> {
    encrypted(state, &headers, peer, request, Auth::Session, |state, call| {
        let expire_at = state.license.heartbeat(call.session()?)?;
        Ok(json!({ "expire_at": expire_at }))
    })
    .await
}

#[derive(Deserialize)]
struct CustomDataRequest {
    custom_data: String,
}

pub(crate) async fn custom_data(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<EnvelopeRequest>,
) -> ApiResult<Json<EnvelopeResponse>> {
    encrypted(state, &headers, peer, request, Auth::Session, |state, call| {
        let body: CustomDataRequest = call.opened.parse()?;
        state
            .license
            .update_custom_data(call.session()?, &body.custom_data)?;
        Ok(Value::Null)
    })
    .await
}

pub(crate) async fn cloud_var(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(key): Path<String>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<EnvelopeRequest>,
) -> ApiResult<Json<EnvelopeResponse>> {
    encrypted(state, &headers, peer, request, Auth::Session, move |state, call| {
        let var = state.license.cloud_var_for_session(call.session()?, &key)?;
        Ok(json!({ "key": var.key, "value": var.value }))
    })
    .await
}

pub(crate) async fn project_info(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<EnvelopeRequest>,
) -> ApiResult<Json<EnvelopeResponse>> {
    encrypted(state, &headers, peer, request, Auth::Session, |state, call| {
        to_value(state.license.project_info(call.session()?)?)
    })
    .await
}

pub(crate) async fn unbind(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<EnvelopeRequest>,
) -> ApiResult<Json<EnvelopeResponse>> {
    encrypted(state, &headers, peer, request, Auth::Anonymous, |state, call| {
        let body: UnbindRequest = call.opened.parse()?;
        let card = state.license.unbind_hwid(&call.project, &body)?;
        Ok(json!({
            "card_key": card.card_key,
            "hwid_list": card.hwid_list,
            "expire_at": card.expire_at,
        }))
    })
    .await
}

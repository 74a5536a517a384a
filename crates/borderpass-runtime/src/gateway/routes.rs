//! REST handlers over the workflow engine.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::Json;
use serde::{Deserialize, Serialize};

use borderpass_core::auth::AuthContext;
use borderpass_core::domain::{FormPayload, ProcessKind, User, UserProfile};
use borderpass_core::workflow::{Decision, Outcome, Stage};
use borderpass_core::Role;

use super::auth::AuthMiddleware;
use super::response::{ApiError, ApiResponse};
use super::tracing::TracingState;
use crate::engine::WorkflowEngine;
use crate::store::Repository;

/// Shared handler state.
pub struct AppState<R> {
    pub engine: WorkflowEngine<R>,
    pub auth: Arc<AuthMiddleware>,
}

impl<R: Clone> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            auth: self.auth.clone(),
        }
    }
}

/// Per-request context placed in extensions by the gateway middleware.
pub struct RequestMeta {
    pub auth: AuthContext,
    pub request_id: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            auth: parts
                .extensions
                .get::<AuthContext>()
                .cloned()
                .unwrap_or_default(),
            request_id: parts
                .extensions
                .get::<TracingState>()
                .map(|t| t.request_id.clone()),
        })
    }
}

impl RequestMeta {
    /// The authenticated caller, or `Unauthorized`.
    fn caller(&self) -> Result<(i64, Role), ApiError> {
        self.auth.require_user().map_err(ApiError::from)
    }

    fn respond<T: Serialize>(&self, result: Result<T, ApiError>) -> ApiResponse {
        let response = ApiResponse::from_result(result);
        match &self.request_id {
            Some(id) => response.with_request_id(id.clone()),
            None => response,
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub kind: ProcessKind,
    pub payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub stage: Stage,
    pub outcome: Outcome,
    #[serde(default)]
    pub observation: Option<String>,
}

impl From<DecisionRequest> for Decision {
    fn from(req: DecisionRequest) -> Self {
        let decision = Decision::new(req.stage, req.outcome);
        match req.observation {
            Some(text) => decision.with_observation(text),
            None => decision,
        }
    }
}

pub async fn login<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResponse {
    let result = async {
        let req = body(payload)?;
        let user = state.engine.authenticate(&req.username, &req.password).await?;
        let token = state
            .auth
            .issue_token(&user)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        Ok::<_, ApiError>(LoginResponse { token, user })
    }
    .await;
    meta.respond(result)
}

pub async fn register<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResponse {
    let result = async {
        let req = body(payload)?;
        Ok::<_, ApiError>(
            state
                .engine
                .register_traveler(&req.username, &req.password, req.profile)
                .await?,
        )
    }
    .await;
    meta.respond(result)
}

pub async fn list_processes<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
) -> ApiResponse {
    let result = async {
        let (caller_id, role) = meta.caller()?;
        Ok::<_, ApiError>(state.engine.list_processes(role, caller_id).await?)
    }
    .await;
    meta.respond(result)
}

pub async fn submit_process<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResponse {
    let result = async {
        let (caller_id, _) = meta.caller()?;
        let req = body(payload)?;
        let form = FormPayload::from_value(req.kind, req.payload)?;
        Ok::<_, ApiError>(state.engine.submit_process(caller_id, req.kind, form).await?)
    }
    .await;
    meta.respond(result)
}

pub async fn get_process<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
    Path(id): Path<i64>,
) -> ApiResponse {
    let result = async {
        let (caller_id, role) = meta.caller()?;
        Ok::<_, ApiError>(state.engine.get_process(role, caller_id, id).await?)
    }
    .await;
    meta.respond(result)
}

pub async fn decide<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
    Path(id): Path<i64>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> ApiResponse {
    let result = async {
        let (caller_id, role) = meta.caller()?;
        let decision = Decision::from(body(payload)?);
        Ok::<_, ApiError>(state.engine.decide(role, caller_id, id, decision).await?)
    }
    .await;
    meta.respond(result)
}

pub async fn list_activity<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
    Path(id): Path<i64>,
) -> ApiResponse {
    let result = async {
        let (caller_id, role) = meta.caller()?;
        Ok::<_, ApiError>(state.engine.list_activity_for(role, caller_id, id).await?)
    }
    .await;
    meta.respond(result)
}

pub async fn list_notifications<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
) -> ApiResponse {
    let result = async {
        let (caller_id, _) = meta.caller()?;
        Ok::<_, ApiError>(state.engine.list_notifications(caller_id).await?)
    }
    .await;
    meta.respond(result)
}

pub async fn mark_notification_read<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
    Path(id): Path<i64>,
) -> ApiResponse {
    let result = async {
        let (caller_id, _) = meta.caller()?;
        state
            .engine
            .mark_own_notification_read(caller_id, id)
            .await?;
        Ok::<_, ApiError>(serde_json::json!({ "id": id, "is_read": true }))
    }
    .await;
    meta.respond(result)
}

pub async fn activate_user<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
    Path(id): Path<i64>,
) -> ApiResponse {
    let result = async {
        let (caller_id, role) = meta.caller()?;
        Ok::<_, ApiError>(state.engine.activate_user(role, caller_id, id).await?)
    }
    .await;
    meta.respond(result)
}

pub async fn dashboard_stats<R: Repository>(
    State(state): State<AppState<R>>,
    meta: RequestMeta,
) -> ApiResponse {
    let result = async {
        let (caller_id, role) = meta.caller()?;
        Ok::<_, ApiError>(state.engine.process_stats(role, caller_id).await?)
    }
    .await;
    meta.respond(result)
}

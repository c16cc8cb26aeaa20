use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::routes::ApiJson;
use crate::services::lifecycle::LifecycleService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session/create/", post(create_session))
        .route("/session/duplicate/", post(duplicate_session))
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub day_id: i64,
    #[serde(default)]
    pub name: String,
    pub num_mics: i64,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateSessionRequest {
    pub source_session_id: i64,
    #[serde(default)]
    pub target_session_name: String,
}

#[derive(Debug, Serialize)]
pub struct DuplicateSessionResponse {
    pub success: bool,
    pub message: String,
    pub session_id: i64,
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateSessionRequest>,
) -> AppResult<Json<CreateSessionResponse>> {
    let session = LifecycleService::create_session(
        &state,
        req.day_id,
        &req.name,
        req.num_mics,
        &req.location,
    )
    .await?;

    Ok(Json(CreateSessionResponse {
        success: true,
        session_id: session.id,
    }))
}

async fn duplicate_session(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<DuplicateSessionRequest>,
) -> AppResult<Json<DuplicateSessionResponse>> {
    let copy = LifecycleService::duplicate_session(
        &state,
        req.source_session_id,
        &req.target_session_name,
    )
    .await?;

    Ok(Json(DuplicateSessionResponse {
        success: true,
        message: format!("Session duplicated as '{}'", copy.name),
        session_id: copy.id,
    }))
}

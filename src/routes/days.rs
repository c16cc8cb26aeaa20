use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::routes::{Ack, ApiJson};
use crate::services::lifecycle::LifecycleService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/day/create/", post(create_day))
        .route("/day/toggle/", post(toggle_day))
        .route("/day/rename/", post(rename_day))
        .route("/day/delete/", post(delete_day))
}

#[derive(Debug, Deserialize)]
pub struct CreateDayRequest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateDayResponse {
    pub success: bool,
    pub day_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DayRequest {
    pub day_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ToggleDayRequest {
    pub day_id: i64,
    /// Desired state; omitted means flip.
    #[serde(default)]
    pub is_collapsed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ToggleDayResponse {
    pub success: bool,
    pub is_collapsed: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenameDayRequest {
    pub day_id: i64,
    #[serde(default)]
    pub name: String,
}

async fn create_day(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateDayRequest>,
) -> AppResult<Json<CreateDayResponse>> {
    let day = LifecycleService::create_day(&state, &req.date, &req.name).await?;
    Ok(Json(CreateDayResponse {
        success: true,
        day_id: day.id,
    }))
}

async fn toggle_day(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ToggleDayRequest>,
) -> AppResult<Json<ToggleDayResponse>> {
    let is_collapsed = LifecycleService::toggle_day(&state, req.day_id, req.is_collapsed).await?;
    Ok(Json(ToggleDayResponse {
        success: true,
        is_collapsed,
    }))
}

async fn rename_day(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RenameDayRequest>,
) -> AppResult<Json<Ack>> {
    LifecycleService::rename_day(&state, req.day_id, &req.name).await?;
    Ok(Ack::ok())
}

async fn delete_day(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<DayRequest>,
) -> AppResult<Json<Ack>> {
    LifecycleService::delete_day(&state, req.day_id).await?;
    Ok(Ack::ok())
}

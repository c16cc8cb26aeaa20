use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::AppResult;
use crate::services::tracker::TrackerService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/presenters/list/", get(list_presenters))
}

#[derive(Debug, Serialize)]
pub struct PresenterEntry {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PresenterListResponse {
    pub presenters: Vec<PresenterEntry>,
}

async fn list_presenters(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<PresenterListResponse>> {
    let presenters = TrackerService::list_presenters(&state)
        .await?
        .into_iter()
        .map(|name| PresenterEntry { name })
        .collect();

    Ok(Json(PresenterListResponse { presenters }))
}

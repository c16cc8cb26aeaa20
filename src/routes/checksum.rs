use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::services::checksum::{ChecksumScope, ChecksumService};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/mic-tracker-checksum/", get(checksum))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChecksumQuery {
    pub day: Option<i64>,
    pub session: Option<i64>,
}

impl ChecksumQuery {
    fn scope(&self) -> ChecksumScope {
        match (self.session, self.day) {
            (Some(id), _) => ChecksumScope::Session(id),
            (None, Some(id)) => ChecksumScope::Day(id),
            (None, None) => ChecksumScope::All,
        }
    }
}

/// `{}` when nothing is selected.
#[derive(Debug, Serialize)]
pub struct ChecksumResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

async fn checksum(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChecksumQuery>,
) -> AppResult<Json<ChecksumResponse>> {
    let checksum = ChecksumService::compute(&state, query.scope()).await?;
    Ok(Json(ChecksumResponse { checksum }))
}

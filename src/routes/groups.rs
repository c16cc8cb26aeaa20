use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::MicGroup;
use crate::error::{AppError, AppResult};
use crate::routes::ApiJson;
use crate::services::groups::GroupService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/mic-groups/assign/", post(assign_group))
        .route(
            "/mic-groups/:session_id/",
            get(list_groups).post(manage_groups),
        )
}

#[derive(Debug, Serialize)]
pub struct GroupView {
    pub id: i64,
    pub name: String,
    pub color: String,
}

impl From<MicGroup> for GroupView {
    fn from(g: MicGroup) -> Self {
        GroupView {
            id: g.id,
            name: g.name,
            color: g.color,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupListResponse {
    pub success: bool,
    pub groups: Vec<GroupView>,
}

#[derive(Debug, Deserialize)]
pub struct ManageGroupRequest {
    pub action: String,
    pub name: Option<String>,
    pub color: Option<String>,
    pub group_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ManageGroupResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unassigned: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AssignGroupRequest {
    pub assignment_id: i64,
    #[serde(default)]
    pub group_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AssignGroupResponse {
    pub success: bool,
    pub group: Option<GroupView>,
}

async fn list_groups(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<i64>,
) -> AppResult<Json<GroupListResponse>> {
    let groups = GroupService::list(&state, session_id).await?;
    Ok(Json(GroupListResponse {
        success: true,
        groups: groups.into_iter().map(GroupView::from).collect(),
    }))
}

async fn manage_groups(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<i64>,
    ApiJson(req): ApiJson<ManageGroupRequest>,
) -> AppResult<Json<ManageGroupResponse>> {
    match req.action.as_str() {
        "create" => {
            let group = GroupService::create(
                &state,
                session_id,
                req.name.as_deref(),
                req.color.as_deref(),
            )
            .await?;
            Ok(Json(ManageGroupResponse {
                success: true,
                group: Some(group.into()),
                unassigned: None,
            }))
        }
        "delete" => {
            let group_id = req
                .group_id
                .ok_or_else(|| AppError::BadRequest("group_id is required".to_string()))?;
            let unassigned = GroupService::delete(&state, session_id, group_id).await?;
            Ok(Json(ManageGroupResponse {
                success: true,
                group: None,
                unassigned: Some(unassigned),
            }))
        }
        other => Err(AppError::BadRequest(format!("Unknown action: {}", other))),
    }
}

async fn assign_group(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AssignGroupRequest>,
) -> AppResult<Json<AssignGroupResponse>> {
    let group = GroupService::assign(&state, req.assignment_id, req.group_id).await?;
    Ok(Json(AssignGroupResponse {
        success: true,
        group: group.map(GroupView::from),
    }))
}

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{DayStats, SessionStats};
use crate::error::{AppError, AppResult};
use crate::routes::{Ack, ApiJson};
use crate::services::lifecycle::LifecycleService;
use crate::services::photos::{media_url, PhotoService};
use crate::services::rotation::RotationService;
use crate::services::tracker::TrackerService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/mic/update/", post(update_field))
        .route("/mic/bulk-update/", post(bulk_update))
        .route("/mic/dmic-and-rotate/", post(dmic_and_rotate))
        .route("/mic/reset-rotation/", post(reset_rotation))
        .route("/mic/add-shared-presenter/", post(add_shared_presenter))
        .route("/mic/remove-shared-presenter/", post(remove_shared_presenter))
        .route("/mic/get-assignment/:id/", get(get_assignment))
        .route("/mic/slot/upload-photo/", post(upload_photo))
        .route("/mic/delete-session/", post(delete_session))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub assignment_id: i64,
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct UpdateFieldResponse {
    pub success: bool,
    pub session_stats: SessionStats,
    pub day_stats: DayStats,
    pub presenter_display: String,
    pub presenter_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    pub session_id: i64,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub success: bool,
    pub updated: u64,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub assignment_id: i64,
}

#[derive(Debug, Serialize)]
pub struct RotateResponse {
    pub success: bool,
    pub is_d_mic: bool,
    pub is_micd: bool,
    pub current_presenter: String,
    pub previous_presenter: String,
    pub message: String,
    pub session_stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct ResetRotationResponse {
    pub success: bool,
    pub message: String,
    pub current_presenter: String,
}

#[derive(Debug, Deserialize)]
pub struct SharedPresenterRequest {
    pub assignment_id: i64,
    pub presenter_name: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SlotView {
    pub id: i64,
    pub position: i64,
    pub presenter_name: String,
    pub photo_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct AssignmentView {
    pub id: i64,
    pub session_id: i64,
    pub rf_number: i64,
    pub presenter: String,
    pub current_presenter: String,
    pub shared_presenters: Vec<String>,
    pub active_slot: i64,
    pub mic_type: String,
    pub is_d_mic: bool,
    pub is_micd: bool,
    pub group_id: Option<i64>,
    pub notes: String,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub success: bool,
    pub assignment: AssignmentView,
}

#[derive(Debug, Serialize)]
pub struct UploadPhotoResponse {
    pub success: bool,
    pub photo_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSessionRequest {
    pub session_id: i64,
}

// ============================================================================
// Handlers
// ============================================================================

async fn update_field(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<UpdateFieldRequest>,
) -> AppResult<Json<UpdateFieldResponse>> {
    let outcome =
        TrackerService::update_field(&state, req.assignment_id, &req.field, &req.value).await?;

    Ok(Json(UpdateFieldResponse {
        success: true,
        session_stats: outcome.session_stats,
        day_stats: outcome.day_stats,
        presenter_display: outcome.presenter_display,
        presenter_count: outcome.presenter_count,
    }))
}

async fn bulk_update(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BulkUpdateRequest>,
) -> AppResult<Json<BulkUpdateResponse>> {
    let updated = TrackerService::bulk_update(&state, req.session_id, &req.action).await?;
    Ok(Json(BulkUpdateResponse {
        success: true,
        updated,
    }))
}

async fn dmic_and_rotate(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AssignmentRequest>,
) -> AppResult<Json<RotateResponse>> {
    let out = RotationService::toggle_dmic_and_rotate(&state, req.assignment_id).await?;

    Ok(Json(RotateResponse {
        success: true,
        is_d_mic: out.is_d_mic,
        is_micd: out.is_micd,
        current_presenter: out.current_presenter,
        previous_presenter: out.previous_presenter,
        message: out.message,
        session_stats: out.session_stats,
    }))
}

async fn reset_rotation(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AssignmentRequest>,
) -> AppResult<Json<ResetRotationResponse>> {
    let out = RotationService::reset_rotation(&state, req.assignment_id).await?;
    Ok(Json(ResetRotationResponse {
        success: true,
        message: out.message,
        current_presenter: out.current_presenter,
    }))
}

async fn add_shared_presenter(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SharedPresenterRequest>,
) -> AppResult<Json<MessageResponse>> {
    let message =
        TrackerService::add_shared_presenter(&state, req.assignment_id, &req.presenter_name)
            .await?;
    Ok(Json(MessageResponse {
        success: true,
        message,
    }))
}

async fn remove_shared_presenter(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SharedPresenterRequest>,
) -> AppResult<Json<MessageResponse>> {
    let message =
        TrackerService::remove_shared_presenter(&state, req.assignment_id, &req.presenter_name)
            .await?;
    Ok(Json(MessageResponse {
        success: true,
        message,
    }))
}

async fn get_assignment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<AssignmentResponse>> {
    let detail = TrackerService::load_assignment(&state, id).await?;
    let prefix = &state.config.media.url_prefix;

    let presenter = detail.primary_name();
    let current_presenter = detail.current_presenter();
    let active = detail.assignment.active_slot;
    let slots = detail
        .slots
        .into_iter()
        .map(|s| SlotView {
            is_active: s.position == active,
            photo_url: s.photo_path.as_deref().map(|p| media_url(prefix, p)),
            id: s.id,
            position: s.position,
            presenter_name: s.presenter_name,
        })
        .collect();

    let a = detail.assignment;
    Ok(Json(AssignmentResponse {
        success: true,
        assignment: AssignmentView {
            id: a.id,
            session_id: a.session_id,
            rf_number: a.rf_number,
            presenter,
            current_presenter,
            shared_presenters: a.shared_presenters.0,
            active_slot: a.active_slot,
            mic_type: a.mic_type,
            is_d_mic: a.is_d_mic,
            is_micd: a.is_micd,
            group_id: a.group_id,
            notes: a.notes,
            slots,
        },
    }))
}

/// Multipart fields: `slot_id` and `photo`.
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadPhotoResponse>> {
    let mut slot_id: Option<i64> = None;
    let mut photo: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "slot_id" => {
                let text = field.text().await?;
                slot_id = Some(text.trim().parse().map_err(|_| {
                    AppError::BadRequest(format!("Invalid slot_id: {}", text))
                })?);
            }
            "photo" => {
                let file_name = field.file_name().unwrap_or("photo").to_string();
                let bytes = field.bytes().await?;
                photo = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let slot_id = slot_id.ok_or_else(|| AppError::BadRequest("slot_id is required".to_string()))?;
    let (file_name, bytes) =
        photo.ok_or_else(|| AppError::Validation("No photo provided".to_string()))?;

    let photo_url = PhotoService::upload_slot_photo(&state, slot_id, &file_name, &bytes).await?;
    Ok(Json(UploadPhotoResponse {
        success: true,
        photo_url,
    }))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<DeleteSessionRequest>,
) -> AppResult<Json<Ack>> {
    LifecycleService::delete_session(&state, req.session_id).await?;
    Ok(Ack::ok())
}

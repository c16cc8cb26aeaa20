use std::sync::Arc;

use axum::{extract::FromRequest, Router};
use serde::Serialize;

use crate::error::AppError;
use crate::AppState;

pub mod checksum;
pub mod days;
pub mod groups;
pub mod health;
pub mod mic;
pub mod presenters;
pub mod sessions;

/// JSON body extractor whose rejections use the `{success: false, error}` shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Plain `{"success": true}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> axum::Json<Ack> {
        axum::Json(Ack { success: true })
    }
}

/// Every tracker endpoint, mounted under `/api`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(mic::router())
        .merge(days::router())
        .merge(sessions::router())
        .merge(groups::router())
        .merge(presenters::router())
        .merge(checksum::router())
}

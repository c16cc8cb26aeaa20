use std::path::Path;
use std::sync::Arc;

use crate::db::{AssignmentRepository, PresenterSlotRepository, SessionRepository};
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Image extensions accepted for slot photos.
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Sub-directory of the media root holding slot photos.
const SLOT_PHOTO_DIR: &str = "slots";

pub struct PhotoService;

impl PhotoService {
    /// Store an uploaded photo for a presenter slot and return its public URL.
    pub async fn upload_slot_photo(
        state: &Arc<AppState>,
        slot_id: i64,
        file_name: &str,
        bytes: &[u8],
    ) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::Validation("No photo provided".to_string()));
        }
        let ext = image_extension(file_name)?;

        let slot = PresenterSlotRepository::find_by_id(&state.db, slot_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Presenter slot {} not found", slot_id)))?;

        let relative = format!(
            "{}/{}_{}.{}",
            SLOT_PHOTO_DIR,
            slot.id,
            uuid::Uuid::new_v4().simple(),
            ext
        );
        let dir = state.config.media.root.join(SLOT_PHOTO_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(state.config.media.root.join(&relative), bytes).await?;

        let mut tx = state.db.begin().await?;
        PresenterSlotRepository::set_photo(&mut *tx, slot.id, &relative).await?;
        if let Some(assignment) = AssignmentRepository::find_by_id(&mut *tx, slot.assignment_id).await? {
            SessionRepository::touch(&mut *tx, assignment.session_id).await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Stored photo for slot {} ({} bytes) at {}",
            slot.id,
            bytes.len(),
            relative
        );

        Ok(media_url(&state.config.media.url_prefix, &relative))
    }
}

fn image_extension(file_name: &str) -> AppResult<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::Validation(format!(
            "Unsupported image type: {}",
            file_name
        )))
    }
}

/// Public URL for a path relative to the media root.
pub fn media_url(prefix: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_session, test_state};
    use crate::services::tracker::TrackerService;

    #[test]
    fn only_images_are_accepted() {
        assert_eq!(image_extension("Headshot.JPG").unwrap(), "jpg");
        assert!(image_extension("notes.pdf").is_err());
        assert!(image_extension("noext").is_err());
    }

    #[test]
    fn urls_join_cleanly() {
        assert_eq!(media_url("/media/", "/slots/1.png"), "/media/slots/1.png");
    }

    #[tokio::test]
    async fn upload_writes_file_and_records_path() {
        let media = tempfile::tempdir().unwrap();
        let mut state = test_state().await;
        Arc::get_mut(&mut state).unwrap().config.media.root = media.path().to_path_buf();

        let (_day, _session, assignments) = seed_session(&state, 1).await;
        let detail = TrackerService::load_assignment(&state, assignments[0].id)
            .await
            .unwrap();
        let slot = &detail.slots[0];

        let url = PhotoService::upload_slot_photo(&state, slot.id, "face.png", b"\x89PNG")
            .await
            .unwrap();
        assert!(url.starts_with("/media/slots/"));
        assert!(url.ends_with(".png"));

        let stored = PresenterSlotRepository::find_by_id(&state.db, slot.id)
            .await
            .unwrap()
            .unwrap();
        let path = stored.photo_path.unwrap();
        assert_eq!(std::fs::read(media.path().join(path)).unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn shared_slot_keeps_id_and_photo_across_list_edits() {
        let media = tempfile::tempdir().unwrap();
        let mut state = test_state().await;
        Arc::get_mut(&mut state).unwrap().config.media.root = media.path().to_path_buf();

        let (_day, _session, assignments) = seed_session(&state, 1).await;
        let id = assignments[0].id;
        TrackerService::add_shared_presenter(&state, id, "Ben").await.unwrap();
        let ben = TrackerService::load_assignment(&state, id).await.unwrap().slots[1].clone();
        assert_eq!(ben.presenter_name, "Ben");

        PhotoService::upload_slot_photo(&state, ben.id, "ben.jpg", b"\xff\xd8")
            .await
            .unwrap();

        // Append, then reorder so Ben moves to position 2.
        TrackerService::add_shared_presenter(&state, id, "Cy").await.unwrap();
        TrackerService::update_field(
            &state,
            id,
            "shared_presenters",
            &serde_json::json!(["Cy", "Ben"]),
        )
        .await
        .unwrap();

        let slots = TrackerService::load_assignment(&state, id).await.unwrap().slots;
        let moved = slots.iter().find(|s| s.presenter_name == "Ben").unwrap();
        assert_eq!(moved.id, ben.id);
        assert_eq!(moved.position, 2);
        assert!(moved.photo_path.is_some());
        assert_eq!(slots[1].presenter_name, "Cy");

        // The page still holds Ben's slot id from before the edits.
        PhotoService::upload_slot_photo(&state, ben.id, "ben2.png", b"\x89PNG")
            .await
            .unwrap();

        TrackerService::remove_shared_presenter(&state, id, "Cy").await.unwrap();
        let slots = TrackerService::load_assignment(&state, id).await.unwrap().slots;
        assert_eq!(slots.len(), 2);
        assert_eq!((slots[1].id, slots[1].position), (ben.id, 1));
    }

    #[tokio::test]
    async fn upload_rejects_unknown_slot_and_empty_body() {
        let state = test_state().await;
        assert!(matches!(
            PhotoService::upload_slot_photo(&state, 9999, "a.jpg", b"x").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            PhotoService::upload_slot_photo(&state, 1, "a.jpg", b"").await,
            Err(AppError::Validation(_))
        ));
    }
}

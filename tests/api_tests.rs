//! HTTP-level tests: the router through `oneshot`, and the page controllers
//! against a live server on a random port.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use mic_tracker::client::context::{ModalKind, UiSession};
use mic_tracker::client::sync::SyncAction;
use mic_tracker::client::{HeadlessView, HttpTrackerApi, Node, RowRef, Tracker};
use mic_tracker::config::Config;
use mic_tracker::db::{AssignmentRepository, PresenterSlotRepository};
use mic_tracker::services::checksum::ChecksumScope;
use mic_tracker::services::init::init_memory_db;
use mic_tracker::services::tracker::AssignmentField;
use mic_tracker::{build_router, AppState};

const TOKEN: &str = "0123456789abcdef";

async fn setup_state(media_root: &std::path::Path) -> Arc<AppState> {
    let db = init_memory_db().await.expect("in-memory database");
    let mut config = Config::default();
    config.media.root = media_root.to_path_buf();
    Arc::new(AppState { db, config })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("csrftoken={}", TOKEN))
        .header("x-csrftoken", TOKEN)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Router
// =============================================================================

#[tokio::test]
async fn health_reports_database_and_issues_csrf_cookie() {
    let media = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(media.path()).await);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("csrftoken="), "cookie: {}", cookie);
    assert!(response.headers().contains_key("content-security-policy"));

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn post_without_csrf_token_is_forbidden() {
    let media = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(media.path()).await);

    let request = Request::builder()
        .method("POST")
        .uri("/api/day/create/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "date": "2031-01-01" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("CSRF"));
}

#[tokio::test]
async fn post_with_mismatched_token_is_forbidden() {
    let media = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(media.path()).await);

    let request = Request::builder()
        .method("POST")
        .uri("/api/day/create/")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("csrftoken={}", TOKEN))
        .header("x-csrftoken", "something-else")
        .body(Body::from(json!({ "date": "2031-01-01" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_day_then_session() {
    let media = tempfile::tempdir().unwrap();
    let state = setup_state(media.path()).await;
    let app = build_router(state.clone());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/day/create/",
            json!({ "date": "2031-01-01", "name": "Opening" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let day_id = extract_json(response.into_body()).await["day_id"]
        .as_i64()
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/session/create/",
            json!({ "day_id": day_id, "name": "Keynote", "num_mics": 4, "location": "Hall" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = extract_json(response.into_body()).await["session_id"]
        .as_i64()
        .unwrap();

    let assignments = AssignmentRepository::list_by_session(&state.db, session_id)
        .await
        .unwrap();
    assert_eq!(assignments.len(), 4);

    let request = Request::builder()
        .uri(format!("/api/mic-tracker-checksum/?session={}", session_id))
        .body(Body::empty())
        .unwrap();
    let body = extract_json(app.oneshot(request).await.unwrap().into_body()).await;
    assert_eq!(body["checksum"].as_str().map(str::len), Some(64));
}

#[tokio::test]
async fn invalid_requests_use_the_error_envelope() {
    let media = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(media.path()).await);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/mic/get-assignment/999/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(extract_json(response.into_body()).await["success"], false);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/session/create/",
            json!({ "day_id": 1, "name": "Keynote", "num_mics": 0 }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(extract_json(response.into_body()).await["success"], false);

    let response = app
        .oneshot(post_json("/api/mic/update/", json!("not an object")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_tracker_has_no_checksum() {
    let media = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(media.path()).await);

    let request = Request::builder()
        .uri("/api/mic-tracker-checksum/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!({}));
}

// =============================================================================
// Controllers against a live server
// =============================================================================

async fn spawn_server(state: Arc<AppState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

#[tokio::test]
async fn tracker_drives_a_session_end_to_end() {
    let media = tempfile::tempdir().unwrap();
    let state = setup_state(media.path()).await;
    let base = spawn_server(state.clone()).await;

    let api = HttpTrackerApi::new(&base).unwrap();
    let mut t = Tracker::new(api, HeadlessView::new(), UiSession::new(ChecksumScope::All));

    // Nothing to watch yet.
    assert_eq!(t.poll_sync().await, SyncAction::None);

    t.open_add_day();
    let day_id = t.submit_add_day("2031-03-01", "Main").await.unwrap();
    t.open_add_session(day_id);
    assert!(t.submit_add_session("Keynote", "150", "Hall A").await.is_err());
    let session_id = t
        .submit_add_session("Keynote", "3", "Hall A")
        .await
        .unwrap();
    assert_eq!(t.ui().open_modal, None);

    assert_eq!(t.poll_sync().await, SyncAction::None);

    let assignments = AssignmentRepository::list_by_session(&state.db, session_id)
        .await
        .unwrap();
    let first = assignments[0].id;
    let row = RowRef::new(first, session_id, day_id);

    // Presenter edit
    t.update_field(row, AssignmentField::PresenterName, json!("Ana"))
        .await
        .unwrap();
    assert_eq!(t.view().text(&Node::PresenterDisplay(first)), Some("Ana"));
    assert_eq!(t.view().text(&Node::SessionMicd(session_id)), Some("MIC'D: 0/3"));

    // The presenter edit changed the checksum; the user is still active,
    // so the monitor shows the banner instead of reloading.
    assert_eq!(t.poll_sync().await, SyncAction::ShowBanner);
    t.on_activity();

    // Shared presenter, then rotate to them and back.
    t.add_shared_presenter_inline(first, "Ben").await.unwrap();
    assert_eq!(t.view().text(&Node::ShareCount(first)), Some("+1"));

    let rotated = t.toggle_dmic(row, true).await.unwrap();
    assert!(rotated.is_d_mic);
    assert!(!rotated.is_micd);
    assert_eq!(rotated.current_presenter, "Ben");
    assert_eq!(t.view().text(&Node::ActiveSlotChip(first)), Some("Ben"));

    t.reset_rotation(first).await.unwrap();
    assert_eq!(t.view().text(&Node::ActiveSlotChip(first)), Some("Ana"));
    assert_eq!(t.view().is_checked(&Node::DmicCheckbox(first)), Some(false));

    // MIC'D updates the footer.
    t.update_field(row, AssignmentField::IsMicd, json!(true))
        .await
        .unwrap();
    assert_eq!(t.view().text(&Node::SessionMicd(session_id)), Some("MIC'D: 1/3"));
    assert_eq!(
        t.view().text(&Node::SessionAvailable(session_id)),
        Some("Available: 2")
    );

    // Groups: assign two rows, delete the group, both rows lose it.
    let group = t.create_group(session_id, "Band", "red").await.unwrap();
    t.assign_group(first, Some(group.id)).await.unwrap();
    t.assign_group(assignments[1].id, Some(group.id)).await.unwrap();
    assert!(t.view().has_class(&Node::Row(first), "group-red"));

    let cleared = t.delete_group(session_id, group.id).await.unwrap();
    assert_eq!(cleared, 2);
    assert!(!t.view().has_class(&Node::Row(first), "group-red"));
    let refreshed = AssignmentRepository::find_by_id(&state.db, first)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.group_id, None);

    // Photo on the primary slot, then fetch it back from the media mount.
    let slots = PresenterSlotRepository::list_by_assignment(&state.db, first)
        .await
        .unwrap();
    let slot_id = slots[0].id;
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let url = t
        .upload_photo(slot_id, first, "face.png", png.clone())
        .await
        .unwrap();
    assert!(url.starts_with("/media/slots/"), "url: {}", url);
    assert_eq!(t.view().visible(&Node::SlotPlaceholder(slot_id)), Some(false));

    let served = reqwest::get(format!("{}{}", base.trim_end_matches('/'), url))
        .await
        .unwrap();
    assert_eq!(served.status(), reqwest::StatusCode::OK);
    assert_eq!(served.bytes().await.unwrap().to_vec(), png);

    // Duplicate, then delete the copy.
    let copy = t
        .duplicate_session(session_id, "Keynote (Room B)")
        .await
        .unwrap();
    assert_ne!(copy.session_id, session_id);
    t.delete_session(copy.session_id).await.unwrap();

    assert_eq!(
        t.view().visible(&Node::ModalError(ModalKind::AddSession)),
        Some(false)
    );
}

//! The tracker's JSON API as seen from a page, plus its reqwest implementation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::client::error::{ClientError, ClientResult};
use crate::db::{DayStats, SessionStats};
use crate::services::checksum::ChecksumScope;

const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub session_stats: SessionStats,
    #[serde(default)]
    pub day_stats: DayStats,
    #[serde(default)]
    pub presenter_display: String,
    #[serde(default)]
    pub presenter_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationResult {
    pub is_d_mic: bool,
    pub is_micd: bool,
    #[serde(default)]
    pub current_presenter: String,
    #[serde(default)]
    pub previous_presenter: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_stats: Option<SessionStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResetResult {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub current_presenter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotData {
    pub id: i64,
    pub position: i64,
    #[serde(default)]
    pub presenter_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentData {
    pub id: i64,
    #[serde(default)]
    pub presenter: String,
    #[serde(default)]
    pub current_presenter: String,
    #[serde(default)]
    pub shared_presenters: Vec<String>,
    #[serde(default)]
    pub active_slot: i64,
    #[serde(default)]
    pub is_d_mic: bool,
    #[serde(default)]
    pub is_micd: bool,
    #[serde(default)]
    pub slots: Vec<SlotData>,
}

impl AssignmentData {
    /// Primary plus shared presenters that actually have a name.
    pub fn presenter_count(&self) -> i64 {
        let primary = if self.presenter.trim().is_empty() { 0 } else { 1 };
        primary + self.shared_presenters.len() as i64
    }

    pub fn display_name(&self) -> &str {
        if self.current_presenter.is_empty() {
            &self.presenter
        } else {
            &self.current_presenter
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupData {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSession {
    pub day_id: i64,
    pub name: String,
    pub num_mics: i64,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateResult {
    #[serde(default)]
    pub message: String,
    pub session_id: i64,
}

// ============================================================================
// Trait
// ============================================================================

/// Every call the page controllers make. `success: false` answers surface as
/// [`ClientError::Application`].
#[async_trait]
pub trait TrackerApi: Send + Sync {
    async fn update_field(&self, assignment_id: i64, field: &str, value: Value)
        -> ClientResult<FieldUpdate>;
    async fn bulk_update(&self, session_id: i64, action: &str) -> ClientResult<()>;
    async fn dmic_and_rotate(&self, assignment_id: i64) -> ClientResult<RotationResult>;
    async fn reset_rotation(&self, assignment_id: i64) -> ClientResult<ResetResult>;
    async fn add_shared_presenter(&self, assignment_id: i64, name: &str) -> ClientResult<String>;
    async fn remove_shared_presenter(&self, assignment_id: i64, name: &str)
        -> ClientResult<String>;
    async fn get_assignment(&self, assignment_id: i64) -> ClientResult<AssignmentData>;
    async fn upload_photo(&self, slot_id: i64, file_name: &str, bytes: Vec<u8>)
        -> ClientResult<String>;
    async fn delete_session(&self, session_id: i64) -> ClientResult<()>;
    /// Persist a day's collapse state; returns what the server stored.
    async fn toggle_day(&self, day_id: i64, collapsed: bool) -> ClientResult<bool>;
    async fn create_day(&self, date: &str, name: &str) -> ClientResult<i64>;
    async fn create_session(&self, session: &NewSession) -> ClientResult<i64>;
    async fn duplicate_session(&self, source_session_id: i64, target_name: &str)
        -> ClientResult<DuplicateResult>;
    async fn list_groups(&self, session_id: i64) -> ClientResult<Vec<GroupData>>;
    async fn create_group(&self, session_id: i64, name: &str, color: &str)
        -> ClientResult<GroupData>;
    async fn delete_group(&self, session_id: i64, group_id: i64) -> ClientResult<()>;
    async fn assign_group(&self, assignment_id: i64, group_id: Option<i64>)
        -> ClientResult<Option<GroupData>>;
    async fn list_presenters(&self) -> ClientResult<Vec<String>>;
    async fn checksum(&self, scope: ChecksumScope) -> ClientResult<Option<String>>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

pub struct HttpTrackerApi {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
}

impl HttpTrackerApi {
    /// `base_url` is the server root, e.g. `http://localhost:8080/`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;

        Ok(Self { client, jar, base })
    }

    fn api_url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base.join("api/")?.join(path)?)
    }

    fn cookie_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let raw = header.to_str().ok()?;
        raw.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == CSRF_COOKIE).then(|| value.to_string())
        })
    }

    /// Token from the cookie jar; a cheap GET seeds the cookie the first time.
    async fn csrf_token(&self) -> ClientResult<String> {
        if let Some(token) = self.cookie_token() {
            return Ok(token);
        }
        self.client.get(self.base.join("health")?).send().await?;
        self.cookie_token()
            .ok_or_else(|| ClientError::Application("Server did not issue a CSRF token".to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let resp = self.client.get(self.api_url(path)?).send().await?;
        decode(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> ClientResult<T> {
        let token = self.csrf_token().await?;
        let resp = self
            .client
            .post(self.api_url(path)?)
            .header(CSRF_HEADER, token)
            .json(&body)
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> ClientResult<T> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    decode_body(status, &bytes)
}

/// Error bodies that are not JSON (plain-text 404/405 from the router) still
/// surface as application errors carrying the status.
fn decode_body<T: DeserializeOwned>(status: reqwest::StatusCode, bytes: &[u8]) -> ClientResult<T> {
    let body: Value = match serde_json::from_slice(bytes) {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            tracing::debug!("Request rejected with a non-JSON body ({})", status);
            return Err(ClientError::Application(format!("Request failed ({})", status)));
        }
        Err(e) => return Err(e.into()),
    };

    if !status.is_success() || body.get("success") == Some(&Value::Bool(false)) {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed ({})", status));
        tracing::debug!("Request rejected: {}", message);
        return Err(ClientError::Application(message));
    }

    Ok(serde_json::from_value(body)?)
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct Empty {}

#[derive(Deserialize)]
struct AssignmentBody {
    assignment: AssignmentData,
}

#[derive(Deserialize)]
struct GroupsBody {
    groups: Vec<GroupData>,
}

#[derive(Deserialize)]
struct GroupBody {
    #[serde(default)]
    group: Option<GroupData>,
}

#[derive(Deserialize)]
struct PresenterName {
    name: String,
}

#[derive(Deserialize)]
struct PresentersBody {
    presenters: Vec<PresenterName>,
}

#[derive(Deserialize)]
struct ChecksumBody {
    #[serde(default)]
    checksum: Option<String>,
}

#[async_trait]
impl TrackerApi for HttpTrackerApi {
    async fn update_field(
        &self,
        assignment_id: i64,
        field: &str,
        value: Value,
    ) -> ClientResult<FieldUpdate> {
        self.post(
            "mic/update/",
            json!({ "assignment_id": assignment_id, "field": field, "value": value }),
        )
        .await
    }

    async fn bulk_update(&self, session_id: i64, action: &str) -> ClientResult<()> {
        let _: Empty = self
            .post(
                "mic/bulk-update/",
                json!({ "session_id": session_id, "action": action }),
            )
            .await?;
        Ok(())
    }

    async fn dmic_and_rotate(&self, assignment_id: i64) -> ClientResult<RotationResult> {
        self.post(
            "mic/dmic-and-rotate/",
            json!({ "assignment_id": assignment_id }),
        )
        .await
    }

    async fn reset_rotation(&self, assignment_id: i64) -> ClientResult<ResetResult> {
        self.post(
            "mic/reset-rotation/",
            json!({ "assignment_id": assignment_id }),
        )
        .await
    }

    async fn add_shared_presenter(&self, assignment_id: i64, name: &str) -> ClientResult<String> {
        let body: MessageBody = self
            .post(
                "mic/add-shared-presenter/",
                json!({ "assignment_id": assignment_id, "presenter_name": name }),
            )
            .await?;
        Ok(body.message)
    }

    async fn remove_shared_presenter(
        &self,
        assignment_id: i64,
        name: &str,
    ) -> ClientResult<String> {
        let body: MessageBody = self
            .post(
                "mic/remove-shared-presenter/",
                json!({ "assignment_id": assignment_id, "presenter_name": name }),
            )
            .await?;
        Ok(body.message)
    }

    async fn get_assignment(&self, assignment_id: i64) -> ClientResult<AssignmentData> {
        let body: AssignmentBody = self
            .get(&format!("mic/get-assignment/{}/", assignment_id))
            .await?;
        Ok(body.assignment)
    }

    async fn upload_photo(
        &self,
        slot_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<String> {
        #[derive(Deserialize)]
        struct PhotoBody {
            photo_url: String,
        }

        let token = self.csrf_token().await?;
        let form = reqwest::multipart::Form::new()
            .text("slot_id", slot_id.to_string())
            .part(
                "photo",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string()),
            );

        let resp = self
            .client
            .post(self.api_url("mic/slot/upload-photo/")?)
            .header(CSRF_HEADER, token)
            .multipart(form)
            .send()
            .await?;
        let body: PhotoBody = decode(resp).await?;
        Ok(body.photo_url)
    }

    async fn delete_session(&self, session_id: i64) -> ClientResult<()> {
        let _: Empty = self
            .post("mic/delete-session/", json!({ "session_id": session_id }))
            .await?;
        Ok(())
    }

    async fn toggle_day(&self, day_id: i64, collapsed: bool) -> ClientResult<bool> {
        #[derive(Deserialize)]
        struct ToggleBody {
            is_collapsed: bool,
        }
        let body: ToggleBody = self
            .post(
                "day/toggle/",
                json!({ "day_id": day_id, "is_collapsed": collapsed }),
            )
            .await?;
        Ok(body.is_collapsed)
    }

    async fn create_day(&self, date: &str, name: &str) -> ClientResult<i64> {
        #[derive(Deserialize)]
        struct DayBody {
            day_id: i64,
        }
        let body: DayBody = self
            .post("day/create/", json!({ "date": date, "name": name }))
            .await?;
        Ok(body.day_id)
    }

    async fn create_session(&self, session: &NewSession) -> ClientResult<i64> {
        #[derive(Deserialize)]
        struct SessionBody {
            session_id: i64,
        }
        let body: SessionBody = self
            .post("session/create/", serde_json::to_value(session)?)
            .await?;
        Ok(body.session_id)
    }

    async fn duplicate_session(
        &self,
        source_session_id: i64,
        target_name: &str,
    ) -> ClientResult<DuplicateResult> {
        self.post(
            "session/duplicate/",
            json!({
                "source_session_id": source_session_id,
                "target_session_name": target_name,
            }),
        )
        .await
    }

    async fn list_groups(&self, session_id: i64) -> ClientResult<Vec<GroupData>> {
        let body: GroupsBody = self.get(&format!("mic-groups/{}/", session_id)).await?;
        Ok(body.groups)
    }

    async fn create_group(
        &self,
        session_id: i64,
        name: &str,
        color: &str,
    ) -> ClientResult<GroupData> {
        let body: GroupBody = self
            .post(
                &format!("mic-groups/{}/", session_id),
                json!({ "action": "create", "name": name, "color": color }),
            )
            .await?;
        body.group
            .ok_or_else(|| ClientError::Application("Group was not returned".to_string()))
    }

    async fn delete_group(&self, session_id: i64, group_id: i64) -> ClientResult<()> {
        let _: Empty = self
            .post(
                &format!("mic-groups/{}/", session_id),
                json!({ "action": "delete", "group_id": group_id }),
            )
            .await?;
        Ok(())
    }

    async fn assign_group(
        &self,
        assignment_id: i64,
        group_id: Option<i64>,
    ) -> ClientResult<Option<GroupData>> {
        let body: GroupBody = self
            .post(
                "mic-groups/assign/",
                json!({ "assignment_id": assignment_id, "group_id": group_id }),
            )
            .await?;
        Ok(body.group)
    }

    async fn list_presenters(&self) -> ClientResult<Vec<String>> {
        let body: PresentersBody = self.get("presenters/list/").await?;
        Ok(body.presenters.into_iter().map(|p| p.name).collect())
    }

    async fn checksum(&self, scope: ChecksumScope) -> ClientResult<Option<String>> {
        let path = match scope {
            ChecksumScope::All => "mic-tracker-checksum/".to_string(),
            ChecksumScope::Day(id) => format!("mic-tracker-checksum/?day={}", id),
            ChecksumScope::Session(id) => format!("mic-tracker-checksum/?session={}", id),
        };
        let body: ChecksumBody = self.get(&path).await?;
        Ok(body.checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_urls_are_rooted_under_api() {
        let api = HttpTrackerApi::new("http://localhost:8080/tracker").unwrap();
        assert_eq!(
            api.api_url("mic/update/").unwrap().as_str(),
            "http://localhost:8080/tracker/api/mic/update/"
        );
    }

    #[test]
    fn csrf_token_is_read_from_the_jar() {
        let api = HttpTrackerApi::new("http://localhost:8080/").unwrap();
        assert_eq!(api.cookie_token(), None);

        let url = Url::parse("http://localhost:8080/").unwrap();
        api.jar.add_cookie_str("other=1; Path=/", &url);
        api.jar.add_cookie_str("csrftoken=abc123; Path=/", &url);
        assert_eq!(api.cookie_token().as_deref(), Some("abc123"));
    }

    #[test]
    fn plain_text_error_is_an_application_error() {
        let err = decode_body::<Value>(reqwest::StatusCode::NOT_FOUND, b"Not Found").unwrap_err();
        match err {
            ClientError::Application(message) => {
                assert_eq!(message, "Request failed (404 Not Found)")
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = decode_body::<Value>(
            reqwest::StatusCode::BAD_REQUEST,
            br#"{"success": false, "error": "Mic count must be between 1 and 100"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Application(m) if m.contains("Mic count")));

        let err = decode_body::<Value>(reqwest::StatusCode::OK, b"<html>").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn presenter_count_ignores_blank_primary() {
        let mut data = AssignmentData {
            shared_presenters: vec!["Ben".into()],
            ..Default::default()
        };
        assert_eq!(data.presenter_count(), 1);
        data.presenter = "Ana".into();
        assert_eq!(data.presenter_count(), 2);
        assert_eq!(data.display_name(), "Ana");
    }
}

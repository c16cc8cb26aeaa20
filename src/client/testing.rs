//! Scripted API double for controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::client::api::{
    AssignmentData, DuplicateResult, FieldUpdate, GroupData, NewSession, ResetResult,
    RotationResult, TrackerApi,
};
use crate::client::context::UiSession;
use crate::client::error::{ClientError, ClientResult};
use crate::client::view::HeadlessView;
use crate::client::Tracker;
use crate::services::checksum::ChecksumScope;

/// Each call pops the next scripted response for its method. `Ok` values are
/// shaped like the method's return type; `Err` becomes `success: false`.
#[derive(Default)]
pub(crate) struct FakeApi {
    responses: Mutex<HashMap<&'static str, VecDeque<Result<Value, String>>>>,
    calls: Mutex<Vec<(&'static str, Value)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, method: &'static str, response: Result<Value, String>) {
        self.responses
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn respond<T: DeserializeOwned>(&self, method: &'static str, args: Value) -> ClientResult<T> {
        self.calls.lock().unwrap().push((method, args));
        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(value)) => Ok(serde_json::from_value(value)?),
            Some(Err(message)) => Err(ClientError::Application(message)),
            None => Err(ClientError::Application(format!(
                "no scripted response for {}",
                method
            ))),
        }
    }
}

#[async_trait]
impl TrackerApi for FakeApi {
    async fn update_field(
        &self,
        assignment_id: i64,
        field: &str,
        value: Value,
    ) -> ClientResult<FieldUpdate> {
        self.respond(
            "update_field",
            json!({ "assignment_id": assignment_id, "field": field, "value": value }),
        )
    }

    async fn bulk_update(&self, session_id: i64, action: &str) -> ClientResult<()> {
        self.respond(
            "bulk_update",
            json!({ "session_id": session_id, "action": action }),
        )
    }

    async fn dmic_and_rotate(&self, assignment_id: i64) -> ClientResult<RotationResult> {
        self.respond("dmic_and_rotate", json!({ "assignment_id": assignment_id }))
    }

    async fn reset_rotation(&self, assignment_id: i64) -> ClientResult<ResetResult> {
        self.respond("reset_rotation", json!({ "assignment_id": assignment_id }))
    }

    async fn add_shared_presenter(&self, assignment_id: i64, name: &str) -> ClientResult<String> {
        self.respond(
            "add_shared_presenter",
            json!({ "assignment_id": assignment_id, "presenter_name": name }),
        )
    }

    async fn remove_shared_presenter(
        &self,
        assignment_id: i64,
        name: &str,
    ) -> ClientResult<String> {
        self.respond(
            "remove_shared_presenter",
            json!({ "assignment_id": assignment_id, "presenter_name": name }),
        )
    }

    async fn get_assignment(&self, assignment_id: i64) -> ClientResult<AssignmentData> {
        self.respond("get_assignment", json!({ "assignment_id": assignment_id }))
    }

    async fn upload_photo(
        &self,
        slot_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<String> {
        self.respond(
            "upload_photo",
            json!({ "slot_id": slot_id, "file_name": file_name, "size": bytes.len() }),
        )
    }

    async fn delete_session(&self, session_id: i64) -> ClientResult<()> {
        self.respond("delete_session", json!({ "session_id": session_id }))
    }

    async fn toggle_day(&self, day_id: i64, collapsed: bool) -> ClientResult<bool> {
        self.respond(
            "toggle_day",
            json!({ "day_id": day_id, "is_collapsed": collapsed }),
        )
    }

    async fn create_day(&self, date: &str, name: &str) -> ClientResult<i64> {
        self.respond("create_day", json!({ "date": date, "name": name }))
    }

    async fn create_session(&self, session: &NewSession) -> ClientResult<i64> {
        self.respond("create_session", serde_json::to_value(session)?)
    }

    async fn duplicate_session(
        &self,
        source_session_id: i64,
        target_name: &str,
    ) -> ClientResult<DuplicateResult> {
        self.respond(
            "duplicate_session",
            json!({
                "source_session_id": source_session_id,
                "target_session_name": target_name,
            }),
        )
    }

    async fn list_groups(&self, session_id: i64) -> ClientResult<Vec<GroupData>> {
        self.respond("list_groups", json!({ "session_id": session_id }))
    }

    async fn create_group(
        &self,
        session_id: i64,
        name: &str,
        color: &str,
    ) -> ClientResult<GroupData> {
        self.respond(
            "create_group",
            json!({ "session_id": session_id, "name": name, "color": color }),
        )
    }

    async fn delete_group(&self, session_id: i64, group_id: i64) -> ClientResult<()> {
        self.respond(
            "delete_group",
            json!({ "session_id": session_id, "group_id": group_id }),
        )
    }

    async fn assign_group(
        &self,
        assignment_id: i64,
        group_id: Option<i64>,
    ) -> ClientResult<Option<GroupData>> {
        self.respond(
            "assign_group",
            json!({ "assignment_id": assignment_id, "group_id": group_id }),
        )
    }

    async fn list_presenters(&self) -> ClientResult<Vec<String>> {
        self.respond("list_presenters", json!({}))
    }

    async fn checksum(&self, scope: ChecksumScope) -> ClientResult<Option<String>> {
        let args = match scope {
            ChecksumScope::All => json!({}),
            ChecksumScope::Day(id) => json!({ "day": id }),
            ChecksumScope::Session(id) => json!({ "session": id }),
        };
        self.respond("checksum", args)
    }
}

pub(crate) fn tracker(api: FakeApi) -> Tracker<FakeApi, HeadlessView> {
    Tracker::new(api, HeadlessView::new(), UiSession::default())
}

/// A `mic/update/` answer for a single-session day.
pub(crate) fn field_update(
    micd: i64,
    total: i64,
    shared: i64,
    display: &str,
    count: i64,
) -> Value {
    json!({
        "session_stats": { "micd": micd, "total": total, "shared": shared },
        "day_stats": { "sessions": 1, "total": total, "micd": micd, "shared": shared },
        "presenter_display": display,
        "presenter_count": count,
    })
}

pub(crate) fn group(id: i64, name: &str, color: &str) -> Value {
    json!({ "id": id, "name": name, "color": color })
}

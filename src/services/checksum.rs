//! Change-detection fingerprint polled by every open tracker page.
//!
//! The digest covers what a viewer sees: days, sessions, assignments, slots and
//! groups of the selection. Per-client view state (day collapse) is left out.

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::db::{
    AssignmentRepository, DayRepository, MicGroupRepository, PresenterSlotRepository,
    SessionRepository,
};
use crate::error::AppResult;
use crate::AppState;

/// Which part of the tracker a client is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumScope {
    All,
    Day(i64),
    Session(i64),
}

#[derive(Serialize)]
struct SessionSnapshot {
    id: i64,
    day_id: i64,
    name: String,
    location: String,
    num_mics: i64,
    sort_order: i64,
    groups: Vec<(i64, String, String)>,
    assignments: Vec<AssignmentSnapshot>,
}

#[derive(Serialize)]
struct AssignmentSnapshot {
    id: i64,
    rf_number: i64,
    mic_type: String,
    is_d_mic: bool,
    is_micd: bool,
    group_id: Option<i64>,
    shared_presenters: Vec<String>,
    active_slot: i64,
    notes: String,
    slots: Vec<(i64, String, Option<String>)>,
}

#[derive(Serialize)]
struct DaySnapshot {
    id: i64,
    date: String,
    name: String,
    sessions: Vec<SessionSnapshot>,
}

pub struct ChecksumService;

impl ChecksumService {
    /// SHA-256 hex digest of the scope, or `None` when there is nothing to watch.
    pub async fn compute(state: &Arc<AppState>, scope: ChecksumScope) -> AppResult<Option<String>> {
        let days = match scope {
            ChecksumScope::All => DayRepository::list_all(&state.db).await?,
            ChecksumScope::Day(id) => DayRepository::find_by_id(&state.db, id)
                .await?
                .into_iter()
                .collect(),
            ChecksumScope::Session(id) => {
                let Some(session) = SessionRepository::find_by_id(&state.db, id).await? else {
                    return Ok(None);
                };
                let snapshot = Self::session_snapshot(state, session).await?;
                return Ok(Some(digest(&snapshot)?));
            }
        };

        if days.is_empty() {
            return Ok(None);
        }

        let mut snapshots = Vec::with_capacity(days.len());
        for day in days {
            let mut sessions = Vec::new();
            for session in SessionRepository::list_by_day(&state.db, day.id).await? {
                sessions.push(Self::session_snapshot(state, session).await?);
            }
            snapshots.push(DaySnapshot {
                id: day.id,
                date: day.date.to_string(),
                name: day.name,
                sessions,
            });
        }

        let checksum = digest(&snapshots)?;
        tracing::debug!("Checksum for {:?}: {}", scope, checksum);
        Ok(Some(checksum))
    }

    async fn session_snapshot(
        state: &Arc<AppState>,
        session: crate::db::MicSession,
    ) -> AppResult<SessionSnapshot> {
        let groups = MicGroupRepository::list_by_session(&state.db, session.id)
            .await?
            .into_iter()
            .map(|g| (g.id, g.name, g.color))
            .collect();

        let mut assignments = Vec::new();
        for a in AssignmentRepository::list_by_session(&state.db, session.id).await? {
            let slots = PresenterSlotRepository::list_by_assignment(&state.db, a.id)
                .await?
                .into_iter()
                .map(|s| (s.position, s.presenter_name, s.photo_path))
                .collect();
            assignments.push(AssignmentSnapshot {
                id: a.id,
                rf_number: a.rf_number,
                mic_type: a.mic_type,
                is_d_mic: a.is_d_mic,
                is_micd: a.is_micd,
                group_id: a.group_id,
                shared_presenters: a.shared_presenters.0,
                active_slot: a.active_slot,
                notes: a.notes,
                slots,
            });
        }

        Ok(SessionSnapshot {
            id: session.id,
            day_id: session.day_id,
            name: session.name,
            location: session.location,
            num_mics: session.num_mics,
            sort_order: session.sort_order,
            groups,
            assignments,
        })
    }
}

fn digest<T: Serialize>(value: &T) -> AppResult<String> {
    let bytes = serde_json::to_vec(value).map_err(anyhow::Error::from)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

//! Checksum polling: reload an idle page when data changed elsewhere, or
//! show the "Updates available" banner to an active user.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use crate::client::api::TrackerApi;
use crate::client::view::{Node, TrackerView};
use crate::client::Tracker;
use crate::config::SyncConfig;

pub const CHECK_INTERVAL: Duration = Duration::from_secs(5);
pub const IDLE_THRESHOLD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    None,
    Reload,
    ShowBanner,
}

#[derive(Debug, Clone)]
pub struct SyncMonitor {
    last_checksum: Option<String>,
    last_activity: Instant,
    has_unseen_updates: bool,
    idle_threshold: Duration,
    poll_interval: Duration,
}

impl SyncMonitor {
    pub fn new(now: Instant) -> Self {
        Self {
            last_checksum: None,
            last_activity: now,
            has_unseen_updates: false,
            idle_threshold: IDLE_THRESHOLD,
            poll_interval: CHECK_INTERVAL,
        }
    }

    pub fn from_config(config: &SyncConfig, now: Instant) -> Self {
        Self {
            idle_threshold: Duration::from_secs(config.idle_threshold_seconds),
            poll_interval: Duration::from_secs(config.poll_interval_seconds.max(1)),
            ..Self::new(now)
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn last_checksum(&self) -> Option<&str> {
        self.last_checksum.as_deref()
    }

    pub fn has_unseen_updates(&self) -> bool {
        self.has_unseen_updates
    }

    pub fn is_idle(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_activity) > self.idle_threshold
    }

    /// Decide what a freshly polled checksum means for the page.
    pub fn observe(&mut self, checksum: Option<&str>, now: Instant) -> SyncAction {
        let Some(checksum) = checksum else {
            return SyncAction::None;
        };

        match self.last_checksum.as_deref() {
            None => {
                self.last_checksum = Some(checksum.to_string());
                return SyncAction::None;
            }
            Some(previous) if previous == checksum => return SyncAction::None,
            Some(_) => {}
        }

        self.last_checksum = Some(checksum.to_string());

        if self.is_idle(now) && !self.has_unseen_updates {
            SyncAction::Reload
        } else {
            self.has_unseen_updates = true;
            SyncAction::ShowBanner
        }
    }

    /// Any click, key press or edit. Also dismisses the banner.
    pub fn record_activity(&mut self, now: Instant) {
        self.last_activity = now;
        self.has_unseen_updates = false;
    }
}

impl<A: TrackerApi, V: TrackerView> Tracker<A, V> {
    /// One polling round. Failures are logged and otherwise ignored.
    pub async fn poll_sync(&mut self) -> SyncAction {
        let scope = self.ui.sync_scope;
        let checksum = match self.api.checksum(scope).await {
            Ok(checksum) => checksum,
            Err(e) => {
                tracing::warn!("Error checking for updates: {}", e);
                return SyncAction::None;
            }
        };

        let action = self.ui.sync.observe(checksum.as_deref(), Instant::now());
        match action {
            SyncAction::Reload => {
                tracing::info!("Auto-refreshing (user idle)");
                self.view.reload();
            }
            SyncAction::ShowBanner => {
                tracing::debug!("Updates available");
                self.view.set_visible(&Node::UpdateBanner, true);
            }
            SyncAction::None => {}
        }
        action
    }

    pub fn on_activity(&mut self) {
        self.ui.sync.record_activity(Instant::now());
        self.view.set_visible(&Node::UpdateBanner, false);
    }

    /// The banner's "Dismiss" button hides it without counting as activity,
    /// so later changes keep showing the banner instead of reloading.
    pub fn dismiss_banner(&mut self) {
        self.view.set_visible(&Node::UpdateBanner, false);
    }

    /// Poll on the configured interval until `shutdown` flips or its sender
    /// is dropped. Each message on `activity` counts as user activity.
    pub async fn run(
        &mut self,
        mut activity: mpsc::Receiver<()>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let period = self.ui.sync.poll_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Auto-refresh enabled (checking every {:?})", period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_sync().await;
                }
                Some(()) = activity.recv() => {
                    self.on_activity();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Sync monitor stopped");
    }
}

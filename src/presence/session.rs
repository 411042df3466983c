//! A single session's presence on one project.
//!
//! The session announces itself on start, refreshes its entry on a
//! heartbeat timer, and polls the medium on a second timer, publishing the
//! live collaborators through a watch channel. Stopping the session cancels
//! both timers but leaves the entry on the medium: other sessions keep
//! seeing it until it expires.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::medium::{CollaborationState, PresenceFilter, PresenceMedium};
use crate::core::{PresenceConfig, SharedClock};
use crate::model::UserProfile;

/// Text areas whose focus is broadcast.
pub const GENERAL_NOTES: &str = "general_notes";
pub const TECH_REMARKS: &str = "tech_remarks";
pub const RECORDS_INPUT: &str = "records_input";

/// Live collaborators keyed by user id.
pub type Collaborators = BTreeMap<String, CollaborationState>;

/// Timer settings for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceTiming {
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub expiry: Duration,
}

impl Default for PresenceTiming {
    fn default() -> Self {
        Self::from(&PresenceConfig::default())
    }
}

impl From<&PresenceConfig> for PresenceTiming {
    fn from(config: &PresenceConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            heartbeat_interval: config.heartbeat_interval(),
            expiry: config.expiry(),
        }
    }
}

/// One user's presence on one project.
#[derive(Debug)]
pub struct PresenceSession {
    medium: Arc<dyn PresenceMedium>,
    clock: SharedClock,
    timing: PresenceTiming,
    entry: Mutex<CollaborationState>,
    collaborators: watch::Sender<Collaborators>,
}

impl PresenceSession {
    pub fn new(
        project_id: impl Into<String>,
        profile: &UserProfile,
        medium: Arc<dyn PresenceMedium>,
        clock: SharedClock,
        timing: PresenceTiming,
    ) -> Self {
        let entry = CollaborationState {
            project_id: project_id.into(),
            user_id: profile.id.clone(),
            user_name: profile.name.clone(),
            user_color: profile.display_color().to_string(),
            active_section: String::new(),
            last_seen: 0,
        };
        let (collaborators, _) = watch::channel(Collaborators::new());
        Self { medium, clock, timing, entry: Mutex::new(entry), collaborators }
    }

    /// This session's current entry.
    pub fn entry(&self) -> CollaborationState {
        self.entry.lock().clone()
    }

    pub fn timing(&self) -> PresenceTiming {
        self.timing
    }

    /// Stamp the entry and write it to the medium.
    ///
    /// `last_seen` always moves forward, even if the clock has not.
    pub async fn announce(&self) {
        let entry = {
            let mut entry = self.entry.lock();
            entry.last_seen = self.clock.now_millis().max(entry.last_seen + 1);
            entry.clone()
        };

        if let Err(e) = self.medium.publish(&entry).await {
            tracing::warn!(
                medium = self.medium.name(),
                project = %entry.project_id,
                error = %e,
                "Failed to publish presence"
            );
        }
    }

    /// Refresh the entry so other sessions do not expire it.
    pub async fn heartbeat(&self) {
        self.announce().await;
    }

    /// Record which section has focus and re-announce. Empty clears focus.
    pub async fn focus_section(&self, section_id: &str) {
        self.entry.lock().active_section = section_id.to_string();
        tracing::debug!(section = section_id, "Focus changed");
        self.announce().await;
    }

    /// Read the medium, keep the live entries of other users, and publish them.
    ///
    /// On a medium error the previous snapshot stays in place.
    pub async fn poll(&self) -> Collaborators {
        let (project_id, user_id) = {
            let entry = self.entry.lock();
            (entry.project_id.clone(), entry.user_id.clone())
        };
        let filter = PresenceFilter::new(project_id, self.clock.now_millis(), self.timing.expiry)
            .excluding(user_id);

        match self.medium.snapshot(&filter).await {
            Ok(entries) => {
                // Re-check so a medium that ignores the filter cannot leak stale entries
                let live: Collaborators = entries
                    .into_iter()
                    .filter(|e| filter.matches(e))
                    .map(|e| (e.user_id.clone(), e))
                    .collect();
                self.collaborators.send_replace(live.clone());
                live
            }
            Err(e) => {
                tracing::warn!(medium = self.medium.name(), error = %e, "Presence poll failed");
                self.collaborators()
            }
        }
    }

    /// Latest published snapshot.
    pub fn collaborators(&self) -> Collaborators {
        self.collaborators.borrow().clone()
    }

    /// Receiver notified on every poll.
    pub fn subscribe(&self) -> watch::Receiver<Collaborators> {
        self.collaborators.subscribe()
    }

    /// First collaborator focused on `section`, if any.
    pub fn section_editor(&self, section: &str) -> Option<CollaborationState> {
        self.collaborators.borrow().values().find(|c| c.is_editing(section)).cloned()
    }

    /// Announce, poll once, then run the heartbeat and poll timers.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn start(self) -> PresenceHandle {
        let session = Arc::new(self);
        session.announce().await;
        session.poll().await;

        let heartbeat = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(session.timing.heartbeat_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    session.heartbeat().await;
                }
            })
        };

        let poller = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(session.timing.poll_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    session.poll().await;
                }
            })
        };

        let entry = session.entry();
        tracing::debug!(project = %entry.project_id, user = %entry.user_id, "Presence started");

        PresenceHandle { session, tasks: vec![heartbeat, poller] }
    }
}

/// Running presence session. Dropping it stops the timers.
#[derive(Debug)]
pub struct PresenceHandle {
    session: Arc<PresenceSession>,
    tasks: Vec<JoinHandle<()>>,
}

impl PresenceHandle {
    pub fn session(&self) -> &PresenceSession {
        &self.session
    }

    pub fn collaborators(&self) -> Collaborators {
        self.session.collaborators()
    }

    pub fn subscribe(&self) -> watch::Receiver<Collaborators> {
        self.session.subscribe()
    }

    pub async fn focus_section(&self, section_id: &str) {
        self.session.focus_section(section_id).await;
    }

    pub fn section_editor(&self, section: &str) -> Option<CollaborationState> {
        self.session.section_editor(section)
    }

    /// Cancel both timers. The entry is left to expire on its own.
    pub fn stop(mut self) {
        self.abort_tasks();
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for PresenceHandle {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

//! Shared presence media.
//!
//! A medium is a blackboard every session can write its own entry to and
//! read everyone's entries from. Sessions only ever write under their own
//! (project, user) key, so concurrent writers never collide; readers may
//! see an entry up to one poll interval late.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::store::{get_json, set_json, SharedStorage};

/// Storage key prefix for presence entries.
pub const PRESENCE_KEY_PREFIX: &str = "presence:";

/// One participant's presence on one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationState {
    pub project_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_color: String,
    /// Focused section id; empty when only viewing
    #[serde(default)]
    pub active_section: String,
    /// Unix milliseconds of the last announce or heartbeat
    pub last_seen: i64,
}

impl CollaborationState {
    /// Whether the entry has gone without a heartbeat for longer than `expiry`.
    pub fn is_expired(&self, now_millis: i64, expiry: Duration) -> bool {
        let expiry = i64::try_from(expiry.as_millis()).unwrap_or(i64::MAX);
        now_millis.saturating_sub(self.last_seen) > expiry
    }

    /// Whether this participant is focused on `section`.
    pub fn is_editing(&self, section: &str) -> bool {
        !section.is_empty() && self.active_section == section
    }

    /// Storage key of this entry.
    pub fn key(&self) -> String {
        presence_key(&self.project_id, &self.user_id)
    }
}

/// Storage key of a presence entry.
pub fn presence_key(project_id: &str, user_id: &str) -> String {
    format!("{PRESENCE_KEY_PREFIX}{project_id}:{user_id}")
}

/// Selects the live entries of one project.
#[derive(Debug, Clone)]
pub struct PresenceFilter {
    pub project_id: String,
    pub now_millis: i64,
    pub expiry: Duration,
    /// Usually the reading session's own user id
    pub exclude_user: Option<String>,
}

impl PresenceFilter {
    pub fn new(project_id: impl Into<String>, now_millis: i64, expiry: Duration) -> Self {
        Self { project_id: project_id.into(), now_millis, expiry, exclude_user: None }
    }

    pub fn excluding(mut self, user_id: impl Into<String>) -> Self {
        self.exclude_user = Some(user_id.into());
        self
    }

    pub fn matches(&self, entry: &CollaborationState) -> bool {
        entry.project_id == self.project_id
            && self.exclude_user.as_deref() != Some(entry.user_id.as_str())
            && !entry.is_expired(self.now_millis, self.expiry)
    }
}

/// Transport for presence entries.
#[async_trait]
pub trait PresenceMedium: Send + Sync + std::fmt::Debug {
    /// Write (or overwrite) the entry keyed by its project and user.
    async fn publish(&self, entry: &CollaborationState) -> anyhow::Result<()>;

    /// All entries accepted by `filter`.
    async fn snapshot(&self, filter: &PresenceFilter) -> anyhow::Result<Vec<CollaborationState>>;

    /// Medium name for logs.
    fn name(&self) -> &str;
}

/// In-process medium. Clones share the same board.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    entries: Arc<RwLock<HashMap<(String, String), CollaborationState>>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries on the board, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl PresenceMedium for MemoryMedium {
    async fn publish(&self, entry: &CollaborationState) -> anyhow::Result<()> {
        self.entries
            .write()
            .insert((entry.project_id.clone(), entry.user_id.clone()), entry.clone());
        Ok(())
    }

    async fn snapshot(&self, filter: &PresenceFilter) -> anyhow::Result<Vec<CollaborationState>> {
        let mut entries: Vec<CollaborationState> =
            self.entries.read().values().filter(|e| filter.matches(e)).cloned().collect();
        entries.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(entries)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Medium over a key-value store; entries live under `presence:<project>:<user>`.
///
/// With a [`crate::store::FileStore`] every process sharing the data
/// directory sees the others.
#[derive(Debug, Clone)]
pub struct StorageMedium {
    storage: SharedStorage,
}

impl StorageMedium {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl PresenceMedium for StorageMedium {
    async fn publish(&self, entry: &CollaborationState) -> anyhow::Result<()> {
        set_json(self.storage.as_ref(), &entry.key(), entry)?;
        Ok(())
    }

    async fn snapshot(&self, filter: &PresenceFilter) -> anyhow::Result<Vec<CollaborationState>> {
        let prefix = format!("{PRESENCE_KEY_PREFIX}{}:", filter.project_id);
        let mut entries = Vec::new();

        for key in self.storage.keys(&prefix)? {
            match get_json::<CollaborationState>(self.storage.as_ref(), &key) {
                Ok(Some(entry)) if filter.matches(&entry) => entries.push(entry),
                Ok(_) => {}
                // A torn or foreign document is skipped, not fatal
                Err(e) => tracing::debug!(key = %key, error = %e, "Skipping presence entry"),
            }
        }

        entries.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(entries)
    }

    fn name(&self) -> &str {
        "storage"
    }
}

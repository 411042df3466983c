//! Persistence of the session's [`UserProfile`].

use super::storage::{get_json, set_json, SharedStorage, StorageResult};
use crate::model::UserProfile;

/// Storage key of the profile document.
pub const PROFILE_KEY: &str = "profile";

/// Loads and saves the single local profile.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    storage: SharedStorage,
}

impl ProfileStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// The stored profile, or the default one when missing or unreadable.
    pub fn load(&self) -> UserProfile {
        match get_json::<UserProfile>(self.storage.as_ref(), PROFILE_KEY) {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable profile, using defaults");
                UserProfile::default()
            }
        }
    }

    /// Overwrite the stored profile.
    pub fn save(&self, profile: &UserProfile) -> StorageResult<()> {
        set_json(self.storage.as_ref(), PROFILE_KEY, profile)
    }

    /// Load, modify and save in one step.
    pub fn update(&self, f: impl FnOnce(&mut UserProfile)) -> StorageResult<UserProfile> {
        let mut profile = self.load();
        f(&mut profile);
        self.save(&profile)?;
        Ok(profile)
    }
}

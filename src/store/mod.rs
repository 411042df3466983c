//! State ownership and persistence.
//!
//! [`ProjectStore`] and [`ProfileStore`] are explicit objects built at
//! startup around an injected [`KeyValueStore`], so tests swap in a
//! [`MemoryStore`] while the CLI uses a [`FileStore`] in the data directory.

mod profile;
mod projects;
mod sample;
mod storage;

pub use profile::{ProfileStore, PROFILE_KEY};
pub use projects::{project_key, ProjectStore, PROJECT_KEY_PREFIX};
pub use sample::{sample_projects, SAMPLE_IDS};
pub use storage::{
    get_json, set_json, FileStore, KeyValueStore, MemoryStore, SharedStorage, StorageError,
    StorageResult,
};

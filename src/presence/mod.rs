//! Collaboration presence.
//!
//! Shows which teammates are viewing a project and which text section each
//! is editing. This is a liveness hint over a shared blackboard: every
//! session writes its own entry, heartbeats it, and polls for the others.
//! Entries that miss heartbeats for longer than the expiry are dropped from
//! the visible set. There are no locks and no conflict resolution.

mod medium;
mod session;

pub use medium::{
    presence_key, CollaborationState, MemoryMedium, PresenceFilter, PresenceMedium,
    StorageMedium, PRESENCE_KEY_PREFIX,
};
pub use session::{
    Collaborators, PresenceHandle, PresenceSession, PresenceTiming, GENERAL_NOTES, RECORDS_INPUT,
    TECH_REMARKS,
};

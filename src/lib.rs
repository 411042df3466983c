//! # StitchFlow
//!
//! Merchandising tracker for garment manufacturing.
//!
//! StitchFlow follows apparel styles through a fixed 16-stage production
//! workflow, from buyer inquiry through costing, samples, production and
//! shipment to final payment, and asks a hosted language model for advice
//! along the way.
//!
//! ## Features
//!
//! - **Project store**: 16-step workflows, step records, todo planner,
//!   persisted as one JSON document per project
//! - **Presence**: see which teammates are viewing a project and which
//!   section they are editing
//! - **Advisory relay**: risk analysis, follow-up drafts, costing help,
//!   urgency plans, trend feed and chat, with fixed fallbacks on failure
//!
//! ## Quick Start
//!
//! ```bash
//! # List tracked styles
//! stitchflow list
//!
//! # Mark the costing step of p1 approved
//! stitchflow step p1 3 --status approved
//!
//! # Show who else is on p1 while editing the general notes
//! stitchflow presence p1 --section general_notes
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_panics_doc)]

pub mod advisor;
pub mod ai;
pub mod core;
pub mod model;
pub mod presence;
pub mod store;

pub use advisor::AdvisorChat;
pub use ai::{AdvisoryProvider, AdvisoryRelay, FeedInsight, Generation};
pub use crate::core::{Clock, Config, ManualClock, SystemClock};
pub use model::{
    NewProject, Project, ProjectPatch, StepPatch, StepStatus, TodoItem, UserProfile, WorkflowStep,
};
pub use presence::{CollaborationState, PresenceHandle, PresenceMedium, PresenceSession};
pub use store::{FileStore, KeyValueStore, MemoryStore, ProfileStore, ProjectStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "stitchflow";

/// Short alias
pub const APP_ALIAS: &str = "sf";

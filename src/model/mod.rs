//! Domain records: projects, workflow steps, todos, profiles, chat.
//!
//! All records serialize with camelCase keys, matching the JSON documents
//! kept in storage.

mod chat;
mod profile;
mod project;
mod step;

pub use chat::{ChatMessage, ChatRole};
pub use profile::{UserProfile, DEFAULT_USER_COLOR};
pub use project::{
    DashboardStats, NewProject, Priority, Project, ProjectPatch, StepPatch, TodoItem,
};
pub use step::{
    create_initial_workflow, due_date_for, workflow_at_stage, StepRecord, StepStatus,
    WorkflowStep, WorkflowStepId, WORKFLOW_LEN, WORKFLOW_STRUCTURE,
};

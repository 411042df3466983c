//! Projects (garment styles), their todo lists, and partial updates.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::step::{StepRecord, StepStatus, WorkflowStep, WORKFLOW_LEN};

/// Priority of a todo item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A free-standing task on a project's planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub task: String,
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
}

/// A garment style tracked through the production workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub style_name: String,
    pub style_number: String,
    pub buyer_name: String,
    pub season: String,
    pub quantity: u32,
    pub ship_date: String,
    pub current_step_index: usize,
    pub workflow: Vec<WorkflowStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_pack_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_pack_notes: Option<String>,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub todo_items: Vec<TodoItem>,
    #[serde(default)]
    pub merchandiser_notes: String,
}

impl Project {
    /// The step the project is currently at.
    pub fn current_step(&self) -> Option<&WorkflowStep> {
        self.workflow.get(self.current_step_index)
    }

    /// Label of the current stage, or an empty string.
    pub fn current_stage_label(&self) -> &str {
        self.current_step().map_or("", |s| s.label.as_str())
    }

    /// Share of completed or approved steps, 0-100.
    pub fn progress_percent(&self) -> u8 {
        let done = self.workflow.iter().filter(|s| s.status.is_done()).count();
        ((done * 100) / WORKFLOW_LEN).min(100) as u8
    }

    /// Indices of steps past due on `today`.
    pub fn overdue_steps(&self, today: NaiveDate) -> Vec<usize> {
        self.workflow
            .iter()
            .enumerate()
            .filter(|(_, step)| step.is_overdue(today))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Number of todo items still open.
    pub fn open_todos(&self) -> usize {
        self.todo_items.iter().filter(|t| !t.completed).count()
    }
}

/// Fields supplied by the add-project flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub style_name: String,
    pub style_number: String,
    pub buyer_name: String,
    pub season: String,
    pub quantity: u32,
    pub ship_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
}

/// Partial update of a workflow step. `None` fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepPatch {
    pub label: Option<String>,
    pub status: Option<StepStatus>,
    pub due_date: Option<String>,
    pub comment: Option<String>,
    pub records: Option<Vec<StepRecord>>,
}

impl StepPatch {
    pub fn status(status: StepStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn due_date(date: impl Into<String>) -> Self {
        Self { due_date: Some(date.into()), ..Self::default() }
    }

    pub fn records(records: Vec<StepRecord>) -> Self {
        Self { records: Some(records), ..Self::default() }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Shallow-merge onto `step`. Does not touch `updated_at`.
    pub fn apply(self, step: &mut WorkflowStep) {
        if let Some(label) = self.label {
            step.label = label;
        }
        if let Some(status) = self.status {
            step.status = status;
        }
        if let Some(due_date) = self.due_date {
            step.due_date = Some(due_date);
        }
        if let Some(comment) = self.comment {
            step.comment = Some(comment);
        }
        if let Some(records) = self.records {
            step.records = records;
        }
    }
}

/// Partial update of a project. The workflow itself is only changed
/// through step updates, which keeps it at 16 stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub style_name: Option<String>,
    pub style_number: Option<String>,
    pub buyer_name: Option<String>,
    pub season: Option<String>,
    pub quantity: Option<u32>,
    pub ship_date: Option<String>,
    pub current_step_index: Option<usize>,
    pub product_image_url: Option<String>,
    pub tech_pack_url: Option<String>,
    pub tech_pack_notes: Option<String>,
    pub is_urgent: Option<bool>,
    pub todo_items: Option<Vec<TodoItem>>,
    pub merchandiser_notes: Option<String>,
}

impl ProjectPatch {
    pub fn urgent(is_urgent: bool) -> Self {
        Self { is_urgent: Some(is_urgent), ..Self::default() }
    }

    pub fn notes(notes: impl Into<String>) -> Self {
        Self { merchandiser_notes: Some(notes.into()), ..Self::default() }
    }

    pub fn todos(todo_items: Vec<TodoItem>) -> Self {
        Self { todo_items: Some(todo_items), ..Self::default() }
    }

    /// Shallow-merge onto `project`.
    pub fn apply(self, project: &mut Project) {
        let Self {
            style_name,
            style_number,
            buyer_name,
            season,
            quantity,
            ship_date,
            current_step_index,
            product_image_url,
            tech_pack_url,
            tech_pack_notes,
            is_urgent,
            todo_items,
            merchandiser_notes,
        } = self;

        if let Some(v) = style_name {
            project.style_name = v;
        }
        if let Some(v) = style_number {
            project.style_number = v;
        }
        if let Some(v) = buyer_name {
            project.buyer_name = v;
        }
        if let Some(v) = season {
            project.season = v;
        }
        if let Some(v) = quantity {
            project.quantity = v;
        }
        if let Some(v) = ship_date {
            project.ship_date = v;
        }
        if let Some(v) = current_step_index {
            project.current_step_index = v;
        }
        if let Some(v) = product_image_url {
            project.product_image_url = Some(v);
        }
        if let Some(v) = tech_pack_url {
            project.tech_pack_url = Some(v);
        }
        if let Some(v) = tech_pack_notes {
            project.tech_pack_notes = Some(v);
        }
        if let Some(v) = is_urgent {
            project.is_urgent = v;
        }
        if let Some(v) = todo_items {
            project.todo_items = v;
        }
        if let Some(v) = merchandiser_notes {
            project.merchandiser_notes = v;
        }
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub projects: usize,
    pub urgent: usize,
    pub overdue_steps: usize,
    pub open_todos: usize,
}

impl DashboardStats {
    pub fn collect<'a>(projects: impl IntoIterator<Item = &'a Project>, today: NaiveDate) -> Self {
        projects.into_iter().fold(Self::default(), |mut stats, p| {
            stats.projects += 1;
            stats.urgent += usize::from(p.is_urgent);
            stats.overdue_steps += p.overdue_steps(today).len();
            stats.open_todos += p.open_todos();
            stats
        })
    }
}

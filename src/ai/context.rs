//! Structured context attached to advisory prompts.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use crate::model::Project;

/// Portfolio summary sent with free-form advice questions.
///
/// One entry per project: style name, buyer, current stage and urgency.
pub fn portfolio_context(projects: &[Project]) -> Value {
    let projects: Vec<Value> = projects
        .iter()
        .map(|p| {
            json!({
                "name": p.style_name,
                "buyer": p.buyer_name,
                "status": p.current_stage_label(),
                "isUrgent": p.is_urgent,
            })
        })
        .collect();
    json!({ "projects": projects })
}

/// Activity numbers fed to the skills evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillStats {
    /// Average days a completed step took past its due date (negative = early)
    pub avg_days_late: f64,
    pub total_tasks_updated: usize,
    pub overdue_count: usize,
    pub completed_steps: usize,
    pub ai_followup_count: usize,
}

impl SkillStats {
    /// Derive stats from the current portfolio.
    ///
    /// A step counts as updated when it has records or is no longer pending.
    pub fn from_projects(projects: &[Project], today: NaiveDate, ai_followup_count: usize) -> Self {
        let mut stats = Self { ai_followup_count, ..Self::default() };
        let mut lateness = Vec::new();

        for step in projects.iter().flat_map(|p| &p.workflow) {
            if !step.records.is_empty() || step.status != crate::model::StepStatus::Pending {
                stats.total_tasks_updated += 1;
            }
            if step.is_overdue(today) {
                stats.overdue_count += 1;
            }
            if step.status.is_done() {
                stats.completed_steps += 1;
                let due = step
                    .due_date
                    .as_deref()
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
                let done = chrono::DateTime::parse_from_rfc3339(&step.updated_at)
                    .ok()
                    .map(|t| t.date_naive());
                if let (Some(due), Some(done)) = (due, done) {
                    lateness.push((done - due).num_days() as f64);
                }
            }
        }

        if !lateness.is_empty() {
            stats.avg_days_late = lateness.iter().sum::<f64>() / lateness.len() as f64;
        }
        stats
    }
}

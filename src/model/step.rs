//! Workflow stages and steps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Number of stages every project workflow carries.
pub const WORKFLOW_LEN: usize = 16;

/// Status of a single workflow step.
///
/// Transitions are unconstrained: any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
    Approved,
}

impl StepStatus {
    /// Whether the step counts as done (completed or approved).
    pub fn is_done(self) -> bool {
        matches!(self, Self::Completed | Self::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
            Self::Approved => "APPROVED",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "REJECTED" => Ok(Self::Rejected),
            "APPROVED" => Ok(Self::Approved),
            other => Err(format!("unknown step status: {other}")),
        }
    }
}

/// The 16 fixed production stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStepId {
    BuyerInquiry,
    SupplierCompare,
    FabricTrimsCollection,
    CostingQuotation,
    FobApproval,
    SamplesTrack,
    SamplesApproval,
    WashPrintApproval,
    ProductionPlanning,
    InlineReport,
    DailyProduction,
    InspectionReport,
    FinalInspectionApproval,
    CommercialDocs,
    FinalPayment,
    DiscrepancyRecord,
}

/// Stage ids paired with their display labels, in pipeline order.
pub const WORKFLOW_STRUCTURE: [(WorkflowStepId, &str); WORKFLOW_LEN] = [
    (WorkflowStepId::BuyerInquiry, "Buyer Inquiry"),
    (WorkflowStepId::SupplierCompare, "Supplier Comparison"),
    (WorkflowStepId::FabricTrimsCollection, "Fabric & Trims Price"),
    (WorkflowStepId::CostingQuotation, "Costing Quotation"),
    (WorkflowStepId::FobApproval, "FOB Price Approval"),
    (WorkflowStepId::SamplesTrack, "Samples Submission"),
    (WorkflowStepId::SamplesApproval, "Samples Approval"),
    (WorkflowStepId::WashPrintApproval, "Wash & Print Strike-off"),
    (WorkflowStepId::ProductionPlanning, "Production Planning"),
    (WorkflowStepId::InlineReport, "Inline Report"),
    (WorkflowStepId::DailyProduction, "Daily Production Tracker"),
    (WorkflowStepId::InspectionReport, "Inspection Report"),
    (WorkflowStepId::FinalInspectionApproval, "Final Inspection"),
    (WorkflowStepId::CommercialDocs, "Commercial Documents"),
    (WorkflowStepId::FinalPayment, "Final Payment"),
    (WorkflowStepId::DiscrepancyRecord, "Buyer Discrepancy Record"),
];

impl WorkflowStepId {
    /// Position of this stage in the pipeline.
    pub fn index(self) -> usize {
        WORKFLOW_STRUCTURE.iter().position(|(id, _)| *id == self).unwrap_or(0)
    }

    /// Default display label.
    pub fn label(self) -> &'static str {
        WORKFLOW_STRUCTURE[self.index()].1
    }

    /// Stage at a pipeline position.
    pub fn at(index: usize) -> Option<Self> {
        WORKFLOW_STRUCTURE.get(index).map(|(id, _)| *id)
    }
}

/// A timestamped note (and optional image) attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub id: String,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub timestamp: String,
}

/// One stage of a project's workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: WorkflowStepId,
    pub label: String,
    pub status: StepStatus,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub records: Vec<StepRecord>,
}

impl WorkflowStep {
    /// Whether the step is past due on `today` and not yet done.
    ///
    /// Steps without a parseable due date are never overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        if self.status.is_done() {
            return false;
        }
        self.due_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .is_some_and(|due| due < today)
    }
}

/// Due date of the stage at `index` when the workflow is anchored on stage `base`.
///
/// Stages are spaced five days apart; stages before the anchor land in the past.
pub fn due_date_for(today: NaiveDate, base: usize, index: usize) -> String {
    let offset = (index as i64 - base as i64) * 5;
    let date = if offset >= 0 {
        today.checked_add_days(Days::new(offset.unsigned_abs()))
    } else {
        today.checked_sub_days(Days::new(offset.unsigned_abs()))
    };
    date.unwrap_or(today).format("%Y-%m-%d").to_string()
}

/// Build a workflow anchored on `current`: earlier stages completed,
/// `current` in progress, later stages pending.
pub fn workflow_at_stage(now: DateTime<Utc>, current: usize) -> Vec<WorkflowStep> {
    let today = now.date_naive();
    let stamp = now.to_rfc3339();
    WORKFLOW_STRUCTURE
        .iter()
        .enumerate()
        .map(|(idx, (id, label))| WorkflowStep {
            id: *id,
            label: (*label).to_string(),
            status: match idx.cmp(&current) {
                std::cmp::Ordering::Less => StepStatus::Completed,
                std::cmp::Ordering::Equal => StepStatus::InProgress,
                std::cmp::Ordering::Greater => StepStatus::Pending,
            },
            updated_at: stamp.clone(),
            due_date: Some(due_date_for(today, current, idx)),
            comment: None,
            records: Vec::new(),
        })
        .collect()
}

/// Fresh workflow for a newly added project.
pub fn create_initial_workflow(now: DateTime<Utc>) -> Vec<WorkflowStep> {
    workflow_at_stage(now, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_initial_workflow_shape() {
        let workflow = create_initial_workflow(now());
        assert_eq!(workflow.len(), WORKFLOW_LEN);
        assert_eq!(workflow[0].status, StepStatus::InProgress);
        assert!(workflow[1..].iter().all(|s| s.status == StepStatus::Pending));

        for (step, (id, label)) in workflow.iter().zip(WORKFLOW_STRUCTURE.iter()) {
            assert_eq!(step.id, *id);
            assert_eq!(step.label, *label);
        }
    }

    #[test]
    fn test_initial_due_dates_step_five_days() {
        let workflow = create_initial_workflow(now());
        assert_eq!(workflow[0].due_date.as_deref(), Some("2024-06-01"));
        assert_eq!(workflow[1].due_date.as_deref(), Some("2024-06-06"));
        assert_eq!(workflow[15].due_date.as_deref(), Some("2024-08-15"));
    }

    #[test]
    fn test_workflow_at_stage_backdates_earlier_steps() {
        let workflow = workflow_at_stage(now(), 3);
        assert_eq!(workflow[0].status, StepStatus::Completed);
        assert_eq!(workflow[3].status, StepStatus::InProgress);
        assert_eq!(workflow[4].status, StepStatus::Pending);
        assert_eq!(workflow[0].due_date.as_deref(), Some("2024-05-17"));
    }

    #[test]
    fn test_status_serde_format() {
        let json = serde_json::to_string(&StepStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let id = serde_json::to_string(&WorkflowStepId::FobApproval).unwrap();
        assert_eq!(id, "\"fob_approval\"");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("in-progress".parse::<StepStatus>(), Ok(StepStatus::InProgress));
        assert_eq!("approved".parse::<StepStatus>(), Ok(StepStatus::Approved));
        assert!("shipped".parse::<StepStatus>().is_err());
    }

    #[test]
    fn test_step_id_positions() {
        assert_eq!(WorkflowStepId::BuyerInquiry.index(), 0);
        assert_eq!(WorkflowStepId::CostingQuotation.label(), "Costing Quotation");
        assert_eq!(WorkflowStepId::at(15), Some(WorkflowStepId::DiscrepancyRecord));
        assert_eq!(WorkflowStepId::at(16), None);
    }

    #[test]
    fn test_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut step = create_initial_workflow(now()).remove(1);
        assert!(step.is_overdue(today));

        step.status = StepStatus::Approved;
        assert!(!step.is_overdue(today));

        step.status = StepStatus::Rejected;
        step.due_date = Some("not a date".to_string());
        assert!(!step.is_overdue(today));

        step.due_date = Some("2024-06-10".to_string());
        assert!(!step.is_overdue(today));
    }
}

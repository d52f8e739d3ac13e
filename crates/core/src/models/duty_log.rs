use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Action tags written to the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyAction {
    Booked,
    Cancelled,
    Completed,
    ApprovedIndividual,
    ApprovedAll,
    Rejected,
    RejectedAll,
    StatusPending,
    StatusApproved,
    StatusCancelled,
    ScheduleDeleted,
    ProfileDeactivated,
}

impl DutyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DutyAction::Booked => "booked",
            DutyAction::Cancelled => "cancelled",
            DutyAction::Completed => "completed",
            DutyAction::ApprovedIndividual => "approved_individual",
            DutyAction::ApprovedAll => "approved_all",
            DutyAction::Rejected => "rejected",
            DutyAction::RejectedAll => "rejected_all",
            DutyAction::StatusPending => "status_pending",
            DutyAction::StatusApproved => "status_approved",
            DutyAction::StatusCancelled => "status_cancelled",
            DutyAction::ScheduleDeleted => "schedule_deleted",
            DutyAction::ProfileDeactivated => "profile_deactivated",
        }
    }
}

impl fmt::Display for DutyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit record. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyLog {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub action: String,
    pub performed_by: Option<Uuid>,
    pub target_user: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of a single student's reservation.
///
/// `booked → approved | cancelled`; `approved → completed | cancelled`;
/// `cancelled` and `completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Approved,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Approved => "approved",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Active bookings count against schedule capacity and the
    /// one-duty-per-day rule.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Booked | BookingStatus::Approved)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Booked, BookingStatus::Approved)
                | (BookingStatus::Booked, BookingStatus::Cancelled)
                | (BookingStatus::Approved, BookingStatus::Completed)
                | (BookingStatus::Approved, BookingStatus::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(BookingStatus::Booked),
            "approved" => Ok(BookingStatus::Approved),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub student_id: Uuid,
    pub booking_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A booking joined with its schedule and student, as shown on admin views
/// and duty histories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetails {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub student_id: Uuid,
    pub booking_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub date: NaiveDate,
    pub location: String,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub student_name: String,
    pub student_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDutyRequest {
    pub schedule_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDutyResponse {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub student_id: Uuid,
    pub booking_time: DateTime<Utc>,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkApprovalResponse {
    pub approved: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRejectionResponse {
    pub rejected: usize,
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub cancelled: i64,
    pub completed: i64,
}

/// Per-student completion numbers over a reporting window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentDutyStats {
    pub student_id: Uuid,
    pub full_name: String,
    pub total: i64,
    pub completed: i64,
    pub cancelled: i64,
}

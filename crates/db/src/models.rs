use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub student_number: Option<String>,
    pub year_level: Option<String>,
    pub phone_number: Option<String>,
    pub student_id: Option<Uuid>,
    pub is_active: bool,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a profile; the id is assigned by the auth collaborator.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub student_number: Option<String>,
    pub year_level: Option<String>,
    pub phone_number: Option<String>,
    pub student_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSchedule {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub location: String,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub max_students: i32,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub date: NaiveDate,
    pub description: Option<String>,
    pub location: String,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub max_students: i32,
    pub created_by: Option<Uuid>,
}

/// A schedule row joined with its active booking count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbScheduleWithCount {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub location: String,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub max_students: i32,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active_bookings: i64,
}

/// Capacity snapshot for one schedule, used by the booking fast path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbScheduleBookingInfo {
    pub schedule_date: NaiveDate,
    pub location: String,
    pub max_students: i32,
    pub current_bookings: i64,
    pub is_full: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub student_id: Uuid,
    pub booking_time: DateTime<Utc>,
    pub status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// A booking joined with schedule and student details for admin views and
/// duty histories.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBookingDetail {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub student_id: Uuid,
    pub booking_time: DateTime<Utc>,
    pub status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub date: NaiveDate,
    pub location: String,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDutyLog {
    pub id: Uuid,
    pub schedule_student_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub action: String,
    pub performed_by: Option<Uuid>,
    pub target_user: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDutyLog {
    pub schedule_student_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub action: String,
    pub performed_by: Option<Uuid>,
    pub target_user: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBookingStatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbStudentDutyStat {
    pub student_id: Uuid,
    pub full_name: String,
    pub total: i64,
    pub completed: i64,
    pub cancelled: i64,
}

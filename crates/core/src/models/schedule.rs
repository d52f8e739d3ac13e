use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::booking::BookingDetails;

/// Schedule-level status, derived from the aggregate state of its bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Approved,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Approved => "approved",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScheduleStatus::Pending),
            "approved" => Ok(ScheduleStatus::Approved),
            "cancelled" => Ok(ScheduleStatus::Cancelled),
            other => Err(format!("unknown schedule status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub location: String,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub max_students: i32,
    pub status: ScheduleStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub date: NaiveDate,
    pub description: Option<String>,
    pub location: String,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    /// Defaults to the location roster capacity when omitted.
    pub max_students: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateSchedulesRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Days of week to generate, 0 = Sunday .. 6 = Saturday.
    /// Defaults to Monday through Friday.
    pub days_of_week: Option<Vec<u8>>,
    pub description: Option<String>,
    pub shift_start: Option<NaiveTime>,
    pub shift_end: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateSchedulesResponse {
    pub created: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetScheduleResponse {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub bookings: Vec<BookingDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub active_bookings: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleStatusRequest {
    pub status: ScheduleStatus,
}

/// A duty site with its default capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyLocation {
    pub name: &'static str,
    pub capacity: i32,
    pub description: &'static str,
}

/// The hospital/health-unit roster the program rotates through.
pub const DUTY_LOCATIONS: &[DutyLocation] = &[
    DutyLocation {
        name: "ISDH - Magsingal",
        capacity: 4,
        description: "Ilocos Sur District Hospital - Magsingal",
    },
    DutyLocation {
        name: "ISDH - Sinait",
        capacity: 4,
        description: "Ilocos Sur District Hospital - Sinait",
    },
    DutyLocation {
        name: "ISDH - Narvacan",
        capacity: 4,
        description: "Ilocos Sur District Hospital - Narvacan",
    },
    DutyLocation {
        name: "ISPH - Gab. Silang",
        capacity: 2,
        description: "Ilocos Sur Provincial Hospital - Gab. Silang",
    },
    DutyLocation {
        name: "RHU - Sto. Domingo",
        capacity: 4,
        description: "Rural Health Unit - Sto. Domingo",
    },
    DutyLocation {
        name: "RHU - Santa",
        capacity: 4,
        description: "Rural Health Unit - Santa",
    },
    DutyLocation {
        name: "RHU - San Ildefonso",
        capacity: 4,
        description: "Rural Health Unit - San Ildefonso",
    },
    DutyLocation {
        name: "RHU - Bantay",
        capacity: 4,
        description: "Rural Health Unit - Bantay",
    },
];

/// Default capacity when the location is not on the roster.
pub const DEFAULT_CAPACITY: i32 = 2;

pub fn capacity_for_location(location: &str) -> i32 {
    DUTY_LOCATIONS
        .iter()
        .find(|l| l.name == location)
        .map(|l| l.capacity)
        .unwrap_or(DEFAULT_CAPACITY)
}

/// Bulk generation assigns one site per month, cycling through the roster.
pub fn location_for_date(date: NaiveDate) -> &'static DutyLocation {
    use chrono::Datelike;
    let index = (date.month0() as usize) % DUTY_LOCATIONS.len();
    &DUTY_LOCATIONS[index]
}

//! # Schedule Management Handlers
//!
//! Admin-side schedule lifecycle: creation (single and bulk over a date
//! range), listing with open-slot filtering, direct status changes, and
//! deletion.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use dutyroster_core::{
    errors::DutyError,
    models::{
        duty_log::DutyAction,
        notification::NotificationKind,
        schedule::{
            capacity_for_location, location_for_date, BulkCreateSchedulesRequest,
            BulkCreateSchedulesResponse, CreateScheduleRequest, GetScheduleResponse, Schedule,
            ScheduleSummary, UpdateScheduleStatusRequest,
        },
    },
    rules,
};
use dutyroster_db::models::{DbSchedule, NewDutyLog, NewSchedule};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::{auth::CurrentUser, error_handling::AppError};
use crate::{sink, ApiState};

const DEFAULT_DESCRIPTION: &str = "Community Health Center Duty";
const DEFAULT_SHIFT_START: (u32, u32) = (8, 0);
const DEFAULT_SHIFT_END: (u32, u32) = (20, 0);

pub(crate) fn schedule_from_db(db: DbSchedule) -> Result<Schedule, AppError> {
    Ok(Schedule {
        id: db.id,
        date: db.date,
        description: db.description,
        location: db.location,
        shift_start: db.shift_start,
        shift_end: db.shift_end,
        max_students: db.max_students,
        status: super::parse_status(&db.status)?,
        approved_by: db.approved_by,
        approved_at: db.approved_at,
        created_at: db.created_at,
    })
}

/// Creates a single schedule. Capacity defaults from the location roster.
#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Json(payload): Json<CreateScheduleRequest>,
) -> Result<Json<Schedule>, AppError> {
    user.require_admin()?;

    let today = Utc::now().date_naive();
    rules::validate_schedule_date(payload.date, today)?;

    let max_students = payload
        .max_students
        .unwrap_or_else(|| capacity_for_location(&payload.location));
    rules::validate_capacity(max_students)?;

    let new_schedule = NewSchedule {
        date: payload.date,
        description: payload.description,
        location: payload.location,
        shift_start: payload.shift_start,
        shift_end: payload.shift_end,
        max_students,
        created_by: Some(user.id),
    };

    let created =
        dutyroster_db::repositories::schedule::create_schedule(&state.db_pool, &new_schedule)
            .await
            .map_err(DutyError::Database)?;

    Ok(Json(schedule_from_db(created)?))
}

/// Bulk-creates schedules over a date range, filtered by days of week, with
/// the duty site assigned by the monthly location rotation.
#[axum::debug_handler]
pub async fn create_bulk_schedules(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Json(payload): Json<BulkCreateSchedulesRequest>,
) -> Result<Json<BulkCreateSchedulesResponse>, AppError> {
    user.require_admin()?;

    let today = Utc::now().date_naive();
    rules::validate_schedule_date(payload.start_date, today)?;
    if payload.end_date < payload.start_date {
        return Err(AppError(DutyError::Validation(
            "End date must not be before start date".to_string(),
        )));
    }

    let days = match &payload.days_of_week {
        Some(indices) => rules::weekdays_from_indices(indices)?,
        None => rules::DEFAULT_DUTY_DAYS.to_vec(),
    };

    let shift_start = payload
        .shift_start
        .unwrap_or_else(|| default_time(DEFAULT_SHIFT_START));
    let shift_end = payload
        .shift_end
        .unwrap_or_else(|| default_time(DEFAULT_SHIFT_END));

    let schedules: Vec<NewSchedule> =
        rules::expand_date_range(payload.start_date, payload.end_date, &days)
            .into_iter()
            .map(|date| {
                let location = location_for_date(date);
                NewSchedule {
                    date,
                    description: payload
                        .description
                        .clone()
                        .or_else(|| Some(DEFAULT_DESCRIPTION.to_string())),
                    location: location.name.to_string(),
                    shift_start,
                    shift_end,
                    max_students: location.capacity,
                    created_by: Some(user.id),
                }
            })
            .collect();

    let created =
        dutyroster_db::repositories::schedule::create_schedules_bulk(&state.db_pool, &schedules)
            .await
            .map_err(DutyError::Database)?;

    Ok(Json(BulkCreateSchedulesResponse {
        created: created as usize,
    }))
}

fn default_time((hour, minute): (u32, u32)) -> chrono::NaiveTime {
    chrono::NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Query parameters for the schedule list.
#[derive(Debug, Default, Deserialize)]
pub struct ListSchedulesQuery {
    /// Only schedules on or after this date.
    pub from: Option<chrono::NaiveDate>,
    /// Only schedules with open slots (and not cancelled).
    pub available: Option<bool>,
}

#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListSchedulesQuery>,
    _user: CurrentUser,
) -> Result<Json<Vec<ScheduleSummary>>, AppError> {
    let schedules =
        dutyroster_db::repositories::schedule::list_schedules(&state.db_pool, query.from)
            .await
            .map_err(DutyError::Database)?;

    let available_only = query.available.unwrap_or(false);
    let mut summaries = Vec::with_capacity(schedules.len());
    for row in schedules {
        let active_bookings = row.active_bookings;
        let schedule = schedule_from_db(DbSchedule {
            id: row.id,
            date: row.date,
            description: row.description,
            location: row.location,
            shift_start: row.shift_start,
            shift_end: row.shift_end,
            max_students: row.max_students,
            status: row.status,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })?;

        if available_only
            && (!rules::has_open_slots(active_bookings, schedule.max_students)
                || schedule.status == dutyroster_core::models::schedule::ScheduleStatus::Cancelled)
        {
            continue;
        }

        summaries.push(ScheduleSummary {
            schedule,
            active_bookings,
        });
    }

    Ok(Json(summaries))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    _user: CurrentUser,
) -> Result<Json<GetScheduleResponse>, AppError> {
    let db_schedule = dutyroster_db::repositories::schedule::get_schedule_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Schedule with ID {id} not found")))?;

    let bookings =
        dutyroster_db::repositories::booking::list_bookings_for_schedule(&state.db_pool, id)
            .await
            .map_err(DutyError::Database)?;

    let bookings: Result<Vec<_>, _> = bookings
        .into_iter()
        .map(super::booking::details_from_db)
        .collect();

    Ok(Json(GetScheduleResponse {
        schedule: schedule_from_db(db_schedule)?,
        bookings: bookings?,
    }))
}

/// Directly sets a schedule's status. Approval notifies the schedule's
/// pending students.
#[axum::debug_handler]
pub async fn update_schedule_status(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(payload): Json<UpdateScheduleStatusRequest>,
) -> Result<Json<Schedule>, AppError> {
    user.require_admin()?;

    dutyroster_db::repositories::schedule::get_schedule_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Schedule with ID {id} not found")))?;

    let updated = dutyroster_db::repositories::schedule::update_schedule_status(
        &state.db_pool,
        id,
        payload.status.as_str(),
        Some(user.id),
    )
    .await
    .map_err(DutyError::Database)?;

    let action = match payload.status {
        dutyroster_core::models::schedule::ScheduleStatus::Pending => DutyAction::StatusPending,
        dutyroster_core::models::schedule::ScheduleStatus::Approved => DutyAction::StatusApproved,
        dutyroster_core::models::schedule::ScheduleStatus::Cancelled => DutyAction::StatusCancelled,
    };

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: None,
            schedule_id: Some(id),
            action: action.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: None,
            notes: Some(format!("Schedule status changed to {}", payload.status)),
        },
    )
    .await;

    if payload.status == dutyroster_core::models::schedule::ScheduleStatus::Approved {
        let bookings =
            dutyroster_db::repositories::booking::list_bookings_for_schedule(&state.db_pool, id)
                .await
                .unwrap_or_default();
        let students: Vec<Uuid> = bookings
            .iter()
            .filter(|b| b.status == "booked")
            .map(|b| b.student_id)
            .collect();

        sink::notify_many(
            &state.db_pool,
            &students,
            "Duty Schedule Approved",
            &format!("Your duty schedule for {} has been approved", updated.date),
            NotificationKind::Success,
        )
        .await;
    }

    Ok(Json(schedule_from_db(updated)?))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require_admin()?;

    dutyroster_db::repositories::schedule::get_schedule_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Schedule with ID {id} not found")))?;

    dutyroster_db::repositories::schedule::delete_schedule(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?;

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: None,
            schedule_id: Some(id),
            action: DutyAction::ScheduleDeleted.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: None,
            notes: Some("Admin deleted schedule".to_string()),
        },
    )
    .await;

    Ok(Json(serde_json::json!({ "deleted": id })))
}

//! # Booking Workflow Handlers
//!
//! The approval coordinator: every booking state transition goes through
//! here. Handlers assemble snapshots from the repositories, let the core
//! rules decide, perform the single primary write, and hand side effects to
//! the best-effort sink. There is no in-process locking; the insert
//! transaction and the storage-level unique index are the backstop for
//! racing reservations, and a stale snapshot surfaces as an ordinary
//! conflict.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use dutyroster_core::{
    errors::DutyError,
    models::{
        booking::{
            BookDutyRequest, BookDutyResponse, Booking, BookingDetails, BookingStats,
            BookingStatus, BulkApprovalResponse, BulkRejectionResponse, CancelBookingRequest,
            RejectBookingRequest, StudentDutyStats,
        },
        duty_log::DutyAction,
        notification::NotificationKind,
        profile::Role,
        schedule::ScheduleStatus,
    },
    rules,
};
use dutyroster_db::models::{DbBooking, DbBookingDetail, NewDutyLog};
use dutyroster_db::repositories::booking::BookingInsert;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::{auth::CurrentUser, error_handling::AppError};
use crate::{sink, ApiState};

pub(crate) fn booking_from_db(db: DbBooking) -> Result<Booking, AppError> {
    Ok(Booking {
        id: db.id,
        schedule_id: db.schedule_id,
        student_id: db.student_id,
        booking_time: db.booking_time,
        status: super::parse_status(&db.status)?,
        cancelled_at: db.cancelled_at,
        cancellation_reason: db.cancellation_reason,
        completed_at: db.completed_at,
    })
}

pub(crate) fn details_from_db(db: DbBookingDetail) -> Result<BookingDetails, AppError> {
    Ok(BookingDetails {
        id: db.id,
        schedule_id: db.schedule_id,
        student_id: db.student_id,
        booking_time: db.booking_time,
        status: super::parse_status(&db.status)?,
        cancelled_at: db.cancelled_at,
        cancellation_reason: db.cancellation_reason,
        completed_at: db.completed_at,
        date: db.date,
        location: db.location,
        shift_start: db.shift_start,
        shift_end: db.shift_end,
        student_name: db.full_name,
        student_email: db.email,
    })
}

/// Reserves a slot on a schedule for the calling student.
#[axum::debug_handler]
pub async fn book_duty(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Json(payload): Json<BookDutyRequest>,
) -> Result<Json<BookDutyResponse>, AppError> {
    if user.role != Role::Student {
        return Err(AppError(DutyError::Authorization(
            "Only students can book duties".to_string(),
        )));
    }

    // Capacity snapshot; also confirms the schedule exists.
    let info = dutyroster_db::repositories::schedule::get_schedule_booking_info(
        &state.db_pool,
        payload.schedule_id,
    )
    .await
    .map_err(DutyError::Database)?
    .ok_or_else(|| {
        DutyError::NotFound(format!("Schedule with ID {} not found", payload.schedule_id))
    })?;

    let already_booked = dutyroster_db::repositories::booking::has_active_booking(
        &state.db_pool,
        payload.schedule_id,
        user.id,
    )
    .await
    .map_err(DutyError::Database)?;

    let has_duty_on_date = dutyroster_db::repositories::booking::has_active_booking_on_date(
        &state.db_pool,
        user.id,
        info.schedule_date,
    )
    .await
    .map_err(DutyError::Database)?;

    let today = Utc::now().date_naive();
    let cancelled_same_day = dutyroster_db::repositories::booking::has_same_day_cancellation(
        &state.db_pool,
        user.id,
        info.schedule_date,
        today,
    )
    .await
    .map_err(DutyError::Database)?;

    let ctx = rules::BookingContext {
        schedule_date: info.schedule_date,
        max_students: info.max_students,
        active_bookings: info.current_bookings,
        already_booked,
        has_duty_on_date,
        cancelled_same_day,
    };
    rules::validate_booking(&ctx, today)?;

    // The checks above are a fast path; the insert transaction re-checks
    // committed state under lock and makes the final call under concurrency.
    let booking = match dutyroster_db::repositories::booking::create_booking(
        &state.db_pool,
        payload.schedule_id,
        user.id,
    )
    .await
    .map_err(DutyError::Database)?
    {
        BookingInsert::Created(booking) => booking,
        BookingInsert::Duplicate => {
            return Err(AppError(DutyError::Conflict(
                "You have already booked this duty".to_string(),
            )));
        }
        BookingInsert::Full => {
            return Err(AppError(DutyError::Conflict(
                "This duty is fully booked".to_string(),
            )));
        }
        BookingInsert::DateTaken => {
            return Err(AppError(DutyError::Conflict(
                "You already have a duty scheduled for this date. Students can only have one duty per day"
                    .to_string(),
            )));
        }
    };

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: Some(booking.id),
            schedule_id: Some(payload.schedule_id),
            action: DutyAction::Booked.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: Some(user.id),
            notes: Some(format!("Student booked duty for {}", info.schedule_date)),
        },
    )
    .await;

    sink::notify_admins(
        &state.db_pool,
        "New Duty Booking",
        &format!(
            "{} has booked duty for {} at {}",
            user.full_name, info.schedule_date, info.location
        ),
    )
    .await;

    let response = BookDutyResponse {
        id: booking.id,
        schedule_id: booking.schedule_id,
        student_id: booking.student_id,
        booking_time: booking.booking_time,
        status: super::parse_status(&booking.status)?,
    };

    Ok(Json(response))
}

/// Cancels a booking. Students may cancel their own, admins any; never on
/// the duty's own calendar day. The persisted cancelled_at stamp drives the
/// same-day rebooking lockout.
#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = dutyroster_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Booking with ID {id} not found")))?;

    let schedule = dutyroster_db::repositories::schedule::get_schedule_by_id(
        &state.db_pool,
        booking.schedule_id,
    )
    .await
    .map_err(DutyError::Database)?
    .ok_or_else(|| {
        DutyError::NotFound(format!("Schedule with ID {} not found", booking.schedule_id))
    })?;

    rules::validate_cancel_authorization(user.id, user.role, booking.student_id)?;

    let status: BookingStatus = super::parse_status(&booking.status)?;
    let today = Utc::now().date_naive();
    rules::validate_cancellation(status, schedule.date, today)?;

    let reason = payload
        .reason
        .unwrap_or_else(|| format!("Cancelled by {}", user.role));

    let updated =
        dutyroster_db::repositories::booking::cancel_booking(&state.db_pool, id, &reason)
            .await
            .map_err(DutyError::Database)?;

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: Some(id),
            schedule_id: Some(booking.schedule_id),
            action: DutyAction::Cancelled.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: Some(booking.student_id),
            notes: Some(format!("Duty for {} cancelled by {}", schedule.date, user.role)),
        },
    )
    .await;

    Ok(Json(booking_from_db(updated)?))
}

/// Marks the calling student's approved booking as completed.
#[axum::debug_handler]
pub async fn complete_duty(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<Booking>, AppError> {
    let booking = dutyroster_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Booking with ID {id} not found")))?;

    let status: BookingStatus = super::parse_status(&booking.status)?;
    rules::validate_completion(status, booking.student_id, user.id)?;

    let updated = dutyroster_db::repositories::booking::complete_booking(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?;

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: Some(id),
            schedule_id: Some(booking.schedule_id),
            action: DutyAction::Completed.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: Some(user.id),
            notes: Some("Student marked duty as completed".to_string()),
        },
    )
    .await;

    Ok(Json(booking_from_db(updated)?))
}

/// Approves one pending booking. When it was the schedule's last pending
/// booking, the schedule itself flips to approved.
#[axum::debug_handler]
pub async fn approve_booking(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<Booking>, AppError> {
    user.require_admin()?;

    let booking = dutyroster_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Booking with ID {id} not found")))?;

    let status: BookingStatus = super::parse_status(&booking.status)?;
    rules::validate_approval(status)?;

    let updated = dutyroster_db::repositories::booking::approve_booking(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?;

    let remaining = dutyroster_db::repositories::booking::count_booked_for_schedule(
        &state.db_pool,
        booking.schedule_id,
    )
    .await
    .map_err(DutyError::Database)?;

    if let Some(schedule_status) = rules::schedule_status_after_approval(remaining) {
        dutyroster_db::repositories::schedule::update_schedule_status(
            &state.db_pool,
            booking.schedule_id,
            schedule_status.as_str(),
            Some(user.id),
        )
        .await
        .map_err(DutyError::Database)?;
    }

    sink::notify(
        &state.db_pool,
        booking.student_id,
        "Duty Booking Approved",
        "Your duty booking has been approved! You can now complete your duty on the scheduled date.",
        NotificationKind::Success,
    )
    .await;

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: Some(id),
            schedule_id: Some(booking.schedule_id),
            action: DutyAction::ApprovedIndividual.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: Some(booking.student_id),
            notes: Some("Admin approved individual student booking".to_string()),
        },
    )
    .await;

    Ok(Json(booking_from_db(updated)?))
}

/// Rejects one pending booking. When no pending bookings remain the
/// schedule reverts to pending so the slot reopens for booking.
#[axum::debug_handler]
pub async fn reject_booking(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(payload): Json<RejectBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    user.require_admin()?;

    let booking = dutyroster_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Booking with ID {id} not found")))?;

    let status: BookingStatus = super::parse_status(&booking.status)?;
    rules::validate_rejection(status)?;

    let reason = payload
        .reason
        .unwrap_or_else(|| "Rejected by admin".to_string());

    let updated =
        dutyroster_db::repositories::booking::cancel_booking(&state.db_pool, id, &reason)
            .await
            .map_err(DutyError::Database)?;

    let remaining = dutyroster_db::repositories::booking::count_booked_for_schedule(
        &state.db_pool,
        booking.schedule_id,
    )
    .await
    .map_err(DutyError::Database)?;

    if let Some(schedule_status) = rules::schedule_status_after_rejection(remaining) {
        dutyroster_db::repositories::schedule::update_schedule_status(
            &state.db_pool,
            booking.schedule_id,
            schedule_status.as_str(),
            None,
        )
        .await
        .map_err(DutyError::Database)?;
    }

    sink::notify(
        &state.db_pool,
        booking.student_id,
        "Duty Booking Rejected",
        &format!("Your duty booking has been rejected. Reason: {reason}"),
        NotificationKind::Error,
    )
    .await;

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: Some(id),
            schedule_id: Some(booking.schedule_id),
            action: DutyAction::Rejected.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: Some(booking.student_id),
            notes: Some(format!("Admin rejected student booking: {reason}")),
        },
    )
    .await;

    Ok(Json(booking_from_db(updated)?))
}

/// Approves every pending booking on a schedule in one pass and marks the
/// schedule approved.
#[axum::debug_handler]
pub async fn approve_all_bookings(
    State(state): State<Arc<ApiState>>,
    Path(schedule_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<BulkApprovalResponse>, AppError> {
    user.require_admin()?;

    let schedule =
        dutyroster_db::repositories::schedule::get_schedule_by_id(&state.db_pool, schedule_id)
            .await
            .map_err(DutyError::Database)?
            .ok_or_else(|| {
                DutyError::NotFound(format!("Schedule with ID {schedule_id} not found"))
            })?;

    let approved = dutyroster_db::repositories::booking::approve_all_for_schedule(
        &state.db_pool,
        schedule_id,
    )
    .await
    .map_err(DutyError::Database)?;

    // Bulk approval marks the schedule approved regardless of how many
    // bookings it touched.
    dutyroster_db::repositories::schedule::update_schedule_status(
        &state.db_pool,
        schedule_id,
        ScheduleStatus::Approved.as_str(),
        Some(user.id),
    )
    .await
    .map_err(DutyError::Database)?;

    let students: Vec<Uuid> = approved.iter().map(|b| b.student_id).collect();
    sink::notify_many(
        &state.db_pool,
        &students,
        "Duty Schedule Approved",
        &format!(
            "Your duty booking for {} at {} has been approved",
            schedule.date, schedule.location
        ),
        NotificationKind::Success,
    )
    .await;

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: None,
            schedule_id: Some(schedule_id),
            action: DutyAction::ApprovedAll.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: None,
            notes: Some(format!(
                "Admin approved schedule for {} student(s)",
                approved.len()
            )),
        },
    )
    .await;

    Ok(Json(BulkApprovalResponse {
        approved: approved.len(),
    }))
}

/// Rejects every pending booking on a schedule and withdraws the schedule
/// itself. Unlike individual rejection, the schedule ends up cancelled, not
/// pending: the duty is called off rather than reopened.
#[axum::debug_handler]
pub async fn reject_all_bookings(
    State(state): State<Arc<ApiState>>,
    Path(schedule_id): Path<Uuid>,
    user: CurrentUser,
    Json(payload): Json<RejectBookingRequest>,
) -> Result<Json<BulkRejectionResponse>, AppError> {
    user.require_admin()?;

    dutyroster_db::repositories::schedule::get_schedule_by_id(&state.db_pool, schedule_id)
        .await
        .map_err(DutyError::Database)?
        .ok_or_else(|| DutyError::NotFound(format!("Schedule with ID {schedule_id} not found")))?;

    let reason = payload
        .reason
        .unwrap_or_else(|| "Schedule rejected by admin".to_string());

    let rejected = dutyroster_db::repositories::booking::cancel_all_for_schedule(
        &state.db_pool,
        schedule_id,
        &reason,
    )
    .await
    .map_err(DutyError::Database)?;

    dutyroster_db::repositories::schedule::update_schedule_status(
        &state.db_pool,
        schedule_id,
        ScheduleStatus::Cancelled.as_str(),
        None,
    )
    .await
    .map_err(DutyError::Database)?;

    let students: Vec<Uuid> = rejected.iter().map(|b| b.student_id).collect();
    sink::notify_many(
        &state.db_pool,
        &students,
        "Duty Schedule Rejected",
        "The duty schedule has been rejected by the administrator. Your booking has been cancelled.",
        NotificationKind::Error,
    )
    .await;

    sink::record(
        &state.db_pool,
        NewDutyLog {
            schedule_student_id: None,
            schedule_id: Some(schedule_id),
            action: DutyAction::RejectedAll.as_str().to_string(),
            performed_by: Some(user.id),
            target_user: None,
            notes: Some(format!(
                "Admin rejected schedule and cancelled {} student booking(s): {reason}",
                rejected.len()
            )),
        },
    )
    .await;

    Ok(Json(BulkRejectionResponse {
        rejected: rejected.len(),
    }))
}

/// The admin approval queue: pending bookings across all schedules.
#[axum::debug_handler]
pub async fn list_pending_bookings(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    user.require_admin()?;

    let bookings = dutyroster_db::repositories::booking::list_pending_bookings(&state.db_pool)
        .await
        .map_err(DutyError::Database)?;

    let details: Result<Vec<_>, _> = bookings.into_iter().map(details_from_db).collect();
    Ok(Json(details?))
}

/// All bookings for one schedule, with student details.
#[axum::debug_handler]
pub async fn list_bookings_for_schedule(
    State(state): State<Arc<ApiState>>,
    Path(schedule_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    user.require_admin()?;

    let bookings = dutyroster_db::repositories::booking::list_bookings_for_schedule(
        &state.db_pool,
        schedule_id,
    )
    .await
    .map_err(DutyError::Database)?;

    let details: Result<Vec<_>, _> = bookings.into_iter().map(details_from_db).collect();
    Ok(Json(details?))
}

/// A student's duty history. Visible to the student, any admin, and the
/// linked parent (view-only).
#[axum::debug_handler]
pub async fn list_student_duties(
    State(state): State<Arc<ApiState>>,
    Path(student_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    let allowed = match user.role {
        Role::Admin => true,
        Role::Student => user.id == student_id,
        Role::Parent => user.student_id == Some(student_id),
    };
    if !allowed {
        return Err(AppError(DutyError::Authorization(
            "You can only view your own duties".to_string(),
        )));
    }

    let duties =
        dutyroster_db::repositories::booking::list_student_duties(&state.db_pool, student_id)
            .await
            .map_err(DutyError::Database)?;

    let details: Result<Vec<_>, _> = duties.into_iter().map(details_from_db).collect();
    Ok(Json(details?))
}

/// Aggregate booking counts for the admin dashboard.
#[axum::debug_handler]
pub async fn booking_stats(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
) -> Result<Json<BookingStats>, AppError> {
    user.require_admin()?;

    let counts = dutyroster_db::repositories::booking::booking_stats(&state.db_pool)
        .await
        .map_err(DutyError::Database)?;

    let mut stats = BookingStats::default();
    for row in counts {
        stats.total += row.count;
        match super::parse_status::<BookingStatus>(&row.status)? {
            BookingStatus::Booked => stats.pending = row.count,
            BookingStatus::Approved => stats.approved = row.count,
            BookingStatus::Cancelled => stats.cancelled = row.count,
            BookingStatus::Completed => stats.completed = row.count,
        }
    }

    Ok(Json(stats))
}

/// Query parameters for the per-student statistics report.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Per-student duty numbers over a reporting window.
#[axum::debug_handler]
pub async fn student_duty_stats(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<StatsQuery>,
    user: CurrentUser,
) -> Result<Json<Vec<StudentDutyStats>>, AppError> {
    user.require_admin()?;

    let stats = dutyroster_db::repositories::booking::student_duty_stats(
        &state.db_pool,
        query.start_date,
        query.end_date,
    )
    .await
    .map_err(DutyError::Database)?;

    let stats = stats
        .into_iter()
        .map(|row| StudentDutyStats {
            student_id: row.student_id,
            full_name: row.full_name,
            total: row.total,
            completed: row.completed,
            cancelled: row.cancelled,
        })
        .collect();

    Ok(Json(stats))
}

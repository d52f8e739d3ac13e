//! Booking and approval rules for the duty workflow.
//!
//! Every business rule lives here, in one place, as pure functions over
//! snapshots the caller assembles from the repository layer. The checks are
//! read-then-write: under concurrent bookings the insert transaction and the
//! storage-level unique index are the authoritative guard, and a stale
//! snapshot detected at insert time is treated as an ordinary recoverable
//! conflict, not an error in these rules.

use chrono::{Datelike, NaiveDate, Weekday};
use uuid::Uuid;

use crate::errors::{DutyError, DutyResult};
use crate::models::booking::BookingStatus;
use crate::models::profile::Role;
use crate::models::schedule::ScheduleStatus;

/// Snapshot of everything the booking validator needs to admit or reject a
/// reservation attempt for one (schedule, student) pair.
#[derive(Debug, Clone)]
pub struct BookingContext {
    pub schedule_date: NaiveDate,
    pub max_students: i32,
    /// Bookings on this schedule with status booked or approved.
    pub active_bookings: i64,
    /// The student already holds an active booking on this schedule.
    pub already_booked: bool,
    /// The student holds an active booking on any schedule for the same date.
    pub has_duty_on_date: bool,
    /// The student cancelled a booking for this date earlier today.
    pub cancelled_same_day: bool,
}

/// Admit or reject a booking attempt. Checks run in a fixed order and the
/// first failure aborts with a user-facing message; nothing is written before
/// the caller's insert.
pub fn validate_booking(ctx: &BookingContext, today: NaiveDate) -> DutyResult<()> {
    if ctx.schedule_date < today {
        return Err(DutyError::Validation(
            "Cannot book duty for past dates".to_string(),
        ));
    }

    if ctx.schedule_date == today {
        return Err(DutyError::Validation(
            "Cannot book duty for today. Bookings must be made in advance".to_string(),
        ));
    }

    if ctx.active_bookings >= ctx.max_students as i64 {
        return Err(DutyError::Validation(format!(
            "This duty is fully booked ({}/{} students assigned)",
            ctx.active_bookings, ctx.max_students
        )));
    }

    if ctx.already_booked {
        return Err(DutyError::Validation(
            "You have already booked this duty".to_string(),
        ));
    }

    if ctx.has_duty_on_date {
        return Err(DutyError::Validation(
            "You already have a duty scheduled for this date. Students can only have one duty per day"
                .to_string(),
        ));
    }

    if ctx.cancelled_same_day {
        return Err(DutyError::Validation(
            "You cancelled a booking for this date today. You can book this date again tomorrow"
                .to_string(),
        ));
    }

    Ok(())
}

pub fn has_open_slots(active_bookings: i64, max_students: i32) -> bool {
    active_bookings < max_students as i64
}

/// Only pending bookings can be approved.
pub fn validate_approval(status: BookingStatus) -> DutyResult<()> {
    if !status.can_transition_to(BookingStatus::Approved) {
        return Err(DutyError::Validation(format!(
            "Only pending bookings can be approved (current status: {status})"
        )));
    }
    Ok(())
}

/// Rejection is an admin decision on a pending booking; approved bookings
/// are withdrawn through cancellation instead.
pub fn validate_rejection(status: BookingStatus) -> DutyResult<()> {
    if status != BookingStatus::Booked {
        return Err(DutyError::Validation(format!(
            "Only pending bookings can be rejected (current status: {status})"
        )));
    }
    Ok(())
}

/// Cancellation is allowed from any non-terminal status, but never on the
/// duty's own calendar day.
pub fn validate_cancellation(
    status: BookingStatus,
    duty_date: NaiveDate,
    today: NaiveDate,
) -> DutyResult<()> {
    if status.is_terminal() {
        return Err(DutyError::Validation(format!(
            "Only active bookings can be cancelled (current status: {status})"
        )));
    }

    if duty_date == today {
        return Err(DutyError::Validation(
            "Cannot cancel duties on the same day. Cancellations must be made in advance"
                .to_string(),
        ));
    }

    Ok(())
}

/// Students may cancel only their own bookings; admins may cancel any.
pub fn validate_cancel_authorization(
    caller_id: Uuid,
    caller_role: Role,
    booking_student: Uuid,
) -> DutyResult<()> {
    match caller_role {
        Role::Admin => Ok(()),
        Role::Student if caller_id == booking_student => Ok(()),
        Role::Student => Err(DutyError::Authorization(
            "You can only cancel your own duties".to_string(),
        )),
        Role::Parent => Err(DutyError::Authorization(
            "Parents cannot cancel duties".to_string(),
        )),
    }
}

/// Completion is a pure status flip: only the owning student, only from
/// approved.
pub fn validate_completion(
    status: BookingStatus,
    booking_student: Uuid,
    caller_id: Uuid,
) -> DutyResult<()> {
    if booking_student != caller_id {
        return Err(DutyError::Authorization(
            "You can only complete your own duties".to_string(),
        ));
    }

    if !status.can_transition_to(BookingStatus::Completed) {
        return Err(DutyError::Validation(format!(
            "Only approved duties can be marked as completed (current status: {status})"
        )));
    }

    Ok(())
}

/// After an individual approval: once no `booked` records remain, the whole
/// schedule is approved.
pub fn schedule_status_after_approval(remaining_booked: i64) -> Option<ScheduleStatus> {
    (remaining_booked == 0).then_some(ScheduleStatus::Approved)
}

/// After an individual rejection: once no `booked` records remain, the
/// schedule reverts to pending so the slot reopens for booking. Bulk
/// rejection does not use this cascade; it withdraws the schedule outright.
pub fn schedule_status_after_rejection(remaining_booked: i64) -> Option<ScheduleStatus> {
    (remaining_booked == 0).then_some(ScheduleStatus::Pending)
}

/// Schedules can only be created for today or future dates.
pub fn validate_schedule_date(date: NaiveDate, today: NaiveDate) -> DutyResult<()> {
    if date < today {
        return Err(DutyError::Validation(
            "Cannot create schedule for past dates".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_capacity(max_students: i32) -> DutyResult<()> {
    if max_students < 1 {
        return Err(DutyError::Validation(
            "Schedule capacity must be at least one student".to_string(),
        ));
    }
    Ok(())
}

/// Days used for bulk generation when the request does not name any.
pub const DEFAULT_DUTY_DAYS: &[Weekday] = &[
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// Maps request day indices (0 = Sunday .. 6 = Saturday) to weekdays.
pub fn weekdays_from_indices(indices: &[u8]) -> DutyResult<Vec<Weekday>> {
    indices
        .iter()
        .map(|i| match i {
            0 => Ok(Weekday::Sun),
            1 => Ok(Weekday::Mon),
            2 => Ok(Weekday::Tue),
            3 => Ok(Weekday::Wed),
            4 => Ok(Weekday::Thu),
            5 => Ok(Weekday::Fri),
            6 => Ok(Weekday::Sat),
            other => Err(DutyError::Validation(format!(
                "Invalid day of week: {other}"
            ))),
        })
        .collect()
}

/// Expands a bulk-creation range into the concrete dates matching the
/// requested days of week, inclusive on both ends.
pub fn expand_date_range(
    start: NaiveDate,
    end: NaiveDate,
    days_of_week: &[Weekday],
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        if days_of_week.contains(&current.weekday()) {
            dates.push(current);
        }
        current = match current.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    dates
}
